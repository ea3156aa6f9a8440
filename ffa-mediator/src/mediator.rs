/*
 * Copyright 2023 The Hafnium Authors.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! The FF-A mediator as seen by the host hypervisor.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::context::{self, ContextPool, DomainContext};
use crate::direct::*;
use crate::ffa::*;
use crate::probe::{self, Config, MediatorState};
use crate::singleton::*;
use crate::smccc::*;
use crate::types::*;
use crate::version::*;

/// Hooks through which the host drives a TEE mediator.
pub trait TeeMediator {
    /// Human readable name of the mediator.
    const NAME: &'static str;

    /// TEE type a domain configuration selects to use this mediator.
    const CONFIG_ID: u32;

    /// Negotiates with the firmware. Called once during boot, before any
    /// domain is created.
    fn probe(&self) -> Result<(), probe::Error>;

    fn domain_init(&self, domain_id: domid_t) -> Result<(), context::Error>;

    /// Undoes `domain_init`. Succeeds if there is nothing to undo.
    fn domain_teardown(&self, domain_id: domid_t) -> Result<(), context::Error>;

    fn relinquish_resources(&self, domain_id: domid_t) -> Result<(), context::Error>;

    /// Handles a trapped SMC/HVC. Returns false if the call is not for this
    /// mediator and `regs` is left untouched.
    fn handle_call(&self, domain_id: domid_t, regs: &mut SmcccRegs) -> bool;
}

pub struct FfaMediator<G> {
    gateway: G,
    config: Config,
    probed: AtomicBool,
    state: WriteOnce<MediatorState>,
    contexts: ContextPool,
}

impl<G: FirmwareGateway> FfaMediator<G> {
    pub const fn new(gateway: G, config: Config) -> Self {
        Self {
            gateway,
            config,
            probed: AtomicBool::new(false),
            state: WriteOnce::new(),
            contexts: ContextPool::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The state negotiated with the SPMC, if probing succeeded.
    pub fn state(&self) -> Option<&MediatorState> {
        self.state.get()
    }

    pub fn context(&self, domain_id: domid_t) -> Option<&DomainContext> {
        self.contexts.get(domain_id)
    }

    pub fn is_active(&self, domain_id: domid_t) -> bool {
        self.context(domain_id).is_some()
    }

    pub fn active_domains(&self) -> usize {
        self.contexts.active_count()
    }

    fn handle_id_get(regs: &mut SmcccRegs, ctx: &DomainContext) {
        regs.set([
            u64::from(FFA_SUCCESS_32),
            0,
            u64::from(ctx.vm_id()),
            0,
            0,
            0,
            0,
            0,
        ]);
    }
}

impl<G: FirmwareGateway> TeeMediator for FfaMediator<G> {
    const NAME: &'static str = "FF-A";
    const CONFIG_ID: u32 = 2;

    fn probe(&self) -> Result<(), probe::Error> {
        if self.probed.swap(true, Ordering::AcqRel) {
            return Err(probe::Error::AlreadyProbed);
        }

        let state = probe::probe(&self.gateway, &self.config)?;
        self.state
            .set(state)
            .map_err(|_| probe::Error::AlreadyProbed)
    }

    fn domain_init(&self, domain_id: domid_t) -> Result<(), context::Error> {
        if !self.state.is_ready() {
            return Err(context::Error::NotReady);
        }

        self.contexts.attach(domain_id)?;
        Ok(())
    }

    fn domain_teardown(&self, domain_id: domid_t) -> Result<(), context::Error> {
        self.contexts.detach(domain_id);
        Ok(())
    }

    fn relinquish_resources(&self, _domain_id: domid_t) -> Result<(), context::Error> {
        Ok(())
    }

    fn handle_call(&self, domain_id: domid_t, regs: &mut SmcccRegs) -> bool {
        let ctx = match self.contexts.get(domain_id) {
            Some(ctx) => ctx,
            None => return false,
        };
        // A context only exists once the state is published.
        let state = match self.state.get() {
            Some(state) => state,
            None => return false,
        };

        match regs.func_id() {
            FFA_VERSION => {
                handle_version(regs, ctx, state);
                true
            }
            FFA_ID_GET => {
                Self::handle_id_get(regs, ctx);
                true
            }
            FFA_MSG_SEND_DIRECT_REQ_32 | FFA_MSG_SEND_DIRECT_REQ_64 => {
                handle_msg_send_direct_req(regs, ctx, &self.gateway);
                true
            }
            fid => {
                if ctx.note_unhandled() {
                    dlog!("ffa: unhandled fid {:#x}\n", fid);
                }
                false
            }
        }
    }
}
