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

//! Scripted firmware used by the unit tests.

use std::boxed::Box;
use std::cell::RefCell;
use std::vec::Vec;

use crate::ffa::*;
use crate::smccc::*;

type Handler = Box<dyn Fn(&SmcccRegs) -> SmcccRegs>;

/// A firmware gateway answering calls with a replaceable closure and
/// recording every call it receives.
pub struct MockGateway {
    smccc_version: u32,
    handler: RefCell<Handler>,
    calls: RefCell<Vec<SmcccRegs>>,
}

impl MockGateway {
    pub fn new<F>(smccc_version: u32, handler: F) -> Self
    where
        F: Fn(&SmcccRegs) -> SmcccRegs + 'static,
    {
        Self {
            smccc_version,
            handler: RefCell::new(Box::new(handler)),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A well-behaved SPMC implementing `version` with every feature present.
    /// Direct requests are answered with a direct response of the same width
    /// whose payload registers have garbage in their upper halves.
    pub fn spmc(version: FfaVersion) -> Self {
        Self::new(ARM_SMCCC_VERSION_1_2, move |args| spmc_answer(version, args))
    }

    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&SmcccRegs) -> SmcccRegs + 'static,
    {
        *self.handler.borrow_mut() = Box::new(handler);
    }

    pub fn calls(&self) -> Vec<SmcccRegs> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn reset_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl FirmwareGateway for MockGateway {
    fn call(&self, args: &SmcccRegs) -> SmcccRegs {
        self.calls.borrow_mut().push(*args);
        let handler = self.handler.borrow();
        (*handler)(args)
    }

    fn smccc_version(&self) -> u32 {
        self.smccc_version
    }
}

pub const GARBAGE: u64 = 0xdead_beef_0000_0000;

pub fn spmc_answer(version: FfaVersion, args: &SmcccRegs) -> SmcccRegs {
    let a = &args.a;
    match args.func_id() {
        FFA_VERSION => SmcccRegs::new([u64::from(version.raw()), 0, 0, 0, 0, 0, 0, 0]),
        FFA_FEATURES => SmcccRegs::new([u64::from(FFA_SUCCESS_32), 0, 0, 0, 0, 0, 0, 0]),
        FFA_MSG_SEND_DIRECT_REQ_32 | FFA_MSG_SEND_DIRECT_REQ_64 => {
            let resp = if args.func_id() == FFA_MSG_SEND_DIRECT_REQ_32 {
                FFA_MSG_SEND_DIRECT_RESP_32
            } else {
                FFA_MSG_SEND_DIRECT_RESP_64
            };
            let src_dst = a[1] as u32;
            let dst_src = (src_dst << 16) | (src_dst >> 16);
            SmcccRegs::new([
                u64::from(resp),
                u64::from(dst_src),
                a[2] | GARBAGE,
                a[3] | GARBAGE,
                a[4] | GARBAGE,
                a[5] | GARBAGE,
                a[6] | GARBAGE,
                a[7] | GARBAGE,
            ])
        }
        _ => SmcccRegs::new([
            u64::from(FFA_ERROR),
            0,
            FfaReturn::NotSupported.into_reg(),
            0,
            0,
            0,
            0,
            0,
        ]),
    }
}
