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

//! Per-domain mediator state.
//!
//! Every domain that enables the mediator owns one slot of a fixed arena
//! between `init` and `teardown`. A slot records its owner and the FF-A
//! version the guest negotiated. Domains never touch each other's slots, so
//! no lock is needed; slot ownership is handed over with atomic
//! compare-and-swap on the owner word.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::ffa::*;
use crate::types::*;

/// Owner word of a slot nobody owns. Never a valid domain ID since such a
/// domain could not be given an FF-A endpoint ID.
const SLOT_FREE: u32 = u32::max_value();

const_assert!(MAX_DOMAINS <= ffa_vm_id_t::max_value() as usize);

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Error {
    /// The mediator was not successfully probed.
    NotReady,
    /// The domain ID cannot be mapped to an FF-A endpoint ID.
    IdRangeExceeded,
    /// The domain already has a context.
    AlreadyAttached,
    /// No free context slot is left.
    OutOfMemory,
}

impl From<Error> for &'static str {
    fn from(err: Error) -> Self {
        use Error::*;
        match err {
            NotReady => "FF-A mediator is not available",
            IdRangeExceeded => "Domain ID too large for an FF-A endpoint ID",
            AlreadyAttached => "Domain already has an FF-A context",
            OutOfMemory => "Out of FF-A domain contexts",
        }
    }
}

/// A domain's mediator state, valid while the domain owns its slot.
pub struct DomainContext {
    owner: AtomicU32,

    /// Raw FF-A version negotiated by the guest, or 0 before `FFA_VERSION`.
    guest_version: AtomicU32,

    /// Set once an unhandled function ID from this domain has been logged.
    unhandled_logged: AtomicBool,
}

impl DomainContext {
    const fn new() -> Self {
        Self {
            owner: AtomicU32::new(SLOT_FREE),
            guest_version: AtomicU32::new(0),
            unhandled_logged: AtomicBool::new(false),
        }
    }

    /// The domain owning this context.
    pub fn domain_id(&self) -> domid_t {
        self.owner.load(Ordering::Relaxed)
    }

    /// The FF-A endpoint ID of the owning domain.
    pub fn vm_id(&self) -> ffa_vm_id_t {
        vm_id_of(self.domain_id())
    }

    pub fn guest_version(&self) -> Option<FfaVersion> {
        match self.guest_version.load(Ordering::Relaxed) {
            0 => None,
            raw => Some(FfaVersion::from_raw(raw)),
        }
    }

    /// Records the version agreed on with the guest.
    ///
    /// Handshakes from several vCPUs of one domain are not serialized: the last
    /// store wins.
    pub fn set_guest_version(&self, version: FfaVersion) {
        self.guest_version.store(version.raw(), Ordering::Relaxed);
    }

    /// Returns true the first time it is called for the current owner.
    pub fn note_unhandled(&self) -> bool {
        !self.unhandled_logged.swap(true, Ordering::Relaxed)
    }

    fn reset(&self) {
        self.guest_version.store(0, Ordering::Relaxed);
        self.unhandled_logged.store(false, Ordering::Relaxed);
    }
}

// The arena is built from this constant to allow `const` construction.
#[allow(clippy::declare_interior_mutable_const)]
const FREE_CONTEXT: DomainContext = DomainContext::new();

/// Arena of domain contexts.
pub struct ContextPool {
    slots: [DomainContext; MAX_DOMAINS],
}

impl ContextPool {
    pub const fn new() -> Self {
        Self {
            slots: [FREE_CONTEXT; MAX_DOMAINS],
        }
    }

    /// Returns the context owned by `domain_id`, if any.
    pub fn get(&self, domain_id: domid_t) -> Option<&DomainContext> {
        if domain_id == SLOT_FREE {
            return None;
        }

        self.slots
            .iter()
            .find(|slot| slot.owner.load(Ordering::Acquire) == domain_id)
    }

    /// Attaches a fresh context to `domain_id`.
    ///
    /// Readiness of the mediator is checked by the caller; this only checks
    /// the domain itself.
    pub fn attach(&self, domain_id: domid_t) -> Result<&DomainContext, Error> {
        // Endpoint IDs are `domain_id + 1` and must fit in 16 bits.
        if domain_id >= domid_t::from(ffa_vm_id_t::max_value()) {
            return Err(Error::IdRangeExceeded);
        }

        if self.get(domain_id).is_some() {
            return Err(Error::AlreadyAttached);
        }

        let claimed = self
            .slots
            .iter()
            .find(|slot| {
                slot.owner
                    .compare_exchange(SLOT_FREE, domain_id, Ordering::SeqCst, Ordering::Relaxed)
                    .is_ok()
            })
            .ok_or(Error::OutOfMemory)?;

        // A racing attach of the same domain may have claimed another slot
        // after the check above. Both sides back off in that case; SeqCst
        // keeps them from both missing the other's claim.
        let duplicate = self.slots.iter().any(|slot| {
            !core::ptr::eq(slot, claimed) && slot.owner.load(Ordering::SeqCst) == domain_id
        });
        if duplicate {
            claimed.owner.store(SLOT_FREE, Ordering::Release);
            return Err(Error::AlreadyAttached);
        }

        Ok(claimed)
    }

    /// Releases the context of `domain_id`. Returns whether one was attached.
    pub fn detach(&self, domain_id: domid_t) -> bool {
        match self.get(domain_id) {
            Some(slot) => {
                // Slots are handed out zeroed.
                slot.reset();
                slot.owner.store(SLOT_FREE, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Number of domains currently holding a context.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.owner.load(Ordering::Relaxed) != SLOT_FREE)
            .count()
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}
