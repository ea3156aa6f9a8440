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

//! Write-once storage for state negotiated during boot.
//!
//! The mediator learns a few facts about the firmware exactly once, while the
//! hypervisor is still initializing and no guest runs. Afterwards those facts
//! are read on every mediated call from any physical CPU. `WriteOnce` makes
//! the two phases explicit: a single `set` publishes the value with release
//! ordering, and every reader checks the ready flag with acquire ordering
//! before touching it. No lock is taken on the read side.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU8, Ordering};

const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const READY: u8 = 2;

pub struct WriteOnce<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

unsafe impl<T: Send + Sync> Sync for WriteOnce<T> {}

impl<T> WriteOnce<T> {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Stores `value` unless a value was stored before, in which case `value`
    /// is handed back.
    pub fn set(&self, value: T) -> Result<(), T> {
        if self
            .state
            .compare_exchange(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(value);
        }

        // Safe: the successful transition to `WRITING` grants exclusive access,
        // and readers ignore the cell until `READY` is published.
        unsafe {
            (*self.value.get()).as_mut_ptr().write(value);
        }
        self.state.store(READY, Ordering::Release);

        Ok(())
    }

    pub fn get(&self) -> Option<&T> {
        if self.is_ready() {
            Some(unsafe { &*(*self.value.get()).as_ptr() })
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }
}

impl<T> Drop for WriteOnce<T> {
    fn drop(&mut self) {
        if *self.state.get_mut() == READY {
            unsafe {
                self.value.get_mut().as_mut_ptr().drop_in_place();
            }
        }
    }
}
