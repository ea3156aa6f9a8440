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

//! Arm FF-A call mediator.
//!
//! The mediator sits between a guest and the secure partition manager (SPMC).
//! It negotiates the FF-A version with the firmware once at boot, keeps a small
//! context for every domain that enabled it, and relays the handful of calls a
//! guest is allowed to make: `FFA_VERSION`, `FFA_ID_GET` and direct
//! request/response messaging.
//!
//! The host hypervisor drives the mediator through [`mediator::TeeMediator`].

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate static_assertions;

#[macro_use]
pub mod dlog;

pub mod arch;
pub mod context;
pub mod direct;
pub mod ffa;
pub mod mediator;
pub mod probe;
pub mod singleton;
pub mod smccc;
pub mod spinlock;
pub mod types;
pub mod version;

mod panic;

#[cfg(test)]
mod testing;
