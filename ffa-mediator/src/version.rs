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

//! `FFA_VERSION` handshake between a guest and the mediator.

use crate::context::*;
use crate::ffa::*;
use crate::probe::*;
use crate::smccc::*;

/// Picks the version to use with a guest asking for `requested`.
///
/// Guests older than 1.1 are served as 1.0; everything else gets the version
/// negotiated with the SPMC, never more.
pub fn negotiate(requested: FfaVersion, state: &MediatorState) -> FfaVersion {
    if requested < FFA_VERSION_1_1 {
        FFA_VERSION_1_0
    } else {
        state.version
    }
}

pub fn handle_version(regs: &mut SmcccRegs, ctx: &DomainContext, state: &MediatorState) {
    let requested = FfaVersion::from_raw(regs.a[1] as u32);
    let version = negotiate(requested, state);

    ctx.set_guest_version(version);
    regs.set([u64::from(version.raw()), 0, 0, 0, 0, 0, 0, 0]);
}
