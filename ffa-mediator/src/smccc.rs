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

//! Arm SMC Calling Convention plumbing shared by the guest-facing side and
//! the firmware-facing side of the mediator.

use crate::types::*;

/// Number of argument/result registers an FF-A call uses (x0-x7).
pub const SMCCC_REG_COUNT: usize = 8;

pub const SMCCC_VERSION_MAJOR_SHIFT: u32 = 16;
pub const SMCCC_VERSION_MINOR_MASK: u32 = 0xffff;

pub const fn make_smccc_version(major: u32, minor: u32) -> u32 {
    (major << SMCCC_VERSION_MAJOR_SHIFT) | (minor & SMCCC_VERSION_MINOR_MASK)
}

pub const ARM_SMCCC_VERSION_1_0: u32 = make_smccc_version(1, 0);
pub const ARM_SMCCC_VERSION_1_2: u32 = make_smccc_version(1, 2);

/// Function ID of `SMCCC_VERSION`.
pub const ARM_SMCCC_VERSION_FID: u32 = 0x8000_0000;

bitflags! {
    /// Function ID bits defined by the calling convention itself.
    pub struct FuncIdFlags: u32 {
        /// The call runs to completion without being preempted.
        const FAST_CALL = 1 << 31;

        /// Arguments and results use the 64-bit (SMC64) convention.
        const CONV_64 = 1 << 30;
    }
}

/// Register width selected by a function ID.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RegWidth {
    W32,
    W64,
}

impl RegWidth {
    pub fn of(fid: u32) -> Self {
        if FuncIdFlags::from_bits_truncate(fid).contains(FuncIdFlags::CONV_64) {
            RegWidth::W64
        } else {
            RegWidth::W32
        }
    }

    pub fn mask(self) -> uintreg_t {
        match self {
            RegWidth::W32 => 0xffff_ffff,
            RegWidth::W64 => !0,
        }
    }
}

/// Registers x0-x7 of a call, in or out.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct SmcccRegs {
    pub a: [uintreg_t; SMCCC_REG_COUNT],
}

impl SmcccRegs {
    pub fn new(a: [uintreg_t; SMCCC_REG_COUNT]) -> Self {
        Self { a }
    }

    /// The function ID in w0.
    pub fn func_id(&self) -> u32 {
        self.a[0] as u32
    }

    /// Overwrites every register.
    pub fn set(&mut self, a: [uintreg_t; SMCCC_REG_COUNT]) {
        self.a = a;
    }

    /// Applies `width` to x1-x7. x0 carries the function ID or status and is
    /// left alone.
    pub fn mask_args(&mut self, width: RegWidth) {
        let mask = width.mask();
        for reg in self.a[1..].iter_mut() {
            *reg &= mask;
        }
    }
}

/// The synchronous call primitive into the secure world.
///
/// Implementations block until the firmware answers and perform no retries.
pub trait FirmwareGateway {
    /// Issues one call with `args` in x0-x7 and returns x0-x7 on completion.
    fn call(&self, args: &SmcccRegs) -> SmcccRegs;

    /// Revision of the calling convention implemented below us, encoded as
    /// `major << 16 | minor`.
    fn smccc_version(&self) -> u32;
}
