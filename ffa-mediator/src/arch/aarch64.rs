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

use core::arch::asm;

use crate::smccc::*;
use crate::types::*;

/// Secure monitor calls following SMCCC v1.2, which allows x0-x17 for both
/// arguments and results. FF-A only uses x0-x7; x8-x17 are treated as
/// clobbered.
pub struct SmcGateway;

impl SmcGateway {
    pub const fn new() -> Self {
        Self
    }
}

impl FirmwareGateway for SmcGateway {
    fn call(&self, args: &SmcccRegs) -> SmcccRegs {
        let mut a: [uintreg_t; SMCCC_REG_COUNT] = args.a;

        // Safe: an SMC only writes the registers declared below and does not
        // touch memory owned by the hypervisor.
        unsafe {
            asm!(
                "smc #0",
                inout("x0") a[0],
                inout("x1") a[1],
                inout("x2") a[2],
                inout("x3") a[3],
                inout("x4") a[4],
                inout("x5") a[5],
                inout("x6") a[6],
                inout("x7") a[7],
                lateout("x8") _,
                lateout("x9") _,
                lateout("x10") _,
                lateout("x11") _,
                lateout("x12") _,
                lateout("x13") _,
                lateout("x14") _,
                lateout("x15") _,
                lateout("x16") _,
                lateout("x17") _,
                options(nostack),
            );
        }

        SmcccRegs::new(a)
    }

    fn smccc_version(&self) -> u32 {
        let resp = self.call(&SmcccRegs::new([
            u64::from(ARM_SMCCC_VERSION_FID),
            0,
            0,
            0,
            0,
            0,
            0,
            0,
        ]));

        // Firmware predating SMCCC_VERSION implements v1.0.
        match resp.a[0] as u32 as i32 {
            v if v < 0 => ARM_SMCCC_VERSION_1_0,
            v => v as u32,
        }
    }
}
