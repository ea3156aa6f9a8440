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

//! FF-A ABI definitions used by the mediator.

use core::fmt;

use crate::types::*;

// Function IDs.
pub const FFA_ERROR: u32 = 0x8400_0060;
pub const FFA_SUCCESS_32: u32 = 0x8400_0061;
pub const FFA_SUCCESS_64: u32 = 0xc400_0061;
pub const FFA_VERSION: u32 = 0x8400_0063;
pub const FFA_FEATURES: u32 = 0x8400_0064;
pub const FFA_ID_GET: u32 = 0x8400_0069;
pub const FFA_MSG_SEND_DIRECT_REQ_32: u32 = 0x8400_006f;
pub const FFA_MSG_SEND_DIRECT_REQ_64: u32 = 0xc400_006f;
pub const FFA_MSG_SEND_DIRECT_RESP_32: u32 = 0x8400_0070;
pub const FFA_MSG_SEND_DIRECT_RESP_64: u32 = 0xc400_0070;

/// Status codes carried in w2 of an `FFA_ERROR` response.
#[repr(i32)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum FfaReturn {
    Success = 0,
    NotSupported = -1,
    InvalidParameters = -2,
    NoMemory = -3,
    Busy = -4,
    Interrupted = -5,
    Denied = -6,
    Retry = -7,
    Aborted = -8,
}

impl FfaReturn {
    /// Decodes a status code, mapping unknown values to `NotSupported`.
    pub fn from_code(code: i32) -> Self {
        use FfaReturn::*;

        match code {
            0 => Success,
            -2 => InvalidParameters,
            -3 => NoMemory,
            -4 => Busy,
            -5 => Interrupted,
            -6 => Denied,
            -7 => Retry,
            -8 => Aborted,
            _ => NotSupported,
        }
    }

    /// The sign-extended register image of the code.
    pub fn into_reg(self) -> uintreg_t {
        self as i32 as i64 as uintreg_t
    }
}

pub const FFA_VERSION_MAJOR_SHIFT: u32 = 16;
pub const FFA_VERSION_MAJOR_MASK: u32 = 0x7fff;
pub const FFA_VERSION_MINOR_MASK: u32 = 0xffff;

/// An FF-A version as encoded in `FFA_VERSION`: bit 31 is zero, bits[30:16]
/// hold the major and bits[15:0] the minor revision. Encoded versions compare
/// in the same order as the revisions they denote.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct FfaVersion(u32);

impl FfaVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self(
            ((major & FFA_VERSION_MAJOR_MASK) << FFA_VERSION_MAJOR_SHIFT)
                | (minor & FFA_VERSION_MINOR_MASK),
        )
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        (self.0 >> FFA_VERSION_MAJOR_SHIFT) & FFA_VERSION_MAJOR_MASK
    }

    pub const fn minor(self) -> u32 {
        self.0 & FFA_VERSION_MINOR_MASK
    }
}

impl fmt::Display for FfaVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

pub const FFA_VERSION_1_0: FfaVersion = FfaVersion::new(1, 0);
pub const FFA_VERSION_1_1: FfaVersion = FfaVersion::new(1, 1);

/// The version the mediator speaks with guests and the SPMC. A guest may
/// negotiate it down to `FFA_VERSION_1_0`.
pub const FFA_MY_VERSION: FfaVersion = FFA_VERSION_1_1;

/// The oldest SPMC the mediator can work with.
pub const FFA_MIN_SPMC_VERSION: FfaVersion = FFA_VERSION_1_1;

/// FF-A measures memory in 4K pages regardless of the translation granule.
pub const FFA_PAGE_SIZE: usize = 4096;

// Mapping guest memory for FF-A assumes the hypervisor uses the same granule.
const_assert_eq!(PAGE_SIZE, FFA_PAGE_SIZE);
const_assert!(FFA_MIN_SPMC_VERSION.raw() <= FFA_MY_VERSION.raw());
