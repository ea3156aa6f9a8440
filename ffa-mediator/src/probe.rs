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

//! One-time negotiation with the secure world.

use arrayvec::ArrayVec;

use crate::ffa::*;
use crate::smccc::*;
use crate::types::*;

bitflags! {
    /// FF-A interfaces the SPMC must implement for the mediator to be enabled.
    pub struct MandatoryFeatures: u32 {
        const MSG_SEND_DIRECT_REQ_32 = 0b0001;
        const MSG_SEND_DIRECT_REQ_64 = 0b0010;
        const ID_GET = 0b0100;
    }
}

const MANDATORY_FEATURE_COUNT: usize = 3;

impl MandatoryFeatures {
    /// The function IDs to query with `FFA_FEATURES`, in a stable order.
    pub fn func_ids(self) -> ArrayVec<[u32; MANDATORY_FEATURE_COUNT]> {
        let table = [
            (Self::MSG_SEND_DIRECT_REQ_32, FFA_MSG_SEND_DIRECT_REQ_32),
            (Self::MSG_SEND_DIRECT_REQ_64, FFA_MSG_SEND_DIRECT_REQ_64),
            (Self::ID_GET, FFA_ID_GET),
        ];

        table
            .iter()
            .filter(|(feature, _)| self.contains(*feature))
            .map(|(_, fid)| *fid)
            .collect()
    }
}

/// Probe parameters.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Oldest calling convention revision able to carry FF-A arguments in x0-x7.
    pub min_smccc_version: u32,

    /// Accepted SPMC versions, both ends inclusive.
    pub min_spmc_version: FfaVersion,
    pub max_version: FfaVersion,

    pub mandatory: MandatoryFeatures,
}

impl Config {
    pub const DEFAULT: Self = Self {
        min_smccc_version: ARM_SMCCC_VERSION_1_2,
        min_spmc_version: FFA_MIN_SPMC_VERSION,
        max_version: FFA_MY_VERSION,
        mandatory: MandatoryFeatures::MSG_SEND_DIRECT_REQ_32,
    };
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Error {
    TransportUnsupported,
    IncompatibleVersion,
    MissingMandatoryFeature,
    AlreadyProbed,
}

impl From<Error> for &'static str {
    fn from(err: Error) -> Self {
        use Error::*;
        match err {
            TransportUnsupported => "SMCCC revision too old to carry FF-A calls",
            IncompatibleVersion => "SPMC implements an incompatible FF-A version",
            MissingMandatoryFeature => "SPMC lacks a mandatory FF-A feature",
            AlreadyProbed => "FF-A mediator was already probed",
        }
    }
}

/// State negotiated with the SPMC.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MediatorState {
    /// Version to use with the SPMC, and the highest version offered to guests.
    pub version: FfaVersion,
}

/// Interprets the answer to a call that returns a plain status.
pub fn ffa_ret_code(resp: &SmcccRegs) -> FfaReturn {
    match resp.func_id() {
        FFA_ERROR => match resp.a[2] as i32 {
            0 => FfaReturn::NotSupported,
            code => FfaReturn::from_code(code),
        },
        FFA_SUCCESS_32 | FFA_SUCCESS_64 => FfaReturn::Success,
        _ => FfaReturn::NotSupported,
    }
}

fn ffa_simple_call<G: FirmwareGateway>(
    gateway: &G,
    fid: u32,
    a1: uintreg_t,
    a2: uintreg_t,
    a3: uintreg_t,
    a4: uintreg_t,
) -> FfaReturn {
    let resp = gateway.call(&SmcccRegs::new([
        u64::from(fid),
        a1,
        a2,
        a3,
        a4,
        0,
        0,
        0,
    ]));

    ffa_ret_code(&resp)
}

fn ffa_features<G: FirmwareGateway>(gateway: &G, id: u32) -> FfaReturn {
    ffa_simple_call(gateway, FFA_FEATURES, u64::from(id), 0, 0, 0)
}

/// Asks the SPMC for its version, offering ours. Returns `None` if the SPMC
/// does not implement `FFA_VERSION`.
fn ffa_get_version<G: FirmwareGateway>(gateway: &G) -> Option<FfaVersion> {
    let resp = gateway.call(&SmcccRegs::new([
        u64::from(FFA_VERSION),
        u64::from(FFA_MY_VERSION.raw()),
        0,
        0,
        0,
        0,
        0,
        0,
    ]));

    if resp.a[0] as u32 as i32 == FfaReturn::NotSupported as i32 {
        dlog!("ffa: FFA_VERSION returned not supported\n");
        return None;
    }

    Some(FfaVersion::from_raw(resp.a[0] as u32))
}

fn check_mandatory_feature<G: FirmwareGateway>(gateway: &G, id: u32) -> Result<(), Error> {
    match ffa_features(gateway, id) {
        FfaReturn::Success => Ok(()),
        ret => {
            dlog!(
                "ffa: mandatory feature id {:#x} missing: error {}\n",
                id,
                ret as i32
            );
            Err(Error::MissingMandatoryFeature)
        }
    }
}

/// Negotiates the calling convention, the FF-A version and the mandatory
/// features with the SPMC behind `gateway`.
pub fn probe<G: FirmwareGateway>(gateway: &G, config: &Config) -> Result<MediatorState, Error> {
    let smccc_ver = gateway.smccc_version();
    if smccc_ver < config.min_smccc_version {
        dlog!(
            "ffa: unsupported SMCCC version {:#x} (need at least {:#x})\n",
            smccc_ver,
            config.min_smccc_version
        );
        return Err(Error::TransportUnsupported);
    }

    let version = ffa_get_version(gateway).ok_or(Error::IncompatibleVersion)?;
    if version < config.min_spmc_version || version > config.max_version {
        dlog!("ffa: Incompatible version {:#x} found\n", version.raw());
        return Err(Error::IncompatibleVersion);
    }

    dlog!("ARM FF-A Mediator version {}\n", FFA_MY_VERSION);
    dlog!("ARM FF-A Firmware version {}\n", version);

    for id in config.mandatory.func_ids() {
        check_mandatory_feature(gateway, id)?;
    }

    Ok(MediatorState { version })
}
