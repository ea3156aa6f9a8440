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

//! Relay of `FFA_MSG_SEND_DIRECT_REQ` from a guest to the SPMC.

use crate::context::*;
use crate::ffa::*;
use crate::smccc::*;
use crate::types::*;

/// Whether the SPMC may answer a direct request with `a0`. The whole register
/// is checked: bits above w0 must be clear.
fn is_direct_req_answer(a0: uintreg_t) -> bool {
    [
        FFA_ERROR,
        FFA_SUCCESS_32,
        FFA_SUCCESS_64,
        FFA_MSG_SEND_DIRECT_RESP_32,
        FFA_MSG_SEND_DIRECT_RESP_64,
    ]
    .iter()
    .any(|&fid| a0 == uintreg_t::from(fid))
}

/// Forwards the direct request in `regs` on behalf of the domain owning
/// `ctx`, and replaces `regs` with the answer.
///
/// The sender ID in w1[31:16] must be the caller's own endpoint ID, otherwise
/// the request never reaches the SPMC. Every register the guest gets to see is
/// truncated to the width of the request.
pub fn handle_msg_send_direct_req<G: FirmwareGateway>(
    regs: &mut SmcccRegs,
    ctx: &DomainContext,
    gateway: &G,
) {
    let fid = regs.func_id();
    let width = RegWidth::of(fid);
    let src_dst = regs.a[1] as u32;

    let mut resp = if (src_dst >> 16) != u32::from(ctx.vm_id()) {
        SmcccRegs::new([
            u64::from(FFA_ERROR),
            0,
            FfaReturn::InvalidParameters.into_reg(),
            0,
            0,
            0,
            0,
            0,
        ])
    } else {
        let mut arg = *regs;
        arg.a[0] = u64::from(fid);
        arg.a[1] = u64::from(src_dst);
        arg.mask_args(width);

        let resp = gateway.call(&arg);
        if is_direct_req_answer(resp.a[0]) {
            resp
        } else {
            dlog!(
                "ffa: bad answer {:#x} to direct request from VM {:#x}\n",
                resp.a[0],
                ctx.vm_id()
            );
            SmcccRegs::new([
                u64::from(FFA_ERROR),
                u64::from(src_dst),
                FfaReturn::Aborted.into_reg(),
                0,
                0,
                0,
                0,
                0,
            ])
        }
    };

    resp.mask_args(width);
    *regs = resp;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::*;

    const MASK_32: u64 = 0xffff_ffff;

    fn request(fid: u32, src_dst: u32, payload: u64) -> SmcccRegs {
        SmcccRegs::new([
            u64::from(fid),
            u64::from(src_dst) | 0xaaaa_0000_0000_0000,
            payload,
            payload + 1,
            payload + 2,
            payload + 3,
            payload + 4,
            payload + 5,
        ])
    }

    #[test]
    fn spoofed_source_never_reaches_firmware() {
        let pool = ContextPool::new();
        let ctx = pool.attach(3).unwrap();
        let gw = MockGateway::spmc(FFA_VERSION_1_1);

        for &src in &[0u32, 3, 5, 0xffff] {
            let mut regs = request(FFA_MSG_SEND_DIRECT_REQ_32, (src << 16) | 7, 0x1234);
            handle_msg_send_direct_req(&mut regs, ctx, &gw);

            assert_eq!(regs.func_id(), FFA_ERROR);
            assert_eq!(regs.a[1], 0);
            assert_eq!(regs.a[2], FfaReturn::InvalidParameters.into_reg() & MASK_32);
            assert!(regs.a[3..].iter().all(|&r| r == 0));
        }
        assert_eq!(gw.call_count(), 0);
    }

    #[test]
    fn spoofed_source_64_keeps_full_error_code() {
        let pool = ContextPool::new();
        let ctx = pool.attach(0).unwrap();
        let gw = MockGateway::spmc(FFA_VERSION_1_1);

        let mut regs = request(FFA_MSG_SEND_DIRECT_REQ_64, (2 << 16) | 1, 0);
        handle_msg_send_direct_req(&mut regs, ctx, &gw);

        assert_eq!(regs.a[2], FfaReturn::InvalidParameters.into_reg());
        assert_eq!(gw.call_count(), 0);
    }

    #[test]
    fn request_32_is_masked_both_ways() {
        let pool = ContextPool::new();
        let ctx = pool.attach(3).unwrap();
        let gw = MockGateway::spmc(FFA_VERSION_1_1);
        let src_dst = (4 << 16) | 7;

        let mut regs = request(FFA_MSG_SEND_DIRECT_REQ_32, src_dst, 0x5555_0000_1000_0000);
        handle_msg_send_direct_req(&mut regs, ctx, &gw);

        let calls = gw.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].func_id(), FFA_MSG_SEND_DIRECT_REQ_32);
        assert_eq!(calls[0].a[1], u64::from(src_dst));
        assert!(calls[0].a[1..].iter().all(|&r| r <= MASK_32));
        assert_eq!(calls[0].a[2], 0x1000_0000);

        assert_eq!(regs.func_id(), FFA_MSG_SEND_DIRECT_RESP_32);
        assert_eq!(regs.a[1], u64::from((7 << 16) | 4u32));
        assert!(regs.a[1..].iter().all(|&r| r <= MASK_32));
        assert_eq!(regs.a[2], 0x1000_0000);
        assert_eq!(regs.a[7], 0x1000_0005);
    }

    #[test]
    fn request_64_keeps_upper_halves() {
        let pool = ContextPool::new();
        let ctx = pool.attach(0).unwrap();
        let gw = MockGateway::spmc(FFA_VERSION_1_1);
        let payload = 0x5555_0000_1000_0000;

        let mut regs = request(FFA_MSG_SEND_DIRECT_REQ_64, (1 << 16) | 0x8001, payload);
        handle_msg_send_direct_req(&mut regs, ctx, &gw);

        let calls = gw.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].a[1], u64::from((1u32 << 16) | 0x8001));
        assert_eq!(calls[0].a[2], payload);

        assert_eq!(regs.func_id(), FFA_MSG_SEND_DIRECT_RESP_64);
        assert_eq!(regs.a[2], payload | GARBAGE);
    }

    #[test]
    fn unknown_answer_becomes_aborted() {
        let pool = ContextPool::new();
        let ctx = pool.attach(3).unwrap();
        let gw = MockGateway::spmc(FFA_VERSION_1_1);
        gw.set_handler(|_| SmcccRegs::new([0x8400_0062, 1, 2, 3, 4, 5, 6, 7]));
        let src_dst = (4 << 16) | 9;

        let mut regs = request(FFA_MSG_SEND_DIRECT_REQ_32, src_dst, 0);
        handle_msg_send_direct_req(&mut regs, ctx, &gw);

        assert_eq!(gw.call_count(), 1);
        assert_eq!(
            regs.a,
            [
                u64::from(FFA_ERROR),
                u64::from(src_dst),
                FfaReturn::Aborted.into_reg() & MASK_32,
                0,
                0,
                0,
                0,
                0
            ]
        );
    }

    #[test]
    fn answer_with_upper_bits_in_a0_becomes_aborted() {
        let pool = ContextPool::new();
        let ctx = pool.attach(3).unwrap();
        let gw = MockGateway::spmc(FFA_VERSION_1_1);
        gw.set_handler(|_| {
            SmcccRegs::new([
                0xdead_beef_0000_0000 | u64::from(FFA_MSG_SEND_DIRECT_RESP_32),
                0,
                0,
                0,
                0,
                0,
                0,
                0,
            ])
        });
        let src_dst = (4 << 16) | 7;

        for &fid in &[FFA_MSG_SEND_DIRECT_REQ_32, FFA_MSG_SEND_DIRECT_REQ_64] {
            let mut regs = request(fid, src_dst, 0);
            handle_msg_send_direct_req(&mut regs, ctx, &gw);

            assert_eq!(regs.a[0], u64::from(FFA_ERROR));
            assert_eq!(regs.a[1], u64::from(src_dst));
            assert_eq!(
                regs.a[2] & MASK_32,
                FfaReturn::Aborted.into_reg() & MASK_32
            );
        }
        assert_eq!(gw.call_count(), 2);
    }

    #[test]
    fn allowed_answers_pass_through() {
        let pool = ContextPool::new();
        let ctx = pool.attach(3).unwrap();
        let gw = MockGateway::spmc(FFA_VERSION_1_1);

        for &answer in &[
            FFA_ERROR,
            FFA_SUCCESS_32,
            FFA_SUCCESS_64,
            FFA_MSG_SEND_DIRECT_RESP_32,
            FFA_MSG_SEND_DIRECT_RESP_64,
        ] {
            gw.set_handler(move |_| SmcccRegs::new([u64::from(answer), 0, 0x11, 0, 0, 0, 0, 0]));
            let mut regs = request(FFA_MSG_SEND_DIRECT_REQ_32, (4 << 16) | 1, 0);
            handle_msg_send_direct_req(&mut regs, ctx, &gw);

            assert_eq!(regs.func_id(), answer);
            assert_eq!(regs.a[2], 0x11);
        }
        assert_eq!(gw.call_count(), 5);
    }
}
