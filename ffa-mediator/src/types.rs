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

#![allow(non_camel_case_types)]

/// The integer type corresponding to the native register size.
pub type uintreg_t = u64;

/// Identifier the host hypervisor assigns to a domain.
pub type domid_t = u32;

/// FF-A endpoint ID of a VM as seen by the secure world.
pub type ffa_vm_id_t = u16;

/// The ID the FF-A specification reserves for the hypervisor itself.
pub const HF_HYPERVISOR_VM_ID: ffa_vm_id_t = 0;

/// Number of domains that may have the mediator enabled at the same time.
pub const MAX_DOMAINS: usize = 128;

/// Granule used by the hypervisor for stage-2 mappings.
pub const PAGE_BITS: usize = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_BITS;

/// Returns the FF-A endpoint ID of the domain `domain_id`.
///
/// IDs are shifted by one since 0 belongs to the hypervisor. Callers must have
/// checked that `domain_id` is below `ffa_vm_id_t::max_value()`.
#[inline]
pub fn vm_id_of(domain_id: domid_t) -> ffa_vm_id_t {
    debug_assert!(domain_id < domid_t::from(ffa_vm_id_t::max_value()));
    (domain_id + 1) as ffa_vm_id_t
}
