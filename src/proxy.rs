//! EIP-1967 proxy resolution.
//!
//! Reads the implementation and admin slots of an upgradable proxy. Accounts
//! without code, or with an empty implementation slot, are simply "not a
//! proxy": most resolved contracts are not wrapped, so this never fails.

use alloy_primitives::{Address, Bytes, U256};

use crate::onchain::{decode_address, eip1967_slots, encode_address};
use crate::state::{StateReader, StateWriter, StorageReader};

/// Logic contract behind `proxy`, or `None` if `proxy` is not an EIP-1967 proxy.
pub fn read_implementation(state: &impl StateReader, proxy: Address) -> Option<Address> {
    if !state.has_code(proxy) {
        return None;
    }
    read_address_slot(state, proxy, eip1967_slots::IMPLEMENTATION)
}

/// Admin of `proxy`, if set.
pub fn read_admin(state: &impl StateReader, proxy: Address) -> Option<Address> {
    if !state.has_code(proxy) {
        return None;
    }
    read_address_slot(state, proxy, eip1967_slots::ADMIN)
}

/// Whether `address` is an EIP-1967 proxy with a non-zero implementation.
pub fn is_proxy(state: &impl StateReader, address: Address) -> bool {
    read_implementation(state, address).is_some()
}

/// Follow `address` to its logic contract when it is a proxy, otherwise
/// return it unchanged.
pub fn follow(state: &impl StateReader, address: Address) -> Address {
    read_implementation(state, address).unwrap_or(address)
}

/// Install proxy `code` at `proxy` pointing at `implementation`.
pub(crate) fn write_proxy(
    state: &mut impl StateWriter,
    proxy: Address,
    code: Bytes,
    implementation: Address,
    admin: Address,
) {
    state.set_code(proxy, code);
    state.set_storage(proxy, eip1967_slots::IMPLEMENTATION, encode_address(implementation));
    state.set_storage(proxy, eip1967_slots::ADMIN, encode_address(admin));
}

fn read_address_slot(state: &impl StorageReader, address: Address, slot: U256) -> Option<Address> {
    state
        .read_storage(address, slot)
        .map(decode_address)
        .filter(|addr| !addr.is_zero())
}
