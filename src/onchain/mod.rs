//! On-chain Storage Layout
//!
//! Solidity storage-layout helpers shared by the Registry reader, the proxy
//! resolver and the hard-fork installer. The installer writes exactly the
//! layout the readers decode, and both must match the deployed contracts.
//! [`abi`] holds the call interface of the KIP-113 contract.
//!
//! Layout:
//!   Registry (0x…0401)
//!     slot 0                          owner
//!     keccak256(name . 1)             records[name].length
//!     keccak256(keccak256(name . 1))  records[name][i] (addr, activation)
//!     slot 2 / keccak256(2) + i       names[i] (short string)
//!   EIP-1967 proxy
//!     IMPLEMENTATION_SLOT             logic address
//!     ADMIN_SLOT                      admin address

pub mod abi;
pub mod helpers;
pub mod slots;

pub use abi::IKIP113;
pub use helpers::{
    decode_address, decode_short_string, decode_u64, dynamic_array_base_slot, encode_address,
    encode_short_string, encode_u64, mapping_string_slot,
};
pub use slots::{eip1967_slots, registry_slots};
