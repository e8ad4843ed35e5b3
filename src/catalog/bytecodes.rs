//! Runtime bytecode injected at hard forks.
//!
//! The node never executes these to resolve system contracts: the Registry is
//! read through its storage layout (see [`crate::registry::records`]). Each
//! Registry and KIP-113 runtime therefore only serves storage views to callers.
//! Each one ends with an unreachable `INVALID` byte followed by an ASCII tag, so
//! every blob differs from the others and blob hashes stay unique.
//! Networks running the compiled Solidity contracts supply them through
//! [`crate::config::CodeOverrides`].

use alloy_primitives::{bytes, Bytes};

/// EIP-1967 delegating proxy.
///
/// - Empty calldata: STOP (accepts plain value transfers)
/// - Otherwise: DELEGATECALL to the address in the implementation slot and
///   bubble up the return data or revert.
pub const ERC1967_PROXY_CODE: Bytes = bytes!(
    "36"             // calldatasize
    "15"             // iszero
    "60" "48"        // push1 0x48 (STOP_DEST)
    "57"             // jumpi
    "36"             // calldatasize
    "60" "00"        // push1 0x00
    "60" "00"        // push1 0x00
    "37"             // calldatacopy
    "60" "00"        // push1 0x00
    "60" "00"        // push1 0x00
    "36"             // calldatasize
    "60" "00"        // push1 0x00
    "7f"             // push32 (EIP-1967 implementation slot)
    "360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc"
    "54"             // sload
    "5a"             // gas
    "f4"             // delegatecall
    "3d"             // returndatasize
    "60" "00"        // push1 0x00
    "60" "00"        // push1 0x00
    "3e"             // returndatacopy
    "60" "43"        // push1 0x43 (RETURN_DEST)
    "57"             // jumpi
    "3d"             // returndatasize
    "60" "00"        // push1 0x00
    "fd"             // revert
    "5b"             // jumpdest (RETURN_DEST = 0x43)
    "3d"             // returndatasize
    "60" "00"        // push1 0x00
    "f3"             // return
    "5b"             // jumpdest (STOP_DEST = 0x48)
    "00"             // stop
);

/// Registry runtime: rejects value, returns `sload(calldata[4..36])`.
pub const REGISTRY_CODE: Bytes = bytes!(
    "34"             // callvalue
    "15"             // iszero
    "60" "09"        // push1 0x09 (VIEW_DEST)
    "57"             // jumpi
    "60" "00"        // push1 0x00
    "80"             // dup1
    "fd"             // revert
    "5b"             // jumpdest (VIEW_DEST = 0x09)
    "60" "04"        // push1 0x04
    "35"             // calldataload
    "54"             // sload
    "60" "00"        // push1 0x00
    "52"             // mstore
    "60" "20"        // push1 0x20
    "60" "00"        // push1 0x00
    "f3"             // return
    "fe"             // invalid
    "5265676973747279" // "Registry"
);

/// Registry mock: 64-byte calldata writes `sstore(word0, word1)`,
/// anything else is served as a storage view.
pub const REGISTRY_MOCK_CODE: Bytes = bytes!(
    "36"             // calldatasize
    "60" "40"        // push1 0x40
    "14"             // eq
    "60" "13"        // push1 0x13 (WRITE_DEST)
    "57"             // jumpi
    "60" "04"        // push1 0x04
    "35"             // calldataload
    "54"             // sload
    "60" "00"        // push1 0x00
    "52"             // mstore
    "60" "20"        // push1 0x20
    "60" "00"        // push1 0x00
    "f3"             // return
    "5b"             // jumpdest (WRITE_DEST = 0x13)
    "60" "20"        // push1 0x20
    "35"             // calldataload (value)
    "60" "00"        // push1 0x00
    "35"             // calldataload (slot)
    "55"             // sstore
    "00"             // stop
    "fe"             // invalid
    "52656769737472794d6f636b" // "RegistryMock"
);

/// KIP-113 logic runtime, deployed behind [`ERC1967_PROXY_CODE`].
pub const KIP113_CODE: Bytes = bytes!(
    "34"             // callvalue
    "15"             // iszero
    "60" "09"        // push1 0x09 (VIEW_DEST)
    "57"             // jumpi
    "60" "00"        // push1 0x00
    "80"             // dup1
    "fd"             // revert
    "5b"             // jumpdest (VIEW_DEST = 0x09)
    "60" "04"        // push1 0x04
    "35"             // calldataload
    "54"             // sload
    "60" "00"        // push1 0x00
    "52"             // mstore
    "60" "20"        // push1 0x20
    "60" "00"        // push1 0x00
    "f3"             // return
    "fe"             // invalid
    "4b4950313133"   // "KIP113"
);

/// KIP-113 mock: same write/view split as [`REGISTRY_MOCK_CODE`].
pub const KIP113_MOCK_CODE: Bytes = bytes!(
    "36"             // calldatasize
    "60" "40"        // push1 0x40
    "14"             // eq
    "60" "13"        // push1 0x13 (WRITE_DEST)
    "57"             // jumpi
    "60" "04"        // push1 0x04
    "35"             // calldataload
    "54"             // sload
    "60" "00"        // push1 0x00
    "52"             // mstore
    "60" "20"        // push1 0x20
    "60" "00"        // push1 0x00
    "f3"             // return
    "5b"             // jumpdest (WRITE_DEST = 0x13)
    "60" "20"        // push1 0x20
    "35"             // calldataload (value)
    "60" "00"        // push1 0x00
    "35"             // calldataload (slot)
    "55"             // sstore
    "00"             // stop
    "fe"             // invalid
    "4b49503131334d6f636b" // "KIP113Mock"
);
