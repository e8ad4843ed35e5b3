//! Block-scoped state access
//!
//! Narrow views over the account/state database used by every resolver in
//! this crate. Each handle is expected to be pinned to a single block: the
//! resolvers keep no state of their own, so two handles built from the same
//! block always produce the same answers.
//!
//! ```text
//!   RegistryClient / proxy / Kip113Validator   (read)
//!   HardforkInstaller                          (read + write)
//!     → StateProviderStateReader   (MDBX, production)
//!     → GenesisStateReader         (genesis alloc)
//!     → InMemoryState              (genesis building, tests)
//! ```

pub mod memory;
pub mod providers;

pub use memory::InMemoryState;
pub use providers::{GenesisStateReader, StateProviderStateReader};

use crate::errors::CallError;
use alloy_primitives::{Address, Bytes, B256, U256};

/// The block a query is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockContext {
    /// Block number
    pub number: u64,
    /// Block timestamp (seconds)
    pub timestamp: u64,
    /// Block hash, `B256::ZERO` when not yet sealed
    pub hash: B256,
}

impl BlockContext {
    /// Create a context for a sealed block.
    pub const fn new(number: u64, timestamp: u64, hash: B256) -> Self {
        Self { number, timestamp, hash }
    }

    /// Context for an unsealed block known only by number.
    pub const fn at_number(number: u64) -> Self {
        Self { number, timestamp: 0, hash: B256::ZERO }
    }

    /// Whether the block hash is known.
    pub fn is_sealed(&self) -> bool {
        !self.hash.is_zero()
    }
}

/// Trait for reading contract storage slots.
///
/// In production: implemented by the state provider (MDBX database)
/// In tests: implemented by [`InMemoryState`]
pub trait StorageReader {
    /// Read a storage slot value from a contract address.
    /// Returns None if the contract or slot doesn't exist.
    fn read_storage(&self, address: Address, slot: U256) -> Option<B256>;
}

/// Storage plus account code.
pub trait StateReader: StorageReader {
    /// Runtime bytecode deployed at `address`, `None` for accounts without code.
    fn code(&self, address: Address) -> Option<Bytes>;

    /// Whether `address` holds non-empty code.
    fn has_code(&self, address: Address) -> bool {
        self.code(address).is_some_and(|code| !code.is_empty())
    }
}

/// Read-only contract execution against the block the handle is pinned to.
pub trait ContractCaller {
    /// Execute `input` against `to` without committing state.
    fn call_contract(
        &self,
        to: Address,
        input: Bytes,
        block: &BlockContext,
    ) -> Result<Bytes, CallError>;
}

/// Mutable access to the state of an in-progress state transition.
///
/// Only the hard-fork installer writes. Writes become visible to subsequent
/// reads on the same handle.
pub trait StateWriter: StateReader {
    /// Replace the code at `address`.
    fn set_code(&mut self, address: Address, code: Bytes);

    /// Write a storage slot. Writing `B256::ZERO` clears it.
    fn set_storage(&mut self, address: Address, slot: U256, value: B256);
}

impl<T: StorageReader + ?Sized> StorageReader for &T {
    fn read_storage(&self, address: Address, slot: U256) -> Option<B256> {
        (**self).read_storage(address, slot)
    }
}

impl<T: StateReader + ?Sized> StateReader for &T {
    fn code(&self, address: Address) -> Option<Bytes> {
        (**self).code(address)
    }
}

impl<T: ContractCaller + ?Sized> ContractCaller for &T {
    fn call_contract(
        &self,
        to: Address,
        input: Bytes,
        block: &BlockContext,
    ) -> Result<Bytes, CallError> {
        (**self).call_contract(to, input, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};

    #[test]
    fn test_block_context_sealed() {
        assert!(!BlockContext::at_number(10).is_sealed());
        assert!(BlockContext::new(10, 100, B256::repeat_byte(1)).is_sealed());
    }

    #[test]
    fn test_has_code_ignores_empty_code() {
        let addr = address!("0000000000000000000000000000000000000abc");
        let mut state = InMemoryState::new();
        assert!(!state.has_code(addr));
        state.set_code(addr, Bytes::new());
        assert!(!state.has_code(addr));
        state.set_code(addr, bytes!("00"));
        assert!(state.has_code(addr));
    }

    #[test]
    fn test_reader_through_reference() {
        fn read(reader: impl StateReader, addr: Address) -> Option<Bytes> {
            reader.code(addr)
        }

        let addr = address!("0000000000000000000000000000000000000abc");
        let mut state = InMemoryState::new();
        state.set_code(addr, bytes!("6000"));
        assert_eq!(read(&state, addr), Some(bytes!("6000")));
    }
}
