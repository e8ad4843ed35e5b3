use alloy_genesis::{Genesis, GenesisAccount};
use alloy_primitives::{Address, Bytes, B256, U256};
use std::collections::BTreeMap;

use super::{StateReader, StorageReader};

/// Wraps a Reth `StateProvider` reference to implement [`StateReader`].
///
/// This is the production adapter that reads from the live MDBX database. The
/// provider must be the historical state of the block being queried so that
/// replays resolve exactly what the first execution resolved.
///
/// # Usage
/// ```ignore
/// let state = provider.history_by_block_hash(block.hash)?;
/// let reader = StateProviderStateReader(state.as_ref());
/// let kip113 = RegistryClient::new().resolve(&reader, SystemContract::Kip113, &block)?;
/// ```
pub struct StateProviderStateReader<'a>(pub &'a dyn reth_storage_api::StateProvider);

impl StorageReader for StateProviderStateReader<'_> {
    fn read_storage(&self, address: Address, slot: U256) -> Option<B256> {
        // Convert U256 slot to B256 storage key (big-endian, Solidity layout)
        let key = B256::from(slot.to_be_bytes());
        self.0
            .storage(address, key)
            .ok()
            .flatten()
            .map(|v| B256::from(v.to_be_bytes()))
    }
}

impl StateReader for StateProviderStateReader<'_> {
    fn code(&self, address: Address) -> Option<Bytes> {
        self.0
            .account_code(&address)
            .ok()
            .flatten()
            .map(|code| code.original_bytes())
    }
}

/// A [`StateReader`] over a genesis configuration's alloc.
///
/// Lets the resolvers run against a chain that only exists as a genesis file,
/// without needing a running node.
pub struct GenesisStateReader {
    alloc: BTreeMap<Address, GenesisAccount>,
}

impl GenesisStateReader {
    /// Create a reader from a genesis configuration.
    pub fn from_genesis(genesis: &Genesis) -> Self {
        Self { alloc: genesis.alloc.clone() }
    }

    /// Create a reader from a bare alloc.
    pub fn from_alloc(alloc: BTreeMap<Address, GenesisAccount>) -> Self {
        Self { alloc }
    }
}

impl StorageReader for GenesisStateReader {
    fn read_storage(&self, address: Address, slot: U256) -> Option<B256> {
        let account = self.alloc.get(&address)?;
        let storage = account.storage.as_ref()?;
        let slot_key = B256::from(slot.to_be_bytes());
        storage.get(&slot_key).copied()
    }
}

impl StateReader for GenesisStateReader {
    fn code(&self, address: Address) -> Option<Bytes> {
        self.alloc.get(&address)?.code.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};

    #[test]
    fn test_genesis_reader_reads_alloc() {
        let addr = address!("0000000000000000000000000000000000000401");
        let mut storage = BTreeMap::new();
        storage.insert(B256::ZERO, B256::repeat_byte(0x11));
        let account = GenesisAccount {
            balance: U256::ZERO,
            nonce: Some(1),
            code: Some(bytes!("00")),
            storage: Some(storage),
            private_key: None,
        };
        let reader = GenesisStateReader::from_alloc(BTreeMap::from([(addr, account)]));

        assert_eq!(reader.read_storage(addr, U256::ZERO), Some(B256::repeat_byte(0x11)));
        assert_eq!(reader.read_storage(addr, U256::from(1)), None);
        assert_eq!(reader.code(addr), Some(bytes!("00")));
        assert!(!reader.has_code(Address::ZERO));
    }
}
