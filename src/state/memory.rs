use alloy_genesis::GenesisAccount;
use alloy_primitives::{Address, Bytes, B256, U256};
use std::collections::BTreeMap;

use super::{StateReader, StateWriter, StorageReader};

/// Code and storage held in ordered maps.
///
/// Used to render installer output as a genesis alloc, and as the state
/// backend in unit tests. Ordered maps keep iteration (and therefore the
/// rendered alloc) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryState {
    code: BTreeMap<Address, Bytes>,
    storage: BTreeMap<(Address, U256), B256>,
}

impl InMemoryState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Code and storage of a genesis alloc. Balances and nonces are dropped.
    pub fn from_alloc(alloc: &BTreeMap<Address, GenesisAccount>) -> Self {
        let mut state = Self::new();
        for (address, account) in alloc {
            if let Some(code) = &account.code {
                state.set_code(*address, code.clone());
            }
            for (slot, value) in account.storage.iter().flatten() {
                state.set_storage(*address, U256::from_be_bytes(slot.0), *value);
            }
        }
        state
    }

    /// All accounts that hold code or storage.
    pub fn accounts(&self) -> impl Iterator<Item = Address> + '_ {
        let mut accounts: Vec<Address> = self
            .code
            .keys()
            .copied()
            .chain(self.storage.keys().map(|(address, _)| *address))
            .collect();
        accounts.sort_unstable();
        accounts.dedup();
        accounts.into_iter()
    }

    /// Non-zero storage slots of `address`.
    pub fn storage_of(&self, address: Address) -> BTreeMap<B256, B256> {
        self.storage
            .range((address, U256::ZERO)..=(address, U256::MAX))
            .map(|((_, slot), value)| (B256::from(slot.to_be_bytes()), *value))
            .collect()
    }

    /// Render the state as genesis accounts (nonce 1, zero balance).
    pub fn into_alloc(self) -> BTreeMap<Address, GenesisAccount> {
        self.accounts()
            .map(|address| {
                let storage = self.storage_of(address);
                let account = GenesisAccount {
                    balance: U256::ZERO,
                    nonce: Some(1),
                    code: self.code.get(&address).cloned(),
                    storage: (!storage.is_empty()).then_some(storage),
                    private_key: None,
                };
                (address, account)
            })
            .collect()
    }
}

impl StorageReader for InMemoryState {
    fn read_storage(&self, address: Address, slot: U256) -> Option<B256> {
        self.storage.get(&(address, slot)).copied()
    }
}

impl StateReader for InMemoryState {
    fn code(&self, address: Address) -> Option<Bytes> {
        self.code.get(&address).cloned()
    }
}

impl StateWriter for InMemoryState {
    fn set_code(&mut self, address: Address, code: Bytes) {
        if code.is_empty() {
            self.code.remove(&address);
        } else {
            self.code.insert(address, code);
        }
    }

    fn set_storage(&mut self, address: Address, slot: U256, value: B256) {
        if value.is_zero() {
            self.storage.remove(&(address, slot));
        } else {
            self.storage.insert((address, slot), value);
        }
    }
}
