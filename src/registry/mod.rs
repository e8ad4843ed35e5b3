//! Registry Client
//!
//! Resolves canonical system contract names to addresses for a given block.
//!
//! ```text
//!   resolve(name, block)
//!     Registry code absent?  → AddressBook: well-known address
//!                              others:      RegistryNotInstalled
//!     records[name]          → greatest activation ≤ block.number
//!                              (binary search over storage, bounded length)
//!     no record              → AddressBook: well-known address
//!                              others:      None
//! ```
//!
//! Results depend only on the state handle and the block. The client holds no
//! cache; see [`crate::cache`] for the block-hash keyed wrapper.

pub mod records;

pub use records::{
    active_record, find_active_record, read_names, read_owner, read_records, records_len,
    RegistryRecord, MAX_REGISTRY_ENTRIES,
};

use alloy_primitives::Address;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::catalog::{SystemContract, REGISTRY_ADDR};
use crate::config::{Activation, SystemContractsConfig};
use crate::errors::SystemContractError;
use crate::proxy;
use crate::state::{BlockContext, StateReader};

/// Resolves system contract addresses through the on-chain Registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryClient {
    /// Registry fork, used only to decide how loudly to report a missing Registry
    registry_fork: Option<Activation>,
}

impl RegistryClient {
    /// Client without knowledge of the fork schedule.
    pub const fn new() -> Self {
        Self { registry_fork: None }
    }

    /// Client aware of the Registry fork activation.
    pub const fn with_fork(registry_fork: Activation) -> Self {
        Self { registry_fork: Some(registry_fork) }
    }

    /// Client for the configured fork schedule.
    pub const fn from_config(config: &SystemContractsConfig) -> Self {
        Self { registry_fork: config.registry_fork }
    }

    /// Whether the Registry has code in `state`.
    pub fn is_installed(&self, state: &impl StateReader) -> bool {
        state.has_code(REGISTRY_ADDR)
    }

    /// Address of `contract` effective at `block`.
    ///
    /// Returns the proxy address for proxied contracts: on-chain interactions
    /// go through the stable proxy, not the logic contract behind it.
    pub fn resolve(
        &self,
        state: &impl StateReader,
        contract: SystemContract,
        block: &BlockContext,
    ) -> Result<Option<Address>, SystemContractError> {
        if !self.is_installed(state) {
            if contract.is_legacy() {
                return Ok(contract.well_known_address());
            }
            self.report_not_installed(contract, block);
            return Err(SystemContractError::RegistryNotInstalled);
        }

        let record = match find_active_record(state, contract, block.number) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    target: "system_contracts::registry",
                    %contract,
                    block = block.number,
                    %err,
                    "Unreadable registry records"
                );
                return Err(err.into());
            }
        };
        let resolved = record.map(|record| record.addr);
        debug!(
            target: "system_contracts::registry",
            %contract,
            block = block.number,
            ?resolved,
            "Resolved system contract"
        );

        match resolved {
            None if contract.is_legacy() => Ok(contract.well_known_address()),
            resolved => Ok(resolved),
        }
    }

    /// Like [`Self::resolve`], but follows an EIP-1967 proxy to its logic contract.
    pub fn resolve_implementation(
        &self,
        state: &impl StateReader,
        contract: SystemContract,
        block: &BlockContext,
    ) -> Result<Option<Address>, SystemContractError> {
        Ok(self.resolve(state, contract, block)?.map(|addr| proxy::follow(state, addr)))
    }

    /// Every record of `contract`, in activation order.
    pub fn records(
        &self,
        state: &impl StateReader,
        contract: SystemContract,
    ) -> Result<Vec<RegistryRecord>, SystemContractError> {
        if !self.is_installed(state) {
            return Err(SystemContractError::RegistryNotInstalled);
        }
        Ok(read_records(state, contract)?)
    }

    /// Registered canonical names. Names outside the catalog are skipped.
    pub fn names(&self, state: &impl StateReader) -> Result<Vec<SystemContract>, SystemContractError> {
        if !self.is_installed(state) {
            return Err(SystemContractError::RegistryNotInstalled);
        }
        Ok(read_names(state)?
            .into_iter()
            .filter_map(|name| {
                let contract = SystemContract::from_name(&name);
                if contract.is_none() {
                    debug!(target: "system_contracts::registry", %name, "Skipping unknown registry name");
                }
                contract
            })
            .collect())
    }

    /// Resolve every registered name that is active at `block`.
    pub fn resolve_all(
        &self,
        state: &impl StateReader,
        block: &BlockContext,
    ) -> Result<BTreeMap<SystemContract, Address>, SystemContractError> {
        let mut resolved = BTreeMap::new();
        for contract in self.names(state)? {
            if let Some(addr) = self.resolve(state, contract, block)? {
                resolved.insert(contract, addr);
            }
        }
        Ok(resolved)
    }

    fn report_not_installed(&self, contract: SystemContract, block: &BlockContext) {
        match self.registry_fork {
            Some(fork) if fork.is_active(block) => warn!(
                target: "system_contracts::registry",
                %contract,
                block = block.number,
                "Registry missing after its activation"
            ),
            _ => debug!(
                target: "system_contracts::registry",
                %contract,
                block = block.number,
                "Registry not installed yet"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ADDRESS_BOOK_ADDR, ERC1967_PROXY_CODE, REGISTRY_CODE};
    use crate::onchain::{
        eip1967_slots, encode_address, encode_u64, mapping_string_slot, registry_slots,
    };
    use crate::registry::records::{append_record, write_owner};
    use crate::state::{InMemoryState, StateWriter};
    use alloy_primitives::{address, B256};

    const A: Address = address!("00000000000000000000000000000000000000aa");
    const B: Address = address!("00000000000000000000000000000000000000bb");
    const OWNER: Address = address!("000000000000000000000000000000006F5AFE00");

    fn installed_registry() -> InMemoryState {
        let mut state = InMemoryState::new();
        state.set_code(REGISTRY_ADDR, REGISTRY_CODE);
        write_owner(&mut state, OWNER);
        state
    }

    fn register(state: &mut InMemoryState, contract: SystemContract, addr: Address, activation: u64) {
        append_record(state, contract, RegistryRecord::new(addr, activation)).unwrap();
    }

    fn at(number: u64) -> BlockContext {
        BlockContext::at_number(number)
    }

    #[test]
    fn test_fallback_before_installation() {
        let state = InMemoryState::new();
        let client = RegistryClient::new();

        assert_eq!(
            client.resolve(&state, SystemContract::AddressBook, &at(1)),
            Ok(Some(ADDRESS_BOOK_ADDR))
        );
        for contract in [SystemContract::GovParam, SystemContract::Kip103, SystemContract::Kip113] {
            assert_eq!(
                client.resolve(&state, contract, &at(1)),
                Err(SystemContractError::RegistryNotInstalled)
            );
        }
    }

    #[test]
    fn test_monotonic_activation() {
        let mut state = installed_registry();
        register(&mut state, SystemContract::GovParam, A, 100);
        register(&mut state, SystemContract::GovParam, B, 200);
        let client = RegistryClient::new();

        assert_eq!(client.resolve(&state, SystemContract::GovParam, &at(99)), Ok(None));
        assert_eq!(client.resolve(&state, SystemContract::GovParam, &at(150)), Ok(Some(A)));
        assert_eq!(client.resolve(&state, SystemContract::GovParam, &at(250)), Ok(Some(B)));
    }

    #[test]
    fn test_unregistered_name_is_not_found() {
        let state = installed_registry();
        let client = RegistryClient::new();
        assert_eq!(client.resolve(&state, SystemContract::Kip113, &at(10)), Ok(None));
    }

    #[test]
    fn test_address_book_after_installation() {
        let mut state = installed_registry();
        let client = RegistryClient::new();
        assert_eq!(
            client.resolve(&state, SystemContract::AddressBook, &at(10)),
            Ok(Some(ADDRESS_BOOK_ADDR))
        );

        register(&mut state, SystemContract::AddressBook, A, 20);
        assert_eq!(
            client.resolve(&state, SystemContract::AddressBook, &at(10)),
            Ok(Some(ADDRESS_BOOK_ADDR))
        );
        assert_eq!(client.resolve(&state, SystemContract::AddressBook, &at(20)), Ok(Some(A)));
    }

    #[test]
    fn test_deterministic_across_state_instances() {
        let mut first = installed_registry();
        register(&mut first, SystemContract::Kip103, A, 5);
        let second = first.clone();
        let client = RegistryClient::new();

        for number in [0, 4, 5, 6, 1_000_000] {
            let block = at(number);
            let a = client.resolve(&first, SystemContract::Kip103, &block);
            assert_eq!(a, client.resolve(&first, SystemContract::Kip103, &block));
            assert_eq!(a, client.resolve(&second, SystemContract::Kip103, &block));
        }
    }

    #[test]
    fn test_proxy_transparency() {
        let mut state = installed_registry();
        let proxy = address!("0000000000000000000000000000000000001967");
        state.set_code(proxy, ERC1967_PROXY_CODE);
        state.set_storage(proxy, eip1967_slots::IMPLEMENTATION, encode_address(A));
        register(&mut state, SystemContract::Kip113, proxy, 1);
        let client = RegistryClient::new();

        assert_eq!(client.resolve(&state, SystemContract::Kip113, &at(2)), Ok(Some(proxy)));
        assert_eq!(
            client.resolve_implementation(&state, SystemContract::Kip113, &at(2)),
            Ok(Some(A))
        );

        state.set_storage(proxy, eip1967_slots::IMPLEMENTATION, encode_address(B));
        assert_eq!(client.resolve(&state, SystemContract::Kip113, &at(2)), Ok(Some(proxy)));
        assert_eq!(
            client.resolve_implementation(&state, SystemContract::Kip113, &at(2)),
            Ok(Some(B))
        );
    }

    #[test]
    fn test_resolve_implementation_without_proxy() {
        let mut state = installed_registry();
        register(&mut state, SystemContract::GovParam, A, 1);
        let client = RegistryClient::new();
        assert_eq!(
            client.resolve_implementation(&state, SystemContract::GovParam, &at(1)),
            Ok(Some(A))
        );
    }

    #[test]
    fn test_resolve_all_and_names() {
        let mut state = installed_registry();
        register(&mut state, SystemContract::GovParam, A, 10);
        register(&mut state, SystemContract::Kip103, B, 50);
        let client = RegistryClient::new();

        assert_eq!(
            client.names(&state),
            Ok(vec![SystemContract::GovParam, SystemContract::Kip103])
        );
        let resolved = client.resolve_all(&state, &at(20)).unwrap();
        assert_eq!(resolved, BTreeMap::from([(SystemContract::GovParam, A)]));
        let resolved = client.resolve_all(&state, &at(50)).unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_listing_requires_installation() {
        let state = InMemoryState::new();
        let client = RegistryClient::with_fork(Activation::Block(0));
        assert_eq!(
            client.records(&state, SystemContract::GovParam),
            Err(SystemContractError::RegistryNotInstalled)
        );
        assert_eq!(client.names(&state), Err(SystemContractError::RegistryNotInstalled));
        assert_eq!(
            client.resolve_all(&state, &BlockContext::new(1, 1, B256::ZERO)),
            Err(SystemContractError::RegistryNotInstalled)
        );
    }

    #[test]
    fn test_oversized_record_list_is_corrupt_not_zero_address() {
        let mut state = installed_registry();
        let length_slot = mapping_string_slot("GovParam", registry_slots::RECORDS);
        state.set_storage(REGISTRY_ADDR, length_slot, encode_u64(2_000_000));
        let client = RegistryClient::new();

        assert!(matches!(
            client.resolve(&state, SystemContract::GovParam, &at(1)),
            Err(SystemContractError::RegistryCorrupt(_))
        ));
        assert!(matches!(
            client.records(&state, SystemContract::GovParam),
            Err(SystemContractError::RegistryCorrupt(_))
        ));
    }
}
