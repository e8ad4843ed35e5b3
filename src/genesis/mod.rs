//! Genesis allocation for chains that activate system contract forks at
//! block 0.
//!
//! Runs the installer against an in-memory state and renders what it wrote as
//! `alloy-genesis` accounts, so a chain started from the resulting genesis
//! file matches a chain that executed the forks itself.

use alloy_genesis::{Genesis, GenesisAccount};
use alloy_primitives::Address;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::SystemContractsConfig;
use crate::errors::InstallError;
use crate::installer::HardforkInstaller;
use crate::state::InMemoryState;

/// Accounts written by every fork active at genesis (timestamp 0).
///
/// Empty when no fork is scheduled at genesis.
pub fn registry_genesis_alloc(
    config: &SystemContractsConfig,
) -> Result<BTreeMap<Address, GenesisAccount>, InstallError> {
    let mut state = InMemoryState::new();
    HardforkInstaller::new(config.clone()).install_genesis(&mut state, 0)?;
    Ok(state.into_alloc())
}

/// Add the system contracts of every fork active at genesis to `genesis`.
///
/// Accounts already in the alloc keep their balance and nonce. Existing code
/// at a target address is checked exactly as during block execution.
pub fn with_system_contracts(
    mut genesis: Genesis,
    config: &SystemContractsConfig,
) -> Result<Genesis, InstallError> {
    let mut state = InMemoryState::from_alloc(&genesis.alloc);
    let report =
        HardforkInstaller::new(config.clone()).install_genesis(&mut state, genesis.timestamp)?;
    if report.is_empty() {
        return Ok(genesis);
    }

    for (address, account) in state.into_alloc() {
        genesis
            .alloc
            .entry(address)
            .and_modify(|existing| {
                existing.code = account.code.clone();
                existing.storage = account.storage.clone();
            })
            .or_insert(account);
    }
    debug!(
        target: "system_contracts::genesis",
        registry_installed = report.registry_installed,
        deployed = report.deployed.len(),
        registered = report.registered.len(),
        "Added system contracts to genesis"
    );
    Ok(genesis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SystemContract, REGISTRY_ADDR, REGISTRY_MOCK_CODE};
    use crate::config::Activation;
    use crate::registry::RegistryClient;
    use crate::state::{BlockContext, GenesisStateReader, StateReader};
    use alloy_primitives::{address, bytes, U256};

    const OWNER: Address = address!("000000000000000000000000000000006F5AFE00");
    const FUNDED: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn test_dev_alloc_contains_registry_and_kip113() {
        let alloc = registry_genesis_alloc(&SystemContractsConfig::dev(OWNER)).unwrap();

        assert_eq!(alloc[&REGISTRY_ADDR].code, Some(REGISTRY_MOCK_CODE));
        assert_eq!(alloc[&REGISTRY_ADDR].nonce, Some(1));
        // Registry, KIP113 proxy and KIP113 logic.
        assert_eq!(alloc.len(), 3);

        let reader = GenesisStateReader::from_alloc(alloc);
        let client = RegistryClient::new();
        let proxy = client
            .resolve(&reader, SystemContract::Kip113, &BlockContext::at_number(0))
            .unwrap()
            .unwrap();
        assert!(reader.code(proxy).is_some());
    }

    #[test]
    fn test_later_forks_are_not_in_genesis() {
        let config = SystemContractsConfig {
            registry_fork: Some(Activation::Block(10)),
            owner: OWNER,
            ..Default::default()
        };
        assert!(registry_genesis_alloc(&config).unwrap().is_empty());
    }

    #[test]
    fn test_existing_accounts_keep_balance() {
        let mut genesis = Genesis::default();
        let balance = U256::from(10u64).pow(U256::from(18u64));
        genesis.alloc.insert(
            FUNDED,
            GenesisAccount {
                balance,
                nonce: None,
                code: None,
                storage: None,
                private_key: None,
            },
        );

        let genesis = with_system_contracts(genesis, &SystemContractsConfig::dev(OWNER)).unwrap();
        assert_eq!(genesis.alloc[&FUNDED].balance, balance);
        assert!(genesis.alloc.contains_key(&REGISTRY_ADDR));
        assert_eq!(genesis.alloc.len(), 4);
    }

    #[test]
    fn test_foreign_code_in_genesis_is_rejected() {
        let dev = SystemContractsConfig::dev(OWNER);
        let alloc = registry_genesis_alloc(&dev).unwrap();
        let proxy = alloc
            .iter()
            .find(|(addr, account)| **addr != REGISTRY_ADDR && account.storage.is_some())
            .map(|(addr, _)| *addr)
            .unwrap();

        let mut genesis = Genesis::default();
        genesis.alloc.insert(
            proxy,
            GenesisAccount {
                balance: U256::ZERO,
                nonce: Some(1),
                code: Some(bytes!("6001")),
                storage: None,
                private_key: None,
            },
        );
        assert_eq!(
            with_system_contracts(genesis, &dev),
            Err(InstallError::CodeCollision { address: proxy })
        );
    }

    #[test]
    fn test_unscheduled_config_leaves_genesis_unchanged() {
        let genesis = Genesis::default();
        let out = with_system_contracts(genesis.clone(), &SystemContractsConfig::default()).unwrap();
        assert_eq!(out, genesis);
    }
}
