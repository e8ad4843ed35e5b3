//! Hard-fork schedule for system contracts.
//!
//! Deserialized from the chain config JSON next to the rest of the chain's
//! fork schedule, e.g.
//!
//! ```json
//! {
//!   "mode": "production",
//!   "registryFork": { "block": 150000 },
//!   "kip113Fork": { "block": 150000 },
//!   "owner": "0x000000000000000000000000000000006f5afe00",
//!   "records": { "GovParam": "0x00000000000000000000000000000000000b0b0b" },
//!   "codeOverrides": { "registry": "0x6080...", "kip113": "0x6080..." }
//! }
//! ```
//!
//! Production forks need the compiled runtimes in `codeOverrides`: the bundled
//! production blobs are storage views without the contracts' write paths.

use alloy_primitives::{Address, Bytes};
use eyre::{ensure, Context, Result};
use reth_chainspec::{ForkCondition, Hardfork};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{self, NetworkMode, SystemContract, ERC1967_PROXY_CODE};
use crate::state::BlockContext;

/// Hard forks that install system contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemContractsHardfork {
    /// Injects the Registry and registers pre-existing contracts.
    Registry,
    /// Deploys KIP-113 behind an EIP-1967 proxy and registers it.
    Kip113,
}

impl SystemContractsHardfork {
    /// Every fork, in installation order.
    pub const ALL: [Self; 2] = [Self::Registry, Self::Kip113];
}

impl Hardfork for SystemContractsHardfork {
    fn name(&self) -> &'static str {
        match self {
            Self::Registry => "Registry",
            Self::Kip113 => "Kip113",
        }
    }
}

/// When a hard fork activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activation {
    /// At a block number
    Block(u64),
    /// At the first block whose timestamp reaches this value
    Timestamp(u64),
}

impl Activation {
    /// The equivalent reth fork condition.
    pub const fn fork_condition(self) -> ForkCondition {
        match self {
            Self::Block(number) => ForkCondition::Block(number),
            Self::Timestamp(timestamp) => ForkCondition::Timestamp(timestamp),
        }
    }

    /// Whether the fork is active at `block`.
    pub fn is_active(self, block: &BlockContext) -> bool {
        let condition = self.fork_condition();
        condition.active_at_block(block.number) || condition.active_at_timestamp(block.timestamp)
    }

    /// Whether `block` is the first block with the fork active.
    pub fn transitions_at(self, block: &BlockContext, parent_timestamp: u64) -> bool {
        let condition = self.fork_condition();
        condition.transitions_at_block(block.number)
            || condition.transitions_at_timestamp(block.timestamp, parent_timestamp)
    }
}

/// Operator-supplied production bytecode replacing the bundled runtimes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeOverrides {
    /// Registry runtime.
    ///
    /// Must keep the storage layout read by the node (`owner` at slot 0,
    /// `mapping(string => Record[]) records` at slot 1, `string[] names` at
    /// slot 2, `Record { address addr; uint256 activation; }`): resolution
    /// reads these slots directly instead of calling the contract.
    pub registry: Option<Bytes>,
    /// KIP-113 logic runtime
    pub kip113: Option<Bytes>,
    /// EIP-1967 proxy runtime
    pub proxy: Option<Bytes>,
}

/// System contract configuration that extends the standard chain config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemContractsConfig {
    /// Production or mock bytecode
    pub mode: NetworkMode,
    /// Registry installation fork, `None` = never
    pub registry_fork: Option<Activation>,
    /// KIP-113 deployment fork, `None` = never
    pub kip113_fork: Option<Activation>,
    /// Registry owner and proxy admin
    pub owner: Address,
    /// Contracts deployed before the Registry, registered when it is installed
    pub records: BTreeMap<SystemContract, Address>,
    /// Production bytecode overrides (ignored in mock mode)
    pub code_overrides: CodeOverrides,
}

impl SystemContractsConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).wrap_err("invalid system contracts config")?;
        config.validate()?;
        Ok(config)
    }

    /// Test-network config: mock code, both forks at genesis.
    pub fn dev(owner: Address) -> Self {
        Self {
            mode: NetworkMode::Mock,
            registry_fork: Some(Activation::Block(0)),
            kip113_fork: Some(Activation::Block(0)),
            owner,
            ..Default::default()
        }
    }

    /// Reject configs the installer cannot apply.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !(self.kip113_fork.is_some() && self.records.contains_key(&SystemContract::Kip113)),
            "KIP113 cannot be both deployed by the installer and listed in records"
        );
        for (contract, addr) in &self.records {
            ensure!(!addr.is_zero(), "zero address registered for {contract}");
        }
        for (contract, code) in [
            ("Registry", &self.code_overrides.registry),
            ("KIP113", &self.code_overrides.kip113),
            ("proxy", &self.code_overrides.proxy),
        ] {
            ensure!(
                code.as_ref().is_none_or(|code| !code.is_empty()),
                "empty code override for {contract}"
            );
        }
        if self.mode == NetworkMode::Production {
            let installs_registry = self.registry_fork.is_some() || self.kip113_fork.is_some();
            ensure!(
                !installs_registry || self.code_overrides.registry.is_some(),
                "production Registry fork requires codeOverrides.registry"
            );
            ensure!(
                self.kip113_fork.is_none() || self.code_overrides.kip113.is_some(),
                "production KIP113 fork requires codeOverrides.kip113"
            );
        }
        Ok(())
    }

    /// Activation of `fork`, if scheduled.
    pub const fn activation(&self, fork: SystemContractsHardfork) -> Option<Activation> {
        match fork {
            SystemContractsHardfork::Registry => self.registry_fork,
            SystemContractsHardfork::Kip113 => self.kip113_fork,
        }
    }

    /// Scheduled forks as reth fork conditions, for the chain's hardfork list.
    pub fn hardforks(&self) -> Vec<(SystemContractsHardfork, ForkCondition)> {
        SystemContractsHardfork::ALL
            .into_iter()
            .filter_map(|fork| Some((fork, self.activation(fork)?.fork_condition())))
            .collect()
    }

    /// Registry runtime for `mode`.
    pub fn registry_code(&self, mode: NetworkMode) -> Bytes {
        match (mode, &self.code_overrides.registry) {
            (NetworkMode::Production, Some(code)) => code.clone(),
            _ => catalog::registry_code(mode),
        }
    }

    /// Logic runtime of an installer-managed contract for `mode`.
    pub fn contract_code(&self, contract: SystemContract, mode: NetworkMode) -> Option<Bytes> {
        match (contract, mode, &self.code_overrides.kip113) {
            (SystemContract::Kip113, NetworkMode::Production, Some(code)) => Some(code.clone()),
            _ => contract.code(mode),
        }
    }

    /// Proxy runtime for `mode`.
    pub fn proxy_code(&self, mode: NetworkMode) -> Bytes {
        match (mode, &self.code_overrides.proxy) {
            (NetworkMode::Production, Some(code)) => code.clone(),
            _ => ERC1967_PROXY_CODE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{KIP113_CODE, KIP113_MOCK_CODE, REGISTRY_CODE, REGISTRY_MOCK_CODE};
    use alloy_primitives::{address, bytes, B256};

    const OWNER: Address = address!("000000000000000000000000000000006F5AFE00");

    #[test]
    fn test_parse_camel_case_config() {
        let json = r#"{
            "mode": "mock",
            "registryFork": { "block": 100 },
            "kip113Fork": { "timestamp": 1700000000 },
            "owner": "0x000000000000000000000000000000006f5afe00",
            "records": { "GovParam": "0x00000000000000000000000000000000000b0b0b" }
        }"#;
        let config = SystemContractsConfig::from_json(json).unwrap();
        assert_eq!(config.mode, NetworkMode::Mock);
        assert_eq!(config.registry_fork, Some(Activation::Block(100)));
        assert_eq!(config.kip113_fork, Some(Activation::Timestamp(1_700_000_000)));
        assert_eq!(config.owner, OWNER);
        assert_eq!(
            config.records[&SystemContract::GovParam],
            address!("00000000000000000000000000000000000b0b0b")
        );
    }

    #[test]
    fn test_empty_config_schedules_nothing() {
        let config = SystemContractsConfig::from_json("{}").unwrap();
        assert_eq!(config, SystemContractsConfig::default());
        assert!(config.hardforks().is_empty());
    }

    #[test]
    fn test_unknown_record_name_is_rejected() {
        let json = r#"{ "records": { "Registry": "0x0000000000000000000000000000000000000401" } }"#;
        assert!(SystemContractsConfig::from_json(json).is_err());
    }

    #[test]
    fn test_kip113_cannot_be_deployed_and_recorded() {
        let mut config = SystemContractsConfig::dev(OWNER);
        config.records.insert(SystemContract::Kip113, OWNER);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_override_is_rejected() {
        let mut config = SystemContractsConfig::default();
        config.code_overrides.registry = Some(Bytes::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_forks_require_overrides() {
        let json = r#"{ "mode": "production", "kip113Fork": { "block": 10 } }"#;
        assert!(SystemContractsConfig::from_json(json).is_err());

        let json = r#"{
            "mode": "production",
            "kip113Fork": { "block": 10 },
            "codeOverrides": { "registry": "0xfe01" }
        }"#;
        assert!(SystemContractsConfig::from_json(json).is_err());

        let json = r#"{
            "mode": "production",
            "registryFork": { "block": 10 },
            "kip113Fork": { "block": 10 },
            "codeOverrides": { "registry": "0xfe01", "kip113": "0xfe02" }
        }"#;
        let config = SystemContractsConfig::from_json(json).unwrap();
        assert_eq!(
            config.contract_code(SystemContract::Kip113, config.mode),
            Some(bytes!("fe02"))
        );

        let json = r#"{ "registryFork": { "block": 10 } }"#;
        assert!(SystemContractsConfig::from_json(json).is_err());
    }

    #[test]
    fn test_mock_forks_use_bundled_code() {
        assert!(SystemContractsConfig::dev(OWNER).validate().is_ok());
    }

    #[test]
    fn test_block_activation() {
        let fork = Activation::Block(100);
        assert!(!fork.is_active(&BlockContext::at_number(99)));
        assert!(fork.is_active(&BlockContext::at_number(100)));
        assert!(fork.transitions_at(&BlockContext::at_number(100), 0));
        assert!(!fork.transitions_at(&BlockContext::at_number(101), 0));
    }

    #[test]
    fn test_timestamp_activation() {
        let fork = Activation::Timestamp(1_000);
        let first = BlockContext::new(7, 1_002, B256::ZERO);
        let next = BlockContext::new(8, 1_004, B256::ZERO);
        assert!(fork.is_active(&first));
        assert!(fork.transitions_at(&first, 998));
        assert!(!fork.transitions_at(&next, 1_002));
        assert!(!fork.is_active(&BlockContext::new(6, 998, B256::ZERO)));
    }

    #[test]
    fn test_hardforks_lists_scheduled_forks() {
        let mut config = SystemContractsConfig::default();
        config.registry_fork = Some(Activation::Block(5));
        let forks = config.hardforks();
        assert_eq!(forks.len(), 1);
        assert_eq!(forks[0].0.name(), "Registry");
        assert_eq!(forks[0].1, ForkCondition::Block(5));
    }

    #[test]
    fn test_overrides_apply_only_in_production() {
        let mut config = SystemContractsConfig::default();
        config.code_overrides.registry = Some(bytes!("fe01"));
        config.code_overrides.kip113 = Some(bytes!("fe02"));
        config.code_overrides.proxy = Some(bytes!("fe03"));

        assert_eq!(config.registry_code(NetworkMode::Production), bytes!("fe01"));
        assert_eq!(config.registry_code(NetworkMode::Mock), REGISTRY_MOCK_CODE);
        assert_eq!(
            config.contract_code(SystemContract::Kip113, NetworkMode::Production),
            Some(bytes!("fe02"))
        );
        assert_eq!(
            config.contract_code(SystemContract::Kip113, NetworkMode::Mock),
            Some(KIP113_MOCK_CODE)
        );
        assert_eq!(config.proxy_code(NetworkMode::Production), bytes!("fe03"));
        assert_eq!(config.proxy_code(NetworkMode::Mock), ERC1967_PROXY_CODE);
    }

    #[test]
    fn test_bundled_code_without_overrides() {
        let config = SystemContractsConfig::default();
        assert_eq!(config.registry_code(NetworkMode::Production), REGISTRY_CODE);
        assert_eq!(
            config.contract_code(SystemContract::Kip113, NetworkMode::Production),
            Some(KIP113_CODE)
        );
        assert_eq!(config.contract_code(SystemContract::GovParam, NetworkMode::Production), None);
    }
}
