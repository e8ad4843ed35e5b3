//! Hard-Fork Installer
//!
//! Writes system contract code and Registry records as part of the state
//! transition of a fork activation block.
//!
//! ```text
//!   on_block(block)                   fork transitions at `block`?
//!     install_at(fork, activation)
//!       validate     registry blob, proxy/logic collisions, record order
//!       Registry     code + owner at REGISTRY_ADDR, if absent
//!       Kip113       logic + EIP-1967 proxy, record → proxy
//!       Registry     records from config
//! ```
//!
//! Every check runs before the first write, so a failed installation leaves
//! the state untouched. Any [`InstallError`] is fatal to the block.
//! Installing again with the same inputs writes nothing.

pub mod deploy;

pub use deploy::{implementation_address, proxy_address, DeployedContract};

use alloy_primitives::{Bytes, B256};
use reth_chainspec::Hardfork;
use tracing::{debug, info};

use crate::catalog::{NetworkMode, SystemContract, REGISTRY_ADDR};
use crate::config::{SystemContractsConfig, SystemContractsHardfork};
use crate::errors::InstallError;
use crate::registry::records::{append_record, check_append, write_owner, AppendOutcome};
use crate::registry::RegistryRecord;
use crate::state::{BlockContext, StateWriter};
use deploy::ProxyDeployment;

/// What an installation wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Registry code was written
    pub registry_installed: bool,
    /// Contracts deployed behind a fresh proxy
    pub deployed: Vec<DeployedContract>,
    /// Records appended to the Registry
    pub registered: Vec<(SystemContract, RegistryRecord)>,
}

impl InstallReport {
    /// Whether nothing was written.
    pub fn is_empty(&self) -> bool {
        !self.registry_installed && self.deployed.is_empty() && self.registered.is_empty()
    }

    fn extend(&mut self, other: Self) {
        self.registry_installed |= other.registry_installed;
        self.deployed.extend(other.deployed);
        self.registered.extend(other.registered);
    }
}

/// Applies the system contract hard forks of a chain.
#[derive(Debug, Clone)]
pub struct HardforkInstaller {
    config: SystemContractsConfig,
}

impl HardforkInstaller {
    /// Installer for the given schedule.
    pub const fn new(config: SystemContractsConfig) -> Self {
        Self { config }
    }

    /// The schedule being applied.
    pub const fn config(&self) -> &SystemContractsConfig {
        &self.config
    }

    /// Run every fork that activates exactly at `block`.
    ///
    /// Returns `None` when no fork transitions at `block`.
    pub fn on_block(
        &self,
        state: &mut impl StateWriter,
        block: &BlockContext,
        parent_timestamp: u64,
    ) -> Result<Option<InstallReport>, InstallError> {
        let mut report: Option<InstallReport> = None;
        for fork in SystemContractsHardfork::ALL {
            let Some(activation) = self.config.activation(fork) else {
                continue;
            };
            if !activation.transitions_at(block, parent_timestamp) {
                continue;
            }
            let installed = self.install_at(state, fork, block.number, self.config.mode)?;
            report.get_or_insert_with(InstallReport::default).extend(installed);
        }
        Ok(report)
    }

    /// Install every fork already active at the genesis block.
    pub fn install_genesis(
        &self,
        state: &mut impl StateWriter,
        timestamp: u64,
    ) -> Result<InstallReport, InstallError> {
        let genesis = BlockContext::new(0, timestamp, B256::ZERO);
        let mut report = InstallReport::default();
        for fork in SystemContractsHardfork::ALL {
            if self.config.activation(fork).is_some_and(|activation| activation.is_active(&genesis)) {
                report.extend(self.install_at(state, fork, 0, self.config.mode)?);
            }
        }
        Ok(report)
    }

    /// Install `fork` with records effective from block `activation`.
    pub fn install_at(
        &self,
        state: &mut impl StateWriter,
        fork: SystemContractsHardfork,
        activation: u64,
        mode: NetworkMode,
    ) -> Result<InstallReport, InstallError> {
        let registry_code = non_empty(self.config.registry_code(mode), "Registry")?;

        let (deployment, records) = match fork {
            SystemContractsHardfork::Registry => {
                let records = self
                    .config
                    .records
                    .iter()
                    .map(|(contract, addr)| (*contract, RegistryRecord::new(*addr, activation)))
                    .collect::<Vec<_>>();
                (None, records)
            }
            SystemContractsHardfork::Kip113 => {
                let deployment = self.deployment(SystemContract::Kip113, mode)?;
                let target = deployment.target();
                let records = vec![(target.contract, RegistryRecord::new(target.proxy, activation))];
                (Some(deployment), records)
            }
        };

        let deployment = match deployment {
            Some(deployment) if !deployment.is_deployed(&*state)? => Some(deployment),
            _ => None,
        };
        let mut pending = Vec::with_capacity(records.len());
        for (contract, record) in records {
            if check_append(&*state, contract, record)? == AppendOutcome::Appended {
                pending.push((contract, record));
            }
        }

        let mut report = InstallReport::default();
        if !state.has_code(REGISTRY_ADDR) {
            state.set_code(REGISTRY_ADDR, registry_code);
            if !self.config.owner.is_zero() {
                write_owner(state, self.config.owner);
            }
            report.registry_installed = true;
            info!(
                target: "system_contracts::installer",
                fork = fork.name(),
                registry = %REGISTRY_ADDR,
                owner = %self.config.owner,
                ?mode,
                "Installed Registry"
            );
        }

        if let Some(deployment) = deployment {
            deployment.apply(state, self.config.owner);
            let target = deployment.target();
            info!(
                target: "system_contracts::installer",
                fork = fork.name(),
                contract = %target.contract,
                proxy = %target.proxy,
                implementation = %target.implementation,
                ?mode,
                "Deployed system contract behind proxy"
            );
            report.deployed.push(target);
        }

        for (contract, record) in pending {
            append_record(state, contract, record)?;
            info!(
                target: "system_contracts::installer",
                fork = fork.name(),
                %contract,
                addr = %record.addr,
                activation = record.activation,
                "Registered system contract"
            );
            report.registered.push((contract, record));
        }

        if report.is_empty() {
            debug!(
                target: "system_contracts::installer",
                fork = fork.name(),
                activation,
                "Fork already installed"
            );
        }
        Ok(report)
    }

    fn deployment(
        &self,
        contract: SystemContract,
        mode: NetworkMode,
    ) -> Result<ProxyDeployment, InstallError> {
        let logic = self
            .config
            .contract_code(contract, mode)
            .ok_or(InstallError::NotDeployable { contract: contract.name() })?;
        let logic = non_empty(logic, contract.name())?;
        let proxy = non_empty(self.config.proxy_code(mode), "ERC1967Proxy")?;
        Ok(ProxyDeployment::new(contract, proxy, logic))
    }
}

fn non_empty(code: Bytes, contract: &'static str) -> Result<Bytes, InstallError> {
    if code.is_empty() {
        return Err(InstallError::EmptyCode { contract });
    }
    Ok(code)
}
