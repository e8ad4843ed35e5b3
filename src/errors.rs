use alloy_primitives::{Address, Bytes};
use reth_consensus::ConsensusError;
use thiserror::Error;

/// Failure reported by a [`ContractCaller`](crate::state::ContractCaller).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The callee reverted with the given output
    #[error("execution reverted: {0}")]
    Reverted(Bytes),

    /// The call could not be executed (out of gas, missing state, ...)
    #[error("call failed: {0}")]
    Failed(String),
}

/// Registry storage that does not follow the Registry layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("corrupt Registry storage: {0}")]
pub struct CorruptRegistry(pub String);

/// Errors returned by system contract queries.
///
/// All variants are deterministic functions of chain state and are never
/// retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemContractError {
    /// No code at the Registry address for the queried block
    #[error("Registry contract not installed")]
    RegistryNotInstalled,

    /// `getAllBls()` returned data that does not decode or is structurally invalid
    #[error("KIP113 call returned bad data: {reason}")]
    Kip113BadResult {
        /// What was wrong with the returned data
        reason: String,
    },

    /// A BLS public key failed proof-of-possession verification
    #[error("KIP113 PoP verification failed for validator {validator}")]
    Kip113BadPop {
        /// Node id of the offending entry
        validator: Address,
    },

    /// The contract call itself failed
    #[error(transparent)]
    Call(#[from] CallError),

    /// Registry storage cannot be decoded
    #[error(transparent)]
    RegistryCorrupt(#[from] CorruptRegistry),
}

impl SystemContractError {
    pub(crate) fn bad_result(reason: impl Into<String>) -> Self {
        Self::Kip113BadResult { reason: reason.into() }
    }
}

/// Hard-fork installation failures.
///
/// Every variant is fatal: the block that triggered the installation must be
/// rejected rather than committed with partial state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    /// The configured bytecode for a contract is empty
    #[error("empty bytecode for {contract}")]
    EmptyCode {
        /// Contract whose blob is empty
        contract: &'static str,
    },

    /// The contract has no bytecode in the selected network mode
    #[error("{contract} is not an installer-managed contract")]
    NotDeployable {
        /// Contract the installer was asked to deploy
        contract: &'static str,
    },

    /// A target address already holds different code
    #[error("address {address} already holds different code")]
    CodeCollision {
        /// Address that was about to be overwritten
        address: Address,
    },

    /// A record would break the increasing-activation order of a name
    #[error("conflicting registry record for {name}: latest activation {latest}, requested {requested}")]
    ConflictingRecord {
        /// Canonical name
        name: &'static str,
        /// Activation of the latest existing record
        latest: u64,
        /// Activation of the record being appended
        requested: u64,
    },

    /// Existing Registry storage cannot be decoded
    #[error(transparent)]
    RegistryCorrupt(#[from] CorruptRegistry),
}

impl From<InstallError> for ConsensusError {
    fn from(err: InstallError) -> Self {
        ConsensusError::Custom(std::sync::Arc::new(err))
    }
}
