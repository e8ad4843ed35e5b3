//! System Contract Catalog
//!
//! Static lookup tables for the canonical system contracts: the closed set of
//! names registered in the Registry, the addresses assigned by protocol
//! convention, and the runtime bytecode injected at hard forks.
//!
//! Nothing here is mutable. Every table is a `const` so that every node
//! resolves exactly the same values.

pub mod bytecodes;

pub use bytecodes::{
    ERC1967_PROXY_CODE, KIP113_CODE, KIP113_MOCK_CODE, REGISTRY_CODE, REGISTRY_MOCK_CODE,
};

use alloy_primitives::{address, b256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical name of the legacy AddressBook contract.
pub const ADDRESS_BOOK_NAME: &str = "AddressBook";
/// Canonical name of the governance parameter store.
pub const GOV_PARAM_NAME: &str = "GovParam";
/// Canonical name of the KIP-103 treasury rebalance contract.
pub const KIP103_NAME: &str = "TreasuryRebalance";
/// Canonical name of the KIP-113 validator BLS key registry.
pub const KIP113_NAME: &str = "KIP113";

/// Every canonical name, in registration order.
pub const ALL_CONTRACT_NAMES: [&str; 4] =
    [ADDRESS_BOOK_NAME, GOV_PARAM_NAME, KIP103_NAME, KIP113_NAME];

/// AddressBook address. Allocated in genesis, predates the Registry.
pub const ADDRESS_BOOK_ADDR: Address = address!("0000000000000000000000000000000000000400");

/// Registry address. Code is injected here when the Registry hard fork activates.
pub const REGISTRY_ADDR: Address = address!("0000000000000000000000000000000000000401");

/// EIP-1967 implementation slot: `keccak256("eip1967.proxy.implementation") - 1`.
pub const IMPLEMENTATION_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// EIP-1967 admin slot: `keccak256("eip1967.proxy.admin") - 1`.
pub const ADMIN_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// A system contract known by canonical name.
///
/// The set is closed: a name that does not parse into this enum is not a
/// system contract, and there is no way to ask the catalog about one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SystemContract {
    /// Legacy validator/staking directory, present since genesis.
    #[serde(rename = "AddressBook")]
    AddressBook,
    /// Governance parameter store.
    #[serde(rename = "GovParam")]
    GovParam,
    /// KIP-103 treasury rebalance.
    #[serde(rename = "TreasuryRebalance")]
    Kip103,
    /// KIP-113 validator BLS public key registry.
    #[serde(rename = "KIP113")]
    Kip113,
}

impl SystemContract {
    /// All system contracts, in the same order as [`ALL_CONTRACT_NAMES`].
    pub const ALL: [SystemContract; 4] =
        [Self::AddressBook, Self::GovParam, Self::Kip103, Self::Kip113];

    /// Canonical name used as the Registry key.
    pub const fn name(self) -> &'static str {
        match self {
            Self::AddressBook => ADDRESS_BOOK_NAME,
            Self::GovParam => GOV_PARAM_NAME,
            Self::Kip103 => KIP103_NAME,
            Self::Kip113 => KIP113_NAME,
        }
    }

    /// Parse a canonical name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Address assigned by protocol convention, if the contract has one.
    pub const fn well_known_address(self) -> Option<Address> {
        match self {
            Self::AddressBook => Some(ADDRESS_BOOK_ADDR),
            Self::GovParam | Self::Kip103 | Self::Kip113 => None,
        }
    }

    /// Whether the contract predates the Registry and stays resolvable
    /// through its well-known address when the Registry has no record of it.
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::AddressBook)
    }

    /// Logic bytecode the hard-fork installer deploys behind a proxy, if the
    /// contract is installer-managed.
    pub fn code(self, mode: NetworkMode) -> Option<Bytes> {
        match (self, mode) {
            (Self::Kip113, NetworkMode::Production) => Some(KIP113_CODE),
            (Self::Kip113, NetworkMode::Mock) => Some(KIP113_MOCK_CODE),
            _ => None,
        }
    }
}

impl fmt::Display for SystemContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selects production or mock bytecode for injection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Live networks.
    #[default]
    Production,
    /// Test networks; mocks accept unauthenticated storage writes.
    Mock,
}

/// Registry runtime for the given mode.
pub fn registry_code(mode: NetworkMode) -> Bytes {
    match mode {
        NetworkMode::Production => REGISTRY_CODE,
        NetworkMode::Mock => REGISTRY_MOCK_CODE,
    }
}
