//! # System Contracts
//!
//! Resolution and installation of protocol-level system contracts on a
//! reth-based chain.
//!
//! - [`registry`]: resolves canonical names (`AddressBook`, `GovParam`,
//!   `TreasuryRebalance`, `KIP113`) to the address effective at a block,
//!   through the on-chain Registry at [`catalog::REGISTRY_ADDR`].
//! - [`proxy`]: reads EIP-1967 implementation and admin slots.
//! - [`installer`]: writes the Registry and proxied contracts into state when
//!   their hard fork activates.
//! - [`kip113`]: fetches validator BLS public keys and verifies every
//!   proof-of-possession before accepting the set.
//!
//! Every query is a pure function of the state of one block.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod genesis;
pub mod installer;
pub mod kip113;
pub mod onchain;
pub mod proxy;
pub mod registry;
pub mod state;

pub use catalog::{NetworkMode, SystemContract};
pub use config::{Activation, SystemContractsConfig, SystemContractsHardfork};
pub use errors::{CallError, CorruptRegistry, InstallError, SystemContractError};
pub use installer::HardforkInstaller;
pub use kip113::Kip113Validator;
pub use registry::RegistryClient;
pub use state::BlockContext;
