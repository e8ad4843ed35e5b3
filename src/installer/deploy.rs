//! Deployment of installer-managed contracts behind an EIP-1967 proxy.
//!
//! Both addresses are CREATE2 addresses with the Registry as deployer:
//!
//! ```text
//!   proxy          = create2(REGISTRY_ADDR, keccak256(name),                  keccak256(proxy code))
//!   implementation = create2(REGISTRY_ADDR, keccak256(name ".implementation"), keccak256(logic code))
//! ```
//!
//! so every node derives the same addresses from the same configuration.

use alloy_primitives::{keccak256, Address, Bytes};

use crate::catalog::{SystemContract, REGISTRY_ADDR};
use crate::errors::InstallError;
use crate::proxy;
use crate::state::{StateReader, StateWriter};

/// Proxy address of `contract` for the given proxy runtime.
pub fn proxy_address(contract: SystemContract, proxy_code: &[u8]) -> Address {
    REGISTRY_ADDR.create2(keccak256(contract.name()), keccak256(proxy_code))
}

/// Logic contract address of `contract` for the given logic runtime.
pub fn implementation_address(contract: SystemContract, logic_code: &[u8]) -> Address {
    let salt = keccak256(format!("{}.implementation", contract.name()));
    REGISTRY_ADDR.create2(salt, keccak256(logic_code))
}

/// Addresses written for a proxied contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContract {
    /// Contract deployed
    pub contract: SystemContract,
    /// Stable proxy address, the one registered in the Registry
    pub proxy: Address,
    /// Logic contract behind the proxy
    pub implementation: Address,
}

/// A planned proxy + logic deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProxyDeployment {
    target: DeployedContract,
    proxy_code: Bytes,
    logic_code: Bytes,
}

impl ProxyDeployment {
    pub(crate) fn new(contract: SystemContract, proxy_code: Bytes, logic_code: Bytes) -> Self {
        let target = DeployedContract {
            contract,
            proxy: proxy_address(contract, &proxy_code),
            implementation: implementation_address(contract, &logic_code),
        };
        Self { target, proxy_code, logic_code }
    }

    pub(crate) const fn target(&self) -> DeployedContract {
        self.target
    }

    /// Whether the proxy is already deployed.
    ///
    /// A deployed proxy is left alone, including its implementation slot:
    /// governance may have upgraded it since. Different code at either target
    /// address is a collision.
    pub(crate) fn is_deployed(&self, state: &impl StateReader) -> Result<bool, InstallError> {
        match non_empty_code(state, self.target.proxy) {
            Some(code) if code == self.proxy_code => return Ok(true),
            Some(_) => return Err(InstallError::CodeCollision { address: self.target.proxy }),
            None => {}
        }
        match non_empty_code(state, self.target.implementation) {
            Some(code) if code != self.logic_code => {
                Err(InstallError::CodeCollision { address: self.target.implementation })
            }
            _ => Ok(false),
        }
    }

    /// Write logic code, proxy code and the proxy slots.
    pub(crate) fn apply(&self, state: &mut impl StateWriter, admin: Address) {
        state.set_code(self.target.implementation, self.logic_code.clone());
        proxy::write_proxy(
            state,
            self.target.proxy,
            self.proxy_code.clone(),
            self.target.implementation,
            admin,
        );
    }
}

fn non_empty_code(state: &impl StateReader, address: Address) -> Option<Bytes> {
    state.code(address).filter(|code| !code.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ERC1967_PROXY_CODE, KIP113_CODE, KIP113_MOCK_CODE};
    use crate::state::InMemoryState;
    use alloy_primitives::{address, bytes};

    const ADMIN: Address = address!("000000000000000000000000000000006F5AFE00");

    fn kip113() -> ProxyDeployment {
        ProxyDeployment::new(SystemContract::Kip113, ERC1967_PROXY_CODE, KIP113_CODE)
    }

    #[test]
    fn test_addresses_are_deterministic() {
        let proxy = proxy_address(SystemContract::Kip113, &ERC1967_PROXY_CODE);
        assert_eq!(proxy, proxy_address(SystemContract::Kip113, &ERC1967_PROXY_CODE));
        assert_ne!(proxy, proxy_address(SystemContract::GovParam, &ERC1967_PROXY_CODE));
        assert_ne!(proxy, implementation_address(SystemContract::Kip113, &ERC1967_PROXY_CODE));
    }

    #[test]
    fn test_logic_address_follows_code() {
        let production = implementation_address(SystemContract::Kip113, &KIP113_CODE);
        let mock = implementation_address(SystemContract::Kip113, &KIP113_MOCK_CODE);
        assert_ne!(production, mock);
    }

    #[test]
    fn test_apply_writes_proxy_and_logic() {
        let deployment = kip113();
        let target = deployment.target();
        let mut state = InMemoryState::new();
        assert_eq!(deployment.is_deployed(&state), Ok(false));

        deployment.apply(&mut state, ADMIN);
        assert_eq!(state.code(target.implementation), Some(KIP113_CODE));
        assert_eq!(state.code(target.proxy), Some(ERC1967_PROXY_CODE));
        assert_eq!(proxy::read_implementation(&state, target.proxy), Some(target.implementation));
        assert_eq!(proxy::read_admin(&state, target.proxy), Some(ADMIN));
        assert_eq!(deployment.is_deployed(&state), Ok(true));
    }

    #[test]
    fn test_foreign_code_at_proxy_collides() {
        let deployment = kip113();
        let mut state = InMemoryState::new();
        state.set_code(deployment.target().proxy, bytes!("6001"));
        assert_eq!(
            deployment.is_deployed(&state),
            Err(InstallError::CodeCollision { address: deployment.target().proxy })
        );
    }

    #[test]
    fn test_foreign_code_at_implementation_collides() {
        let deployment = kip113();
        let mut state = InMemoryState::new();
        state.set_code(deployment.target().implementation, bytes!("6001"));
        assert_eq!(
            deployment.is_deployed(&state),
            Err(InstallError::CodeCollision { address: deployment.target().implementation })
        );
    }

    #[test]
    fn test_existing_logic_without_proxy_is_reused() {
        let deployment = kip113();
        let mut state = InMemoryState::new();
        state.set_code(deployment.target().implementation, KIP113_CODE);
        assert_eq!(deployment.is_deployed(&state), Ok(false));
    }
}
