//! KIP-113 Key Validator
//!
//! Reads every validator's BLS public key from the KIP-113 contract and
//! accepts the set only if every entry carries a valid proof-of-possession.
//!
//! ```text
//!   fetch_validated_keys(block)
//!     resolve("KIP113")        → not found:              empty set
//!                              → no Registry:            RegistryNotInstalled
//!     getAllBls()              → call failure:           Call
//!     decode + shape checks    → malformed:              Kip113BadResult
//!     verify PoP of each entry → any failure:            Kip113BadPop
//! ```
//!
//! There is no partial result: one bad entry fails the whole fetch.

pub mod bls;

pub use bls::{BlstPopVerifier, PopVerifier, BLS_POP_LENGTH, BLS_PUBLIC_KEY_LENGTH, POP_DST};

use alloy_primitives::{Address, Bytes, FixedBytes};
use alloy_sol_types::SolCall;
use std::collections::BTreeMap;
use tracing::{debug, error};

use crate::catalog::SystemContract;
use crate::errors::SystemContractError;
use crate::onchain::IKIP113;
use crate::registry::RegistryClient;
use crate::state::{BlockContext, ContractCaller, StateReader};

/// A validator's BLS public key and its proof-of-possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlsKeyEntry {
    /// Compressed G1 public key
    pub public_key: FixedBytes<BLS_PUBLIC_KEY_LENGTH>,
    /// Compressed G2 signature over `public_key`
    pub pop: FixedBytes<BLS_POP_LENGTH>,
}

/// Validated keys by validator node id.
pub type ValidatedKeys = BTreeMap<Address, BlsKeyEntry>;

/// Fetches and verifies validator BLS keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kip113Validator<V = BlstPopVerifier> {
    registry: RegistryClient,
    verifier: V,
}

impl Kip113Validator {
    /// Validator using `blst` for PoP verification.
    pub const fn new(registry: RegistryClient) -> Self {
        Self { registry, verifier: BlstPopVerifier }
    }
}

impl<V: PopVerifier> Kip113Validator<V> {
    /// Validator with a custom PoP verifier.
    pub const fn with_verifier(registry: RegistryClient, verifier: V) -> Self {
        Self { registry, verifier }
    }

    /// All validator keys registered at `block`, each with a verified PoP.
    pub fn fetch_validated_keys<S>(
        &self,
        state: &S,
        block: &BlockContext,
    ) -> Result<ValidatedKeys, SystemContractError>
    where
        S: StateReader + ContractCaller,
    {
        let Some(kip113) = self.registry.resolve(state, SystemContract::Kip113, block)? else {
            debug!(
                target: "system_contracts::kip113",
                block = block.number,
                "KIP113 not registered, no BLS keys"
            );
            return Ok(ValidatedKeys::new());
        };

        let input = Bytes::from(IKIP113::getAllBlsCall {}.abi_encode());
        let output = state.call_contract(kip113, input, block)?;
        let keys = decode_all_bls(&output)?;

        for (validator, entry) in &keys {
            let verified =
                self.verifier.verify_pop(entry.public_key.as_slice(), entry.pop.as_slice(), *validator);
            if !verified {
                error!(
                    target: "system_contracts::kip113",
                    %validator,
                    public_key = %entry.public_key,
                    block = block.number,
                    "BLS proof-of-possession verification failed"
                );
                return Err(SystemContractError::Kip113BadPop { validator: *validator });
            }
        }

        debug!(
            target: "system_contracts::kip113",
            %kip113,
            block = block.number,
            validators = keys.len(),
            "Fetched validated BLS keys"
        );
        Ok(keys)
    }
}

/// Decode `getAllBls()` output and check its shape.
///
/// The encoding must be canonical: trailing bytes or dirty padding are
/// rejected like a truncated response.
///
/// Every entry is checked before any PoP is verified, so a malformed response
/// is always reported as [`SystemContractError::Kip113BadResult`].
pub fn decode_all_bls(data: &[u8]) -> Result<ValidatedKeys, SystemContractError> {
    let IKIP113::getAllBlsReturn { nodeIdList: node_ids, pubkeyList: pubkeys } =
        IKIP113::getAllBlsCall::abi_decode_returns_validate(data).map_err(|err| {
            SystemContractError::bad_result(format!("cannot decode getAllBls output: {err}"))
        })?;

    if node_ids.len() != pubkeys.len() {
        return Err(SystemContractError::bad_result(format!(
            "{} node ids but {} keys",
            node_ids.len(),
            pubkeys.len()
        )));
    }

    let mut keys = ValidatedKeys::new();
    for (node_id, info) in node_ids.into_iter().zip(pubkeys) {
        let public_key = FixedBytes::try_from(info.publicKey.as_ref()).map_err(|_| {
            SystemContractError::bad_result(format!(
                "public key of {node_id} is {} bytes",
                info.publicKey.len()
            ))
        })?;
        let pop = FixedBytes::try_from(info.pop.as_ref()).map_err(|_| {
            SystemContractError::bad_result(format!(
                "proof-of-possession of {node_id} is {} bytes",
                info.pop.len()
            ))
        })?;

        if keys.insert(node_id, BlsKeyEntry { public_key, pop }).is_some() {
            return Err(SystemContractError::bad_result(format!("duplicate node id {node_id}")));
        }
    }
    Ok(keys)
}
