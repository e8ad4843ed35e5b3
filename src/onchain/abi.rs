//! ABI of the system contracts that are called rather than read slot by slot.

use alloy_sol_types::sol;

sol! {
    /// KIP-113 validator BLS public key registry.
    interface IKIP113 {
        /// A registered key and its proof-of-possession.
        struct BlsPublicKeyInfo {
            bytes publicKey;
            bytes pop;
        }

        /// Every registered validator, with keys in the same order as node ids.
        function getAllBls()
            external
            view
            returns (address[] memory nodeIdList, BlsPublicKeyInfo[] memory pubkeyList);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;
    use alloy_sol_types::SolCall;

    #[test]
    fn test_get_all_bls_selector() {
        let expected = &keccak256("getAllBls()")[..4];
        assert_eq!(IKIP113::getAllBlsCall::SELECTOR.as_slice(), expected);
        assert_eq!(IKIP113::getAllBlsCall {}.abi_encode(), expected.to_vec());
    }
}
