//! BLS12-381 proof-of-possession verification.
//!
//! Keys use the "min_pk" variant: public keys in G1 (48 bytes compressed),
//! signatures in G2 (96 bytes compressed). A proof-of-possession is the
//! signature of the compressed public key under [`POP_DST`].

use alloy_primitives::Address;
use blst::min_pk::{PublicKey, Signature};
use blst::BLST_ERROR;

/// Domain separation tag of the proof-of-possession scheme.
pub const POP_DST: &[u8] = b"BLS_POP_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Compressed G1 public key length.
pub const BLS_PUBLIC_KEY_LENGTH: usize = 48;

/// Compressed G2 signature length.
pub const BLS_POP_LENGTH: usize = 96;

/// Checks that the holder of `public_key` signed it.
pub trait PopVerifier {
    /// `validator` identifies the entry being checked. It is not part of the
    /// signed message.
    fn verify_pop(&self, public_key: &[u8], pop: &[u8], validator: Address) -> bool;
}

impl<V: PopVerifier + ?Sized> PopVerifier for &V {
    fn verify_pop(&self, public_key: &[u8], pop: &[u8], validator: Address) -> bool {
        (**self).verify_pop(public_key, pop, validator)
    }
}

/// [`PopVerifier`] backed by `blst`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlstPopVerifier;

impl PopVerifier for BlstPopVerifier {
    fn verify_pop(&self, public_key: &[u8], pop: &[u8], _validator: Address) -> bool {
        // Rejects the identity point and points outside the subgroup.
        let Ok(pk) = PublicKey::key_validate(public_key) else {
            return false;
        };
        let Ok(sig) = Signature::from_bytes(pop) else {
            return false;
        };
        sig.verify(true, public_key, POP_DST, &[], &pk, false) == BLST_ERROR::BLST_SUCCESS
    }
}
