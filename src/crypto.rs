//! Low-level cryptographic operations.
//!
//! This is the only module in the crate that imports `ring`. The hash
//! chain, caveat nonces and secret generation all go through the functions
//! exposed here.
//!
//! Primitive choices:
//! - **Keyed hash**: HMAC-SHA256
//! - **Output size**: 256 bits (32 bytes)
//! - **Randomness**: `ring::rand::SystemRandom`, nothing cached

use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::ApiKeyError;

/// The MAC used for every link of the chain.
const ALGORITHM: hmac::Algorithm = hmac::HMAC_SHA256;

/// Size of a keyed hash output in bytes (256 bits).
pub const MAC_LEN: usize = 32;

/// Compute `HMAC-SHA256(key, message)`.
///
/// HMAC accepts keys of any length, so this never fails. Inside the chain
/// the key is either the issuer secret (first link) or the previous link's
/// signature.
pub fn keyed_hash(key: &[u8], message: &[u8]) -> [u8; MAC_LEN] {
    let key = hmac::Key::new(ALGORITHM, key);
    let tag = hmac::sign(&key, message);

    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(tag.as_ref());
    out
}

/// Check `expected == HMAC-SHA256(key, message)` in constant time.
///
/// The comparison is delegated to `ring::hmac::verify`, so it does not
/// short-circuit on the first differing byte.
pub fn verify_keyed_hash(key: &[u8], message: &[u8], expected: &[u8]) -> bool {
    let key = hmac::Key::new(ALGORITHM, key);
    hmac::verify(&key, message, expected).is_ok()
}

/// Fill `buf` from the system CSPRNG.
pub fn fill_random(buf: &mut [u8]) -> Result<(), ApiKeyError> {
    let rng = SystemRandom::new();
    rng.fill(buf).map_err(|_| ApiKeyError::RandomnessFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_hash_is_deterministic() {
        let a = keyed_hash(b"secret", b"message");
        let b = keyed_hash(b"secret", b"message");
        assert_eq!(a, b);
    }

    #[test]
    fn keyed_hash_depends_on_key_and_message() {
        let base = keyed_hash(b"secret", b"message");
        assert_ne!(base, keyed_hash(b"secreT", b"message"));
        assert_ne!(base, keyed_hash(b"secret", b"messagE"));
    }

    #[test]
    fn verify_accepts_only_the_exact_tag() {
        let tag = keyed_hash(b"k", b"m");
        assert!(verify_keyed_hash(b"k", b"m", &tag));

        let mut flipped = tag;
        flipped[MAC_LEN - 1] ^= 0x01;
        assert!(!verify_keyed_hash(b"k", b"m", &flipped));
        assert!(!verify_keyed_hash(b"k", b"m", &tag[..MAC_LEN - 1]));
    }

    #[test]
    fn fill_random_produces_fresh_bytes() {
        let mut a = [0u8; MAC_LEN];
        let mut b = [0u8; MAC_LEN];
        fill_random(&mut a).unwrap();
        fill_random(&mut b).unwrap();
        assert_ne!(a, b);
    }
}
