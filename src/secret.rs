//! Issuer root secrets.
//!
//! A `Secret` is the single value an issuer keeps per principal (for
//! example per project). Every key it issues, and every key derived from
//! those, verifies only against it.
//!
//! - Not `Clone`. Cannot be duplicated without explicit conversion.
//! - Zeroised on drop.
//! - Raw bytes are `pub(crate)`; they never leave the crate and never
//!   appear in `Debug` output.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto;
use crate::error::ApiKeyError;

/// Length of a generated secret in bytes (256 bits).
pub const SECRET_LEN: usize = 32;

/// An issuer root secret.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl Secret {
    /// Generate a fresh random secret.
    pub fn generate() -> Result<Self, ApiKeyError> {
        let mut bytes = vec![0u8; SECRET_LEN];
        crypto::fill_random(&mut bytes)?;
        Ok(Self { bytes })
    }

    /// Import secret material held by the issuer.
    ///
    /// Any length is accepted; HMAC hashes long keys down and pads short
    /// ones. Issuers should still use at least `SECRET_LEN` random bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Borrow the raw secret for chain derivation.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}
