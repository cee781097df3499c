//! # capkey
//!
//! Macaroon-backed capability API keys.
//!
//! An issuer holds one root [`Secret`] per principal. [`ApiKey::new`]
//! issues an unrestricted key; any holder can [`ApiKey::restrict`] it
//! further without contacting the issuer, and nobody can remove a
//! restriction without the secret. [`ApiKey::check`] re-derives the HMAC
//! chain from the secret, evaluates every caveat against an [`Action`] and
//! consults a caller-supplied [`RevocationSet`].
//!
//! ## Public API
//!
//! - [`ApiKey`]: parse, serialize, restrict, check
//! - [`Caveat`], [`Action`], [`Operation`]: restrictions and requests
//! - [`RevocationSet`]: revoked heads and tails
//! - [`HashChain`], [`Signature`]: the underlying chain, for tooling
//! - [`CaveatCodec`], [`BinaryCodec`], [`JsonCodec`]: caveat encodings
//!
//! ```
//! use capkey::{generate_secret, Action, ApiKey, Caveat, Operation, RevocationSet};
//!
//! let secret = generate_secret()?;
//! let read_only = ApiKey::new(&secret).restrict(&Caveat::disallow(Operation::Write))?;
//!
//! let key = ApiKey::parse(&read_only.serialize())?;
//! let none = RevocationSet::new();
//! assert!(key.check(&secret, &Action::now(Operation::Read), &none).is_ok());
//! assert!(key.check(&secret, &Action::now(Operation::Write), &none).is_err());
//! # Ok::<(), capkey::ApiKeyError>(())
//! ```

pub(crate) mod crypto;
pub mod error;
pub mod secret;
pub mod chain;
pub mod caveat;
pub mod codec;
pub mod revocation;
pub mod apikey;

pub use apikey::ApiKey;
pub use caveat::{Action, Caveat, Operation};
pub use chain::{HashChain, Signature};
pub use codec::{BinaryCodec, CaveatCodec, JsonCodec};
pub use error::{ApiKeyError, CodecError, Denial, FormatError};
pub use revocation::RevocationSet;
pub use secret::Secret;

/// Generate a cryptographically secure root secret.
///
/// In production, issuers usually load secrets from their own key store
/// with [`Secret::from_bytes`] instead.
pub fn generate_secret() -> Result<Secret, ApiKeyError> {
    Secret::generate()
}
