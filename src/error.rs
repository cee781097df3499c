//! Error types for capkey.
//!
//! Three failure families matter to callers and are kept apart:
//! - **format**: the key text, chain bytes or a caveat blob is malformed;
//! - **invalid**: the chain does not re-derive under the given secret;
//! - **unauthorized**: the key is genuine but a caveat or a revocation
//!   entry denies the action.
//!
//! Messages never carry secret bytes or signatures.

use std::fmt;

use thiserror::Error;

/// The single error type for all capkey operations.
#[derive(Debug, Error)]
pub enum ApiKeyError {
    /// The key text, chain encoding or a caveat blob could not be parsed.
    #[error("api key format error: {0}")]
    Format(#[from] FormatError),

    /// The signature chain does not re-derive from the secret. Either the
    /// secret is wrong or the chain was tampered with.
    #[error("api key invalid error: signature chain does not verify")]
    Invalid,

    /// The key is authentic but does not authorize the action.
    #[error("api key unauthorized error: {0}")]
    Unauthorized(Denial),

    /// A caveat could not be encoded while restricting a key.
    #[error("api key error: caveat encoding failed: {0}")]
    Encoding(#[source] CodecError),

    /// The system's random number generator failed to produce bytes.
    #[error("api key error: randomness source failed")]
    RandomnessFailure,
}

impl ApiKeyError {
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Structural decoding failures. Raised before any cryptographic check.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Not base-58, or the embedded checksum does not match.
    #[error("invalid api key encoding")]
    Encoding,

    /// The envelope carries a version other than the supported one.
    #[error("unsupported api key version {0}")]
    Version(u8),

    /// The serialized hash chain is truncated or otherwise malformed.
    #[error("malformed chain: {0}")]
    Chain(&'static str),

    /// A caveat blob attached to the chain could not be decoded.
    #[error("invalid caveat format: {0}")]
    Caveat(#[source] CodecError),
}

/// Why an authentic key was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The caveat at `index` (0-based, in chain order) rejects the action.
    ActionDisallowed { index: usize },
    /// The chain's head identifier is on the revocation list.
    HeadRevoked,
    /// The chain signature at `position` (0 = root) is on the revocation list.
    TailRevoked { position: usize },
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActionDisallowed { index } => write!(f, "action disallowed by caveat {}", index),
            Self::HeadRevoked => write!(f, "macaroon head revoked"),
            Self::TailRevoked { position } => {
                write!(f, "macaroon tail revoked at position {}", position)
            }
        }
    }
}

/// Failures of a caveat encoder or decoder.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The blob has no schema tag.
    #[error("empty caveat blob")]
    Empty,

    /// The blob's schema tag is not the one the codec understands.
    #[error("unknown caveat schema tag {0}")]
    UnknownSchema(u8),

    /// The binary serializer rejected the value or the bytes.
    #[error("binary caveat codec: {0}")]
    Binary(#[from] postcard::Error),

    /// The JSON serializer rejected the value or the text.
    #[error("json caveat codec: {0}")]
    Json(#[from] serde_json::Error),

    /// Bytes were left over after the caveat was decoded.
    #[error("{0} trailing bytes after caveat")]
    TrailingBytes(usize),
}
