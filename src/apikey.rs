//! Shareable API keys.
//!
//! An `ApiKey` wraps one `HashChain`. Its text form is base-58 with an
//! embedded version byte and checksum (Base58Check):
//!
//! ```text
//! base58( [ version = 0 ][ chain bytes ][ checksum (4) ] )
//! ```
//!
//! Keys are immutable values. `restrict` returns a new key and leaves the
//! original usable; clones and derived keys share chain storage.

use std::fmt;
use std::str::FromStr;

use crate::caveat::{Action, Caveat};
use crate::chain::{HashChain, Signature};
use crate::codec::{BinaryCodec, CaveatCodec};
use crate::error::{ApiKeyError, Denial, FormatError};
use crate::revocation::{self, RevocationSet};
use crate::secret::Secret;

/// Version byte carried in the text envelope.
pub const KEY_VERSION: u8 = 0;

/// A macaroon-backed API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    chain: HashChain,
}

impl ApiKey {
    /// A brand new unrestricted key for `secret`.
    pub fn new(secret: &Secret) -> Self {
        Self {
            chain: HashChain::unrestricted(secret),
        }
    }

    /// Parse a key from its text form. The key is not validated: nothing
    /// here touches a secret.
    pub fn parse(text: &str) -> Result<Self, ApiKeyError> {
        let decoded = bs58::decode(text)
            .with_check(None)
            .into_vec()
            .map_err(|_| FormatError::Encoding)?;

        let (&version, payload) = decoded.split_first().ok_or(FormatError::Encoding)?;
        if version != KEY_VERSION {
            return Err(FormatError::Version(version).into());
        }

        let chain = HashChain::from_bytes(payload)?;
        Ok(Self { chain })
    }

    /// Encode the key in its shareable text form.
    pub fn serialize(&self) -> String {
        bs58::encode(self.chain.to_bytes())
            .with_check_version(KEY_VERSION)
            .into_string()
    }

    /// A new key carrying every restriction of `self` plus `caveat`.
    pub fn restrict(&self, caveat: &Caveat) -> Result<Self, ApiKeyError> {
        self.restrict_with(&BinaryCodec, caveat)
    }

    pub fn restrict_with<C: CaveatCodec>(&self, codec: &C, caveat: &Caveat) -> Result<Self, ApiKeyError> {
        let blob = codec.encode(caveat).map_err(ApiKeyError::Encoding)?;
        let chain = self.chain.append(blob);
        tracing::trace!(caveats = chain.len(), "restricted api key");
        Ok(Self { chain })
    }

    /// Apply `caveats` in order.
    pub fn restrict_all<'a, I>(&self, caveats: I) -> Result<Self, ApiKeyError>
    where
        I: IntoIterator<Item = &'a Caveat>,
    {
        caveats
            .into_iter()
            .try_fold(self.clone(), |key, caveat| key.restrict(caveat))
    }

    /// Authorize `action` against this key.
    ///
    /// Steps, in order:
    /// 1. the chain must re-derive from `secret`, else `Invalid`;
    /// 2. every caveat must decode, else `Format`;
    /// 3. every caveat must allow the action, else `Unauthorized` naming
    ///    the first caveat that refused;
    /// 4. neither the head nor any chain signature may be in `revoked`,
    ///    else `Unauthorized`.
    ///
    /// Revocation is consulted last, so a revoked key whose caveats also
    /// refuse the action reports the caveat denial.
    pub fn check(&self, secret: &Secret, action: &Action, revoked: &RevocationSet) -> Result<(), ApiKeyError> {
        self.check_with(&BinaryCodec, secret, action, revoked)
    }

    pub fn check_with<C: CaveatCodec>(
        &self,
        codec: &C,
        secret: &Secret,
        action: &Action,
        revoked: &RevocationSet,
    ) -> Result<(), ApiKeyError> {
        if !self.chain.validate(secret) {
            tracing::debug!(op = ?action.op, "api key signature chain did not verify");
            return Err(ApiKeyError::Invalid);
        }

        let caveats = self.caveats_with(codec).map_err(|err| {
            tracing::debug!(op = ?action.op, error = %err, "api key carries a malformed caveat");
            err
        })?;

        if let Some(index) = caveats.iter().position(|caveat| !caveat.allows(action)) {
            tracing::debug!(op = ?action.op, caveat = index, "api key caveat refused action");
            return Err(ApiKeyError::Unauthorized(Denial::ActionDisallowed { index }));
        }

        if let Some(denial) = revocation::first_revoked(&self.chain, secret, revoked) {
            tracing::debug!(op = ?action.op, denial = %denial, "api key is revoked");
            return Err(ApiKeyError::Unauthorized(denial));
        }

        tracing::trace!(op = ?action.op, caveats = caveats.len(), "api key authorized action");
        Ok(())
    }

    /// Decode the attached restrictions, oldest first. No secret is
    /// involved, so the result says nothing about authenticity.
    pub fn caveats(&self) -> Result<Vec<Caveat>, ApiKeyError> {
        self.caveats_with(&BinaryCodec)
    }

    pub fn caveats_with<C: CaveatCodec>(&self, codec: &C) -> Result<Vec<Caveat>, ApiKeyError> {
        self.chain
            .caveats()
            .into_iter()
            .map(|blob| {
                codec
                    .decode(blob)
                    .map_err(|err| ApiKeyError::from(FormatError::Caveat(err)))
            })
            .collect()
    }

    /// Identifier of this key's root ancestor.
    pub fn head(&self) -> Signature {
        self.chain.head()
    }

    /// Identifier of this key only.
    pub fn tail(&self) -> Signature {
        self.chain.tail()
    }

    pub fn chain(&self) -> &HashChain {
        &self.chain
    }
}

impl From<HashChain> for ApiKey {
    fn from(chain: HashChain) -> Self {
        Self { chain }
    }
}

impl FromStr for ApiKey {
    type Err = ApiKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey").field("chain", &self.chain).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caveat::Operation;
    use crate::codec::JsonCodec;

    fn secret() -> Secret {
        Secret::from_bytes([5u8; 32])
    }

    #[test]
    fn text_form_roundtrips() {
        let root = ApiKey::new(&secret());
        let restricted = root.restrict(&Caveat::disallow(Operation::Delete)).unwrap();

        for key in [root, restricted] {
            let text = key.serialize();
            assert_eq!(ApiKey::parse(&text).unwrap(), key);
            assert_eq!(text.parse::<ApiKey>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn wrong_version_is_a_format_error() {
        let chain_bytes = ApiKey::new(&secret()).chain().to_bytes();
        let text = bs58::encode(chain_bytes).with_check_version(1).into_string();
        assert!(matches!(
            ApiKey::parse(&text),
            Err(ApiKeyError::Format(FormatError::Version(1)))
        ));
    }

    #[test]
    fn bad_checksum_is_a_format_error() {
        let mut raw = bs58::decode(ApiKey::new(&secret()).serialize()).into_vec().unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        let text = bs58::encode(raw).into_string();
        assert!(matches!(
            ApiKey::parse(&text),
            Err(ApiKeyError::Format(FormatError::Encoding))
        ));
        assert!(ApiKey::parse("not base58 0OIl").unwrap_err().is_format());
        assert!(ApiKey::parse("").unwrap_err().is_format());
    }

    #[test]
    fn malformed_chain_is_a_format_error() {
        let text = bs58::encode([1u8, 2, 3]).with_check_version(KEY_VERSION).into_string();
        assert!(matches!(
            ApiKey::parse(&text),
            Err(ApiKeyError::Format(FormatError::Chain(_)))
        ));
    }

    #[test]
    fn caveats_read_back_in_order() {
        let first = Caveat::disallow(Operation::Write);
        let second = Caveat::default().with_buckets(["alpha"]);
        let key = ApiKey::new(&secret())
            .restrict_all([&first, &second])
            .unwrap();
        assert_eq!(key.caveats().unwrap(), vec![first, second]);
    }

    #[test]
    fn check_uses_the_given_codec() {
        let s = secret();
        let key = ApiKey::new(&s)
            .restrict_with(&JsonCodec, &Caveat::disallow(Operation::List))
            .unwrap();

        let list = Action::now(Operation::List);
        let read = Action::now(Operation::Read);
        let none = RevocationSet::new();

        assert!(key.check_with(&JsonCodec, &s, &list, &none).unwrap_err().is_unauthorized());
        assert!(key.check_with(&JsonCodec, &s, &read, &none).is_ok());
        assert!(key.check(&s, &read, &none).unwrap_err().is_format());
    }

    #[test]
    fn debug_hides_the_tail() {
        let key = ApiKey::new(&secret());
        let shown = format!("{:?}", key);
        assert!(!shown.contains(&key.tail().to_hex()));
        assert!(shown.contains(&key.head().to_hex()));
    }
}
