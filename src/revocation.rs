//! Revocation lists.
//!
//! A revocation list names chain identifiers: heads, or any signature a
//! chain passes through. Revoking a value also revokes every key derived
//! from a key that produced it, because a derived chain re-derives the
//! same intermediate signatures up to the point where it diverges.
//!
//! The list is supplied by the caller for each check; nothing here is
//! persisted or shared between checks.

use std::collections::HashSet;

use crate::chain::HashChain;
use crate::error::Denial;
use crate::secret::Secret;

/// A set of revoked identifiers, keyed by their raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationSet {
    ids: HashSet<Vec<u8>>,
}

impl RevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an identifier. Returns `false` if it was already present.
    pub fn insert(&mut self, id: impl AsRef<[u8]>) -> bool {
        self.ids.insert(id.as_ref().to_vec())
    }

    pub fn contains(&self, id: impl AsRef<[u8]>) -> bool {
        self.ids.contains(id.as_ref())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<T: AsRef<[u8]>> FromIterator<T> for RevocationSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: AsRef<[u8]>> Extend<T> for RevocationSet {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}

/// Report the first revoked identifier `chain` passes through under
/// `secret`: the head first, then each signature from the root onward.
///
/// An empty set short-circuits without deriving anything.
pub fn first_revoked(chain: &HashChain, secret: &Secret, revoked: &RevocationSet) -> Option<Denial> {
    if revoked.is_empty() {
        return None;
    }
    if revoked.contains(chain.head()) {
        return Some(Denial::HeadRevoked);
    }
    chain
        .tails(secret)
        .iter()
        .position(|sig| revoked.contains(sig))
        .map(|position| Denial::TailRevoked { position })
}
