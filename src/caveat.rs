//! Restrictions and the actions they are evaluated against.
//!
//! A caveat only ever narrows what a key allows. A key carrying several
//! caveats authorizes an action only if every one of them allows it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto;
use crate::error::ApiKeyError;

/// Length of the random nonce attached by `Caveat::with_nonce`.
pub const NONCE_LEN: usize = 4;

/// The kind of operation an action performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Unset or unrecognized operation. Never authorized.
    Invalid,
    Read,
    Write,
    List,
    Delete,
}

/// A request to be authorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub op: Operation,
    /// When the action happens. Required: an action without a time is
    /// denied by every caveat.
    pub time: Option<DateTime<Utc>>,
    pub bucket: Vec<u8>,
    pub encrypted_path: Vec<u8>,
}

impl Action {
    pub fn new(op: Operation, time: DateTime<Utc>) -> Self {
        Self {
            op,
            time: Some(time),
            bucket: Vec::new(),
            encrypted_path: Vec::new(),
        }
    }

    /// An action stamped with the current time.
    pub fn now(op: Operation) -> Self {
        Self::new(op, Utc::now())
    }

    pub fn with_bucket(mut self, bucket: impl Into<Vec<u8>>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_path(mut self, encrypted_path: impl Into<Vec<u8>>) -> Self {
        self.encrypted_path = encrypted_path.into();
        self
    }
}

/// A first-party restriction. Unset fields impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Caveat {
    pub disallow_reads: bool,
    pub disallow_writes: bool,
    pub disallow_lists: bool,
    pub disallow_deletes: bool,

    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,

    /// Allowed bucket names. Empty means any bucket.
    pub buckets: Vec<Vec<u8>>,
    /// Allowed prefixes of the encrypted object path. Empty means any path.
    pub encrypted_path_prefixes: Vec<Vec<u8>>,

    /// Random bytes that make otherwise identical caveats distinct.
    /// Ignored by `allows`.
    pub nonce: Vec<u8>,
}

impl Caveat {
    /// A caveat that denies one kind of operation.
    pub fn disallow(op: Operation) -> Self {
        let mut caveat = Self::default();
        match op {
            Operation::Read => caveat.disallow_reads = true,
            Operation::Write => caveat.disallow_writes = true,
            Operation::List => caveat.disallow_lists = true,
            Operation::Delete => caveat.disallow_deletes = true,
            Operation::Invalid => {}
        }
        caveat
    }

    pub fn not_before(mut self, time: DateTime<Utc>) -> Self {
        self.not_before = Some(time);
        self
    }

    pub fn not_after(mut self, time: DateTime<Utc>) -> Self {
        self.not_after = Some(time);
        self
    }

    pub fn with_buckets<I, B>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        self.buckets.extend(buckets.into_iter().map(Into::into));
        self
    }

    pub fn with_path_prefixes<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Vec<u8>>,
    {
        self.encrypted_path_prefixes
            .extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Attach a fresh random nonce.
    pub fn with_nonce(mut self) -> Result<Self, ApiKeyError> {
        let mut nonce = vec![0u8; NONCE_LEN];
        crypto::fill_random(&mut nonce)?;
        self.nonce = nonce;
        Ok(self)
    }

    /// Whether this caveat permits `action`.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// operation, timestamp presence, `not_after`, `not_before`, bucket,
    /// path prefix. Both time bounds are inclusive.
    pub fn allows(&self, action: &Action) -> bool {
        let disallowed = match action.op {
            Operation::Read => self.disallow_reads,
            Operation::Write => self.disallow_writes,
            Operation::List => self.disallow_lists,
            Operation::Delete => self.disallow_deletes,
            Operation::Invalid => true,
        };
        if disallowed {
            return false;
        }

        let time = match action.time {
            Some(time) => time,
            None => return false,
        };

        if matches!(self.not_after, Some(not_after) if time > not_after) {
            return false;
        }
        if matches!(self.not_before, Some(not_before) if not_before > time) {
            return false;
        }

        if !self.buckets.is_empty() && !self.buckets.iter().any(|b| *b == action.bucket) {
            return false;
        }

        if !self.encrypted_path_prefixes.is_empty()
            && !self
                .encrypted_path_prefixes
                .iter()
                .any(|prefix| action.encrypted_path.starts_with(prefix))
        {
            return false;
        }

        true
    }
}
