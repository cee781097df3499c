//! The append-only HMAC chain behind every API key.
//!
//! ## Derivation structure
//!
//! ```text
//! head   = HMAC(secret, HEAD_LABEL)
//! sig_0  = HMAC(secret, ROOT_LABEL)
//! sig_i  = HMAC(sig_{i-1}, caveat_i)
//! tail   = sig_n
//! ```
//!
//! The chain stores the head, the caveat blobs and the tail. The tail is a
//! cache: `validate` always re-derives it from the secret. The head is a
//! public identifier for revocation lists; it is independent of every
//! `sig_i`, so publishing it reveals nothing that would let a holder strip
//! caveats.
//!
//! ## Sharing
//!
//! Caveat blobs live in immutable `Arc` nodes that point at their parent.
//! `append` allocates a single node, so keys restricted from a common
//! parent share the parent's nodes instead of copying them.
//!
//! ## Binary layout
//!
//! ```text
//! [ version u8 ][ head (32) ][ caveat count u32 BE ]
//! repeated count times: [ blob len u32 BE ][ blob ]
//! [ tail (32) ]
//! ```

use std::fmt;
use std::sync::Arc;

use crate::crypto::{self, MAC_LEN};
use crate::error::FormatError;
use crate::secret::Secret;

/// Size of a chain signature or identifier in bytes.
pub const SIGNATURE_LEN: usize = MAC_LEN;

/// Label hashed under the secret to produce the root signature.
pub const ROOT_LABEL: &[u8] = b"capkey/v1/root";

/// Label hashed under the secret to produce the public head identifier.
pub const HEAD_LABEL: &[u8] = b"capkey/v1/head";

/// Version byte of the binary chain layout.
pub const CHAIN_FORMAT_VERSION: u8 = 1;

const LEN_PREFIX: usize = 4;

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A fixed-length keyed hash output: a link signature or the head identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

/// `HMAC(secret, ROOT_LABEL)`: the first link of every chain under `secret`.
pub fn root_signature(secret: &Secret) -> Signature {
    Signature(crypto::keyed_hash(secret.as_bytes(), ROOT_LABEL))
}

/// `HMAC(secret, HEAD_LABEL)`: the public identifier shared by every chain
/// issued under `secret`.
pub fn head_identifier(secret: &Secret) -> Signature {
    Signature(crypto::keyed_hash(secret.as_bytes(), HEAD_LABEL))
}

fn fold(previous: &Signature, blob: &[u8]) -> Signature {
    Signature(crypto::keyed_hash(previous.as_ref(), blob))
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

struct Link {
    blob: Box<[u8]>,
    prev: Option<Arc<Link>>,
}

// Unlink iteratively so dropping a very long chain cannot overflow the stack.
impl Drop for Link {
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(link) = prev {
            match Arc::try_unwrap(link) {
                Ok(mut inner) => prev = inner.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// An immutable chain of caveat blobs and its cached final signature.
///
/// Cloning is cheap: clones share every link.
#[derive(Clone)]
pub struct HashChain {
    head: Signature,
    last: Option<Arc<Link>>,
    len: usize,
    tail: Signature,
}

impl HashChain {
    /// A chain with no caveats: the unrestricted root of `secret`.
    pub fn unrestricted(secret: &Secret) -> Self {
        Self {
            head: head_identifier(secret),
            last: None,
            len: 0,
            tail: root_signature(secret),
        }
    }

    /// Fold `blobs`, in order, onto the root of `secret`.
    pub fn build<I, B>(secret: &Secret, blobs: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        blobs
            .into_iter()
            .fold(Self::unrestricted(secret), |chain, blob| chain.append(blob))
    }

    /// Return a new chain with `blob` attached. `self` is left untouched.
    pub fn append(&self, blob: impl Into<Vec<u8>>) -> Self {
        let blob: Box<[u8]> = blob.into().into_boxed_slice();
        let tail = fold(&self.tail, &blob);
        Self {
            head: self.head,
            last: Some(Arc::new(Link {
                blob,
                prev: self.last.clone(),
            })),
            len: self.len + 1,
            tail,
        }
    }

    /// Re-derive the chain from `secret` and compare head and tail in
    /// constant time.
    pub fn validate(&self, secret: &Secret) -> bool {
        let head_ok = crypto::verify_keyed_hash(secret.as_bytes(), HEAD_LABEL, self.head.as_ref());

        let caveats = self.caveats();
        let tail_ok = match caveats.split_last() {
            None => crypto::verify_keyed_hash(secret.as_bytes(), ROOT_LABEL, self.tail.as_ref()),
            Some((last, rest)) => {
                let penultimate = rest
                    .iter()
                    .fold(root_signature(secret), |sig, blob| fold(&sig, blob));
                crypto::verify_keyed_hash(penultimate.as_ref(), last, self.tail.as_ref())
            }
        };

        head_ok & tail_ok
    }

    /// Every signature produced while folding from the root: `len() + 1`
    /// values, root first, the re-derived tail last.
    pub fn tails(&self, secret: &Secret) -> Vec<Signature> {
        let mut out = Vec::with_capacity(self.len + 1);
        let mut sig = root_signature(secret);
        out.push(sig);
        for blob in self.caveats() {
            sig = fold(&sig, blob);
            out.push(sig);
        }
        out
    }

    pub fn head(&self) -> Signature {
        self.head
    }

    pub fn tail(&self) -> Signature {
        self.tail
    }

    /// Number of attached caveats.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The caveat blobs in the order they were appended.
    pub fn caveats(&self) -> Vec<&[u8]> {
        let mut out = Vec::with_capacity(self.len);
        let mut node = self.last.as_deref();
        while let Some(link) = node {
            out.push(&*link.blob);
            node = link.prev.as_deref();
        }
        out.reverse();
        out
    }

    /// Encode the chain in the binary layout described in the module docs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let caveats = self.caveats();
        let body: usize = caveats.iter().map(|c| LEN_PREFIX + c.len()).sum();

        let mut out = Vec::with_capacity(1 + 2 * SIGNATURE_LEN + LEN_PREFIX + body);
        out.push(CHAIN_FORMAT_VERSION);
        out.extend_from_slice(self.head.as_ref());
        out.extend_from_slice(&(caveats.len() as u32).to_be_bytes());
        for blob in caveats {
            out.extend_from_slice(&(blob.len() as u32).to_be_bytes());
            out.extend_from_slice(blob);
        }
        out.extend_from_slice(self.tail.as_ref());
        out
    }

    /// Decode a chain produced by `to_bytes`. Purely structural: no secret
    /// is involved and nothing is authenticated.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FormatError> {
        let mut reader = Reader::new(data);

        if reader.u8()? != CHAIN_FORMAT_VERSION {
            return Err(FormatError::Chain("unsupported chain version"));
        }
        let head = reader.signature()?;

        let count = reader.u32()? as usize;
        // Every blob costs at least its length prefix; reject absurd counts
        // before looping.
        if count > reader.remaining() / LEN_PREFIX {
            return Err(FormatError::Chain("caveat count exceeds input"));
        }

        let mut last = None;
        for _ in 0..count {
            let blob_len = reader.u32()? as usize;
            let blob = reader.take(blob_len)?;
            last = Some(Arc::new(Link {
                blob: blob.into(),
                prev: last,
            }));
        }

        let tail = reader.signature()?;
        if reader.remaining() != 0 {
            return Err(FormatError::Chain("trailing bytes after signature"));
        }

        Ok(Self {
            head,
            last,
            len: count,
            tail,
        })
    }
}

impl PartialEq for HashChain {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head
            && self.tail == other.tail
            && self.len == other.len
            && self.caveats() == other.caveats()
    }
}

impl Eq for HashChain {}

impl fmt::Debug for HashChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashChain")
            .field("head", &self.head)
            .field("caveats", &self.len)
            .field("tail", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if n > self.remaining() {
            return Err(FormatError::Chain("truncated chain"));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, FormatError> {
        let bytes: [u8; LEN_PREFIX] = self
            .take(LEN_PREFIX)?
            .try_into()
            .map_err(|_| FormatError::Chain("truncated chain"))?;
        Ok(u32::from_be_bytes(bytes))
    }

    fn signature(&mut self) -> Result<Signature, FormatError> {
        let bytes: [u8; SIGNATURE_LEN] = self
            .take(SIGNATURE_LEN)?
            .try_into()
            .map_err(|_| FormatError::Chain("truncated chain"))?;
        Ok(Signature(bytes))
    }
}
