//! Caveat encoders and decoders.
//!
//! The chain treats caveats as opaque blobs; a codec turns a `Caveat` into
//! such a blob and back. Every blob opens with a one-byte schema tag so a
//! decoder can refuse bytes written under a schema it does not speak.
//!
//! ```text
//! [ schema tag (1) ][ serialized caveat ]
//! ```

use crate::caveat::Caveat;
use crate::error::CodecError;

/// Encodes and decodes caveats to and from chain blobs.
pub trait CaveatCodec {
    /// Schema tag written as the first byte of every blob.
    const SCHEMA: u8;

    fn encode(&self, caveat: &Caveat) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, blob: &[u8]) -> Result<Caveat, CodecError>;
}

/// Split the schema tag off `blob` and check it against `expected`.
fn strip_schema(blob: &[u8], expected: u8) -> Result<&[u8], CodecError> {
    match blob.split_first() {
        None => Err(CodecError::Empty),
        Some((&tag, body)) if tag == expected => Ok(body),
        Some((&tag, _)) => Err(CodecError::UnknownSchema(tag)),
    }
}

/// Compact binary codec (postcard). Used by default for keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl CaveatCodec for BinaryCodec {
    const SCHEMA: u8 = 1;

    fn encode(&self, caveat: &Caveat) -> Result<Vec<u8>, CodecError> {
        let body = postcard::to_stdvec(caveat)?;
        let mut blob = Vec::with_capacity(1 + body.len());
        blob.push(Self::SCHEMA);
        blob.extend_from_slice(&body);
        Ok(blob)
    }

    fn decode(&self, blob: &[u8]) -> Result<Caveat, CodecError> {
        let body = strip_schema(blob, Self::SCHEMA)?;
        let (caveat, rest) = postcard::take_from_bytes::<Caveat>(body)?;
        if !rest.is_empty() {
            return Err(CodecError::TrailingBytes(rest.len()));
        }
        Ok(caveat)
    }
}

/// Human-readable codec (serde_json). Larger keys, but the caveats can be
/// read straight out of a decoded chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl CaveatCodec for JsonCodec {
    const SCHEMA: u8 = 2;

    fn encode(&self, caveat: &Caveat) -> Result<Vec<u8>, CodecError> {
        let mut blob = vec![Self::SCHEMA];
        serde_json::to_writer(&mut blob, caveat)?;
        Ok(blob)
    }

    fn decode(&self, blob: &[u8]) -> Result<Caveat, CodecError> {
        let body = strip_schema(blob, Self::SCHEMA)?;
        Ok(serde_json::from_slice(body)?)
    }
}
