use alloc::vec::Vec;

use crate::codec::Scalar;
use crate::{Archive, ArchiveConfig, CorruptedData, Decoder, Encoder, Result};

// -----------------------------------------------------------------------------
// Checksum

/// Size of the `[checksum][payload length]` header.
pub const HEADER_SIZE: usize = 16;

const MODULUS: u64 = u64::MAX >> 1;

/// Rolling sum of the payload's 8-byte little-endian words, modulo
/// `2^63 - 1`.
///
/// A trailing partial word is zero-padded. Changing one bit moves one word
/// by `±2^k`, which is never a multiple of the odd modulus, so every single
/// bit flip changes the sum. This detects accidental damage only.
pub fn checksum(payload: &[u8]) -> u64 {
    payload.chunks(8).fold(0, |sum, chunk| {
        let mut word = [0_u8; 8];
        word[..chunk.len()].copy_from_slice(chunk);
        (sum + u64::load(&word) % MODULUS) % MODULUS
    })
}

// -----------------------------------------------------------------------------
// Header

/// The integrity header in front of every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub checksum: u64,
    pub payload_len: u64,
}

impl Header {
    pub fn for_payload(payload: &[u8]) -> Self {
        Self {
            checksum: checksum(payload),
            payload_len: payload.len() as u64,
        }
    }

    /// Writes the header into the first [`HEADER_SIZE`] bytes of `dst`.
    pub fn write(&self, dst: &mut [u8]) {
        self.checksum.dump(&mut dst[..8]);
        self.payload_len.dump(&mut dst[8..HEADER_SIZE]);
    }

    /// Reads the header of `bytes` without validating the payload.
    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CorruptedData::HeaderTooShort { len: bytes.len() });
        }
        Ok(Self {
            checksum: u64::load(&bytes[..8]),
            payload_len: u64::load(&bytes[8..HEADER_SIZE]),
        })
    }

    /// Validates length then checksum and returns the payload.
    pub fn open(bytes: &[u8]) -> Result<&[u8]> {
        let header = Self::read(bytes)?;
        let payload = &bytes[HEADER_SIZE..];

        if header.payload_len != payload.len() as u64 {
            return Err(CorruptedData::LengthMismatch {
                declared: header.payload_len,
                actual: payload.len(),
            });
        }

        let computed = checksum(payload);
        if header.checksum != computed {
            return Err(CorruptedData::ChecksumMismatch {
                stored: header.checksum,
                computed,
            });
        }

        Ok(payload)
    }
}

// -----------------------------------------------------------------------------
// Raw payloads

/// Encodes `value` without the integrity header.
pub fn encode_payload<T: Archive>(value: &T) -> Vec<u8> {
    let mut enc = Encoder::writing(Vec::new());
    enc.run(value);
    enc.into_bytes()
}

/// Decodes a payload produced by [`encode_payload`].
pub fn decode_payload<T: Archive>(payload: &[u8]) -> Result<T> {
    let mut dec = Decoder::new(payload, ArchiveConfig::DEFAULT);
    let value = T::decode(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

// -----------------------------------------------------------------------------
// Envelope

/// Total serialized size of `value`, header included, from a counting pass.
pub fn integrity_count<T: Archive>(value: &T) -> usize {
    let mut counter = Encoder::counting();
    counter.run(value);
    HEADER_SIZE + counter.position()
}

/// Serializes `value` into a buffer with an integrity header.
///
/// A counting pass sizes the buffer first, so the payload is written
/// without reallocation.
pub fn serialize<T: Archive>(value: &T) -> Vec<u8> {
    let len = integrity_count(value);

    let mut buf = Vec::with_capacity(len);
    buf.resize(HEADER_SIZE, 0);

    let mut enc = Encoder::writing(buf);
    enc.run(value);
    let allocations = enc.allocations();
    let mut buf = enc.into_bytes();
    debug_assert_eq!(buf.len(), len, "counting pass disagrees with the written payload");

    let (head, payload) = buf.split_at_mut(HEADER_SIZE);
    Header::for_payload(payload).write(head);

    log::debug!(
        "serialized {} payload bytes, {allocations} allocations",
        payload.len()
    );
    buf
}

fn open(bytes: &[u8]) -> Result<&[u8]> {
    Header::open(bytes).inspect_err(|e| log::warn!("rejecting archive: {e}"))
}

/// Validates the header of `bytes` and decodes a `T` from the payload.
///
/// # Errors
/// [`CorruptedData`] if the buffer is shorter than the header, its length
/// disagrees with the header, the checksum does not match, or the payload
/// does not decode to exactly one `T`.
///
/// # Panics
/// If the payload was written for a different type: unknown pointer tags,
/// back-references to unknown ids, unregistered class-ids.
pub fn deserialize<T: Archive>(bytes: &[u8]) -> Result<T> {
    deserialize_with(bytes, ArchiveConfig::DEFAULT)
}

/// As [`deserialize`] with explicit decoder settings.
pub fn deserialize_with<T: Archive>(bytes: &[u8], config: ArchiveConfig) -> Result<T> {
    let payload = open(bytes)?;
    let mut dec = Decoder::new(payload, config);
    let value = T::decode(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

/// Decodes over an existing value.
///
/// Pointer fields give up the allocations they held; an allocation shared
/// by several replaced fields is released once, after the pass.
///
/// # Errors
/// As [`deserialize`]. A buffer rejected by its header leaves `target`
/// untouched. A payload that passes the checksum but fails to decode
/// leaves `target` partly overwritten: fields before the failure hold
/// their new values, and [`Interior`](crate::Interior) pointers among them
/// stay unbound.
pub fn deserialize_into<T: Archive>(target: &mut T, bytes: &[u8]) -> Result<()> {
    deserialize_into_with(target, bytes, ArchiveConfig::DEFAULT)
}

/// As [`deserialize_into`] with explicit decoder settings.
pub fn deserialize_into_with<T: Archive>(
    target: &mut T,
    bytes: &[u8],
    config: ArchiveConfig,
) -> Result<()> {
    let payload = open(bytes)?;
    let mut dec = Decoder::new(payload, config).with_free_verifier();
    target.decode_in_place(&mut dec)?;
    dec.finish()
}

// -----------------------------------------------------------------------------
// Tests
