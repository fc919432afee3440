//! Bitmap codec: one bit per element, packed LSB-first, general entropy
//! over the packed bytes. Elements arrive as one byte each (0 or 1) — the
//! local stream's natural unit for a `bitmap` ltype — and are packed here.

use super::general::GeneralCodec;
use super::{Codec, CodecId};
use crate::error::{Result, SeqzipError};

pub struct BitmapCodec;

impl Codec for BitmapCodec {
    fn id(&self) -> CodecId {
        CodecId::Bitmap
    }

    /// `input` is one byte per bit (0 or 1). Output: 1-byte tail-bit count
    /// header, then the general-entropy-compressed packed bitmap.
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let (packed, tail_bits) = pack_bits(input);
        let compressed = GeneralCodec.compress(&packed)?;
        let mut out = Vec::with_capacity(compressed.len() + 1);
        out.push(tail_bits);
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    /// `uncompressed_len` is the element count (number of bits), matching
    /// the byte-per-element convention used by every other codec here.
    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Err(SeqzipError::invariant("bitmap codec: empty input"));
        }
        let tail_bits = input[0];
        let packed_len = tail_bits_to_packed_len(uncompressed_len, tail_bits)?;
        let packed = GeneralCodec.decompress(&input[1..], packed_len)?;
        Ok(unpack_bits(&packed, uncompressed_len))
    }
}

/// Packs `bits` (one byte per bit, 0 or 1) LSB-first. Returns the packed
/// bytes and the number of valid bits in the final byte (0 means the last
/// byte is entirely used, i.e. `bits.len()` is a multiple of 8 — recorded
/// as 8 in that case so a reader can always subtract from the byte count).
fn pack_bits(bits: &[u8]) -> (Vec<u8>, u8) {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, &b) in bits.iter().enumerate() {
        if b != 0 {
            out[i / 8] |= 1 << (i % 8);
        }
    }
    let tail = if bits.is_empty() {
        0
    } else {
        let rem = bits.len() % 8;
        if rem == 0 {
            8
        } else {
            rem as u8
        }
    };
    (out, tail)
}

fn unpack_bits(packed: &[u8], n_bits: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(n_bits);
    for i in 0..n_bits {
        let byte = packed[i / 8];
        out.push((byte >> (i % 8)) & 1);
    }
    out
}

fn tail_bits_to_packed_len(n_bits: usize, tail_bits: u8) -> Result<usize> {
    if n_bits == 0 {
        return Ok(0);
    }
    let full_bytes = n_bits / 8;
    let rem = n_bits % 8;
    let expected_tail = if rem == 0 { 8 } else { rem as u8 };
    if expected_tail != tail_bits {
        return Err(SeqzipError::invariant(format!(
            "bitmap tail-bit count mismatch: header says {tail_bits}, element count implies {expected_tail}"
        )));
    }
    Ok(if rem == 0 { full_bytes } else { full_bytes + 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_bit_pattern() {
        let bits: Vec<u8> = vec![1, 0, 1, 1, 0, 0, 0, 1, 1, 0, 1];
        let codec = BitmapCodec;
        let compressed = codec.compress(&bits).unwrap();
        let back = codec.decompress(&compressed, bits.len()).unwrap();
        assert_eq!(back, bits);
    }

    #[test]
    fn round_trips_exact_byte_multiple() {
        let bits: Vec<u8> = vec![0, 1, 0, 1, 1, 1, 0, 0];
        let codec = BitmapCodec;
        let compressed = codec.compress(&bits).unwrap();
        let back = codec.decompress(&compressed, bits.len()).unwrap();
        assert_eq!(back, bits);
    }

    #[test]
    fn round_trips_empty() {
        let codec = BitmapCodec;
        let compressed = codec.compress(&[]).unwrap();
        let back = codec.decompress(&compressed, 0).unwrap();
        assert_eq!(back, Vec::<u8>::new());
    }
}
