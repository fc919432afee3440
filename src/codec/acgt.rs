//! ACGT-packed codec: 2-bit nucleotide packing for sequence data that is
//! (almost) entirely `A`/`C`/`G`/`T`. Grounded on the nucleotide-packing
//! idiom in `other_examples/gbam_tools` writer.rs.rs and
//! `other_examples/htslib-bgzf.rs.rs` (both pack bases to sub-byte width
//! before the general block-compression stage).
//!
//! Non-ACGT bytes (`N`, lowercase, IUPAC ambiguity codes) are stored as
//! exceptions: `(position, byte)` pairs appended after the packed stream,
//! with the base substituted by `A` in the packed stream so decoding is a
//! straight 2-bit unpack followed by exception patching.

use super::general::GeneralCodec;
use super::{Codec, CodecId};
use crate::error::{Result, SeqzipError};

const BASES: [u8; 4] = *b"ACGT";

fn base_code(b: u8) -> Option<u8> {
    match b {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

pub struct AcgtCodec;

impl Codec for AcgtCodec {
    fn id(&self) -> CodecId {
        CodecId::Acgt
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut packed = vec![0u8; input.len().div_ceil(4)];
        let mut exceptions = Vec::new();

        for (i, &b) in input.iter().enumerate() {
            let code = match base_code(b) {
                Some(c) => c,
                None => {
                    exceptions.push((i as u32, b));
                    0
                }
            };
            packed[i / 4] |= code << ((i % 4) * 2);
        }

        let compressed_packed = GeneralCodec.compress(&packed)?;

        let mut out = Vec::new();
        out.extend_from_slice(&(exceptions.len() as u32).to_le_bytes());
        for (pos, byte) in &exceptions {
            out.extend_from_slice(&pos.to_le_bytes());
            out.push(*byte);
        }
        out.extend_from_slice(&(compressed_packed.len() as u32).to_le_bytes());
        out.extend_from_slice(&compressed_packed);
        Ok(out)
    }

    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
        if input.len() < 4 {
            return Err(SeqzipError::invariant("acgt codec: truncated header"));
        }
        let n_exceptions = u32::from_le_bytes(input[0..4].try_into().unwrap()) as usize;
        let mut pos = 4;
        let mut exceptions = Vec::with_capacity(n_exceptions);
        for _ in 0..n_exceptions {
            if pos + 5 > input.len() {
                return Err(SeqzipError::invariant("acgt codec: truncated exception list"));
            }
            let p = u32::from_le_bytes(input[pos..pos + 4].try_into().unwrap());
            let b = input[pos + 4];
            exceptions.push((p, b));
            pos += 5;
        }
        if pos + 4 > input.len() {
            return Err(SeqzipError::invariant("acgt codec: truncated packed-length"));
        }
        let packed_len = u32::from_le_bytes(input[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        let packed = GeneralCodec.decompress(&input[pos..pos + packed_len], uncompressed_len.div_ceil(4))?;

        let mut out = Vec::with_capacity(uncompressed_len);
        for i in 0..uncompressed_len {
            let code = (packed[i / 4] >> ((i % 4) * 2)) & 0b11;
            out.push(BASES[code as usize]);
        }
        for (p, b) in exceptions {
            out[p as usize] = b;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_pure_acgt() {
        let seq = b"ACGTACGTACGTGGGGCCCCAAAATTTT".to_vec();
        let codec = AcgtCodec;
        let compressed = codec.compress(&seq).unwrap();
        let back = codec.decompress(&compressed, seq.len()).unwrap();
        assert_eq!(back, seq);
    }

    #[test]
    fn round_trips_with_n_exceptions() {
        let seq = b"ACGTNNNACGTNACGT".to_vec();
        let codec = AcgtCodec;
        let compressed = codec.compress(&seq).unwrap();
        let back = codec.decompress(&compressed, seq.len()).unwrap();
        assert_eq!(back, seq);
    }
}
