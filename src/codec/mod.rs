//! Fixed codec bank: general entropy, transposed int, interlaced signed
//! int, bitmap, ACGT-packed, and a callback (iterator-driven) mode.
//!
//! Grounded on spec §4.6 and, for the per-codec shape, on the kept
//! `block::compress`/`block::decompress_api` pair ("general"), the ACGT
//! 2-bit packing idiom in `other_examples/htslib-bgzf.rs.rs` and
//! `gbam_tools` writer.rs.rs (nucleotide packing alongside a block
//! codec), and [`crate::context::ltype`] for the transposed/interlaced
//! transforms (the codecs here only handle the final compress/decompress
//! step; width reduction and transposition already happened at finalize).

pub mod acgt;
pub mod bitmap;
pub mod callback;
pub mod general;
pub mod interlaced;
pub mod selector;
pub mod transposed;

use crate::error::{Result, SeqzipError};

/// Identifies which codec compressed a section, stored in the section
/// header's codec byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CodecId {
    General = 0,
    Transposed = 1,
    Interlaced = 2,
    Bitmap = 3,
    Acgt = 4,
    Callback = 5,
    /// No compression: payload stored as-is. Used when a candidate
    /// codec's output would be larger than the input.
    None = 255,
}

impl CodecId {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(CodecId::General),
            1 => Ok(CodecId::Transposed),
            2 => Ok(CodecId::Interlaced),
            3 => Ok(CodecId::Bitmap),
            4 => Ok(CodecId::Acgt),
            5 => Ok(CodecId::Callback),
            255 => Ok(CodecId::None),
            other => Err(SeqzipError::invariant(format!("unknown codec id {other}"))),
        }
    }
}

/// The `(compress, decompress, estimate)` triple every codec exposes
/// (spec §2's "Codec bank" bullet).
pub trait Codec {
    fn id(&self) -> CodecId;

    /// Compresses `input`, returning the encoded bytes.
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Decompresses `input` into exactly `uncompressed_len` bytes.
    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>>;

    /// Cheap size estimate used by codecs that don't want to run a full
    /// trial compression during selection (most do anyway; the callback
    /// codec overrides this since it can't be sampled by byte-slicing).
    fn estimate(&self, input: &[u8]) -> usize {
        input.len()
    }
}

/// Compresses `input` with the codec named by `id`, falling back to
/// [`CodecId::None`] (stored uncompressed) if compression would not shrink
/// the buffer — mirrors codecs elsewhere in the corpus that bail out to a
/// stored block rather than emit an expanded one.
pub fn compress_with(id: CodecId, input: &[u8]) -> Result<(CodecId, Vec<u8>)> {
    let codec: Box<dyn Codec> = make_codec(id);
    let out = codec.compress(input)?;
    if out.len() < input.len() {
        Ok((id, out))
    } else {
        Ok((CodecId::None, input.to_vec()))
    }
}

pub fn decompress_with(id: CodecId, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
    if id == CodecId::None {
        return Ok(input.to_vec());
    }
    make_codec(id).decompress(input, uncompressed_len)
}

fn make_codec(id: CodecId) -> Box<dyn Codec> {
    match id {
        CodecId::General | CodecId::None => Box::new(general::GeneralCodec),
        CodecId::Transposed => Box::new(transposed::TransposedCodec),
        CodecId::Interlaced => Box::new(interlaced::InterlacedCodec),
        CodecId::Bitmap => Box::new(bitmap::BitmapCodec),
        CodecId::Acgt => Box::new(acgt::AcgtCodec),
        CodecId::Callback => Box::new(callback::CallbackCodec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_uncompressed_when_compression_does_not_shrink() {
        let input = vec![1u8, 2, 3];
        let (id, out) = compress_with(CodecId::General, &input).unwrap();
        assert_eq!(id, CodecId::None);
        assert_eq!(out, input);
    }
}
