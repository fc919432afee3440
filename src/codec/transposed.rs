//! Transposed integer matrix codec.
//!
//! The column-major reorder itself happens at VB finalize time
//! ([`crate::context::ltype::transpose_bytes`]) since it depends on knowing
//! the column count, which this codec doesn't carry. By the time a buffer
//! reaches here it's already column-major; this codec only runs the
//! general-entropy stage over it, stamped with a distinct id so the
//! reconstructor knows to un-transpose after decompressing.

use super::general::GeneralCodec;
use super::{Codec, CodecId};
use crate::error::Result;

pub struct TransposedCodec;

impl Codec for TransposedCodec {
    fn id(&self) -> CodecId {
        CodecId::Transposed
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        GeneralCodec.compress(input)
    }

    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
        GeneralCodec.decompress(input, uncompressed_len)
    }
}
