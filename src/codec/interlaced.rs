//! Interlaced signed-integer codec.
//!
//! The zig-zag interlace itself happens at VB finalize
//! ([`crate::context::ltype::zigzag_encode`]); this codec runs the
//! general-entropy stage over the already-interlaced buffer, tagged with a
//! distinct id so the reconstructor knows to zig-zag-decode the result.

use super::general::GeneralCodec;
use super::{Codec, CodecId};
use crate::error::Result;

pub struct InterlacedCodec;

impl Codec for InterlacedCodec {
    fn id(&self) -> CodecId {
        CodecId::Interlaced
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        GeneralCodec.compress(input)
    }

    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
        GeneralCodec.decompress(input, uncompressed_len)
    }
}
