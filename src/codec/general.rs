//! General-purpose entropy codec: the kept LZ4 block compressor, reused
//! here as the codec bank's default candidate for any stream that doesn't
//! match a more specialized codec's shape.

use super::Codec;
use crate::block;
use crate::error::{Result, SeqzipError};

pub struct GeneralCodec;

impl Codec for GeneralCodec {
    fn id(&self) -> super::CodecId {
        super::CodecId::General
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let bound = block::compress_bound(input.len() as i32);
        if bound <= 0 {
            return Err(SeqzipError::invariant("input too large for LZ4 block codec"));
        }
        let mut dst = vec![0u8; bound as usize];
        let n = block::compress_default(input, &mut dst)
            .map_err(|e| SeqzipError::resource(format!("general codec compress: {e:?}")))?;
        dst.truncate(n);
        Ok(dst)
    }

    fn decompress(&self, input: &[u8], uncompressed_len: usize) -> Result<Vec<u8>> {
        let mut dst = vec![0u8; uncompressed_len];
        let n = block::decompress_safe(input, &mut dst)
            .map_err(|e| SeqzipError::source_data(format!("general codec decompress: {e:?}"), None))?;
        if n != uncompressed_len {
            return Err(SeqzipError::invariant(format!(
                "general codec decompressed {n} bytes, expected {uncompressed_len}"
            )));
        }
        Ok(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_compressible_text() {
        let input = b"abababababababababababababababab".repeat(10);
        let codec = GeneralCodec;
        let compressed = codec.compress(&input).unwrap();
        assert!(compressed.len() < input.len());
        let back = codec.decompress(&compressed, input.len()).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn round_trips_empty_input() {
        let codec = GeneralCodec;
        let compressed = codec.compress(&[]).unwrap();
        let back = codec.decompress(&compressed, 0).unwrap();
        assert_eq!(back, Vec::<u8>::new());
    }
}
