//! LZ4 block compression and decompression.
//!
//! Generic byte-oriented LZ compressor used as the "general entropy" codec
//! in the codec bank (see [`crate::codec::general`]) — the b250 and local
//! streams of most contexts end up here when no more specialized codec wins
//! the sampling contest in [`crate::codec::selector`].

pub mod compress;
pub mod decompress_api;
pub mod decompress_core;
pub mod types;

pub use compress::{
    compress_bound, compress_default, compress_dest_size, compress_fast, Lz4Error,
    LZ4_ACCELERATION_DEFAULT, LZ4_ACCELERATION_MAX, LZ4_MAX_INPUT_SIZE,
};
pub use decompress_api::{decompress_safe, decompress_safe_partial, BlockDecompressError};
pub use types::LZ4_DISTANCE_MAX;
