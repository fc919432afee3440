//! Running content digest over source bytes, with per-VB snapshots.
//!
//! Thin wrapper around the `xxhash-rust` crate: XXH3-64 for the running
//! whole-file digest (kept across the file's lifetime and snapshotted after
//! every VB so [`crate::vblock::VBlock::digest_snapshot`] can be compared
//! against a reconstruction), XXH32 for the short-snip hashing used by
//! [`crate::context::Context::intern`]'s node lookup. Mirrors the teacher
//! crate's `xxhash.rs`, extended from a one-shot hash to a running
//! accumulator since this engine needs one digest per file, not per block.

use xxhash_rust::xxh3::Xxh3;

pub use xxhash_rust::xxh32::Xxh32 as Xxh32State;

/// One-shot XXH32 hash, used to hash a snip's bytes for node-table lookup.
#[inline]
pub fn xxh32_oneshot(data: &[u8], seed: u32) -> u32 {
    xxhash_rust::xxh32::xxh32(data, seed)
}

/// A stable 64-bit digest value, opaque outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DigestValue(pub u64);

impl std::fmt::Display for DigestValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Running digest over the entire source text, fed incrementally as the
/// reader hands VB-sized chunks to workers. One `Digest` lives on the
/// z-file for its whole lifetime (see spec §3, Digest component in §2).
#[derive(Default)]
pub struct Digest {
    hasher: Xxh3,
}

impl Digest {
    pub fn new() -> Self {
        Digest {
            hasher: Xxh3::new(),
        }
    }

    /// Feed the next contiguous slice of source text. Callers must feed
    /// slices in file order — the digest is order-sensitive.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Snapshot the digest of everything fed so far. Cheap: XXH3's internal
    /// state can be finalized without consuming it.
    pub fn snapshot(&self) -> DigestValue {
        DigestValue(self.hasher.digest())
    }
}

/// Compute the digest of a single buffer in one call, used by `--test` mode
/// to compare a decompressed buffer's digest to its VB snapshot.
pub fn digest_oneshot(bytes: &[u8]) -> DigestValue {
    let mut d = Digest::new();
    d.update(bytes);
    d.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_digest_matches_oneshot() {
        let mut d = Digest::new();
        d.update(b"hello ");
        d.update(b"world");
        assert_eq!(d.snapshot(), digest_oneshot(b"hello world"));
    }

    #[test]
    fn empty_digest_is_stable() {
        assert_eq!(digest_oneshot(b""), digest_oneshot(b""));
    }

    #[test]
    fn xxh32_oneshot_matches_crate() {
        assert_eq!(xxh32_oneshot(b"", 0), xxhash_rust::xxh32::xxh32(b"", 0));
    }
}
