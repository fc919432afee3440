//! Dictionary identifiers.
//!
//! Genozip packs up to 8 ASCII bytes of a field/subfield name into a u64 so
//! `DictId` is `Copy` and hashes cheaply as a map key. We keep that shape
//! rather than using a `String` key, since every [`crate::context::Context`]
//! lookup on the hot path goes through one of these.

use std::fmt;

/// An 8-byte-packed identifier for a context's dictionary, derived from a
/// field name (e.g. `CHROM`, `POS`, `SEQ`). Bytes beyond the 8th are dropped;
/// shorter names are zero-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DictId(pub u64);

impl DictId {
    /// Pack a field name into a `DictId`. Only the first 8 bytes are kept.
    pub fn new(name: &str) -> Self {
        let mut buf = [0u8; 8];
        let bytes = name.as_bytes();
        let n = bytes.len().min(8);
        buf[..n].copy_from_slice(&bytes[..n]);
        DictId(u64::from_le_bytes(buf))
    }

    /// Recover the (possibly zero-padded) name, for logging and section
    /// framing. Trailing NUL bytes are trimmed.
    pub fn as_str_lossy(&self) -> String {
        let bytes = self.0.to_le_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(8);
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }
}

impl fmt::Display for DictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl From<&str> for DictId {
    fn from(name: &str) -> Self {
        DictId::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_name() {
        let id = DictId::new("POS");
        assert_eq!(id.as_str_lossy(), "POS");
    }

    #[test]
    fn truncates_long_name() {
        let id = DictId::new("ABCDEFGHIJ");
        assert_eq!(id.as_str_lossy(), "ABCDEFGH");
    }

    #[test]
    fn equal_names_equal_ids() {
        assert_eq!(DictId::new("CHROM"), DictId::new("CHROM"));
        assert_ne!(DictId::new("CHROM"), DictId::new("POS"));
    }
}
