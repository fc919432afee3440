//! b250 stream encoding: word-indices packed into a variable-width byte
//! stream with single-byte escapes for common cases.
//!
//! Grounded directly on `zip_generate_one_b250` in the original
//! implementation: `ONE_UP` is checked before `MOST_FREQ`, and both are
//! only considered once the natural element width is at least 2 bytes —
//! below that, the full single-byte range is needed to address the
//! dictionary directly and escapes would only get in the way.

use std::fmt;

/// Fixed element width a b250 stream is encoded at, chosen from the largest
/// word-index that will appear in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum B250Width {
    Bytes1 = 1,
    Bytes2 = 2,
    Bytes3 = 3,
    Bytes4 = 4,
}

impl B250Width {
    /// Narrowest width that can hold `max_word_index`.
    pub fn for_max_index(max_word_index: u32) -> Self {
        if max_word_index <= 0xff {
            B250Width::Bytes1
        } else if max_word_index <= 0xffff {
            B250Width::Bytes2
        } else if max_word_index <= 0xff_ffff {
            B250Width::Bytes3
        } else {
            B250Width::Bytes4
        }
    }

    pub fn from_byte(b: u8) -> Result<Self, String> {
        match b {
            1 => Ok(B250Width::Bytes1),
            2 => Ok(B250Width::Bytes2),
            3 => Ok(B250Width::Bytes3),
            4 => Ok(B250Width::Bytes4),
            other => Err(format!("unknown b250 width tag {other}")),
        }
    }

    fn byte_count(self) -> usize {
        match self {
            B250Width::Bytes1 => 1,
            B250Width::Bytes2 => 2,
            B250Width::Bytes3 => 3,
            B250Width::Bytes4 => 4,
        }
    }
}

/// A word-index for one record's b250 element, or one of two sentinel
/// states for a missing/empty column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordIndex {
    Index(u32),
    Missing,
    Empty,
}

/// Single-byte escape codes. Values chosen to sit outside any width-1
/// word-index's addressable range is not possible (bytes1 mode never emits
/// escapes), so these only appear in bytes2/3/4 streams, tagged by the
/// section header's width field rather than by scanning for a magic byte
/// (see §4.4 / DESIGN.md Open Question 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Escape {
    OneUp = 0xfe,
    MostFreq0 = 0xfb,
    MostFreq1 = 0xfc,
    MostFreq2 = 0xfd,
    MissingSf = 0xff,
    EmptySf = 0xfa,
}

/// Encodes a VB's sequence of word-indices into a byte stream at the given
/// width, applying the `ONE_UP`/`MOST_FREQ`/`MISSING`/`EMPTY` escapes.
pub fn encode(indices: &[WordIndex], width: B250Width) -> Vec<u8> {
    let mut out = Vec::with_capacity(indices.len() * width.byte_count().max(1));
    let mut prev: i64 = -1;

    for (word_i, wi) in indices.iter().enumerate() {
        match *wi {
            WordIndex::Missing => {
                debug_assert!(width != B250Width::Bytes1, "Missing requires width >= 2");
                out.push(Escape::MissingSf as u8);
                prev = -1;
            }
            WordIndex::Empty => {
                debug_assert!(width != B250Width::Bytes1, "Empty requires width >= 2");
                out.push(Escape::EmptySf as u8);
                prev = -1;
            }
            WordIndex::Index(idx) => {
                let one_up = width != B250Width::Bytes1
                    && word_i > 0
                    && i64::from(idx) == prev + 1;

                if one_up {
                    out.push(Escape::OneUp as u8);
                } else if width == B250Width::Bytes1 {
                    out.push(idx as u8);
                } else if idx <= 2 {
                    out.push(match idx {
                        0 => Escape::MostFreq0 as u8,
                        1 => Escape::MostFreq1 as u8,
                        _ => Escape::MostFreq2 as u8,
                    });
                } else {
                    let bytes = idx.to_be_bytes();
                    out.extend_from_slice(&bytes[4 - width.byte_count()..]);
                }
                prev = i64::from(idx);
            }
        }
    }
    out
}

/// Decodes a byte stream back into word-indices. `width` and `record_count`
/// come from the section header (width) and VB record count (for
/// all-the-same expansion, handled by the caller, not here).
pub fn decode(bytes: &[u8], width: B250Width) -> Result<Vec<WordIndex>, String> {
    let mut out = Vec::new();
    let mut prev: i64 = -1;
    let mut word_i: usize = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        if width != B250Width::Bytes1 && b == Escape::MissingSf as u8 {
            out.push(WordIndex::Missing);
            prev = -1;
            pos += 1;
        } else if width != B250Width::Bytes1 && b == Escape::EmptySf as u8 {
            out.push(WordIndex::Empty);
            prev = -1;
            pos += 1;
        } else if width != B250Width::Bytes1 && b == Escape::OneUp as u8 && word_i > 0 {
            let idx = (prev + 1) as u32;
            out.push(WordIndex::Index(idx));
            prev = i64::from(idx);
            pos += 1;
        } else if width != B250Width::Bytes1
            && matches!(
                b,
                x if x == Escape::MostFreq0 as u8
                    || x == Escape::MostFreq1 as u8
                    || x == Escape::MostFreq2 as u8
            )
        {
            let idx = b - Escape::MostFreq0 as u8;
            out.push(WordIndex::Index(idx as u32));
            prev = i64::from(idx);
            pos += 1;
        } else {
            let n = width.byte_count();
            if pos + n > bytes.len() {
                return Err(format!(
                    "truncated b250 stream at element {word_i}: need {n} bytes, {} left",
                    bytes.len() - pos
                ));
            }
            let mut buf = [0u8; 4];
            buf[4 - n..].copy_from_slice(&bytes[pos..pos + n]);
            let idx = u32::from_be_bytes(buf);
            out.push(WordIndex::Index(idx));
            prev = i64::from(idx);
            pos += n;
        }
        word_i += 1;
    }
    Ok(out)
}

impl fmt::Display for WordIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordIndex::Index(i) => write!(f, "{i}"),
            WordIndex::Missing => write!(f, "MISSING"),
            WordIndex::Empty => write!(f, "EMPTY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes1_mode_never_escapes() {
        let indices = vec![WordIndex::Index(0), WordIndex::Index(1), WordIndex::Index(5)];
        let enc = encode(&indices, B250Width::Bytes1);
        assert_eq!(enc, vec![0, 1, 5]);
    }

    #[test]
    fn one_up_wins_over_most_freq() {
        // word 0: index 0 (first element, no ONE_UP). word 1: index 1, which
        // is both "one greater than prev" and <= 2 — ONE_UP must win.
        let indices = vec![WordIndex::Index(0), WordIndex::Index(1)];
        let enc = encode(&indices, B250Width::Bytes2);
        assert_eq!(enc, vec![Escape::MostFreq0 as u8, Escape::OneUp as u8]);
    }

    #[test]
    fn one_up_never_first_element() {
        let indices = vec![WordIndex::Index(0)];
        let enc = encode(&indices, B250Width::Bytes2);
        assert_eq!(enc, vec![Escape::MostFreq0 as u8]);
    }

    #[test]
    fn missing_and_empty_round_trip() {
        let indices = vec![WordIndex::Missing, WordIndex::Empty, WordIndex::Index(9)];
        let enc = encode(&indices, B250Width::Bytes2);
        let dec = decode(&enc, B250Width::Bytes2).unwrap();
        assert_eq!(dec, indices);
    }

    #[test]
    fn round_trip_wide_values() {
        let indices: Vec<WordIndex> = (0..500).map(WordIndex::Index).collect();
        let width = B250Width::for_max_index(499);
        let enc = encode(&indices, width);
        let dec = decode(&enc, width).unwrap();
        assert_eq!(dec, indices);
    }

    #[test]
    fn missing_after_one_up_resets_prev() {
        // After MISSING, prev resets to -1, so a following Index(0) cannot
        // be mistaken for a ONE_UP continuation of whatever came before.
        let indices = vec![
            WordIndex::Index(5),
            WordIndex::Missing,
            WordIndex::Index(6),
        ];
        let enc = encode(&indices, B250Width::Bytes2);
        let dec = decode(&enc, B250Width::Bytes2).unwrap();
        assert_eq!(dec, indices);
    }
}
