//! Codec selector: samples a context's stream, trials candidate codecs on
//! the sample, and picks the one minimizing a weighted sum of bytes
//! produced and wall time spent — spec §4.6.
//!
//! Timing uses the kept [`crate::timefn`] helpers, the same clock source
//! the teacher crate's own benchmark harness used before it was trimmed.

use super::{Codec, CodecId};
use crate::config::CODEC_SAMPLE_BYTES;
use crate::error::Result;

/// Weight applied to elapsed time (in the same units as bytes) when
/// comparing candidates. Bytes dominate by default, per spec §4.6.
const TIME_WEIGHT: f64 = 0.01;

/// A codec pinned ahead of sampling, either because its shape demands it
/// (bitmap, transposed) or because an earlier VB already measured this
/// context and the hint carried forward.
#[derive(Debug, Clone, Copy)]
pub enum Override {
    Pinned(CodecId),
    Hint(CodecId),
}

/// Candidates considered for a general byte/int stream. Bitmap and
/// transposed candidates are excluded here since those are pre-assigned,
/// never sampled against (spec §4.6 "Pre-assigned overrides").
const GENERAL_CANDIDATES: [CodecId; 2] = [CodecId::General, CodecId::Acgt];

/// Picks a codec for `stream`, honoring a pre-assigned override if given,
/// else sampling a bounded prefix and trialing each general candidate.
/// Returns the chosen codec id plus a reusable hint for later VBs of the
/// same context.
pub fn select(stream: &[u8], pre_assigned: Option<Override>) -> Result<(CodecId, Override)> {
    if let Some(Override::Pinned(id)) = pre_assigned {
        return Ok((id, Override::Pinned(id)));
    }
    if let Some(Override::Hint(id)) = pre_assigned {
        return Ok((id, Override::Hint(id)));
    }

    let sample = &stream[..stream.len().min(CODEC_SAMPLE_BYTES)];
    let mut best: Option<(CodecId, f64)> = None;

    for &id in &GENERAL_CANDIDATES {
        let codec = make(id);
        let start = crate::timefn::get_time();
        let Ok(compressed) = codec.compress(sample) else {
            continue;
        };
        let elapsed_ms = crate::timefn::clock_span_ns(start) as f64 / 1_000_000.0;
        let score = compressed.len() as f64 + elapsed_ms * TIME_WEIGHT;
        if best.map(|(_, b)| score < b).unwrap_or(true) {
            best = Some((id, score));
        }
    }

    let chosen = best.map(|(id, _)| id).unwrap_or(CodecId::General);
    Ok((chosen, Override::Hint(chosen)))
}

fn make(id: CodecId) -> Box<dyn Codec> {
    match id {
        CodecId::Acgt => Box::new(super::acgt::AcgtCodec),
        _ => Box::new(super::general::GeneralCodec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_override_skips_sampling() {
        let (id, _) = select(b"irrelevant", Some(Override::Pinned(CodecId::Bitmap))).unwrap();
        assert_eq!(id, CodecId::Bitmap);
    }

    #[test]
    fn pure_acgt_sample_prefers_acgt_codec() {
        let seq = b"ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT".repeat(50);
        let (id, _) = select(&seq, None).unwrap();
        assert_eq!(id, CodecId::Acgt);
    }

    #[test]
    fn non_acgt_text_falls_back_to_general() {
        let text = b"the quick brown fox jumps over the lazy dog ".repeat(50);
        let (id, _) = select(&text, None).unwrap();
        assert_eq!(id, CodecId::General);
    }
}
