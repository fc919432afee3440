//! The VBlock (variable block): the unit of parallel work carrying a
//! source-text slice, its contexts, lifecycle state, and output buffer.
//!
//! Grounded on spec §3's VBlock data model and the teacher's own per-job
//! unit shape in `threadpool.rs` (a `JobFn` closure plus completion
//! tracking) — generalized from "one closure" to "one struct with staged
//! lifecycle", since a VB's work spans parse/merge/compress rather than a
//! single call.

use crate::context::Context;
use crate::digest::DigestValue;

/// VB lifecycle states, transitioned strictly in this order by the
/// dispatcher (spec §2's Dispatcher bullet, §3's Lifecycle paragraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbState {
    Ready,
    Reading,
    ReadyToCompute,
    Computing,
    Processed,
    Written,
}

/// One unit of parallel work: a contiguous, record-boundary-aligned slice
/// of source text plus the contexts it populates.
pub struct VBlock {
    /// 1-based, file-global, monotonically increasing.
    pub vblock_i: u32,
    pub state: VbState,
    pub txt: Vec<u8>,
    /// Bytes past the last complete record, carried into the next VB by
    /// the reader (spec §4.1).
    pub unconsumed: Vec<u8>,
    /// This VB's record count, needed by the reconstructor to expand an
    /// all-the-same collapsed b250 stream back to its full length.
    pub record_count: u32,
    pub contexts: Vec<Context>,
    /// Finalized, codec-compressed section bytes, ready for the writer.
    pub output: Vec<u8>,
    pub digest_snapshot: Option<DigestValue>,
    /// Set when this VB's text ends mid-record (spec §4.1 special case —
    /// a single record legitimately exceeds VB size).
    pub ends_mid_record: bool,
}

impl VBlock {
    pub fn new(vblock_i: u32) -> Self {
        VBlock {
            vblock_i,
            state: VbState::Ready,
            txt: Vec::new(),
            unconsumed: Vec::new(),
            record_count: 0,
            contexts: Vec::new(),
            output: Vec::new(),
            digest_snapshot: None,
            ends_mid_record: false,
        }
    }

    pub fn context_mut(&mut self, did: u32) -> &mut Context {
        &mut self.contexts[did as usize]
    }

    pub fn context(&self, did: u32) -> &Context {
        &self.contexts[did as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vblock_starts_ready_with_no_contexts() {
        let vb = VBlock::new(1);
        assert_eq!(vb.state, VbState::Ready);
        assert!(vb.contexts.is_empty());
        assert_eq!(vb.vblock_i, 1);
    }
}
