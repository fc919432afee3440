//! Per-VB finalization: the seven-step sequence that turns a VB's
//! populated contexts into a compressed output buffer, grounded on spec
//! §4.7 and the call order in `original_source/src/zip.c` around
//! `zip_compress_all_contexts_local` / `ctx_merge_in_vb_ctx` /
//! `zip_generate_b250`.

use crate::codec::selector::{self, Override};
use crate::codec::{compress_with, CodecId};
use crate::context::b250::{self, B250Width, WordIndex};
use crate::context::ltype::{self, LType};
use crate::dict::{DictTable, MergeOutcome};
use crate::digest::DigestValue;
use crate::error::Result;
use crate::section::{write_section, SectionFlags, SectionType};
use crate::vblock::VBlock;
use std::collections::HashMap;
use std::sync::Mutex;

/// Per-`dict_id` codec hint carried across VBs so later VBs can skip
/// resampling (spec §4.6, "Per-VB measurements may propagate as hints").
/// Shared across workers behind a `Mutex` since hints are read and written
/// from whichever VB happens to finalize, not ordered by `vblock_i`.
#[derive(Default)]
pub struct CodecHints {
    bcodec: HashMap<crate::context::DictId, Override>,
    lcodec: HashMap<crate::context::DictId, Override>,
}

/// Runs steps 1-7 of VB finalization, leaving `vb.output` populated with
/// every context's compressed b250 and local sections plus a VB header.
/// `vb.digest_snapshot` must already be set by the reader (single-threaded,
/// so the running digest stays strictly in `vblock_i` order even though
/// finalize itself runs on a worker pool).
pub fn finalize(vb: &mut VBlock, dict_table: &DictTable, hints: &Mutex<CodecHints>) -> Result<()> {
    // Step 1: resolve finalize order by dependency level (spec §4.7 step 1,
    // `local_dep` 0->2): every context at level k is fully finalized (steps
    // 2-6) before any context at level k+1 starts, so a dependent context
    // could read an earlier level's narrowed/transposed `local` bytes. No
    // bundled format declares `local_dep > 0` (every context defaults to
    // level 0), so today this sorts to the original `did` order and the
    // dependency barrier is structurally present but inert.
    let mut order: Vec<u32> = (0..vb.contexts.len() as u32).collect();
    order.sort_by_key(|&did| (vb.contexts[did as usize].local_dep, did));

    // Step 2: dynamic-width reduction for dyn_int contexts, and matrix
    // transpose for transposed_u* contexts, ahead of merge so the merged
    // word-index stream is generated against final ltypes.
    for &did in &order {
        let ctx = &mut vb.contexts[did as usize];
        match ctx.ltype {
            LType::DynInt => {
                // Pre-reduction elements arrive as 8-byte little-endian
                // i64s regardless of final sign/width (mirrors
                // `zip_resize_local`'s `ARRAY(int64_t, src, ctx->local)`
                // scan) so finalize can choose width and signedness together.
                let values: Vec<i64> = ctx
                    .local
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes(c.try_into().unwrap()))
                    .collect();
                let (chosen, bytes) = if values.iter().any(|&v| v < 0) {
                    ltype::reduce_dyn_int_signed(&values)
                } else {
                    let unsigned: Vec<u64> = values.iter().map(|&v| v as u64).collect();
                    ltype::reduce_dyn_int_unsigned(&unsigned)
                };
                ctx.ltype = chosen;
                ctx.local = bytes;
            }
            LType::TransposedU8 => {
                // Pre-finalize representation is one byte per matrix entry
                // (the narrowest possible assumption); narrow the same way
                // as dyn_int (reserving each width's top value), then
                // transpose at the chosen width. Mirrors scenario 6: a
                // mostly-8-bit matrix containing a 0xff entry widens to
                // transposed_u16 before the reorder.
                let cols = ctx.cols.max(1);
                let values: Vec<u64> = ctx.local.iter().map(|&b| b as u64).collect();
                let (chosen, packed) = ltype::reduce_dyn_int_unsigned(&values);
                let elem_width = ltype::width_bytes(chosen);
                match ltype::transpose_bytes(&packed, cols, elem_width) {
                    Some(transposed) => {
                        ctx.ltype = match chosen {
                            LType::U8 => LType::TransposedU8,
                            LType::U16 => LType::TransposedU16,
                            LType::U32 => LType::TransposedU32,
                            other => other,
                        };
                        ctx.local = transposed;
                    }
                    None => {
                        // spec §4.3: abandon transpose, emit as a plain
                        // (untransposed) vector at the narrowed width.
                        ctx.ltype = chosen;
                        ctx.local = packed;
                    }
                }
            }
            LType::TransposedU16 | LType::TransposedU32 => {
                // Parser already committed to a fixed width; only reorder.
                let cols = ctx.cols.max(1);
                let elem_width = ltype::width_bytes(ctx.ltype);
                match ltype::transpose_bytes(&ctx.local, cols, elem_width) {
                    Some(transposed) => ctx.local = transposed,
                    None => {
                        ctx.ltype = if ctx.ltype == LType::TransposedU16 {
                            LType::U16
                        } else {
                            LType::U32
                        };
                    }
                }
            }
            _ => {}
        }
    }

    // Step 3: bitmap tail-bit padding is computed lazily by the bitmap
    // codec itself at compress time (see `crate::codec::bitmap`); nothing
    // to precompute here beyond leaving `ctx.local` as one byte per bit.

    let mut outputs = Vec::new();

    let vblock_i = vb.vblock_i;
    let is_first_vb = vblock_i == 1;
    dict_table.begin_merge(vblock_i);
    let merge_result = (|| -> Result<()> {
        for &did in &order {
            // Step 4/merge: resolve node-indices to word-indices, promoting
            // singletons to local as instructed by the dictionary manager.
            let outcomes = {
                let ctx = vb.context_mut(did);
                dict_table.merge_vb(ctx, is_first_vb)
            };

            let ctx = vb.context_mut(did);
            let mut word_indices = Vec::with_capacity(outcomes.len());
            let mut max_word_index = 0u32;
            for outcome in &outcomes {
                match outcome {
                    MergeOutcome::WordIndex(w) => {
                        word_indices.push(WordIndex::Index(*w));
                        max_word_index = max_word_index.max(*w);
                    }
                    MergeOutcome::PromoteToLocal => {
                        // The dictionary manager already moved this snip's
                        // bytes into ctx.local during merge; mark the context
                        // so this VB doesn't re-promote (step 4). The b250
                        // element itself becomes a reserved escape rather than
                        // a real word-index.
                        ctx.flags.no_singletons = true;
                        word_indices.push(WordIndex::Missing);
                    }
                }
            }

            let element_count = word_indices.len() as u32;
            let has_escape = word_indices
                .iter()
                .any(|wi| matches!(wi, WordIndex::Missing | WordIndex::Empty));
            let all_the_same = ctx.all_the_same_index().is_some() && !word_indices.is_empty();
            let encode_indices: Vec<WordIndex> = if all_the_same {
                vec![word_indices[0]]
            } else {
                word_indices
            };

            // Escape codes (ONE_UP/MOST_FREQ/MISSING/EMPTY) are only
            // addressable in width >= 2 streams (see context::b250's module
            // doc and spec Open Question 2); widen past the natural
            // max-index width whenever a Missing/Empty marker is present.
            let mut width = B250Width::for_max_index(max_word_index);
            if has_escape && width == B250Width::Bytes1 {
                width = B250Width::Bytes2;
            }
            let mut b250_bytes = Vec::new();
            b250_bytes.push(width as u8);
            b250_bytes.extend_from_slice(&element_count.to_be_bytes());
            b250_bytes.extend_from_slice(&b250::encode(&encode_indices, width));

            // Step 5: codec selection, honoring pre-assigned overrides/hints.
            let pre_assigned = hints.lock().unwrap().bcodec.get(&ctx.dict_id).copied();
            let (b250_codec, b250_hint) = selector::select(&b250_bytes, pre_assigned)?;
            hints.lock().unwrap().bcodec.insert(ctx.dict_id, b250_hint);

            let (local_codec, local_hint) = if ctx.local.is_empty() {
                (CodecId::General, Override::Hint(CodecId::General))
            } else {
                let pre_assigned_local = pinned_override(ctx.ltype)
                    .or_else(|| hints.lock().unwrap().lcodec.get(&ctx.dict_id).copied());
                selector::select(&ctx.local, pre_assigned_local)?
            };
            hints.lock().unwrap().lcodec.insert(ctx.dict_id, local_hint);

            // Step 6: compress b250 and local into sections.
            let (b250_id, b250_compressed) = compress_with(b250_codec, &b250_bytes)?;
            let mut flags = SectionFlags::EMPTY;
            if all_the_same {
                flags = flags | SectionFlags::ALL_THE_SAME;
            }
            let mut section_buf = Vec::new();
            write_section(
                &mut section_buf,
                SectionType::B250,
                flags,
                vblock_i,
                b250_bytes.len() as u32,
                b250_id,
                ctx.dict_id,
                &b250_compressed,
            );

            if !ctx.local.is_empty() {
                let (local_id, local_compressed) = compress_with(local_codec, &ctx.local)?;
                write_section(
                    &mut section_buf,
                    SectionType::Local,
                    SectionFlags::EMPTY,
                    vblock_i,
                    ctx.local.len() as u32,
                    local_id,
                    ctx.dict_id,
                    &local_compressed,
                );
            }

            outputs.push(section_buf);
        }
        Ok(())
    })();
    dict_table.end_merge(vblock_i);
    merge_result?;

    // Step 7: VB header, then every context's sections.
    let mut out = Vec::new();
    write_vb_header(&mut out, vb);
    for section in outputs {
        out.extend_from_slice(&section);
    }
    vb.output = out;

    Ok(())
}

/// Pre-assigned codec overrides that pin a context's `local` codec ahead of
/// sampling (spec §4.6, "bitmaps always use the bitmap codec", "transposed
/// integer matrices use the transposed codec"). `b250` is never pinned this
/// way — these shapes only ever apply to the local stream.
fn pinned_override(ltype: LType) -> Option<Override> {
    match ltype {
        LType::Bitmap => Some(Override::Pinned(CodecId::Bitmap)),
        LType::TransposedU8 | LType::TransposedU16 | LType::TransposedU32 => {
            Some(Override::Pinned(CodecId::Transposed))
        }
        _ => None,
    }
}

fn write_vb_header(out: &mut Vec<u8>, vb: &VBlock) {
    let digest = vb.digest_snapshot.unwrap_or(DigestValue(0));
    let mut payload = Vec::with_capacity(4 + 4 + 8 + 4);
    payload.extend_from_slice(&vb.record_count.to_be_bytes());
    payload.extend_from_slice(&(vb.txt.len() as u32).to_be_bytes());
    payload.extend_from_slice(&digest.0.to_be_bytes());
    payload.extend_from_slice(&(vb.txt.len() as u32).to_be_bytes()); // recon-size
    write_section(
        out,
        SectionType::VbHeader,
        SectionFlags::EMPTY,
        vb.vblock_i,
        payload.len() as u32,
        CodecId::None,
        crate::context::DictId(0),
        &payload,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Context, DictId, LType};

    #[test]
    fn finalize_collapses_all_the_same_b250() {
        let table = DictTable::new();
        let hints = Mutex::new(CodecHints::default());

        let mut vb = VBlock::new(1);
        vb.txt = b"chr1\nchr1\nchr1\n".to_vec();
        vb.record_count = 3;
        vb.digest_snapshot = Some(crate::digest::digest_oneshot(&vb.txt));
        let mut ctx = Context::new(DictId::new("CHROM"), 0, LType::Sequence);
        let idx = ctx.intern(b"chr1");
        ctx.append_b250(idx);
        ctx.append_b250(idx);
        ctx.append_b250(idx);
        vb.contexts.push(ctx);

        finalize(&mut vb, &table, &hints).unwrap();
        assert!(!vb.output.is_empty());
    }

    #[test]
    fn pinned_override_dispatches_on_ltype() {
        assert!(matches!(
            pinned_override(LType::Bitmap),
            Some(Override::Pinned(CodecId::Bitmap))
        ));
        assert!(matches!(
            pinned_override(LType::TransposedU8),
            Some(Override::Pinned(CodecId::Transposed))
        ));
        assert!(matches!(
            pinned_override(LType::TransposedU16),
            Some(Override::Pinned(CodecId::Transposed))
        ));
        assert!(pinned_override(LType::Sequence).is_none());
    }

    /// Spec §8 scenario 6: a transposed matrix of 8-bit values (rows=100,
    /// cols=5) containing one 0xff entry must widen to `transposed_u16`
    /// (0xff is reserved as u8's missing sentinel) before the column-major
    /// reorder, and the local codec must be pinned to `Transposed` rather
    /// than sampled.
    #[test]
    fn finalize_widens_transposed_u8_on_reserved_sentinel_and_pins_transposed_codec() {
        let table = DictTable::new();
        let hints = Mutex::new(CodecHints::default());

        let mut vb = VBlock::new(1);
        vb.digest_snapshot = Some(crate::digest::digest_oneshot(&vb.txt));
        let mut ctx = Context::new(DictId::new("MATRIX"), 0, LType::TransposedU8);
        ctx.cols = 5;
        let mut values = vec![1u8; 100 * 5];
        values[42] = 0xff;
        ctx.append_local(&values);
        vb.contexts.push(ctx);

        finalize(&mut vb, &table, &hints).unwrap();
        assert_eq!(vb.contexts[0].ltype, LType::TransposedU16);

        let mut pos = 0;
        let mut saw_local_transposed = false;
        while pos + crate::section::HEADER_LEN <= vb.output.len() {
            let (hdr, len) = crate::section::SectionHeader::read(&vb.output[pos..]).unwrap();
            if hdr.section_type == SectionType::Local {
                assert_eq!(hdr.codec, CodecId::Transposed);
                saw_local_transposed = true;
            }
            pos += len + hdr.compressed_size as usize;
        }
        assert!(saw_local_transposed);
    }

    #[test]
    fn finalize_scans_dyn_int_at_source_width_and_routes_signed_through_zigzag() {
        let table = DictTable::new();
        let hints = Mutex::new(CodecHints::default());

        let mut vb = VBlock::new(1);
        vb.digest_snapshot = Some(crate::digest::digest_oneshot(&vb.txt));
        let mut ctx = Context::new(DictId::new("DELTA"), 0, LType::DynInt);
        // Values large enough that a per-byte scan (instead of 8-byte
        // elements) would mis-split them; includes a negative value so the
        // signed zig-zag path must be taken.
        for v in [-300i64, 1000, -1, 40000] {
            ctx.append_local(&v.to_le_bytes());
        }
        vb.contexts.push(ctx);

        finalize(&mut vb, &table, &hints).unwrap();
        assert_eq!(vb.contexts[0].ltype, LType::I32);
        assert_eq!(vb.contexts[0].local.len(), 4 * 4);
    }
}
