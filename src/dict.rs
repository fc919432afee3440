//! File-global dictionary table and the clone/intern/merge/rewrite protocol
//! that unifies each VB's private [`crate::context::Context`] into it.
//!
//! Grounded on spec §4.5 and on `zip.c`'s VB pipeline (`zip_generate_b250`,
//! the `ctx_sort_dictionaries_vb_1` call gated on `vb->vblock_i == 1`, and
//! the merge call serialized by a VB-index lock before b250 generation).
//! The lock here is a plain `Mutex` plus a `Condvar` used as a ticket
//! barrier, the same primitive the teacher's write-order buffer uses (see
//! [`crate::dispatcher`]), rather than a dedicated serializer type.

use crate::context::{Context, DictId, NodeEntry};
use std::collections::HashMap;
use std::sync::{Condvar, Mutex};

/// One dict_id's file-global, append-only snip table.
#[derive(Default)]
struct GlobalDict {
    dict: Vec<u8>,
    nodes: Vec<NodeEntry>,
    /// hash(snip) -> global node-indices with that hash.
    index: HashMap<u32, Vec<u32>>,
    /// Count of distinct VBs that have referenced a given global node-index
    /// so far. Used to decide singleton promotion (`count == 1` means only
    /// one VB has ever referenced it).
    vb_refs: Vec<u32>,
    /// Per-node flag: once a node has been seen referenced by more than one
    /// VB, singleton promotion is permanently disabled for it, even if a
    /// later VB's private dictionary never referenced it before
    /// (Open Question 3: cross-VB repeats permanently disable promotion).
    ever_multi_vb: Vec<bool>,
    sorted_vb1: bool,
}

/// Shared table of all dict_ids' [`GlobalDict`]s, plus the VB-index ticket
/// barrier that serializes merge (spec §4.5: "Merge order... strictly by
/// vblock_i ascending").
pub struct DictTable {
    dicts: Mutex<HashMap<DictId, GlobalDict>>,
    next_merge: Mutex<u32>,
    merge_cv: Condvar,
}

/// A context's dictionary state as handed to a worker at VB start (spec
/// §4.5 step 1, "Clone").
pub struct DictSnapshot {
    pub dict: Vec<u8>,
    pub nodes: Vec<NodeEntry>,
}

/// Per-node merge outcome, consumed by [`crate::context::b250`] rewriting
/// and VB finalize's singleton-promotion step.
#[derive(Debug, Clone, Copy)]
pub enum MergeOutcome {
    WordIndex(u32),
    /// Snip was a singleton at merge time and was not added to the global
    /// dictionary; caller must move its bytes into `local` instead.
    PromoteToLocal,
}

impl DictTable {
    pub fn new() -> Self {
        DictTable {
            dicts: Mutex::new(HashMap::new()),
            next_merge: Mutex::new(1),
            merge_cv: Condvar::new(),
        }
    }

    /// Step 1 ("Clone"): a read-only snapshot of the current global
    /// dictionary for `dict_id`, used as the VB's starting `Context` state.
    pub fn clone_for_vb(&self, dict_id: DictId) -> DictSnapshot {
        let dicts = self.dicts.lock().unwrap();
        match dicts.get(&dict_id) {
            Some(gd) => DictSnapshot {
                dict: gd.dict.clone(),
                nodes: gd.nodes.clone(),
            },
            None => DictSnapshot {
                dict: Vec::new(),
                nodes: Vec::new(),
            },
        }
    }

    /// Blocks the calling thread until VB #(vblock_i - 1) has completed its
    /// merge. A VB merges every one of its contexts under a single ticket, so
    /// callers must pair this with [`DictTable::end_merge`] once all of the
    /// VB's contexts have gone through [`DictTable::merge_vb`]. Mirrors the
    /// teacher's write-order ticket pattern in [`crate::dispatcher`] but
    /// keyed on merge rather than write.
    pub fn begin_merge(&self, vblock_i: u32) {
        let mut turn = self.next_merge.lock().unwrap();
        while *turn != vblock_i {
            turn = self.merge_cv.wait(turn).unwrap();
        }
    }

    /// Releases VB #vblock_i's merge turn, letting VB #(vblock_i + 1) proceed.
    pub fn end_merge(&self, vblock_i: u32) {
        let mut turn = self.next_merge.lock().unwrap();
        *turn = vblock_i + 1;
        self.merge_cv.notify_all();
    }

    /// Merges one context's snips into the global table. Must be called
    /// while holding the VB's merge turn (between [`DictTable::begin_merge`]
    /// and [`DictTable::end_merge`]); may be called once per context in the
    /// owning VB.
    pub fn merge_vb(&self, ctx: &mut Context, is_first_vb: bool) -> Vec<MergeOutcome> {
        let mut dicts = self.dicts.lock().unwrap();
        let gd = dicts.entry(ctx.dict_id).or_default();
        merge_one_ctx(gd, ctx, is_first_vb)
    }

    /// Final snapshot of every dict_id's accumulated dictionary, taken once
    /// all VBs have merged. Returns `(dict_id, dict_bytes, node_lens)` —
    /// node lengths rather than offsets, since offsets are recoverable by
    /// prefix-summing lengths in node order and the on-disk format only
    /// needs to carry one of the two.
    pub fn snapshot_all(&self) -> Vec<(DictId, Vec<u8>, Vec<u32>)> {
        let dicts = self.dicts.lock().unwrap();
        dicts
            .iter()
            .map(|(id, gd)| (*id, gd.dict.clone(), gd.nodes.iter().map(|n| n.len).collect()))
            .collect()
    }
}

impl Default for DictTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Merges one context's newly-interned snips (node-indices at or beyond the
/// snapshot's `global_len`) into `gd`, returning, for every node-index the
/// context's b250 stream references, whether it landed at a global
/// word-index or should be promoted to `local`.
///
/// Step 2 ("Parse & intern") already happened in the worker before this is
/// called; this function is step 3 ("Merge").
fn merge_one_ctx(gd: &mut GlobalDict, ctx: &mut Context, is_first_vb: bool) -> Vec<MergeOutcome> {
    let global_len_before = gd.nodes.len() as u32;

    // Tally how many times each VB-local node is referenced in this VB's
    // b250, to know at merge time whether a brand-new snip is a singleton.
    let mut local_ref_count = vec![0u32; ctx.nodes.len()];
    for &node_index in &ctx.b250 {
        local_ref_count[node_index as usize] += 1;
    }

    // node_index (VB-local) -> resolved global word-index, or None if
    // promoted to local.
    let mut resolved: Vec<Option<u32>> = Vec::with_capacity(ctx.nodes.len());

    for (i, _node) in ctx.nodes.iter().enumerate() {
        let node_index = i as u32;
        if ctx.is_preexisting(node_index) {
            // Already existed in the global dictionary at clone time; its
            // position there is unchanged (append-only).
            resolved.push(Some(node_index));
            if gd.ever_multi_vb.len() <= node_index as usize {
                gd.ever_multi_vb.resize(node_index as usize + 1, false);
                gd.vb_refs.resize(node_index as usize + 1, 0);
            }
            gd.vb_refs[node_index as usize] += 1;
            if gd.vb_refs[node_index as usize] > 1 {
                gd.ever_multi_vb[node_index as usize] = true;
            }
            continue;
        }

        let snip = ctx.snip_bytes(node_index);
        let hash = crate::digest::xxh32_oneshot(snip, 0);

        // Another VB may have already added this exact snip before this
        // VB's turn came up (it was new to this VB's clone, but another
        // concurrently-computing VB with a lower vblock_i merged it first).
        let mut existing_global = None;
        if let Some(candidates) = gd.index.get(&hash) {
            for &gi in candidates {
                let gn = &gd.nodes[gi as usize];
                if &gd.dict[gn.offset as usize..(gn.offset + gn.len) as usize] == snip {
                    existing_global = Some(gi);
                    break;
                }
            }
        }

        if let Some(gi) = existing_global {
            gd.vb_refs[gi as usize] += 1;
            gd.ever_multi_vb[gi as usize] = true; // a second VB just referenced it
            resolved.push(Some(gi));
            continue;
        }

        let referenced_in_this_vb = local_ref_count[node_index as usize] > 0;
        if referenced_in_this_vb && local_ref_count[node_index as usize] == 1 && !is_first_vb {
            // Singleton: referenced exactly once in this VB, and this VB did
            // not inherit it from the global dict, and it is not VB#1 (VB#1
            // always populates the dictionary so later VBs have something to
            // compare against). Decline to globalize it.
            resolved.push(None);
            continue;
        }

        let offset = gd.dict.len() as u32;
        gd.dict.extend_from_slice(snip);
        let gi = gd.nodes.len() as u32;
        gd.nodes.push(NodeEntry {
            offset,
            len: snip.len() as u32,
            count: 1,
        });
        gd.index.entry(hash).or_default().push(gi);
        gd.vb_refs.push(1);
        gd.ever_multi_vb.push(false);
        resolved.push(Some(gi));
    }

    // Singletons declined above keep their bytes out of the global
    // dictionary; move them into this context's `local` stream instead
    // (spec §4.2 "singleton_promotion").
    let promoted: Vec<Vec<u8>> = resolved
        .iter()
        .enumerate()
        .filter_map(|(i, r)| {
            if r.is_none() {
                Some(ctx.snip_bytes(i as u32).to_vec())
            } else {
                None
            }
        })
        .collect();
    for bytes in promoted {
        crate::context::write_framed_local(&mut ctx.local, &bytes);
    }

    // Step 5: VB#1 sorts its own contributions by observed frequency so low
    // word-indices tend to be the most common (spec §4.5 step 5).
    if is_first_vb && !gd.sorted_vb1 {
        sort_vb1_by_frequency(gd, global_len_before, ctx, &resolved);
        gd.sorted_vb1 = true;
    }

    // Step 4: rewrite this VB's b250 in place from node-index to the
    // resolved outcome.
    ctx.b250
        .iter()
        .map(|&node_index| match resolved[node_index as usize] {
            Some(word_index) => MergeOutcome::WordIndex(word_index),
            None => MergeOutcome::PromoteToLocal,
        })
        .collect()
}

/// Reorders the portion of `gd` newly added by VB#1 (word-indices at or
/// above `base`) by descending reference count, reassigning word-indices
/// densely from `base`. Any node whose word-index changes needs its
/// `index` bucket and cross-references fixed up; since this runs once,
/// immediately after VB#1's own append, no other VB has yet observed the
/// old indices.
fn sort_vb1_by_frequency(
    gd: &mut GlobalDict,
    base: u32,
    ctx: &Context,
    resolved: &[Option<u32>],
) {
    let mut counts = vec![0u32; gd.nodes.len() - base as usize];
    for (node_index, outcome) in resolved.iter().enumerate() {
        if let Some(gi) = outcome {
            if *gi >= base {
                let local_count = ctx
                    .b250
                    .iter()
                    .filter(|&&n| n == node_index as u32)
                    .count() as u32;
                counts[(*gi - base) as usize] += local_count;
            }
        }
    }

    let mut order: Vec<u32> = (0..counts.len() as u32).collect();
    order.sort_by(|&a, &b| counts[b as usize].cmp(&counts[a as usize]).then(a.cmp(&b)));

    // dict bytes stay put; only the nodes table (offset/len pointers) reorders.
    let old_nodes: Vec<NodeEntry> = gd.nodes[base as usize..].to_vec();

    let mut new_nodes = Vec::with_capacity(old_nodes.len());
    for &old_rank in &order {
        new_nodes.push(old_nodes[old_rank as usize]);
    }
    gd.nodes.truncate(base as usize);
    gd.nodes.extend(new_nodes);

    // Rebuild the hash index for the reordered tail.
    for gi in base..gd.nodes.len() as u32 {
        let n = gd.nodes[gi as usize];
        let snip = &gd.dict[n.offset as usize..(n.offset + n.len) as usize];
        let hash = crate::digest::xxh32_oneshot(snip, 0);
        let bucket = gd.index.entry(hash).or_default();
        bucket.retain(|&x| x < base);
        bucket.push(gi);
    }

    let tail_vb_refs: Vec<u32> = order
        .iter()
        .map(|&old_rank| gd.vb_refs[(base + old_rank) as usize])
        .collect();
    gd.vb_refs.truncate(base as usize);
    gd.vb_refs.extend(tail_vb_refs);

    let tail_multi: Vec<bool> = order
        .iter()
        .map(|&old_rank| gd.ever_multi_vb[(base + old_rank) as usize])
        .collect();
    gd.ever_multi_vb.truncate(base as usize);
    gd.ever_multi_vb.extend(tail_multi);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LType;

    #[test]
    fn first_merge_assigns_dense_word_indices() {
        let table = DictTable::new();
        let mut ctx = Context::new(DictId::new("CHROM"), 0, LType::Sequence);
        let a = ctx.intern(b"chr1");
        let b = ctx.intern(b"chr2");
        ctx.append_b250(a);
        ctx.append_b250(b);
        ctx.append_b250(a);

        table.begin_merge(1);
        let outcomes = table.merge_vb(&mut ctx, true);
        table.end_merge(1);
        let indices: Vec<u32> = outcomes
            .iter()
            .map(|o| match o {
                MergeOutcome::WordIndex(w) => *w,
                MergeOutcome::PromoteToLocal => panic!("unexpected singleton in VB#1"),
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 0]);
    }

    #[test]
    fn second_vb_reuses_global_word_index_for_known_snip() {
        let table = DictTable::new();

        let mut ctx1 = Context::new(DictId::new("CHROM"), 0, LType::Sequence);
        let a = ctx1.intern(b"chr1");
        ctx1.append_b250(a);
        ctx1.append_b250(a);
        table.begin_merge(1);
        table.merge_vb(&mut ctx1, true);
        table.end_merge(1);

        let snap = table.clone_for_vb(DictId::new("CHROM"));
        let mut ctx2 = Context::from_global_snapshot(
            DictId::new("CHROM"),
            0,
            LType::Sequence,
            snap.dict,
            snap.nodes,
        );
        let a2 = ctx2.intern(b"chr1");
        let c2 = ctx2.intern(b"chr3");
        ctx2.append_b250(a2);
        ctx2.append_b250(c2);

        table.begin_merge(2);
        let outcomes = table.merge_vb(&mut ctx2, false);
        table.end_merge(2);
        match outcomes[0] {
            MergeOutcome::WordIndex(0) => {}
            other => panic!("expected reused word-index 0, got {other:?}"),
        }
    }

    #[test]
    fn true_singleton_in_non_first_vb_promotes_to_local() {
        let table = DictTable::new();

        let mut ctx1 = Context::new(DictId::new("X"), 0, LType::Sequence);
        let a = ctx1.intern(b"common");
        ctx1.append_b250(a);
        table.begin_merge(1);
        table.merge_vb(&mut ctx1, true);
        table.end_merge(1);

        let snap = table.clone_for_vb(DictId::new("X"));
        let mut ctx2 =
            Context::from_global_snapshot(DictId::new("X"), 0, LType::Sequence, snap.dict, snap.nodes);
        let rare = ctx2.intern(b"once_only");
        ctx2.append_b250(rare);

        table.begin_merge(2);
        let outcomes = table.merge_vb(&mut ctx2, false);
        table.end_merge(2);
        assert!(matches!(outcomes[0], MergeOutcome::PromoteToLocal));
    }
}
