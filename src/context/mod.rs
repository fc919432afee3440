//! Per-column state: the dictionary/node table, the b250 node-index stream,
//! the local literal stream, and the flags/ltype/codec assignments attached
//! to one column of a source format.
//!
//! Grounded on spec §4.2-§4.3 and, for the intern/all-the-same mechanics,
//! on the node-table shape in `original_source/src/context.h`'s `Context`
//! struct (`nodes`, `dict`, `ol_nodes` fields) — generalized here to an
//! in-memory hash map keyed by the snip's XXH32 hash plus an equality check,
//! since this engine doesn't need `Context`'s on-disk-overlay split.

pub mod b250;
pub mod dict_id;
pub mod ltype;

pub use b250::WordIndex;
pub use dict_id::DictId;
pub use ltype::LType;

use crate::digest::xxh32_oneshot;
use std::collections::HashMap;

/// Per-context flags accumulated during segmentation and finalize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFlags {
    pub all_the_same: bool,
    pub no_singletons: bool,
    pub store_as_int: bool,
    pub paired: bool,
}

/// One unique snip's node-table entry: its offset/length in `dict` and how
/// many times it's been referenced this VB (used by the dictionary manager
/// to recognize singletons at merge time).
#[derive(Debug, Clone, Copy)]
pub struct NodeEntry {
    pub offset: u32,
    pub len: u32,
    pub count: u32,
}

/// Per-column state for one VBlock. Created fresh (from a dictionary clone,
/// see [`crate::dict`]) at the start of each VB and consumed by merge.
pub struct Context {
    pub dict_id: DictId,
    pub did: u32,
    pub dict: Vec<u8>,
    pub nodes: Vec<NodeEntry>,
    pub b250: Vec<u32>,
    pub local: Vec<u8>,
    pub ltype: LType,
    pub flags: ContextFlags,
    pub bcodec: Option<&'static str>,
    pub lcodec: Option<&'static str>,
    /// Column count for a `transposed_u*` ltype's matrix reorder (spec
    /// §4.3, "caller sets the column count"). Unused by every other ltype.
    pub cols: usize,
    /// Dependency level for finalize's ordering pass (spec §4.7 step 1): a
    /// context at level *k* may assume every context at level *<k* has
    /// already been finalized. Defaults to 0 (no dependency).
    pub local_dep: u8,
    /// hash(snip) -> candidate node-indices with that hash, checked by byte
    /// equality to resolve collisions. Node-indices below `global_len` are
    /// entries cloned from the global dictionary at VB start.
    index: HashMap<u32, Vec<u32>>,
    /// Number of nodes present at VB start (inherited from the global
    /// dictionary clone). Node-indices `< global_len` are not new snips.
    global_len: u32,
}

impl Context {
    pub fn new(dict_id: DictId, did: u32, ltype: LType) -> Self {
        Context {
            dict_id,
            did,
            dict: Vec::new(),
            nodes: Vec::new(),
            b250: Vec::new(),
            local: Vec::new(),
            ltype,
            flags: ContextFlags::default(),
            bcodec: None,
            lcodec: None,
            cols: 0,
            local_dep: 0,
            index: HashMap::new(),
            global_len: 0,
        }
    }

    /// Rebuilds a context from a cloned global dictionary snapshot, as
    /// called at the start of each VB (spec §4.5 step 1, "Clone").
    pub fn from_global_snapshot(
        dict_id: DictId,
        did: u32,
        ltype: LType,
        dict: Vec<u8>,
        nodes: Vec<NodeEntry>,
    ) -> Self {
        let global_len = nodes.len() as u32;
        let mut index: HashMap<u32, Vec<u32>> = HashMap::new();
        for (i, n) in nodes.iter().enumerate() {
            let bytes = &dict[n.offset as usize..(n.offset + n.len) as usize];
            index
                .entry(xxh32_oneshot(bytes, 0))
                .or_default()
                .push(i as u32);
        }
        Context {
            dict_id,
            did,
            dict,
            nodes,
            b250: Vec::new(),
            local: Vec::new(),
            ltype,
            flags: ContextFlags::default(),
            bcodec: None,
            lcodec: None,
            cols: 0,
            local_dep: 0,
            index,
            global_len,
        }
    }

    /// True if `node_index` was inherited from the global dictionary clone
    /// rather than interned fresh in this VB.
    pub fn is_preexisting(&self, node_index: u32) -> bool {
        node_index < self.global_len
    }

    pub fn snip_bytes(&self, node_index: u32) -> &[u8] {
        let n = &self.nodes[node_index as usize];
        &self.dict[n.offset as usize..(n.offset + n.len) as usize]
    }

    /// Interns `snip`, returning its VB-local node-index. O(|snip|) expected:
    /// one hash plus a bounded chain of byte comparisons.
    pub fn intern(&mut self, snip: &[u8]) -> u32 {
        let hash = xxh32_oneshot(snip, 0);
        if let Some(candidates) = self.index.get(&hash) {
            for &idx in candidates {
                if self.snip_bytes(idx) == snip {
                    self.nodes[idx as usize].count += 1;
                    return idx;
                }
            }
        }
        let offset = self.dict.len() as u32;
        self.dict.extend_from_slice(snip);
        let idx = self.nodes.len() as u32;
        self.nodes.push(NodeEntry {
            offset,
            len: snip.len() as u32,
            count: 1,
        });
        self.index.entry(hash).or_default().push(idx);
        idx
    }

    /// Pushes `node_index` onto `b250`, maintaining the all-the-same
    /// predicate: true only while every pushed index has been identical.
    pub fn append_b250(&mut self, node_index: u32) {
        if self.b250.is_empty() {
            self.flags.all_the_same = true;
        } else if Some(&node_index) != self.b250.last() {
            self.flags.all_the_same = false;
        }
        self.b250.push(node_index);
    }

    /// Appends raw bytes to `local`. Caller must have already set `ltype`.
    pub fn append_local(&mut self, bytes: &[u8]) {
        self.local.extend_from_slice(bytes);
    }

    /// `Some(node_index)` if every element of `b250` is that single index —
    /// the collapse condition for the all-the-same section (spec §4.4).
    pub fn all_the_same_index(&self) -> Option<u32> {
        if self.flags.all_the_same && !self.b250.is_empty() {
            Some(self.b250[0])
        } else {
            None
        }
    }
}

/// Reads length-prefixed singleton-promotion records out of a context's
/// `local` stream (written by `dict::merge_one_ctx` when it declines to
/// globalize a snip). Records appear in ascending VB-local node-index
/// order, which for a parser that interns then immediately appends to
/// `b250` matches the order each singleton's sole occurrence is seen when
/// decoding the b250 stream.
pub fn read_framed_local(local: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 4 <= local.len() {
        let len = u32::from_be_bytes(local[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        out.push(&local[pos..pos + len]);
        pos += len;
    }
    out
}

/// Appends `bytes` to `local` as a length-prefixed record (the inverse of
/// [`read_framed_local`]).
pub fn write_framed_local(local: &mut Vec<u8>, bytes: &[u8]) {
    local.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    local.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(DictId::new("CHROM"), 0, LType::Sequence)
    }

    #[test]
    fn intern_returns_stable_index_for_repeat_snip() {
        let mut c = ctx();
        let a = c.intern(b"chr1");
        let b = c.intern(b"chr2");
        let a2 = c.intern(b"chr1");
        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn all_the_same_survives_identical_run() {
        let mut c = ctx();
        let idx = c.intern(b"chr1");
        c.append_b250(idx);
        c.append_b250(idx);
        c.append_b250(idx);
        assert_eq!(c.all_the_same_index(), Some(idx));
    }

    #[test]
    fn all_the_same_invalidated_on_first_difference() {
        let mut c = ctx();
        let a = c.intern(b"chr1");
        let b = c.intern(b"chr2");
        c.append_b250(a);
        c.append_b250(a);
        c.append_b250(b);
        assert_eq!(c.all_the_same_index(), None);
    }

    #[test]
    fn framed_local_round_trips() {
        let mut local = Vec::new();
        write_framed_local(&mut local, b"chr1");
        write_framed_local(&mut local, b"contig_22");
        let records = read_framed_local(&local);
        assert_eq!(records, vec![b"chr1".as_slice(), b"contig_22".as_slice()]);
    }

    #[test]
    fn hash_collision_resolved_by_byte_equality() {
        let mut c = ctx();
        // Can't force a real xxh32 collision cheaply in a unit test; instead
        // verify two distinct snips that might share a bucket both resolve
        // to distinct, stable node-indices under repeated interning.
        let snips: Vec<&[u8]> = vec![b"a", b"b", b"c", b"a", b"b", b"c"];
        let idxs: Vec<u32> = snips.iter().map(|s| c.intern(s)).collect();
        assert_eq!(idxs[0], idxs[3]);
        assert_eq!(idxs[1], idxs[4]);
        assert_eq!(idxs[2], idxs[5]);
    }
}
