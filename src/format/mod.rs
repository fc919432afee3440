//! Source oracle traits: the seam between the generic engine and a
//! per-format parser (spec §6, "Source oracle"). Only a fixture FASTA-like
//! parser is implemented here, enough to drive the testable properties in
//! spec §8 — full format parsers (VCF, SAM/BAM, FASTQ, GFF3) are an
//! explicit non-goal.

pub mod fasta;

use crate::vblock::VBlock;

/// Result of probing a buffer for the last complete record boundary.
pub enum Boundary {
    /// Byte index (exclusive) of the last complete record in the buffer.
    Found(usize),
    /// Buffer doesn't contain a full record yet; read more before retrying.
    NeedMoreData,
    /// EOF reached with a trailing partial record that the format allows
    /// to stand alone (e.g. a FASTA sequence with no trailing newline).
    EofOk,
}

/// Locates the last complete record in `buf`, per spec §4.1's "boundary
/// oracle" contract.
pub trait BoundaryOracle {
    fn boundary(&self, buf: &[u8], at_eof: bool) -> Boundary;
}

/// Consumes a VB's text, populating its contexts via
/// `intern`/`append_b250`/`append_local` (spec §6, "Source oracle").
pub trait FormatParser: BoundaryOracle {
    /// Declares the contexts this format registers, in `did` order.
    fn context_specs(&self) -> Vec<ContextSpec>;

    /// Parses `vb.txt`, populating `vb.contexts` (already allocated per
    /// `context_specs`) and `vb.record_count`.
    fn parse(&self, vb: &mut VBlock) -> crate::error::Result<()>;

    /// Declares whether a column's dictionary is expected to stay small,
    /// influencing codec hints (spec §6).
    fn dict_id_small(&self, dict_id: crate::context::DictId) -> bool {
        let _ = dict_id;
        false
    }

    /// Inverse of `parse`: rebuilds one VB's original text from its decoded
    /// contexts (the round-trip validation path — see [`crate::decode`]).
    fn reconstruct(
        &self,
        record_count: u32,
        contexts: &[crate::decode::DecodedContext],
        dicts: &std::collections::HashMap<crate::context::DictId, crate::decode::DecodedDict>,
    ) -> crate::error::Result<Vec<u8>>;
}

pub struct ContextSpec {
    pub name: &'static str,
    pub ltype: crate::context::LType,
    /// Column count for a `transposed_u*` ltype (spec §4.3); ignored by
    /// every other ltype.
    pub cols: usize,
    /// Finalize dependency level (spec §4.7 step 1); 0 if this context
    /// reads nothing else's finalized `local`.
    pub local_dep: u8,
}
