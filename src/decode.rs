//! Round-trip reconstruction: the inverse of [`crate::reader`] +
//! [`crate::vb_finalize`] + [`crate::writer`]. Walks a `.sz` file's
//! sections sequentially (every section is self-describing via its
//! header's `compressed_size`, so no directory is needed to step through
//! them), decompresses each context's b250/local streams, resolves
//! dictionary fragments, and hands the result to the format's
//! `FormatParser::reconstruct` to rebuild the original bytes.
//!
//! Per spec.md §1's non-goals, a general decompress CLI is out of scope —
//! this module exists to drive `--test` round-trip validation, the one
//! property spec §8 requires.

use crate::codec::decompress_with;
use crate::context::b250::{self, B250Width, WordIndex};
use crate::context::DictId;
use crate::digest::DigestValue;
use crate::error::{Result, SeqzipError};
use crate::format::FormatParser;
use crate::section::{SectionHeader, SectionType};
use crate::writer::{read_footer, TRAILER_LEN};
use std::collections::HashMap;

/// One context's decoded-but-not-yet-resolved VB contribution: an expanded
/// word-index stream (all-the-same already replayed to `record_count`-ish
/// full length) and its raw local bytes.
pub struct DecodedContext {
    pub dict_id: DictId,
    pub indices: Vec<WordIndex>,
    pub local: Vec<u8>,
}

/// One dict_id's file-global dictionary, indexable by word-index.
pub struct DecodedDict {
    dict: Vec<u8>,
    offsets: Vec<(u32, u32)>,
}

impl DecodedDict {
    fn from_raw(dict: Vec<u8>, node_lens: Vec<u32>) -> Self {
        let mut offsets = Vec::with_capacity(node_lens.len());
        let mut off = 0u32;
        for len in node_lens {
            offsets.push((off, len));
            off += len;
        }
        DecodedDict { dict, offsets }
    }

    pub fn snip(&self, word_index: u32) -> &[u8] {
        let (o, l) = self.offsets[word_index as usize];
        &self.dict[o as usize..(o + l) as usize]
    }
}

struct RawVb {
    vblock_i: u32,
    record_count: u32,
    digest: DigestValue,
    contexts: Vec<DecodedContext>,
}

/// Decompresses a whole `.sz` file, verifying every VB's digest snapshot
/// against the running digest of the reconstructed text, and returns the
/// reconstructed bytes plus the file's final digest.
pub fn decompress(file_bytes: &[u8], parser: &dyn FormatParser) -> Result<(Vec<u8>, DigestValue)> {
    if file_bytes.len() < TRAILER_LEN {
        return Err(SeqzipError::source_data("file too short", None));
    }
    let trailer_start = file_bytes.len() - TRAILER_LEN;
    let footer_len = u64::from_be_bytes(
        file_bytes[trailer_start..trailer_start + 8]
            .try_into()
            .unwrap(),
    ) as usize;
    let content_end = trailer_start
        .checked_sub(footer_len)
        .ok_or_else(|| SeqzipError::source_data("footer length exceeds file size", None))?;
    let _directory = read_footer(file_bytes)?;

    let mut pos = 0usize;
    let mut raw_vbs: Vec<RawVb> = Vec::new();
    let mut dict_raw: HashMap<DictId, (Vec<u8>, Vec<u32>)> = HashMap::new();

    let mut current: Option<RawVb> = None;

    while pos < content_end {
        let (header, hdr_len) = SectionHeader::read(&file_bytes[pos..])?;
        let payload_start = pos + hdr_len;
        let payload_end = payload_start + header.compressed_size as usize;
        let payload = &file_bytes[payload_start..payload_end];
        pos = payload_end;

        match header.section_type {
            SectionType::FileHeader => {}
            SectionType::VbHeader => {
                if let Some(vb) = current.take() {
                    raw_vbs.push(vb);
                }
                let raw = decompress_with(header.codec, payload, header.uncompressed_size as usize)?;
                let record_count = u32::from_be_bytes(raw[0..4].try_into().unwrap());
                let digest = DigestValue(u64::from_be_bytes(raw[8..16].try_into().unwrap()));
                current = Some(RawVb {
                    vblock_i: header.vblock_i,
                    record_count,
                    digest,
                    contexts: Vec::new(),
                });
            }
            SectionType::B250 => {
                let raw = decompress_with(header.codec, payload, header.uncompressed_size as usize)?;
                let width = B250Width::from_byte(raw[0])
                    .map_err(|e| SeqzipError::source_data(e, Some(header.vblock_i)))?;
                let element_count = u32::from_be_bytes(raw[1..5].try_into().unwrap());
                let mut indices = b250::decode(&raw[5..], width)
                    .map_err(|e| SeqzipError::source_data(e, Some(header.vblock_i)))?;
                if header
                    .flags
                    .contains(crate::section::SectionFlags::ALL_THE_SAME)
                    && indices.len() == 1
                {
                    let only = indices[0];
                    indices = vec![only; element_count as usize];
                }
                let vb = current
                    .as_mut()
                    .ok_or_else(|| SeqzipError::invariant("B250 section before any VbHeader"))?;
                vb.contexts.push(DecodedContext {
                    dict_id: header.dict_id,
                    indices,
                    local: Vec::new(),
                });
            }
            SectionType::Local => {
                let raw = decompress_with(header.codec, payload, header.uncompressed_size as usize)?;
                let vb = current
                    .as_mut()
                    .ok_or_else(|| SeqzipError::invariant("Local section before any VbHeader"))?;
                match vb.contexts.iter_mut().find(|c| c.dict_id == header.dict_id) {
                    Some(ctx) => ctx.local = raw,
                    None => vb.contexts.push(DecodedContext {
                        dict_id: header.dict_id,
                        indices: Vec::new(),
                        local: raw,
                    }),
                }
            }
            SectionType::DictFragment => {
                let raw = decompress_with(header.codec, payload, header.uncompressed_size as usize)?;
                let count = u32::from_be_bytes(raw[0..4].try_into().unwrap()) as usize;
                let mut lens = Vec::with_capacity(count);
                let mut p = 4;
                for _ in 0..count {
                    lens.push(u32::from_be_bytes(raw[p..p + 4].try_into().unwrap()));
                    p += 4;
                }
                dict_raw.insert(header.dict_id, (raw[p..].to_vec(), lens));
            }
            SectionType::Counts
            | SectionType::Aliases
            | SectionType::RandomAccessIndex
            | SectionType::Reference
            | SectionType::Footer => {}
        }
    }
    if let Some(vb) = current.take() {
        raw_vbs.push(vb);
    }

    let dicts: HashMap<DictId, DecodedDict> = parser
        .context_specs()
        .into_iter()
        .map(|spec| {
            let dict_id = DictId::new(spec.name);
            let (bytes, lens) = dict_raw.remove(&dict_id).unwrap_or_default();
            (dict_id, DecodedDict::from_raw(bytes, lens))
        })
        .collect();

    let mut out = Vec::new();
    let mut running_digest = crate::digest::Digest::new();
    for vb in &raw_vbs {
        let recon = parser.reconstruct(vb.record_count, &vb.contexts, &dicts)?;
        running_digest.update(&recon);
        if running_digest.snapshot() != vb.digest {
            return Err(SeqzipError::invariant(format!(
                "digest mismatch reconstructing vblock_i={}",
                vb.vblock_i
            )));
        }
        out.extend_from_slice(&recon);
    }

    let final_digest = running_digest.snapshot();
    Ok((out, final_digest))
}
