//! Global-area writer: after the last VB is written, emits the file
//! header, per-`dict_id` dictionary fragments, and the footer directory
//! that indexes every section (spec §4.9).
//!
//! The reference payload, chrom-to-reference map, alias table, stats
//! block, and random-access index are file-global sections whose
//! *contents* depend on subsystems out of scope here (spec §1 non-goals);
//! this writer emits their section framing with empty payloads so the
//! on-disk layout is complete and round-trippable, matching spec §4.9's
//! ordering even where the payload itself is a stub.

use crate::codec::{compress_with, CodecId};
use crate::context::DictId;
use crate::error::Result;
use crate::section::{write_section, SectionFlags, SectionHeader, SectionType, MAGIC};
use std::io::Write;

pub const FORMAT_VERSION: u16 = 1;

/// Wraps any `Write` to track the number of bytes written so far, so the
/// global-area writer can record accurate section offsets while streaming
/// straight to a file instead of buffering the whole output in memory.
pub struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        CountingWriter { inner, count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// One dict_id's accumulated dictionary, ready to be framed as a section.
/// `node_lens` carries each node's byte length in dictionary order, so a
/// reader can split the concatenated `dict_bytes` back into individual
/// snips by prefix-summing — no separate offset table is persisted.
pub struct DictFragment {
    pub dict_id: DictId,
    pub dict_bytes: Vec<u8>,
    pub node_lens: Vec<u32>,
}

/// Writes the file header (data type, format version, flags, creation
/// metadata). Placed first; `data_type` is a small tag supplied by the
/// caller (the format parser's identity), since per-format typing is a
/// non-goal here.
pub fn write_file_header<W: Write>(out: &mut W, data_type: u8) -> Result<()> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
    payload.push(data_type);
    payload.push(0); // flags, reserved

    let mut buf = Vec::new();
    write_section(
        &mut buf,
        SectionType::FileHeader,
        SectionFlags::EMPTY,
        0,
        payload.len() as u32,
        CodecId::None,
        DictId(0),
        &payload,
    );
    out.write_all(&buf)?;
    Ok(())
}

/// Emits the global area in spec §4.9 order and returns the directory
/// entries describing every section written (offset relative to the
/// start of this call, to be combined by the caller with the VB-section
/// byte count already written).
pub fn write_global_area<W: Write>(
    out: &mut W,
    base_offset: u64,
    dict_fragments: &[DictFragment],
) -> Result<Vec<(SectionType, u32, u64, u64)>> {
    let mut directory = Vec::new();
    let mut offset = base_offset;

    for frag in dict_fragments {
        let mut raw = Vec::with_capacity(4 + frag.node_lens.len() * 4 + frag.dict_bytes.len());
        raw.extend_from_slice(&(frag.node_lens.len() as u32).to_be_bytes());
        for len in &frag.node_lens {
            raw.extend_from_slice(&len.to_be_bytes());
        }
        raw.extend_from_slice(&frag.dict_bytes);

        let mut buf = Vec::new();
        let (codec, compressed) = compress_with(CodecId::General, &raw)?;
        write_section(
            &mut buf,
            SectionType::DictFragment,
            SectionFlags::EMPTY,
            0,
            raw.len() as u32,
            codec,
            frag.dict_id,
            &compressed,
        );
        out.write_all(&buf)?;
        directory.push((SectionType::DictFragment, 0, offset, buf.len() as u64));
        offset += buf.len() as u64;
    }

    // Stub sections for subsystems out of scope (spec §1 non-goals): empty
    // payloads, present so the on-disk layout matches §4.9's ordering.
    for st in [
        SectionType::Counts,
        SectionType::Aliases,
        SectionType::RandomAccessIndex,
        SectionType::Reference,
    ] {
        let mut buf = Vec::new();
        write_section(&mut buf, st, SectionFlags::EMPTY, 0, 0, CodecId::None, DictId(0), &[]);
        out.write_all(&buf)?;
        directory.push((st, 0, offset, buf.len() as u64));
        offset += buf.len() as u64;
    }

    Ok(directory)
}

/// Writes the footer: a directory of every section by offset and length,
/// followed by a fixed-size trailer so a reader can find it by seeking to
/// file-end minus that fixed size (spec §4.9).
pub fn write_footer<W: Write>(out: &mut W, directory: &[(SectionType, u32, u64, u64)]) -> Result<()> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&(directory.len() as u32).to_be_bytes());
    for (st, vblock_i, offset, length) in directory {
        payload.push(*st as u8);
        payload.extend_from_slice(&vblock_i.to_be_bytes());
        payload.extend_from_slice(&offset.to_be_bytes());
        payload.extend_from_slice(&length.to_be_bytes());
    }

    let mut buf = Vec::new();
    write_section(
        &mut buf,
        SectionType::Footer,
        SectionFlags::EMPTY,
        0,
        payload.len() as u32,
        CodecId::None,
        DictId(0),
        &payload,
    );

    // Fixed-size trailer: byte length of the footer section, so a reader
    // seeks to file-end minus this constant to find where the footer
    // section itself begins.
    let trailer_len = (buf.len() as u64).to_be_bytes();

    out.write_all(&buf)?;
    out.write_all(&trailer_len)?;
    out.write_all(&MAGIC)?;
    Ok(())
}

pub const TRAILER_LEN: usize = 8 + 4;

/// Reads the footer directory from a complete file's bytes, by seeking
/// from the end using the fixed trailer.
pub fn read_footer(file_bytes: &[u8]) -> Result<Vec<(SectionType, u32, u64, u64)>> {
    use crate::error::SeqzipError;

    if file_bytes.len() < TRAILER_LEN {
        return Err(SeqzipError::source_data("file too short for footer trailer", None));
    }
    let trailer_start = file_bytes.len() - TRAILER_LEN;
    if file_bytes[trailer_start + 8..] != MAGIC {
        return Err(SeqzipError::source_data("bad trailer magic", None));
    }
    let footer_len =
        u64::from_be_bytes(file_bytes[trailer_start..trailer_start + 8].try_into().unwrap()) as usize;
    let footer_start = trailer_start
        .checked_sub(footer_len)
        .ok_or_else(|| SeqzipError::source_data("footer length exceeds file size", None))?;

    let (header, hdr_len) = SectionHeader::read(&file_bytes[footer_start..])?;
    if header.section_type as u8 != SectionType::Footer as u8 {
        return Err(SeqzipError::source_data("expected footer section", None));
    }
    let payload_start = footer_start + hdr_len;
    let payload = &file_bytes[payload_start..payload_start + header.compressed_size as usize];

    let n = u32::from_be_bytes(payload[0..4].try_into().unwrap()) as usize;
    let mut directory = Vec::with_capacity(n);
    let mut pos = 4;
    for _ in 0..n {
        let st = SectionType::from_byte(payload[pos])?;
        let vblock_i = u32::from_be_bytes(payload[pos + 1..pos + 5].try_into().unwrap());
        let offset = u64::from_be_bytes(payload[pos + 5..pos + 13].try_into().unwrap());
        let length = u64::from_be_bytes(payload[pos + 13..pos + 21].try_into().unwrap());
        directory.push((st, vblock_i, offset, length));
        pos += 21;
    }
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_round_trips_directory() {
        let mut out = Vec::new();
        write_file_header(&mut out, 1).unwrap();
        let base = out.len() as u64;
        let dirs = write_global_area(&mut out, base, &[]).unwrap();
        write_footer(&mut out, &dirs).unwrap();

        let read_back = read_footer(&out).unwrap();
        assert_eq!(read_back.len(), dirs.len());
    }
}
