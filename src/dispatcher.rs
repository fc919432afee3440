//! Dispatcher: the bounded-concurrency pipeline that reads, computes, and
//! writes VBs while preserving write order (spec §4.8).
//!
//! Reading and digesting happen single-threaded on the main thread (so the
//! running digest stays strictly ordered without its own barrier); compute
//! (parse + merge + codec selection + compression) runs on the kept
//! [`crate::threadpool::TPool`]; writing happens back on the main thread
//! through a `BTreeMap` reordering buffer, generalized from the teacher's
//! write-order-register pattern used to keep LZ4 frame blocks in order
//! under out-of-order parallel compression.

use crate::context::Context;
use crate::digest::{Digest, DigestValue};
use crate::dict::DictTable;
use crate::error::{Result, SeqzipError};
use crate::format::FormatParser;
use crate::reader::Chunker;
use crate::threadpool::TPool;
use crate::vb_finalize::{self, CodecHints};
use crate::vblock::VBlock;
use crossbeam_channel::{unbounded, Sender};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

pub struct RunStats {
    pub vblocks: u32,
    pub final_digest: DigestValue,
}

/// Runs the full reader -> compute -> write pipeline over `source`,
/// emitting sections to `out` via `write_section_bytes` as each VB becomes
/// writable in order.
pub fn run<R, W>(
    source: R,
    parser: Arc<dyn FormatParser + Send + Sync>,
    out: &mut W,
    vb_size_bytes: usize,
    nb_workers: usize,
    dict_table: Arc<DictTable>,
) -> Result<RunStats>
where
    R: Read,
    W: Write,
{
    let hints = Arc::new(Mutex::new(CodecHints::default()));
    let pool = TPool::new(
        nb_workers.max(1),
        crate::config::DISPATCHER_QUEUE_SLACK + nb_workers.max(1),
    )
    .ok_or_else(|| SeqzipError::resource("failed to start worker pool"))?;

    let (result_tx, result_rx): (Sender<Result<VBlock>>, _) = unbounded();
    let fatal: Arc<Mutex<Option<SeqzipError>>> = Arc::new(Mutex::new(None));

    let mut chunker = Chunker::new(source, vb_size_bytes);
    let mut running_digest = Digest::new();
    let mut pending_writes: BTreeMap<u32, VBlock> = BTreeMap::new();
    let mut next_to_write: u32 = 1;
    let mut vblock_i: u32 = 1;
    let mut total_vblocks: u32 = 0;
    let mut vb_txt = Vec::new();

    loop {
        if fatal.lock().unwrap().is_some() {
            break;
        }

        let has_more = chunker.read_next_vb(parser.as_ref(), &mut vb_txt)?;
        if !has_more {
            break;
        }

        let mut vb = VBlock::new(vblock_i);
        vb.txt = std::mem::take(&mut vb_txt);
        running_digest.update(&vb.txt);
        vb.digest_snapshot = Some(running_digest.snapshot());

        for spec in parser.context_specs() {
            let dict_id = crate::context::DictId::new(spec.name);
            let snap = dict_table.clone_for_vb(dict_id);
            let mut ctx = Context::from_global_snapshot(
                dict_id,
                vb.contexts.len() as u32,
                spec.ltype,
                snap.dict,
                snap.nodes,
            );
            ctx.cols = spec.cols;
            ctx.local_dep = spec.local_dep;
            vb.contexts.push(ctx);
        }

        let parser_for_job = Arc::clone(&parser);
        let dict_table_for_job = Arc::clone(&dict_table);
        let hints_for_job = Arc::clone(&hints);
        let fatal_for_job = Arc::clone(&fatal);
        let tx = result_tx.clone();

        pool.submit_job(Box::new(move || {
            let outcome = run_one_vb(vb, parser_for_job.as_ref(), &dict_table_for_job, &hints_for_job);
            if let Err(e) = &outcome {
                *fatal_for_job.lock().unwrap() = Some(match e {
                    SeqzipError::User(m) => SeqzipError::User(m.clone()),
                    SeqzipError::SourceData { message, vblock_i } => {
                        SeqzipError::SourceData { message: message.clone(), vblock_i: *vblock_i }
                    }
                    SeqzipError::Invariant(m) => SeqzipError::Invariant(m.clone()),
                    SeqzipError::Resource(m) => SeqzipError::Resource(m.clone()),
                });
            }
            let _ = tx.send(outcome);
        }));

        total_vblocks += 1;
        vblock_i += 1;

        drain_and_write(&result_rx, &mut pending_writes, &mut next_to_write, out, false)?;
    }

    pool.jobs_completed();
    drop(result_tx);
    drain_and_write(&result_rx, &mut pending_writes, &mut next_to_write, out, true)?;

    if let Some(e) = fatal.lock().unwrap().take() {
        return Err(e);
    }

    Ok(RunStats {
        vblocks: total_vblocks,
        final_digest: running_digest.snapshot(),
    })
}

fn run_one_vb(
    mut vb: VBlock,
    parser: &(dyn FormatParser + Send + Sync),
    dict_table: &DictTable,
    hints: &Mutex<CodecHints>,
) -> Result<VBlock> {
    parser.parse(&mut vb)?;
    vb_finalize::finalize(&mut vb, dict_table, hints)?;
    Ok(vb)
}

/// Drains every result currently available (non-blocking, unless
/// `block_until_drained` is set for the final flush) into `pending`, then
/// writes out every prefix starting at `next_to_write` that is present,
/// enforcing strict ascending-`vblock_i` write order (spec §4.8).
fn drain_and_write<W: Write>(
    rx: &crossbeam_channel::Receiver<Result<VBlock>>,
    pending: &mut BTreeMap<u32, VBlock>,
    next_to_write: &mut u32,
    out: &mut W,
    block_until_drained: bool,
) -> Result<()> {
    loop {
        let received = if block_until_drained {
            rx.recv().ok()
        } else {
            rx.try_recv().ok()
        };
        match received {
            Some(Ok(vb)) => {
                pending.insert(vb.vblock_i, vb);
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    while let Some(vb) = pending.remove(next_to_write) {
        out.write_all(&vb.output)
            .map_err(SeqzipError::from)?;
        *next_to_write += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::fasta::FastaParser;
    use std::io::Cursor;

    #[test]
    fn runs_single_vb_fasta_end_to_end() {
        let data = b">chr1\nACGTACGT\n".to_vec();
        let parser: Arc<dyn FormatParser + Send + Sync> = Arc::new(FastaParser);
        let mut out = Vec::new();
        let stats = run(
            Cursor::new(data),
            parser,
            &mut out,
            1024 * 1024,
            1,
            Arc::new(DictTable::new()),
        )
        .unwrap();
        assert_eq!(stats.vblocks, 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn runs_multiple_vbs_in_write_order() {
        let mut text = String::new();
        for i in 0..5 {
            text.push_str(&format!(">contig{i}\n"));
            text.push_str(&"A".repeat(50));
            text.push('\n');
        }
        let parser: Arc<dyn FormatParser + Send + Sync> = Arc::new(FastaParser);
        let mut out = Vec::new();
        let stats = run(
            Cursor::new(text.into_bytes()),
            parser,
            &mut out,
            40,
            3,
            Arc::new(DictTable::new()),
        )
        .unwrap();
        assert!(stats.vblocks >= 2);

        // Every VB header section in `out` should appear in ascending
        // vblock_i order.
        let mut pos = 0;
        let mut last_vb = 0u32;
        while pos + crate::section::HEADER_LEN <= out.len() {
            let (hdr, len) = crate::section::SectionHeader::read(&out[pos..]).unwrap();
            assert!(hdr.vblock_i >= last_vb);
            last_vb = hdr.vblock_i;
            pos += len + hdr.compressed_size as usize;
        }
    }
}
