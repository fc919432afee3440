//! End-to-end round trip through the full pipeline: reader -> dispatcher
//! -> writer -> decode, verifying reconstructed bytes match the source
//! exactly (spec §8's round-trip property).

use seqzip::dict::DictTable;
use seqzip::dispatcher;
use seqzip::format::fasta::FastaParser;
use seqzip::format::FormatParser;
use seqzip::writer::{self, CountingWriter, DictFragment};
use std::io::Cursor;
use std::sync::Arc;

fn compress(source: &[u8], vb_size: usize, workers: usize) -> Vec<u8> {
    let parser: Arc<dyn FormatParser + Send + Sync> = Arc::new(FastaParser);
    let dict_table = Arc::new(DictTable::new());

    let mut buf = Vec::new();
    writer::write_file_header(&mut buf, 1).unwrap();
    let mut counting = CountingWriter::new(buf);

    dispatcher::run(
        Cursor::new(source.to_vec()),
        parser,
        &mut counting,
        vb_size,
        workers,
        Arc::clone(&dict_table),
    )
    .unwrap();

    let fragments: Vec<DictFragment> = dict_table
        .snapshot_all()
        .into_iter()
        .map(|(dict_id, dict_bytes, node_lens)| DictFragment {
            dict_id,
            dict_bytes,
            node_lens,
        })
        .collect();

    let base = counting.count();
    let directory = writer::write_global_area(&mut counting, base, &fragments).unwrap();
    writer::write_footer(&mut counting, &directory).unwrap();
    counting.into_inner()
}

#[test]
fn single_vb_round_trips_exactly() {
    let source = b">chr1\nACGTACGTACGT\nACGTACGTACGT\n>chr2\nTTTTGGGGCCCC\n".to_vec();
    let out = compress(&source, 1024 * 1024, 2);

    let parser = FastaParser;
    let (recon, _digest) = seqzip::decode::decompress(&out, &parser).unwrap();
    assert_eq!(recon, source);
}

#[test]
fn multi_vb_round_trips_with_shared_dictionary() {
    let mut source = String::new();
    for i in 0..12 {
        source.push_str(&format!(">contig{}\n", i % 3));
        source.push_str(&"ACGT".repeat(20));
        source.push('\n');
    }
    let source = source.into_bytes();
    let out = compress(&source, 96, 4);

    let parser = FastaParser;
    let (recon, _digest) = seqzip::decode::decompress(&out, &parser).unwrap();
    assert_eq!(recon, source);
}

#[test]
fn repeated_contig_collapses_dictionary_but_still_round_trips() {
    let mut source = String::new();
    for _ in 0..30 {
        source.push_str(">same_contig\n");
        source.push_str("ACGTACGTACGT\n");
    }
    let source = source.into_bytes();
    let out = compress(&source, 64, 3);

    let parser = FastaParser;
    let (recon, _digest) = seqzip::decode::decompress(&out, &parser).unwrap();
    assert_eq!(recon, source);
}
