//! Drives the compiled `seqzip` binary end to end: compress a file, then
//! `--test` round-trip it, then decompress the archive back and diff
//! against the source.

use std::io::Write;
use std::process::Command;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_seqzip")
}

#[test]
fn compress_test_and_decompress_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.fa");
    std::fs::write(
        &input,
        b">chr1\nACGTACGTACGTACGT\nACGTACGTACGTACGT\n>chr2\nTTTTGGGGCCCCAAAA\n",
    )
    .unwrap();

    let archive = dir.path().join("sample.fa.sz");
    let status = Command::new(bin())
        .args(["compress", input.to_str().unwrap(), "--test", "-q"])
        .status()
        .unwrap();
    assert!(status.success(), "compress failed");
    assert!(archive.exists());

    let decompressed = dir.path().join("sample.decoded.fa");
    let status = Command::new(bin())
        .args([
            "decompress",
            archive.to_str().unwrap(),
            "-o",
            decompressed.to_str().unwrap(),
            "-q",
        ])
        .status()
        .unwrap();
    assert!(status.success(), "decompress failed");

    let original = std::fs::read(&input).unwrap();
    let roundtripped = std::fs::read(&decompressed).unwrap();
    assert_eq!(original, roundtripped);
}

#[test]
fn compress_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.fa");
    std::fs::write(&input, b">c\nACGT\n").unwrap();
    let archive = dir.path().join("sample.fa.sz");
    std::fs::File::create(&archive)
        .unwrap()
        .write_all(b"placeholder")
        .unwrap();

    let status = Command::new(bin())
        .args(["compress", input.to_str().unwrap(), "-q"])
        .status()
        .unwrap();
    assert!(!status.success());
}
