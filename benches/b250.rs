//! Benchmarks the b250 encode/decode hot path across a range of stream
//! shapes (dense small-alphabet vs. wide sparse indices).

use criterion::{criterion_group, criterion_main, Criterion};
use seqzip::context::b250::{decode, encode, B250Width, WordIndex};

fn dense_small_alphabet(n: usize) -> Vec<WordIndex> {
    (0..n).map(|i| WordIndex::Index((i % 8) as u32)).collect()
}

fn wide_sparse(n: usize) -> Vec<WordIndex> {
    (0..n).map(|i| WordIndex::Index((i * 97) as u32 % 70_000)).collect()
}

fn bench_b250(c: &mut Criterion) {
    let dense = dense_small_alphabet(100_000);
    c.bench_function("b250_encode_dense_bytes1", |b| {
        b.iter(|| encode(&dense, B250Width::Bytes1))
    });

    let wide = wide_sparse(100_000);
    let encoded = encode(&wide, B250Width::Bytes3);
    c.bench_function("b250_encode_wide_bytes3", |b| {
        b.iter(|| encode(&wide, B250Width::Bytes3))
    });
    c.bench_function("b250_decode_wide_bytes3", |b| {
        b.iter(|| decode(&encoded, B250Width::Bytes3).unwrap())
    });
}

criterion_group!(benches, bench_b250);
criterion_main!(benches);
