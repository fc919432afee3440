//! Benchmarks the dictionary merge path: repeated VBs referencing a mix of
//! pre-existing and fresh snips against a growing global dictionary.

use criterion::{criterion_group, criterion_main, Criterion};
use seqzip::context::{Context, DictId, LType};
use seqzip::dict::DictTable;

fn run_vbs(n_vbs: u32, n_snips_per_vb: u32) {
    let table = DictTable::new();
    for vb_i in 1..=n_vbs {
        let snap = table.clone_for_vb(DictId::new("CHROM"));
        let mut ctx = Context::from_global_snapshot(
            DictId::new("CHROM"),
            0,
            LType::Sequence,
            snap.dict,
            snap.nodes,
        );
        for s in 0..n_snips_per_vb {
            let name = format!("chr{}", s % 24);
            let idx = ctx.intern(name.as_bytes());
            ctx.append_b250(idx);
        }
        table.begin_merge(vb_i);
        table.merge_vb(&mut ctx, vb_i == 1);
        table.end_merge(vb_i);
    }
}

fn bench_merge(c: &mut Criterion) {
    c.bench_function("merge_100_vbs_1000_snips", |b| {
        b.iter(|| run_vbs(100, 1000))
    });
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
