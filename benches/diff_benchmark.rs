//! Diff/patch engine benchmarks.
//!
//! The patcher sits on the hot edit path: every render round diffs the full
//! serialized output. These benches keep the minimal-diff pipeline honest on
//! realistically sized documents.
//!
//! Run with: cargo bench

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use pvsync::markup::parse_markup;
use pvsync::model::RenderOutput;
use pvsync::patch::{patch, simple_diff};

/// A document of `blocks` paragraphs, one word changed in the middle when
/// `edited` is set.
fn document(blocks: usize, edited: bool) -> String {
    let mut html = String::new();
    for i in 0..blocks {
        let word = if edited && i == blocks / 2 {
            "changed"
        } else {
            "stable"
        };
        html.push_str(&format!(
            "<p data-line=\"{}\">paragraph {i} is {word} content for benchmarking</p>\n",
            i * 2 + 1
        ));
    }
    html
}

fn bench_simple_diff(c: &mut Criterion) {
    let old = document(1_000, false);
    let new = document(1_000, true);

    c.bench_function("simple_diff_1000_blocks", |b| {
        b.iter(|| simple_diff(black_box(&old), black_box(&new)))
    });

    c.bench_function("simple_diff_identical_1000_blocks", |b| {
        b.iter(|| simple_diff(black_box(&old), black_box(&old)))
    });
}

fn bench_patch(c: &mut Criterion) {
    let old = RenderOutput::new(document(1_000, false));
    let new = RenderOutput::new(document(1_000, true));
    let tree = parse_markup(old.as_str());

    c.bench_function("patch_single_leaf_1000_blocks", |b| {
        b.iter_batched(
            || tree.clone(),
            |mut tree| patch(black_box(Some(&old)), black_box(&new), &mut tree),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("full_reparse_1000_blocks", |b| {
        b.iter(|| parse_markup(black_box(new.as_str())))
    });
}

criterion_group!(benches, bench_simple_diff, bench_patch);
criterion_main!(benches);
