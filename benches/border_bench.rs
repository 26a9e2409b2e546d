//! Criterion benchmarks for border detection and whitening.
//!
//! Runs every detection strategy on one synthetic page with a dark band on
//! two sides and a block of text lines in the middle.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, GrayImage, Luma};

use superbook_border::{BorderOptions, BorderRemover, DetectionStrategy};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 1200x1600 page: 80px bed on top, 50px on the left, text lines in between
fn synthetic_page() -> GrayImage {
    GrayImage::from_fn(1200, 1600, |x, y| {
        if y < 80 || x < 50 {
            Luma([25])
        } else if (300..1300).contains(&y) && (150..1050).contains(&x) && (y - 300) % 28 < 10 {
            Luma([90])
        } else {
            Luma([235])
        }
    })
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detect(c: &mut Criterion) {
    let gray = synthetic_page();
    let mut group = c.benchmark_group("detect");
    group.sample_size(20);

    for strategy in DetectionStrategy::all() {
        let options = BorderOptions::builder().strategy(strategy).build();
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &gray, |b, gray| {
            b.iter(|| black_box(BorderRemover::detect(black_box(gray), &options)));
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let image = DynamicImage::ImageLuma8(synthetic_page());
    let options = BorderOptions::default();

    c.bench_function("remove (1200x1600, default)", |b| {
        b.iter(|| black_box(BorderRemover::remove(black_box(&image), &options)));
    });
}

criterion_group!(benches, bench_detect, bench_remove);
criterion_main!(benches);
