/// Performance benchmarks for histogram construction and estimation
///
/// Compares the three bin layouts on:
/// 1. Construction from a segment
/// 2. Point and range cardinality estimates
/// 3. Slicing
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use opalsql_stats::{BinLayout, ColumnHistogram, ColumnSegment, Predicate};
use opalsql_types::ScalarValue;

const LAYOUTS: [(&str, BinLayout); 3] = [
    ("equal_distinct_count", BinLayout::EqualDistinctCount),
    ("equal_width", BinLayout::EqualWidth),
    ("equal_height", BinLayout::EqualHeight),
];

fn setup_segment(row_count: usize) -> ColumnSegment {
    let mut rng = StdRng::seed_from_u64(42);
    let values: Vec<Option<i64>> = (0..row_count)
        .map(|_| {
            if rng.gen_ratio(1, 100) {
                None
            } else {
                Some(rng.gen_range(0..1_000_000))
            }
        })
        .collect();
    ColumnSegment::bigint(values)
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    let segment = setup_segment(100_000);

    for (name, layout) in LAYOUTS {
        group.bench_with_input(BenchmarkId::new(name, 100_000), &segment, |b, segment| {
            b.iter(|| {
                ColumnHistogram::from_segment(black_box(segment), layout, 100, None).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_estimation(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimation");
    let segment = setup_segment(100_000);

    for (name, layout) in LAYOUTS {
        let histogram = ColumnHistogram::from_segment(&segment, layout, 100, None).unwrap();
        group.bench_function(BenchmarkId::new("equals", name), |b| {
            b.iter(|| {
                histogram
                    .estimate_cardinality(
                        Predicate::Equals,
                        &ScalarValue::Bigint(black_box(500_000)),
                        None,
                    )
                    .unwrap()
            });
        });
        group.bench_function(BenchmarkId::new("between", name), |b| {
            b.iter(|| {
                histogram
                    .estimate_cardinality(
                        Predicate::Between,
                        &ScalarValue::Bigint(black_box(250_000)),
                        Some(&ScalarValue::Bigint(black_box(750_000))),
                    )
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_slicing(c: &mut Criterion) {
    let mut group = c.benchmark_group("slicing");
    let segment = setup_segment(100_000);

    for (name, layout) in LAYOUTS {
        let histogram = ColumnHistogram::from_segment(&segment, layout, 100, None).unwrap();
        group.bench_function(BenchmarkId::new("less_than", name), |b| {
            b.iter(|| {
                histogram
                    .slice_with_predicate(
                        Predicate::LessThan,
                        &ScalarValue::Bigint(black_box(500_000)),
                        None,
                    )
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_construction, bench_estimation, bench_slicing);
criterion_main!(benches);
