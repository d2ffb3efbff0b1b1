//! Benchmarks for LZ77 match finding and full DEFLATE round trips.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use linkpack_deflate::{BlockStrategy, DeflateOptions, Lz77Encoder, deflate, inflate};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    pub fn random(size: usize) -> Vec<u8> {
        // Simple LCG random number generator
        let mut seed = 12345u32;
        (0..size)
            .map(|_| {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                (seed >> 16) as u8
            })
            .collect()
    }

    pub fn repeated(size: usize) -> Vec<u8> {
        let pattern = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        pattern.iter().copied().cycle().take(size).collect()
    }

    pub fn text_like(size: usize) -> Vec<u8> {
        let words = [
            "the ", "quick ", "brown ", "fox ", "jumps ", "over ", "lazy ", "dog ", "table ",
            "column ", "row ", "view ",
        ];
        let mut data = Vec::with_capacity(size);
        let mut i = 0usize;
        while data.len() < size {
            data.extend_from_slice(words[(i * 7 + i / 3) % words.len()].as_bytes());
            i += 1;
        }
        data.truncate(size);
        data
    }
}

const PATTERNS: [(&str, PatternGenerator); 3] = [
    ("random", test_data::random),
    ("repeated", test_data::repeated),
    ("text", test_data::text_like),
];

fn bench_lz77(c: &mut Criterion) {
    let mut group = c.benchmark_group("lz77");

    for (name, generator) in PATTERNS {
        // Straddle the small/large prefix index threshold.
        for size in [4 * 1024, 64 * 1024] {
            let data = generator(size);
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(name, size),
                &data,
                |b, data| b.iter(|| Lz77Encoder::default().compress(black_box(data))),
            );
        }
    }

    group.finish();
}

fn bench_deflate_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("deflate");
    let data = test_data::text_like(64 * 1024);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for strategy in [
        BlockStrategy::Stored,
        BlockStrategy::Fixed,
        BlockStrategy::Dynamic,
        BlockStrategy::Smallest,
    ] {
        let options = DeflateOptions::new(strategy);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", strategy)),
            &options,
            |b, options| b.iter(|| deflate(black_box(&data), options)),
        );
    }

    group.finish();
}

fn bench_inflate(c: &mut Criterion) {
    let mut group = c.benchmark_group("inflate");

    for (name, generator) in PATTERNS {
        let data = generator(64 * 1024);
        let compressed = deflate(&data, &DeflateOptions::default());
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &compressed, |b, c| {
            b.iter(|| inflate(black_box(c)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lz77, bench_deflate_strategies, bench_inflate);
criterion_main!(benches);
