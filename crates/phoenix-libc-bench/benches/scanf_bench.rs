//! scanf engine benchmarks.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use phoenix_libc_core::stdio::{ScanArg, sscanf};

fn bench_ints(c: &mut Criterion) {
    c.bench_function("sscanf_three_ints", |b| {
        b.iter(|| {
            let (mut x, mut y, mut z) = (0i32, 0i32, 0i32);
            sscanf(
                black_box(b"  12 -345 0x7f"),
                b"%d %d %i",
                &mut [ScanArg::Int(&mut x), ScanArg::Int(&mut y), ScanArg::Int(&mut z)],
            )
        });
    });
}

fn bench_float(c: &mut Criterion) {
    c.bench_function("sscanf_double", |b| {
        b.iter(|| {
            let mut v = 0f64;
            sscanf(black_box(b"6.02214076e23"), b"%lf", &mut [ScanArg::Double(&mut v)])
        });
    });
}

fn bench_text(c: &mut Criterion) {
    c.bench_function("sscanf_scanset_and_word", |b| {
        b.iter(|| {
            let mut key = [0u8; 32];
            let mut value = [0u8; 32];
            sscanf(
                black_box(b"content_type=text/plain"),
                b"%31[a-z_]=%31s",
                &mut [ScanArg::Chars(&mut key), ScanArg::Chars(&mut value)],
            )
        });
    });
}

criterion_group!(benches, bench_ints, bench_float, bench_text);
criterion_main!(benches);
