//! ctype classification benchmarks over the C and de_DE locales.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use phoenix_libc_core::ctype::{is_alpha_l, is_space_l, to_upper_l};
use phoenix_libc_core::locale::{LC_ALL_MASK, LocaleHandle, newlocale};

fn locale(name: &str) -> LocaleHandle {
    newlocale(LC_ALL_MASK, name, None).unwrap()
}

fn bench_classify(c: &mut Criterion) {
    for name in ["C", "de_DE"] {
        let handle = locale(name);
        c.bench_function(&format!("isalpha_all_bytes/{name}"), |b| {
            b.iter(|| (0..=255).filter(|&ch| is_alpha_l(black_box(ch), &handle)).count());
        });
        c.bench_function(&format!("isspace_all_bytes/{name}"), |b| {
            b.iter(|| (0..=255).filter(|&ch| is_space_l(black_box(ch), &handle)).count());
        });
    }
}

fn bench_case(c: &mut Criterion) {
    for name in ["C", "de_DE"] {
        let handle = locale(name);
        c.bench_function(&format!("toupper_all_bytes/{name}"), |b| {
            b.iter(|| (0..=255).map(|ch| to_upper_l(black_box(ch), &handle)).sum::<i32>());
        });
    }
}

criterion_group!(benches, bench_classify, bench_case);
criterion_main!(benches);
