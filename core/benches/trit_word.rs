use criterion::{black_box, criterion_group, criterion_main, Criterion};
use helix9_core::trit::TritWord;

fn bench_trit_word_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("trit_word_ops");

    let a = TritWord::from_int(123_456_789);
    let b = TritWord::from_int(-987_654);

    group.bench_function("add", |bencher| {
        bencher.iter(|| black_box(a).add(black_box(b)))
    });

    group.bench_function("saturating_add", |bencher| {
        bencher.iter(|| black_box(a).saturating_add(black_box(b)))
    });

    group.bench_function("consensus", |bencher| {
        bencher.iter(|| black_box(a).consensus(black_box(b)))
    });

    group.bench_function("to_int_from_int_round_trip", |bencher| {
        bencher.iter(|| {
            let v = black_box(a).to_int();
            black_box(TritWord::from_int(v))
        })
    });

    group.bench_function("to_packed", |bencher| {
        bencher.iter(|| black_box(a).to_packed())
    });

    group.finish();
}

criterion_group!(benches, bench_trit_word_ops);
criterion_main!(benches);
