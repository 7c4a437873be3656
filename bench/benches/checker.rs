use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use track::{builtins::Language, parse_source, type_checker::Checker, util::intern::Interner};

static INPUTS: &[(&str, &str)] = &[
    ("shapes", include_str!("../../demos/shapes.trkt")),
    ("lists", include_str!("../../demos/lists.trkt")),
];

fn criterion_benchmark(c: &mut Criterion) {
    let language = Language::BeginningStudent.environment();

    for (name, input) in INPUTS {
        let mut interner = Interner::with_capacity(256);
        let program = parse_source(input, &mut Vec::new(), &mut interner).unwrap();

        c.bench_function(&format!("checker {name}"), |b| {
            b.iter(|| {
                let checked = Checker::new(&mut interner, &language).check(black_box(&program));
                assert!(checked.is_ok());
                _ = black_box(checked);
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
