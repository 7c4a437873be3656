use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use track::{
    lexer::{lex, SUGGESTED_TOKENS_CAPACITY},
    token::Token,
};

static INPUTS: &[(&str, &str)] = &[
    ("shapes", include_str!("../../demos/shapes.trkt")),
    ("lists", include_str!("../../demos/lists.trkt")),
];

fn lexer(input: &str, tokens: &mut Vec<Token>) {
    lex(input, tokens).unwrap();
    black_box(tokens.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);

    for (name, input) in INPUTS {
        c.bench_function(&format!("lexer {name}"), |b| {
            b.iter(|| {
                tokens.clear();
                lexer(black_box(input), &mut tokens);
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
