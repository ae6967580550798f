use appendlock::StrategyKind;
use criterion::{criterion_group, criterion_main, Criterion};

mod contend;

fn contend_append_layout(c: &mut Criterion) {
    contend::contend(c, StrategyKind::Layout);
}

criterion_group!(benches, contend_append_layout);
criterion_main!(benches);
