use appendlock::StrategyKind;
use criterion::{criterion_group, criterion_main, Criterion};

mod contend;

fn contend_append_none(c: &mut Criterion) {
    contend::contend(c, StrategyKind::None);
}

criterion_group!(benches, contend_append_none);
criterion_main!(benches);
