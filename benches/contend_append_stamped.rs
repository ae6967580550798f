use appendlock::StrategyKind;
use criterion::{criterion_group, criterion_main, Criterion};

mod contend;

fn contend_append_stamped(c: &mut Criterion) {
    contend::contend(c, StrategyKind::Optimistic);
}

criterion_group!(benches, contend_append_stamped);
criterion_main!(benches);
