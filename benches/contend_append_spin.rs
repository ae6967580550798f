use appendlock::StrategyKind;
use criterion::{criterion_group, criterion_main, Criterion};

mod contend;

fn contend_append_spin(c: &mut Criterion) {
    contend::contend(c, StrategyKind::Spinlock);
}

criterion_group!(benches, contend_append_spin);
criterion_main!(benches);
