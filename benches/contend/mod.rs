use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use appendlock::{DynamicArray, Error, StrategyKind};
use criterion::{BenchmarkId, Criterion, Throughput};

pub const STANDARD_TESTS: [usize; 4] = [1, 2, 4, 8];

const ITEMS: usize = 1000;

/// Times `num` long lived workers each appending `ITEMS` values to one
/// shared array.  The array is cleared between runs outside of the
/// timed region.  Panics if any append fails, so a broken strategy
/// never reports a timing.
pub fn contend_workers(array: Arc<DynamicArray>, num: usize, iters: u64) -> Duration {
    let kind = array.strategy_kind();
    let mut children = Vec::new();

    let is_done = Arc::new(AtomicBool::new(false));
    let failure: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
    let start = Arc::new(Barrier::new(num + 1));
    let done = Arc::new(Barrier::new(num + 1));

    for _ in 0..num {
        let array_ref = array.clone();
        let start_ref = start.clone();
        let done_ref = done.clone();
        let is_done_ref = is_done.clone();
        let failure_ref = failure.clone();

        let child = thread::spawn(move || {
            loop {
                start_ref.wait();
                if is_done_ref.load(Ordering::Acquire) {
                    break;
                }

                for i in 0..ITEMS {
                    if let Err(err) = array_ref.append(i as i64) {
                        *failure_ref.lock().unwrap() = Some(err);
                        break;
                    }
                }

                done_ref.wait();
            }
        });
        children.push(child);
    }

    let mut total = Duration::ZERO;
    for _ in 0..iters {
        array.clear().unwrap();
        start.wait();
        let timer = Instant::now();
        done.wait();
        total += timer.elapsed();
        if failure.lock().unwrap().is_some() {
            break;
        }
    }
    is_done.store(true, Ordering::Release);
    start.wait();

    for child in children {
        child.join().unwrap();
    }
    if let Some(err) = failure.lock().unwrap().take() {
        panic!("{} run aborted: {}", kind, err);
    }
    total
}

pub fn contend(c: &mut Criterion, kind: StrategyKind) {
    let mut group = c.benchmark_group(format!("contend_append_{}", kind));
    for num in STANDARD_TESTS.iter() {
        group.throughput(Throughput::Elements((ITEMS * num) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num), num, |b, &num| {
            b.iter_custom(|iters| {
                contend_workers(Arc::new(DynamicArray::with_kind(kind)), num, iters)
            })
        });
    }
    group.finish();
}
