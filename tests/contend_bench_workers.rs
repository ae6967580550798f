extern crate appendlock;

#[allow(dead_code)]
#[path = "../benches/contend/mod.rs"]
mod contend;

use appendlock::strategy::SpinStrategy;
use appendlock::{DynamicArray, Error, Result, Strategy, StrategyKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lets the first few writes through, then refuses every one after.
struct Failing {
    inner: SpinStrategy,
    allowed: usize,
    calls: AtomicUsize,
}

impl Strategy for Failing {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Spinlock
    }

    fn protect_write(&self, write: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if call >= self.allowed {
            return Err(Error::IndexOutOfBounds {
                index: call,
                capacity: self.allowed,
            });
        }
        self.inner.protect_write(write)
    }

    fn protect_read(&self, read: &mut dyn FnMut()) {
        self.inner.protect_read(read)
    }

    fn try_protect_read(&self, read: &mut dyn FnMut()) -> bool {
        self.inner.try_protect_read(read)
    }
}

#[test]
fn workers_time_every_append() {
    let array = Arc::new(DynamicArray::with_kind(StrategyKind::Mutex));
    contend::contend_workers(array.clone(), 2, 3);
    // the last run is not cleared away
    assert_eq!(array.size(), 2000);
}

#[test]
#[should_panic(expected = "run aborted")]
fn failed_append_aborts_the_run() {
    // the first write is the clear before the first run
    let array = Arc::new(DynamicArray::new(Box::new(Failing {
        inner: SpinStrategy::new(),
        allowed: 10,
        calls: AtomicUsize::new(0),
    })));
    contend::contend_workers(array, 2, 5);
}
