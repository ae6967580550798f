// Copyright 2017 Steven Stewart-Gallus
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.  See the License for the specific language governing
// permissions and limitations under the License.
//
use std::sync::atomic::{AtomicBool, Ordering};

use appendlock_util::backoff;
use appendlock_util::cacheline::CacheLineAligned;

use crate::error::Result;
use crate::strategy::{Strategy, StrategyKind};

/// A test and test and set spin lock with randomized exponential
/// backoff.  Never parks in the kernel.
pub struct SpinLock {
    locked: CacheLineAligned<AtomicBool>,
}

#[must_use]
pub struct SpinLockGuard<'r> {
    lock: &'r SpinLock,
}

impl SpinLock {
    #[inline(always)]
    pub const fn new() -> Self {
        SpinLock { locked: CacheLineAligned::new(AtomicBool::new(false)) }
    }

    #[inline]
    pub fn try_lock<'r>(&'r self) -> Option<SpinLockGuard<'r>> {
        if !self.locked.load(Ordering::Relaxed) {
            if let Ok(_) = self.locked
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed) {
                return Some(SpinLockGuard { lock: self });
            }
        }
        return None;
    }

    pub fn lock<'r>(&'r self) -> SpinLockGuard<'r> {
        let mut counter = 0;
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            backoff::spin_wait(&mut counter);
        }
    }
}

impl Default for SpinLock {
    fn default() -> Self {
        SpinLock::new()
    }
}

impl<'r> Drop for SpinLockGuard<'r> {
    #[inline]
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

/// Busy-waiting mutual exclusion for readers and writers alike.
#[derive(Default)]
pub struct SpinStrategy {
    lock: SpinLock,
}

impl SpinStrategy {
    pub fn new() -> Self {
        SpinStrategy { lock: SpinLock::new() }
    }
}

impl Strategy for SpinStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Spinlock
    }

    fn protect_write(&self, write: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let _guard = self.lock.lock();
        write()
    }

    fn protect_read(&self, read: &mut dyn FnMut()) {
        let _guard = self.lock.lock();
        read();
    }

    fn try_protect_read(&self, read: &mut dyn FnMut()) -> bool {
        match self.lock.try_lock() {
            Some(_guard) => {
                read();
                true
            }
            None => false,
        }
    }
}
