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
use std::sync::atomic::{self, AtomicU64, Ordering};

use appendlock_util::backoff;
use appendlock_util::cacheline::CacheLineAligned;

use crate::error::Result;
use crate::strategy::{Strategy, StrategyKind};

/// A sequence lock whose stamp is odd while a writer holds it.
///
/// Writers acquire by moving the stamp from even to odd and release by
/// moving it to the next even value, so every write invalidates every
/// optimistic read that overlapped it.
pub struct StampedLock {
    stamp: CacheLineAligned<AtomicU64>,
}

#[must_use]
pub struct StampedWriteGuard<'r> {
    lock: &'r StampedLock,
    stamp: u64,
}

#[inline(always)]
fn is_write_locked(stamp: u64) -> bool {
    stamp & 1 != 0
}

impl StampedLock {
    #[inline(always)]
    pub const fn new() -> Self {
        StampedLock { stamp: CacheLineAligned::new(AtomicU64::new(0)) }
    }

    pub fn try_write<'r>(&'r self) -> Option<StampedWriteGuard<'r>> {
        let stamp = self.stamp.load(Ordering::Relaxed);
        if is_write_locked(stamp) {
            return None;
        }
        if self.stamp
            .compare_exchange(stamp, stamp + 1, Ordering::Acquire, Ordering::Relaxed)
            .is_err() {
            return None;
        }
        // Order the odd stamp before any of the protected stores.
        atomic::fence(Ordering::Release);
        return Some(StampedWriteGuard {
            lock: self,
            stamp: stamp + 1,
        });
    }

    pub fn write<'r>(&'r self) -> StampedWriteGuard<'r> {
        let mut counter = 0;
        loop {
            if let Some(guard) = self.try_write() {
                return guard;
            }
            backoff::spin_wait(&mut counter);
        }
    }

    /// Returns a stamp to validate later, or `None` while a writer is
    /// inside.
    #[inline]
    pub fn try_optimistic_read(&self) -> Option<u64> {
        let stamp = self.stamp.load(Ordering::Acquire);
        if is_write_locked(stamp) {
            None
        } else {
            Some(stamp)
        }
    }

    /// Whether no writer entered since `stamp` was handed out.
    #[inline]
    pub fn validate(&self, stamp: u64) -> bool {
        atomic::fence(Ordering::Acquire);
        return self.stamp.load(Ordering::Relaxed) == stamp;
    }
}

impl Default for StampedLock {
    fn default() -> Self {
        StampedLock::new()
    }
}

impl<'r> Drop for StampedWriteGuard<'r> {
    fn drop(&mut self) {
        self.lock.stamp.store(self.stamp.wrapping_add(1), Ordering::Release);
    }
}

/// Exclusive writers, speculative readers that retry when a writer
/// overlapped them.  Readers never write the stamp, so they can
/// neither delay a writer nor invalidate one another.
#[derive(Default)]
pub struct StampedStrategy {
    lock: StampedLock,
}

impl StampedStrategy {
    pub fn new() -> Self {
        StampedStrategy { lock: StampedLock::new() }
    }
}

impl Strategy for StampedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Optimistic
    }

    fn protect_write(&self, write: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let _guard = self.lock.write();
        write()
    }

    fn protect_read(&self, read: &mut dyn FnMut()) {
        let mut counter = 0;
        while !self.try_protect_read(read) {
            backoff::spin_wait(&mut counter);
        }
    }

    fn try_protect_read(&self, read: &mut dyn FnMut()) -> bool {
        match self.lock.try_optimistic_read() {
            Some(stamp) => {
                read();
                self.lock.validate(stamp)
            }
            None => false,
        }
    }
}
