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
use crate::strategy::spin::SpinLock;
use crate::strategy::{Strategy, StrategyKind};

/// A layout lock.
///
/// Writers serialize among themselves on a spin lock and never disturb
/// readers, not even when they grow the storage: growth copies into a
/// fresh layout and leaves the old one untouched, and readers that
/// still hold the old layout keep it alive on their own.
///
/// Only a truncation can pull elements out from under a reader, so a
/// truncating writer bumps the layout version around it: odd while the
/// truncation runs, even once it is done.  Readers never take a lock;
/// they compare the version before and after reading and retry on a
/// mismatch.
pub struct LayoutLockStrategy {
    writer: SpinLock,
    version: CacheLineAligned<AtomicU64>,
}

impl LayoutLockStrategy {
    pub fn new() -> Self {
        LayoutLockStrategy {
            writer: SpinLock::new(),
            version: CacheLineAligned::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn begin_read(&self) -> Option<u64> {
        let version = self.version.load(Ordering::Acquire);
        if version & 1 != 0 {
            None
        } else {
            Some(version)
        }
    }

    #[inline]
    fn validate(&self, version: u64) -> bool {
        atomic::fence(Ordering::Acquire);
        return self.version.load(Ordering::Relaxed) == version;
    }
}

impl Default for LayoutLockStrategy {
    fn default() -> Self {
        LayoutLockStrategy::new()
    }
}

impl Strategy for LayoutLockStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Layout
    }

    fn protect_write(&self, write: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let _guard = self.writer.lock();
        write()
    }

    fn protect_truncate(&self, truncate: &mut dyn FnMut()) {
        // Callers hold the writer lock so plain stores are enough.
        let version = self.version.load(Ordering::Relaxed);
        debug_assert!(version & 1 == 0);
        self.version.store(version + 1, Ordering::Relaxed);
        atomic::fence(Ordering::Release);

        truncate();

        self.version.store(version + 2, Ordering::Release);
    }

    fn protect_read(&self, read: &mut dyn FnMut()) {
        let mut counter = 0;
        while !self.try_protect_read(read) {
            backoff::spin_wait(&mut counter);
        }
    }

    fn try_protect_read(&self, read: &mut dyn FnMut()) -> bool {
        match self.begin_read() {
            Some(version) => {
                read();
                self.validate(version)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn in_place_writes_do_not_disturb_readers() {
        let strategy = LayoutLockStrategy::new();
        let mut valid = false;
        strategy.protect_write(&mut || {
                valid = strategy.try_protect_read(&mut || {});
                Ok(())
            })
            .unwrap();
        assert!(valid);
        assert_eq!(strategy.version.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn truncation_invalidates_overlapping_read() {
        let strategy = LayoutLockStrategy::new();
        let valid = strategy.try_protect_read(&mut || {
            strategy.protect_write(&mut || {
                    strategy.protect_truncate(&mut || {});
                    Ok(())
                })
                .unwrap();
        });
        assert!(!valid);
        assert_eq!(strategy.version.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn reads_refused_mid_truncation() {
        let strategy = LayoutLockStrategy::new();
        let mut refused = false;
        strategy.protect_write(&mut || {
                strategy.protect_truncate(&mut || {
                    refused = !strategy.try_protect_read(&mut || {})
                });
                Ok(())
            })
            .unwrap();
        assert!(refused);
        let mut ran = 0;
        strategy.protect_read(&mut || ran += 1);
        assert_eq!(ran, 1);
    }

    #[test]
    fn readers_finish_while_a_writer_is_inside() {
        let strategy = LayoutLockStrategy::new();
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (read_tx, read_rx) = mpsc::channel();

        thread::scope(|s| {
            let strategy = &strategy;
            s.spawn(move || {
                strategy.protect_write(&mut || {
                        entered_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                        Ok(())
                    })
                    .unwrap();
            });
            entered_rx.recv().unwrap();

            s.spawn(move || {
                let mut runs = 0;
                strategy.protect_read(&mut || runs += 1);
                read_tx.send(runs).unwrap();
            });

            // The writer is still inside while the reader reports back.
            let runs = read_rx.recv_timeout(Duration::from_secs(10));
            release_tx.send(()).unwrap();
            assert_eq!(runs, Ok(1));
        });
    }
}
