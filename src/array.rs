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
//! The shared growable array whose appends are being measured.
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use log::debug;

use appendlock_util::backoff;
use appendlock_util::cacheline::CacheLineAligned;

use crate::error::{Error, Result};
use crate::strategy::{Strategy, StrategyKind};

pub type Element = i64;

const MIN_CAPACITY: usize = 16;

// In-flight operations are counted on per-thread stripes so that the
// bookkeeping never becomes a line every operation fights over.  Each
// stripe word holds readers in the low half and writers in the high.
const STRIPES: usize = 16;
const READER: u64 = 1;
const WRITER: u64 = 1 << 32;
const READER_MASK: u64 = WRITER - 1;

static NEXT_STRIPE: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static STRIPE: usize = NEXT_STRIPE.fetch_add(1, Ordering::Relaxed) % STRIPES;
}

/// One generation of backing storage.  Slots are atomics so that even
/// the unsynchronized baseline can only lose updates, never tear them.
pub struct Layout {
    generation: u64,
    slots: Box<[AtomicI64]>,
}

impl Layout {
    fn with_capacity(generation: u64, capacity: usize) -> Self {
        Layout {
            generation: generation,
            slots: (0..capacity).map(|_| AtomicI64::new(0)).collect(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// The access state of an array, as seen by a strategy swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayState {
    Idle,
    WriteInFlight,
    ReadInFlight(usize),
}

pub struct DynamicArray {
    len: CacheLineAligned<AtomicUsize>,
    layout: ArcSwap<Layout>,
    in_flight: [CacheLineAligned<AtomicU64>; STRIPES],
    swapping: CacheLineAligned<AtomicBool>,
    strategy: ArcSwap<Box<dyn Strategy>>,
}

/// Marks one operation as in flight for as long as it lives.
struct InFlight<'r> {
    stripe: &'r AtomicU64,
    role: u64,
}

impl<'r> Drop for InFlight<'r> {
    #[inline]
    fn drop(&mut self) {
        self.stripe.fetch_sub(self.role, Ordering::Release);
    }
}

impl DynamicArray {
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        DynamicArray::with_capacity(strategy, MIN_CAPACITY)
    }

    pub fn with_capacity(strategy: Box<dyn Strategy>, capacity: usize) -> Self {
        DynamicArray {
            len: CacheLineAligned::new(AtomicUsize::new(0)),
            layout: ArcSwap::from_pointee(Layout::with_capacity(0, capacity)),
            in_flight: std::array::from_fn(|_| CacheLineAligned::new(AtomicU64::new(0))),
            swapping: CacheLineAligned::new(AtomicBool::new(false)),
            strategy: ArcSwap::from_pointee(strategy),
        }
    }

    pub fn with_kind(kind: StrategyKind) -> Self {
        DynamicArray::new(kind.build())
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.load().kind()
    }

    pub fn state(&self) -> ArrayState {
        let (readers, writers) = self.in_flight_counts();
        if writers != 0 {
            ArrayState::WriteInFlight
        } else if readers != 0 {
            ArrayState::ReadInFlight(readers)
        } else {
            ArrayState::Idle
        }
    }

    fn in_flight_counts(&self) -> (usize, usize) {
        let mut readers = 0;
        let mut writers = 0;
        for stripe in self.in_flight.iter() {
            let word = stripe.load(Ordering::SeqCst);
            readers += (word & READER_MASK) as usize;
            writers += (word / WRITER) as usize;
        }
        return (readers, writers);
    }

    /// Replaces the active strategy.  Fails if any operation is in
    /// flight on this array, including one on the calling thread.
    pub fn set_strategy(&self, strategy: Box<dyn Strategy>) -> Result<()> {
        let claimed = self.swapping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok();
        // Operations count themselves before they look at the flag, so
        // once it is raised every stripe reading zero means idle.
        let (readers, writers) = self.in_flight_counts();
        if !claimed || readers + writers != 0 {
            if claimed {
                self.swapping.store(false, Ordering::Release);
            }
            return Err(Error::IllegalState {
                strategy: self.strategy_kind(),
                readers: readers,
                writers: writers,
            });
        }

        let old = self.strategy_kind();
        let new = strategy.kind();
        self.strategy.store(Arc::new(strategy));
        self.swapping.store(false, Ordering::Release);

        debug!("array {:p} switched strategy {} -> {}", self, old, new);
        return Ok(());
    }

    pub fn set_strategy_kind(&self, kind: StrategyKind) -> Result<()> {
        self.set_strategy(kind.build())
    }

    fn enter<'r>(&'r self, role: u64) -> InFlight<'r> {
        let stripe: &'r AtomicU64 = &self.in_flight[STRIPE.with(|stripe| *stripe)];
        let mut counter = 0;
        loop {
            stripe.fetch_add(role, Ordering::SeqCst);
            if !self.swapping.load(Ordering::SeqCst) {
                return InFlight {
                    stripe: stripe,
                    role: role,
                };
            }
            // Back out and let the swap finish.
            stripe.fetch_sub(role, Ordering::Relaxed);
            while self.swapping.load(Ordering::Relaxed) {
                backoff::spin_wait(&mut counter);
            }
        }
    }

    pub fn append(&self, value: Element) -> Result<()> {
        let _op = self.enter(WRITER);
        let strategy = self.strategy.load();
        strategy.protect_write(&mut || self.push(value))
    }

    /// Empties the array but keeps its storage for reuse.
    pub fn clear(&self) -> Result<()> {
        let _op = self.enter(WRITER);
        let guard = self.strategy.load();
        let strategy: &dyn Strategy = &***guard;
        strategy.protect_write(&mut || {
            strategy.protect_truncate(&mut || self.len.store(0, Ordering::Release));
            Ok(())
        })
    }

    pub fn size(&self) -> usize {
        self.read(|| self.len.load(Ordering::Acquire))
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.read(|| self.layout.load().capacity())
    }

    pub fn get(&self, index: usize) -> Option<Element> {
        self.read(|| {
            let len = self.len.load(Ordering::Acquire);
            if index >= len {
                return None;
            }
            self.layout.load().slots.get(index).map(|slot| slot.load(Ordering::Relaxed))
        })
    }

    /// A consistent copy of the current contents.
    pub fn to_vec(&self) -> Vec<Element> {
        self.read(|| {
            let len = self.len.load(Ordering::Acquire);
            let layout = self.layout.load();
            layout.slots
                .iter()
                .take(len)
                .map(|slot| slot.load(Ordering::Relaxed))
                .collect()
        })
    }

    /// Diagnostic description of the storage representation.
    pub fn describe(&self) -> String {
        let kind = self.strategy_kind();
        let (len, capacity, generation) = self.read(|| {
            let len = self.len.load(Ordering::Acquire);
            let layout = self.layout.load();
            (len, layout.capacity(), layout.generation())
        });
        return format!("{}(len={}, capacity={}, generation={})",
                       kind.storage_name(),
                       len,
                       capacity,
                       generation);
    }

    fn read<R, F>(&self, mut f: F) -> R
        where R: Default,
              F: FnMut() -> R
    {
        let _op = self.enter(READER);
        let guard = self.strategy.load();
        let mut result = R::default();
        guard.protect_read(&mut || result = f());
        return result;
    }

    /// The mutation every strategy protects: grow if full, write the
    /// slot, publish the new length.
    fn push(&self, value: Element) -> Result<()> {
        let index = self.len.load(Ordering::Relaxed);
        let current = self.layout.load();
        if index < current.capacity() {
            return publish(&self.len, &current, index, value);
        }

        // Readers still holding `current` keep reading it undisturbed;
        // the new length is only published once the copy is in place.
        let grown = self.grow(&current, index);
        return publish(&self.len, &grown, index, value);
    }

    fn grow(&self, current: &Layout, len: usize) -> Arc<Layout> {
        let capacity = (current.capacity() * 2).max(len + 1).max(MIN_CAPACITY);
        let layout = Layout::with_capacity(current.generation + 1, capacity);
        for (to, from) in layout.slots.iter().zip(current.slots.iter()).take(len) {
            to.store(from.load(Ordering::Relaxed), Ordering::Relaxed);
        }
        debug!("array {:p} grew {} -> {} (generation {})",
               self,
               current.capacity(),
               capacity,
               layout.generation);

        let layout = Arc::new(layout);
        self.layout.store(layout.clone());
        return layout;
    }
}

fn publish(len: &AtomicUsize, layout: &Layout, index: usize, value: Element) -> Result<()> {
    match layout.slots.get(index) {
        Some(slot) => {
            slot.store(value, Ordering::Relaxed);
            len.store(index + 1, Ordering::Release);
            Ok(())
        }
        None => {
            Err(Error::IndexOutOfBounds {
                index: index,
                capacity: layout.capacity(),
            })
        }
    }
}

impl fmt::Debug for DynamicArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
