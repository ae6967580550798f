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
//! Interchangeable synchronization policies for a `DynamicArray`.
//!
//! A strategy never touches the storage itself.  The array hands it
//! closures and the strategy decides under which exclusion they run.
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

mod layout;
mod mutex;
mod none;
mod reentrant;
mod spin;
mod stamped;

pub use self::layout::LayoutLockStrategy;
pub use self::mutex::MutexStrategy;
pub use self::none::NoneStrategy;
pub use self::reentrant::ReentrantStrategy;
pub use self::spin::{SpinLock, SpinLockGuard, SpinStrategy};
pub use self::stamped::{StampedLock, StampedStrategy, StampedWriteGuard};

pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Runs a mutation with at most one writer inside at a time
    /// (except for the unsynchronized baseline).
    fn protect_write(&self, write: &mut dyn FnMut() -> Result<()>) -> Result<()>;

    /// Runs a truncation of the array.  Reads that overlap it must not
    /// validate.  Only ever called from inside `protect_write`; growth
    /// never goes through here as it leaves the old layout intact.
    fn protect_truncate(&self, truncate: &mut dyn FnMut()) {
        truncate();
    }

    /// Runs a read so that it observes a consistent state.  The read
    /// may be executed more than once.
    fn protect_read(&self, read: &mut dyn FnMut());

    /// Makes a single attempt at a consistent read.  Returns `false`
    /// without a usable result if the attempt would block or was
    /// invalidated by a writer.
    fn try_protect_read(&self, read: &mut dyn FnMut()) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    None,
    Mutex,
    Reentrant,
    Spinlock,
    Optimistic,
    Layout,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [StrategyKind::None,
                                        StrategyKind::Mutex,
                                        StrategyKind::Reentrant,
                                        StrategyKind::Spinlock,
                                        StrategyKind::Optimistic,
                                        StrategyKind::Layout];

    pub fn name(&self) -> &'static str {
        match *self {
            StrategyKind::None => "none",
            StrategyKind::Mutex => "mutex",
            StrategyKind::Reentrant => "reentrant",
            StrategyKind::Spinlock => "spinlock",
            StrategyKind::Optimistic => "optimistic",
            StrategyKind::Layout => "layout",
        }
    }

    /// Name of the storage representation printed by diagnostics.
    pub fn storage_name(&self) -> &'static str {
        match *self {
            StrategyKind::None => "UnsynchronizedStorage",
            StrategyKind::Mutex => "MutexStorage",
            StrategyKind::Reentrant => "ReentrantLockStorage",
            StrategyKind::Spinlock => "SpinLockStorage",
            StrategyKind::Optimistic => "StampedLockStorage",
            StrategyKind::Layout => "LayoutLockStorage",
        }
    }

    /// Whether concurrent appenders are guaranteed not to lose updates.
    pub fn excludes_writers(&self) -> bool {
        *self != StrategyKind::None
    }

    pub fn build(&self) -> Box<dyn Strategy> {
        match *self {
            StrategyKind::None => Box::new(NoneStrategy),
            StrategyKind::Mutex => Box::new(MutexStrategy::new()),
            StrategyKind::Reentrant => Box::new(ReentrantStrategy::new()),
            StrategyKind::Spinlock => Box::new(SpinStrategy::new()),
            StrategyKind::Optimistic => Box::new(StampedStrategy::new()),
            StrategyKind::Layout => Box::new(LayoutLockStrategy::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<StrategyKind> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "none" | "local" | "fixed" => StrategyKind::None,
            "mutex" | "synchronized" => StrategyKind::Mutex,
            "reentrant" | "reentrantlock" => StrategyKind::Reentrant,
            "spinlock" | "spin" | "customlock" => StrategyKind::Spinlock,
            "optimistic" | "stamped" | "stampedlock" => StrategyKind::Optimistic,
            "layout" | "layoutlock" => StrategyKind::Layout,
            _ => return Err(Error::UnknownStrategy(s.to_string())),
        };
        return Ok(kind);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in StrategyKind::ALL.iter() {
            assert_eq!(kind.name().parse::<StrategyKind>().unwrap(), *kind);
            assert_eq!(kind.build().kind(), *kind);
        }
    }

    #[test]
    fn accepts_original_strategy_names() {
        assert_eq!("Synchronized".parse::<StrategyKind>().unwrap(), StrategyKind::Mutex);
        assert_eq!("ReentrantLock".parse::<StrategyKind>().unwrap(), StrategyKind::Reentrant);
        assert_eq!("CustomLock".parse::<StrategyKind>().unwrap(), StrategyKind::Spinlock);
        assert_eq!("StampedLock".parse::<StrategyKind>().unwrap(), StrategyKind::Optimistic);
        assert_eq!("LayoutLock".parse::<StrategyKind>().unwrap(), StrategyKind::Layout);
    }

    #[test]
    fn rejects_unknown() {
        match "rwlock".parse::<StrategyKind>() {
            Err(Error::UnknownStrategy(name)) => assert_eq!(name, "rwlock"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn only_the_baseline_races() {
        for kind in StrategyKind::ALL.iter() {
            assert_eq!(kind.excludes_writers(), *kind != StrategyKind::None);
        }
    }
}
