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
use parking_lot::ReentrantMutex;

use crate::error::Result;
use crate::strategy::{Strategy, StrategyKind};

/// Mutual exclusion that the owning thread may acquire again while it
/// already holds it.
#[derive(Default)]
pub struct ReentrantStrategy {
    lock: ReentrantMutex<()>,
}

impl ReentrantStrategy {
    pub fn new() -> Self {
        ReentrantStrategy { lock: ReentrantMutex::new(()) }
    }
}

impl Strategy for ReentrantStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Reentrant
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

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn nested_acquire_from_owner() {
        let strategy = ReentrantStrategy::new();
        let mut depth = 0;
        strategy.protect_write(&mut || {
                strategy.protect_write(&mut || {
                        strategy.protect_read(&mut || depth = 2);
                        Ok(())
                    })
            })
            .unwrap();
        assert_eq!(depth, 2);
    }

    #[test]
    fn excludes_other_threads() {
        let strategy = ReentrantStrategy::new();
        let (tx, rx) = mpsc::channel();
        strategy.protect_write(&mut || {
                thread::scope(|s| {
                    s.spawn(|| {
                        tx.send(strategy.try_protect_read(&mut || {})).unwrap();
                    });
                });
                Ok(())
            })
            .unwrap();
        assert_eq!(rx.recv().unwrap(), false);
    }
}
