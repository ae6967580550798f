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
use std::sync::{Mutex, PoisonError, TryLockError};

use crate::error::Result;
use crate::strategy::{Strategy, StrategyKind};

/// Classic mutual exclusion on the standard library mutex.  Readers
/// take the same lock as writers.
#[derive(Debug, Default)]
pub struct MutexStrategy {
    lock: Mutex<()>,
}

impl MutexStrategy {
    pub fn new() -> Self {
        MutexStrategy { lock: Mutex::new(()) }
    }
}

impl Strategy for MutexStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Mutex
    }

    fn protect_write(&self, write: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        // Poisoning is ignored; the guarded state is all atomics.
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        write()
    }

    fn protect_read(&self, read: &mut dyn FnMut()) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        read();
    }

    fn try_protect_read(&self, read: &mut dyn FnMut()) -> bool {
        let _guard = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        read();
        return true;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn try_read_fails_while_writing() {
        let strategy = MutexStrategy::new();
        let mut inner_succeeded = None;
        strategy.protect_write(&mut || {
                inner_succeeded = Some(strategy.try_protect_read(&mut || {}));
                Ok(())
            })
            .unwrap();
        assert_eq!(inner_succeeded, Some(false));

        let mut ran = false;
        assert!(strategy.try_protect_read(&mut || ran = true));
        assert!(ran);
    }

    #[test]
    fn write_errors_propagate() {
        let strategy = MutexStrategy::new();
        let result = strategy.protect_write(&mut || {
            Err(crate::error::Error::IndexOutOfBounds {
                index: 3,
                capacity: 2,
            })
        });
        assert!(result.is_err());
        // the lock was released on the error path
        assert!(strategy.try_protect_read(&mut || {}));
    }
}
