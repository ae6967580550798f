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
use crate::error::Result;
use crate::strategy::{Strategy, StrategyKind};

/// The unsynchronized baseline.  Concurrent appenders race on the
/// length and lose updates; the storage itself is made of atomics so
/// the race stays memory safe.
#[derive(Debug, Default)]
pub struct NoneStrategy;

impl Strategy for NoneStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::None
    }

    #[inline(always)]
    fn protect_write(&self, write: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        write()
    }

    #[inline(always)]
    fn protect_read(&self, read: &mut dyn FnMut()) {
        read();
    }

    fn try_protect_read(&self, read: &mut dyn FnMut()) -> bool {
        read();
        return true;
    }
}
