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
use thiserror::Error;

use crate::strategy::StrategyKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot swap out the {strategy} strategy with {writers} writer(s) and {readers} reader(s) in flight")]
    IllegalState {
        strategy: StrategyKind,
        readers: usize,
        writers: usize,
    },

    #[error("trial {trial} under the {strategy} strategy failed: {source}")]
    TrialFailed {
        strategy: StrategyKind,
        trial: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("{strategy} strategy lost updates: expected size {expected}, found {actual}")]
    ConsistencyViolation {
        strategy: StrategyKind,
        expected: usize,
        actual: usize,
    },

    #[error("write at index {index} outside of storage with capacity {capacity}")]
    IndexOutOfBounds { index: usize, capacity: usize },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error("could not spawn worker {worker}")]
    SpawnFailed {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown strategy {0:?}")]
    UnknownStrategy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
