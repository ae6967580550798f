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
//! Append latency of a shared dynamic array under interchangeable
//! synchronization strategies.
//!
//! A [`DynamicArray`] delegates every mutation to its active
//! [`Strategy`]; the [`harness`] times append workloads against it and
//! reports the fastest trial per strategy.

mod array;
mod error;
pub mod harness;
pub mod strategy;

pub use array::{ArrayState, DynamicArray, Element, Layout};
pub use error::{Error, Result};
pub use harness::{BenchConfig, BenchmarkResult, StrategyReport};
pub use strategy::{Strategy, StrategyKind};
