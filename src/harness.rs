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
//! Timed append workloads and the suite that runs them per strategy.
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use appendlock_util::backoff;

use crate::array::{DynamicArray, Element};
use crate::error::{Error, Result};
use crate::strategy::StrategyKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    pub strategies: Vec<StrategyKind>,
    /// Items appended per worker per trial.
    pub items: usize,
    pub trials: usize,
    /// With one worker the single threaded workload is run.
    pub workers: usize,
    /// Append one untimed element after each reset, before the trial.
    pub seed_element: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            strategies: StrategyKind::ALL.to_vec(),
            items: 1000,
            trials: 100,
            workers: 1,
            seed_element: true,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(Error::InvalidConfig("no strategies selected".to_string()));
        }
        if self.items == 0 {
            return Err(Error::InvalidConfig("items must be at least 1".to_string()));
        }
        if self.trials == 0 {
            return Err(Error::InvalidConfig("trials must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(Error::InvalidConfig("workers must be at least 1".to_string()));
        }
        return Ok(());
    }

    /// Appends performed by one trial, seed excluded.
    pub fn ops_per_trial(&self) -> usize {
        self.items * self.workers
    }
}

/// Per trial durations of one measured block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkResult {
    pub strategy: StrategyKind,
    pub durations: Vec<Duration>,
}

impl BenchmarkResult {
    /// The reported figure.  The fastest trial is the one least
    /// disturbed by the scheduler.
    pub fn min(&self) -> Duration {
        self.durations.iter().min().cloned().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.durations.iter().max().cloned().unwrap_or_default()
    }

    pub fn median(&self) -> Duration {
        let mut sorted = self.durations.clone();
        sorted.sort();
        sorted.get(sorted.len() / 2).cloned().unwrap_or_default()
    }

    pub fn mean(&self) -> Duration {
        if self.durations.is_empty() {
            return Duration::default();
        }
        let total: Duration = self.durations.iter().sum();
        return total / self.durations.len() as u32;
    }

    pub fn min_micros(&self) -> u128 {
        self.min().as_micros()
    }

    /// Throughput of the fastest trial.
    pub fn ops_per_sec(&self, ops_per_trial: usize) -> f64 {
        let secs = self.min().as_secs_f64();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        return ops_per_trial as f64 / secs;
    }
}

/// The outcome for one strategy of a suite run.
#[derive(Debug)]
pub struct StrategyReport {
    pub strategy: StrategyKind,
    /// Storage diagnostic taken right before measuring.
    pub storage: String,
    pub outcome: Result<BenchmarkResult>,
}

impl fmt::Display for StrategyReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.storage)?;
        match self.outcome {
            Ok(ref result) => {
                write!(f,
                       "{} us (median {} us, max {} us)",
                       result.min_micros(),
                       result.median().as_micros(),
                       result.max().as_micros())
            }
            Err(ref err) => write!(f, "failed: {}", err),
        }
    }
}

/// Appends `0..items` from the calling thread.
pub fn run_single_threaded(array: &DynamicArray, items: usize) -> Result<Duration> {
    let before = array.size();

    let start = Instant::now();
    for i in 0..items {
        array.append(i as Element)?;
    }
    let elapsed = start.elapsed();

    check_size(array, before + items)?;
    return Ok(elapsed);
}

const WAITING: u8 = 0;
const OPEN: u8 = 1;
const ABORTED: u8 = 2;

/// Holds workers back until all of them are ready.  Unlike a barrier
/// it can also send the ones already waiting home, when spawning the
/// rest failed.
struct StartGate {
    ready: AtomicUsize,
    state: AtomicU8,
}

impl StartGate {
    fn new() -> Self {
        StartGate {
            ready: AtomicUsize::new(0),
            state: AtomicU8::new(WAITING),
        }
    }

    /// Returns whether the worker should run.
    fn wait(&self) -> bool {
        self.ready.fetch_add(1, Ordering::AcqRel);
        let mut counter = 0;
        loop {
            match self.state.load(Ordering::Acquire) {
                WAITING => backoff::spin_wait(&mut counter),
                state => return state == OPEN,
            }
        }
    }

    fn await_ready(&self, workers: usize) {
        let mut counter = 0;
        while self.ready.load(Ordering::Acquire) < workers {
            backoff::spin_wait(&mut counter);
        }
    }

    fn open(&self) {
        self.state.store(OPEN, Ordering::Release);
    }

    fn abort(&self) {
        self.state.store(ABORTED, Ordering::Release);
    }
}

/// Has `workers` threads each append `0..items`, released together
/// once all of them are up.  Times until the last worker is joined.
pub fn run_concurrent(array: &DynamicArray, items: usize, workers: usize) -> Result<Duration> {
    let before = array.size();
    let gate = StartGate::new();

    let (elapsed, outcomes) = thread::scope(|s| -> Result<_> {
        let mut children = Vec::with_capacity(workers);
        for worker in 0..workers {
            let gate_ref = &gate;
            let spawned = thread::Builder::new()
                .name(format!("append-worker-{}", worker))
                .spawn_scoped(s, move || -> Result<()> {
                    if !gate_ref.wait() {
                        return Ok(());
                    }
                    for i in 0..items {
                        array.append(i as Element)?;
                    }
                    Ok(())
                });
            match spawned {
                Ok(child) => children.push(child),
                Err(err) => {
                    gate.abort();
                    return Err(Error::SpawnFailed {
                        worker: worker,
                        source: err,
                    });
                }
            }
        }

        gate.await_ready(workers);
        let timer = Instant::now();
        gate.open();
        let outcomes: Vec<_> = children.into_iter().map(|child| child.join()).collect();
        Ok((timer.elapsed(), outcomes))
    })?;

    for (worker, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            Err(_) => return Err(Error::WorkerPanicked { worker: worker }),
        }
    }

    check_size(array, before + items * workers)?;
    return Ok(elapsed);
}

fn check_size(array: &DynamicArray, expected: usize) -> Result<()> {
    let actual = array.size();
    if actual != expected {
        return Err(Error::ConsistencyViolation {
            strategy: array.strategy_kind(),
            expected: expected,
            actual: actual,
        });
    }
    return Ok(());
}

/// Runs `workload` `trials` times on a freshly cleared array.  The
/// reset is not timed.
pub fn measure<F>(array: &DynamicArray, trials: usize, workload: F) -> Result<BenchmarkResult>
    where F: FnMut(&DynamicArray) -> Result<Duration>
{
    measure_trials(array, trials, false, workload)
}

/// Like `measure` but every trial starts from a single element array.
pub fn measure_seeded<F>(array: &DynamicArray,
                         trials: usize,
                         workload: F)
                         -> Result<BenchmarkResult>
    where F: FnMut(&DynamicArray) -> Result<Duration>
{
    measure_trials(array, trials, true, workload)
}

fn measure_trials<F>(array: &DynamicArray,
                     trials: usize,
                     seed: bool,
                     mut workload: F)
                     -> Result<BenchmarkResult>
    where F: FnMut(&DynamicArray) -> Result<Duration>
{
    let strategy = array.strategy_kind();
    let mut durations = Vec::with_capacity(trials);

    for trial in 0..trials {
        let reset = array.clear().and_then(|()| if seed { array.append(0) } else { Ok(()) });
        let outcome = reset.and_then(|()| workload(array));
        match outcome {
            Ok(elapsed) => durations.push(elapsed),
            Err(err @ Error::ConsistencyViolation { .. }) => return Err(err),
            Err(err) => {
                return Err(Error::TrialFailed {
                    strategy: strategy,
                    trial: trial,
                    source: Box::new(err),
                })
            }
        }
    }

    return Ok(BenchmarkResult {
        strategy: strategy,
        durations: durations,
    });
}

/// Measures every configured strategy in turn on one shared array.
///
/// A strategy whose trials fail or lose updates is reported and the
/// suite moves on; a refused strategy swap aborts the whole run.
pub fn run_suite(config: &BenchConfig) -> Result<Vec<StrategyReport>> {
    config.validate()?;

    let array = DynamicArray::with_kind(StrategyKind::None);
    let mut reports = Vec::with_capacity(config.strategies.len());

    for kind in config.strategies.iter() {
        array.set_strategy_kind(*kind)?;
        let storage = array.describe();
        info!("measuring {} with {} worker(s) x {} items, {} trials",
              kind,
              config.workers,
              config.items,
              config.trials);

        let outcome = run_block(&array, config);
        match outcome {
            Ok(ref result) => {
                info!("{}: min {} us, {:.0} ops/s",
                      kind,
                      result.min_micros(),
                      result.ops_per_sec(config.ops_per_trial()))
            }
            Err(ref err @ Error::ConsistencyViolation { .. }) if !kind.excludes_writers() => {
                info!("{}: {} (expected without writer exclusion)", kind, err)
            }
            Err(ref err) => warn!("{}: {}", kind, err),
        }

        reports.push(StrategyReport {
            strategy: *kind,
            storage: storage,
            outcome: outcome,
        });
    }

    return Ok(reports);
}

fn run_block(array: &DynamicArray, config: &BenchConfig) -> Result<BenchmarkResult> {
    let items = config.items;
    let workers = config.workers;
    if workers > 1 {
        measure_trials(array,
                       config.trials,
                       config.seed_element,
                       |a| run_concurrent(a, items, workers))
    } else {
        measure_trials(array,
                       config.trials,
                       config.seed_element,
                       |a| run_single_threaded(a, items))
    }
}
