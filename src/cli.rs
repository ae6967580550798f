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
use appendlock::{BenchConfig, Error, StrategyKind};
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version)]
#[clap(name = "appendlock")]
#[clap(about = "Times appends to a shared dynamic array under each locking strategy", long_about = None)]
pub struct Cli {
    /// Strategy to measure, repeatable: none, mutex, reentrant,
    /// spinlock, optimistic, layout or all
    #[clap(short, long = "strategy", default_value = "all")]
    pub strategies: Vec<String>,

    /// Items appended per worker per trial
    #[clap(short = 'n', long, default_value_t = 1000)]
    pub items: usize,

    #[clap(short, long, default_value_t = 100)]
    pub trials: usize,

    /// Concurrent appending threads; 1 runs the single threaded workload
    #[clap(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Start each trial from an empty array instead of a single element
    #[clap(long)]
    pub no_seed: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<BenchConfig, Error> {
        let mut strategies = Vec::new();
        for name in self.strategies.iter() {
            if name.eq_ignore_ascii_case("all") {
                strategies.extend_from_slice(&StrategyKind::ALL);
            } else {
                strategies.push(name.parse()?);
            }
        }

        let config = BenchConfig {
            strategies: strategies,
            items: self.items,
            trials: self.trials,
            workers: self.workers,
            seed_element: !self.no_seed,
        };
        config.validate()?;
        return Ok(config);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_measure_everything() {
        let config = Cli::parse_from(["appendlock"]).into_config().unwrap();
        assert_eq!(config, BenchConfig::default());
    }

    #[test]
    fn repeated_strategies() {
        let cli = Cli::parse_from(["appendlock", "-s", "mutex", "--strategy", "LayoutLock", "-w", "4",
                                   "--no-seed"]);
        let config = cli.into_config().unwrap();
        assert_eq!(config.strategies, vec![StrategyKind::Mutex, StrategyKind::Layout]);
        assert_eq!(config.workers, 4);
        assert!(!config.seed_element);
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let cli = Cli::parse_from(["appendlock", "-s", "rwlock"]);
        assert!(matches!(cli.into_config(), Err(Error::UnknownStrategy(_))));
    }
}
