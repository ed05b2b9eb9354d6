//! Monte-Carlo execution of independent disruption trials
//!
//! Each trial is its own EventLoop holding an ArrivalProcess and a
//! CostLedger. Both agents get private RNGs seeded from the request seed and
//! the trial index, so results do not depend on how trials are spread over
//! threads or batches.

use crate::arrival_process::ArrivalProcess;
use crate::cost_ledger::CostLedger;
use crate::{Event, FittedDistribution, Result, RiskError, SimulationConfig, Stats, TrialResult};
use des::EventLoop;
use des::parallel::{ParallelRunner, ScenarioError, ScenarioResult, progress_logger, run_batched};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const ARRIVAL_STREAM: usize = 0;
const COST_STREAM: usize = 1;

/// How trials are spread over threads
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Size of a dedicated rayon pool; the global pool when unset
    pub num_threads: Option<usize>,
    /// Run trials in batches of this size to bound live event loops
    pub batch_size: Option<usize>,
    /// Log progress every N completed trials
    pub progress_interval: Option<usize>,
}

/// Sub-seed for stream `index` of `seed` (splitmix64 finaliser)
pub fn derive_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub struct SimulationRunner {
    distribution: FittedDistribution,
    config: SimulationConfig,
    options: ExecutionOptions,
    cancel: Arc<AtomicBool>,
}

impl SimulationRunner {
    pub fn new(distribution: FittedDistribution, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        if !distribution.is_valid() {
            return Err(RiskError::InvalidParameter(format!(
                "distribution needs positive finite shape and scale, got {} and {}",
                distribution.shape, distribution.scale
            )));
        }
        if distribution.kind != config.distribution {
            return Err(RiskError::InvalidParameter(format!(
                "fitted {:?} distribution does not match requested {:?}",
                distribution.kind, config.distribution
            )));
        }
        Ok(SimulationRunner {
            distribution,
            config,
            options: ExecutionOptions::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    /// Flag that stops the run at the next trial boundary when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn build_trial(&self, trial: usize) -> EventLoop<Event, Stats> {
        let trial_seed = derive_seed(self.config.seed, trial);
        let agents: Vec<Box<dyn des::Agent<Event, Stats>>> = vec![
            Box::new(ArrivalProcess::new(
                self.distribution,
                self.config.horizon_days,
                derive_seed(trial_seed, ARRIVAL_STREAM),
            )),
            Box::new(CostLedger::new(
                self.config.baseline_cost,
                derive_seed(trial_seed, COST_STREAM),
            )),
        ];
        EventLoop::new(vec![(0.0, Event::TrialStart)], agents)
    }

    /// Run a single trial on the calling thread
    pub fn run_trial(&self, trial: usize) -> Result<TrialResult> {
        let mut event_loop = self.build_trial(trial);
        event_loop.run(self.config.horizon_days);
        trial_result(trial, &event_loop.stats())
    }

    /// Run every trial and return results in trial order
    pub fn run(&self) -> Result<Vec<TrialResult>> {
        let total = self.config.num_trials;
        tracing::info!(
            trials = total,
            horizon_days = self.config.horizon_days,
            kind = ?self.distribution.kind,
            seed = self.config.seed,
            "running disruption trials"
        );

        let mut runner = ParallelRunner::new(total, |trial| self.build_trial(trial))
            .cancel_flag(self.cancel_handle());
        if let Some(n) = self.options.num_threads {
            runner = runner.num_threads(n);
        }
        if let Some(interval) = self.options.progress_interval {
            runner = runner.progress(progress_logger(interval));
        }

        let outcomes = match self.options.batch_size {
            Some(batch_size) => run_batched(runner, batch_size, self.config.horizon_days),
            None => runner.run(self.config.horizon_days),
        };

        let results = collect_results(outcomes)?;
        if self.cancel.load(Ordering::Relaxed) {
            tracing::warn!(trials = total, "cancellation requested after the last trial finished");
        }
        Ok(results)
    }
}

fn collect_results(outcomes: Vec<ScenarioResult<Stats>>) -> Result<Vec<TrialResult>> {
    let total = outcomes.len();
    let cancelled = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(ScenarioError::Cancelled)))
        .count();
    if cancelled > 0 {
        return Err(RiskError::Cancelled {
            completed: total - cancelled,
            total,
        });
    }

    outcomes
        .into_iter()
        .enumerate()
        .map(|(trial, outcome)| match outcome {
            Ok(stats) => trial_result(trial, &stats),
            Err(err) => Err(RiskError::TrialFailed {
                trial,
                message: err.to_string(),
            }),
        })
        .collect()
}

fn trial_result(trial: usize, stats: &[Stats]) -> Result<TrialResult> {
    TrialResult::from_stats(stats).ok_or_else(|| RiskError::TrialFailed {
        trial,
        message: "cost ledger reported no result".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DistributionKind;

    fn config(num_trials: usize, horizon_days: f64) -> SimulationConfig {
        SimulationConfig {
            num_trials,
            horizon_days,
            distribution: DistributionKind::Exponential,
            baseline_cost: 150.0,
            seed: 42,
        }
    }

    #[test]
    fn test_derive_seed_spreads_indices() {
        let seeds: std::collections::HashSet<u64> = (0..1000).map(|i| derive_seed(42, i)).collect();
        assert_eq!(seeds.len(), 1000);
        assert_ne!(derive_seed(42, 0), derive_seed(43, 0));
        assert_eq!(derive_seed(42, 7), derive_seed(42, 7));
    }

    #[test]
    fn test_rejects_zero_trials() {
        let result = SimulationRunner::new(FittedDistribution::exponential(10.0), config(0, 365.0));
        assert!(matches!(result, Err(RiskError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_negative_horizon() {
        let result = SimulationRunner::new(FittedDistribution::exponential(10.0), config(10, -1.0));
        assert!(matches!(result, Err(RiskError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_mismatched_kind() {
        let result = SimulationRunner::new(FittedDistribution::weibull(1.2, 10.0), config(10, 365.0));
        assert!(matches!(result, Err(RiskError::InvalidParameter(_))));
    }

    #[test]
    fn test_rejects_degenerate_distribution() {
        let result = SimulationRunner::new(FittedDistribution::exponential(0.0), config(10, 365.0));
        assert!(matches!(result, Err(RiskError::InvalidParameter(_))));
    }

    #[test]
    fn test_returns_one_result_per_trial() {
        let runner =
            SimulationRunner::new(FittedDistribution::exponential(10.0), config(250, 365.0)).unwrap();
        let results = runner.run().unwrap();
        assert_eq!(results.len(), 250);
    }

    #[test]
    fn test_parallel_run_matches_single_trials() {
        let runner =
            SimulationRunner::new(FittedDistribution::exponential(10.0), config(40, 120.0)).unwrap();
        let results = runner.run().unwrap();
        for (trial, result) in results.iter().enumerate() {
            assert_eq!(*result, runner.run_trial(trial).unwrap());
        }
    }

    #[test]
    fn test_zero_horizon_yields_empty_trials() {
        let runner =
            SimulationRunner::new(FittedDistribution::exponential(0.5), config(100, 0.0)).unwrap();
        let results = runner.run().unwrap();
        assert!(results.iter().all(|r| r.disruption_count == 0 && r.total_cost == 0.0));
    }

    #[test]
    fn test_cost_bounded_by_count() {
        let runner =
            SimulationRunner::new(FittedDistribution::exponential(5.0), config(200, 90.0)).unwrap();
        for result in runner.run().unwrap() {
            let n = result.disruption_count as f64;
            assert!(result.total_cost >= 0.5 * 150.0 * n - 1e-6);
            assert!(result.total_cost <= 2.0 * 150.0 * n + 1e-6);
        }
    }

    #[test]
    fn test_cancelled_run_reports_error() {
        let runner =
            SimulationRunner::new(FittedDistribution::exponential(10.0), config(50, 365.0)).unwrap();
        runner.cancel_handle().store(true, Ordering::Relaxed);

        match runner.run() {
            Err(RiskError::Cancelled { completed, total }) => {
                assert_eq!(completed, 0);
                assert_eq!(total, 50);
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn test_collect_results_reports_failed_trial() {
        let outcomes = vec![
            Ok(vec![Stats::Ledger(TrialResult {
                disruption_count: 1,
                total_cost: 100.0,
            })]),
            Err(ScenarioError::Panicked("boom".to_string())),
        ];
        match collect_results(outcomes) {
            Err(RiskError::TrialFailed { trial, message }) => {
                assert_eq!(trial, 1);
                assert!(message.contains("boom"));
            }
            other => panic!("expected trial failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_ledger_result_is_a_failed_trial() {
        let stats = vec![Stats::Arrivals(crate::ArrivalStats {
            draws: 4,
            last_scheduled_t: 370.0,
        })];

        match trial_result(3, &stats) {
            Err(RiskError::TrialFailed { trial, .. }) => assert_eq!(trial, 3),
            other => panic!("expected trial failure, got {other:?}"),
        }
        // collect_results reports the same trial the same way
        assert!(matches!(
            collect_results(vec![Ok(stats)]),
            Err(RiskError::TrialFailed { trial: 0, .. })
        ));
    }

    #[test]
    fn test_run_trial_matches_first_result() {
        let runner =
            SimulationRunner::new(FittedDistribution::exponential(10.0), config(5, 60.0)).unwrap();
        let first = runner.run_trial(0).unwrap();
        assert_eq!(first, runner.run().unwrap()[0]);
    }
}
