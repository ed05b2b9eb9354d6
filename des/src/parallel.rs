//! Parallel execution of independent EventLoop scenarios
//!
//! This module runs many independent scenarios (Monte-Carlo trials, parameter
//! sweeps) concurrently on a rayon pool while keeping results deterministic.
//!
//! # Example: 100 seeded scenarios
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//! use des::{Agent, EventLoop};
//!
//! struct Fixed(usize);
//! impl Agent<u8, usize> for Fixed {
//!     fn stats(&self) -> usize {
//!         self.0
//!     }
//! }
//!
//! let results = ParallelRunner::new(100, |scenario_id| {
//!     let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(Fixed(scenario_id))];
//!     EventLoop::new(vec![(0.0, 1)], agents)
//! })
//! .num_threads(4)
//! .run(365.0);
//!
//! assert_eq!(results.len(), 100);
//! assert_eq!(results[42].as_ref().unwrap(), &vec![42]);
//! ```
//!
//! # Determinism
//!
//! Results are deterministic when:
//! 1. The builder uses `scenario_id` to derive unique seeds
//! 2. Agents use seeded RNGs (e.g., `StdRng::seed_from_u64(seed)`)
//! 3. No mutable state is shared across scenarios
//!
//! Results come back in `scenario_id` order regardless of thread count or
//! batch size.
//!
//! # Error Handling
//!
//! Panics in individual scenarios are caught and returned as
//! [`ScenarioError::Panicked`]; other scenarios keep running. Scenarios that
//! start after the cancellation flag is raised return
//! [`ScenarioError::Cancelled`] without being built.

use crate::EventLoop;
use rayon::ThreadPool;
use rayon::prelude::*;
use std::marker::PhantomData;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario panicked: {0}")]
    Panicked(String),
    #[error("scenario cancelled before it started")]
    Cancelled,
}

pub type ScenarioResult<S> = Result<Vec<S>, ScenarioError>;

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Executes multiple EventLoop scenarios in parallel
///
/// The builder `F` takes a scenario id and returns a fresh EventLoop. It is
/// called from worker threads, so it must be `Send + Sync`; the EventLoop
/// itself never crosses threads.
pub struct ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    cancel: Option<Arc<AtomicBool>>,
    _marker: PhantomData<fn() -> (T, S)>,
}

impl<T, S, F> ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            cancel: None,
            _marker: PhantomData,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each scenario
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Share a cancellation flag, checked before each scenario starts
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Execute all scenarios and return their stats in scenario_id order
    pub fn run(self, run_until: f64) -> Vec<ScenarioResult<S>> {
        let pool = self.build_pool();
        let progress_counter = AtomicUsize::new(0);
        self.run_range(
            0..self.num_scenarios,
            run_until,
            pool.as_ref(),
            &progress_counter,
        )
    }

    /// Dedicated pool when a thread count is set; None means the global pool
    fn build_pool(&self) -> Option<ThreadPool> {
        self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|err| {
                    tracing::warn!(threads = n, %err, "falling back to the global rayon pool");
                })
                .ok()
        })
    }

    fn run_range(
        &self,
        scenario_ids: Range<usize>,
        run_until: f64,
        pool: Option<&ThreadPool>,
        progress_counter: &AtomicUsize,
    ) -> Vec<ScenarioResult<S>> {
        let total = self.num_scenarios;
        let execute = || {
            scenario_ids
                .into_par_iter()
                .map(|scenario_id| {
                    let cancelled = self
                        .cancel
                        .as_ref()
                        .is_some_and(|flag| flag.load(Ordering::Relaxed));

                    let result = if cancelled {
                        Err(ScenarioError::Cancelled)
                    } else {
                        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            let mut event_loop = (self.builder)(scenario_id);
                            event_loop.run(run_until);
                            event_loop.stats()
                        }))
                        .map_err(|panic| ScenarioError::Panicked(panic_message(panic.as_ref())))
                    };

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, total);
                    }

                    result
                })
                .collect()
        };

        match pool {
            Some(pool) => pool.install(execute),
            None => execute(),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run scenarios in parallel on the global pool
pub fn run_parallel<T, S, F>(num_scenarios: usize, builder: F, run_until: f64) -> Vec<ScenarioResult<S>>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    ParallelRunner::new(num_scenarios, builder).run(run_until)
}

/// Run scenarios in batches to bound the number of live EventLoops
///
/// All batches share one pool sized by the runner's thread count, and its
/// progress callback and cancellation flag. Progress counts across the
/// whole run.
pub fn run_batched<T, S, F>(
    runner: ParallelRunner<T, S, F>,
    batch_size: usize,
    run_until: f64,
) -> Vec<ScenarioResult<S>>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    let total = runner.num_scenarios;
    let batch_size = batch_size.max(1);
    let mut all_results = Vec::with_capacity(total);
    let pool = runner.build_pool();
    let progress_counter = AtomicUsize::new(0);

    for batch_start in (0..total).step_by(batch_size) {
        let batch_end = (batch_start + batch_size).min(total);
        all_results.extend(runner.run_range(
            batch_start..batch_end,
            run_until,
            pool.as_ref(),
            &progress_counter,
        ));
    }

    all_results
}

/// Progress callback that logs every `interval` completed scenarios
pub fn progress_logger(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            tracing::info!(completed, total, "scenarios completed");
        }
    }
}
