//! Supply-chain disruption risk from historical order timing
//!
//! Day gaps between successive order dates are fitted to a Weibull or
//! Exponential distribution by moment matching. Late-delivery orders only
//! set the baseline cost of a disruption. Each Monte-Carlo trial then
//! replays a renewal process over a future horizon on the `des` event loop:
//!
//! - ArrivalProcess: draws the next gap and schedules the next disruption
//! - CostLedger: counts disruptions and accrues a randomised cost for each
//!
//! Trial results are reduced to mean/std of disruption counts and
//! mean/VaR95/VaR99/max of total cost.

pub mod aggregator;
pub mod api;
pub mod arrival_process;
pub mod config;
pub mod cost_ledger;
pub mod error;
pub mod fitter;
pub mod gamma;
pub mod history;
pub mod runner;
pub mod variate;

pub use aggregator::SimulationSummary;
pub use error::{Result, RiskError};
pub use fitter::{DistributionFitter, FitterConfig};
pub use runner::{ExecutionOptions, SimulationRunner};

use serde::{Deserialize, Serialize};

/// Events delivered to agents within a single trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Trial begins at t = 0
    TrialStart,

    /// A disruption happens at the event time
    DisruptionOccurred,
}

/// Distribution family used for inter-arrival gaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    Weibull,
    Exponential,
}

impl DistributionKind {
    /// `"weibull"` selects Weibull, anything else falls back to Exponential
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("weibull") {
            DistributionKind::Weibull
        } else {
            DistributionKind::Exponential
        }
    }
}

/// Fitted inter-arrival distribution
///
/// For Exponential the shape is reported as 1.0 and ignored; the scale is the
/// mean gap (rate = 1 / scale).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FittedDistribution {
    pub kind: DistributionKind,
    pub shape: f64,
    pub scale: f64,
}

impl FittedDistribution {
    pub fn weibull(shape: f64, scale: f64) -> Self {
        FittedDistribution {
            kind: DistributionKind::Weibull,
            shape,
            scale,
        }
    }

    pub fn exponential(mean: f64) -> Self {
        FittedDistribution {
            kind: DistributionKind::Exponential,
            shape: 1.0,
            scale: mean,
        }
    }

    /// Shape and scale are both positive and finite
    pub fn is_valid(&self) -> bool {
        self.shape.is_finite() && self.shape > 0.0 && self.scale.is_finite() && self.scale > 0.0
    }

    /// Theoretical mean gap
    pub fn mean(&self) -> Result<f64> {
        match self.kind {
            DistributionKind::Exponential => Ok(self.scale),
            DistributionKind::Weibull => Ok(self.scale * gamma::gamma(1.0 + 1.0 / self.shape)?),
        }
    }
}

/// Parameters of one simulation request
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub num_trials: usize,
    pub horizon_days: f64,
    pub distribution: DistributionKind,
    pub baseline_cost: f64,
    pub seed: u64,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_trials == 0 {
            return Err(RiskError::InvalidParameter(
                "number of trials must be at least 1".to_string(),
            ));
        }
        if !self.horizon_days.is_finite() || self.horizon_days < 0.0 {
            return Err(RiskError::InvalidParameter(format!(
                "horizon must be a non-negative number of days, got {}",
                self.horizon_days
            )));
        }
        if !self.baseline_cost.is_finite() || self.baseline_cost < 0.0 {
            return Err(RiskError::InvalidParameter(format!(
                "baseline cost must be non-negative, got {}",
                self.baseline_cost
            )));
        }
        Ok(())
    }
}

/// Outcome of a single trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialResult {
    pub disruption_count: usize,
    pub total_cost: f64,
}

/// Observable state of the arrival process after a trial
#[derive(Debug, Clone, PartialEq)]
pub struct ArrivalStats {
    pub draws: usize,
    pub last_scheduled_t: f64,
}

/// Unified stats enum for all agents
#[derive(Debug, Clone, PartialEq)]
pub enum Stats {
    Arrivals(ArrivalStats),
    Ledger(TrialResult),
}

impl TrialResult {
    /// Pick the ledger's result out of a trial's agent stats
    pub fn from_stats(stats: &[Stats]) -> Option<TrialResult> {
        stats.iter().find_map(|s| match s {
            Stats::Ledger(result) => Some(*result),
            _ => None,
        })
    }
}
