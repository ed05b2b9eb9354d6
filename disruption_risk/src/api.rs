//! Request/response surface of the risk simulation
//!
//! Field names follow the JSON contract consumed by the dashboard front end
//! (camelCase, `interArrivalTimes` also accepted as `inter_arrival_times`).

use crate::aggregator::SimulationSummary;
use crate::fitter::DistributionFitter;
use crate::history::OrderHistory;
use crate::runner::{ExecutionOptions, SimulationRunner};
use crate::{DistributionKind, FittedDistribution, Result, RiskError, SimulationConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationRequest {
    pub num_simulations: usize,
    /// Horizon in whole days
    pub time_horizon: u32,
    pub distribution: String,
    #[serde(alias = "inter_arrival_times")]
    pub inter_arrival_times: Option<Vec<f64>>,
    pub seed: Option<u64>,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        SimulationRequest {
            num_simulations: 1000,
            time_horizon: 365,
            distribution: "weibull".to_string(),
            inter_arrival_times: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    pub disruption_counts: Vec<usize>,
    pub total_costs: Vec<f64>,
    pub stats: SimulationSummary,
    pub fitted: FittedDistribution,
    pub baseline_cost: f64,
    pub seed: u64,
}

/// Body returned instead of a response when a request fails
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&RiskError> for ErrorBody {
    fn from(err: &RiskError) -> Self {
        ErrorBody {
            error: err.to_string(),
        }
    }
}

/// Serves simulation requests against one order history
pub struct Simulator {
    history: OrderHistory,
    fitter: DistributionFitter,
    options: ExecutionOptions,
}

impl Simulator {
    pub fn new(history: OrderHistory, fitter: DistributionFitter, options: ExecutionOptions) -> Self {
        Simulator {
            history,
            fitter,
            options,
        }
    }

    /// Gaps supplied with the request, or derived from history when absent or empty
    fn resolve_gaps(&self, request: &SimulationRequest) -> Vec<f64> {
        match &request.inter_arrival_times {
            Some(gaps) if !gaps.is_empty() => gaps.clone(),
            _ => self.history.inter_arrival_times(),
        }
    }

    #[tracing::instrument(skip_all, fields(trials = request.num_simulations, horizon = request.time_horizon))]
    pub fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResponse> {
        let gaps = self.resolve_gaps(request);
        if gaps.is_empty() {
            return Err(RiskError::InsufficientData(
                "no interarrival data for fitting".to_string(),
            ));
        }

        let kind = DistributionKind::from_name(&request.distribution);
        let fitted = self.fitter.fit(&gaps, kind)?;
        let baseline_cost = self.history.baseline_cost();
        let seed = match request.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::rng().random::<u64>();
                tracing::info!(seed, "no seed supplied, drew one");
                seed
            }
        };

        let config = SimulationConfig {
            num_trials: request.num_simulations,
            horizon_days: f64::from(request.time_horizon),
            distribution: kind,
            baseline_cost,
            seed,
        };
        let runner = SimulationRunner::new(fitted, config)?.with_options(self.options.clone());
        let trials = runner.run()?;
        let stats = SimulationSummary::from_trials(&trials)?;

        Ok(SimulationResponse {
            disruption_counts: trials.iter().map(|t| t.disruption_count).collect(),
            total_costs: trials.iter().map(|t| t.total_cost).collect(),
            stats,
            fitted,
            baseline_cost,
            seed,
        })
    }
}
