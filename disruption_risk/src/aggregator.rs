use crate::{Result, RiskError, TrialResult};
use serde::Serialize;

/// Risk statistics over all trials of one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub mean_disruptions: f64,
    pub std_disruptions: f64,
    pub mean_total_cost: f64,
    pub var95: f64,
    pub var99: f64,
    pub max_cost: f64,
}

impl SimulationSummary {
    pub fn from_trials(trials: &[TrialResult]) -> Result<Self> {
        if trials.is_empty() {
            return Err(RiskError::InsufficientData(
                "no trial results to summarise".to_string(),
            ));
        }

        let counts: Vec<f64> = trials.iter().map(|t| t.disruption_count as f64).collect();
        let mut costs: Vec<f64> = trials.iter().map(|t| t.total_cost).collect();
        costs.sort_by(|a, b| a.total_cmp(b));

        let mean_disruptions = mean(&counts);
        let summary = SimulationSummary {
            mean_disruptions,
            std_disruptions: std_dev(&counts, mean_disruptions),
            mean_total_cost: mean(&costs),
            var95: quantile(&costs, 0.95),
            var99: quantile(&costs, 0.99),
            max_cost: costs[costs.len() - 1],
        };

        tracing::info!(
            trials = trials.len(),
            mean_disruptions = summary.mean_disruptions,
            mean_total_cost = summary.mean_total_cost,
            var95 = summary.var95,
            var99 = summary.var99,
            "summarised disruption trials"
        );
        Ok(summary)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Quantile `p` of an ascending slice, interpolating linearly between the
/// order statistics either side of rank `p * (n - 1)`
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}
