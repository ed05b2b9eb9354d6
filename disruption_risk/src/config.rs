//! Experiment configuration loaded from TOML
//!
//! ```toml
//! [experiment]
//! name = "baseline"
//! seed = 42
//! num_simulations = 1000
//! time_horizon = 365
//! distribution = "weibull"
//!
//! [fitter]
//! shape_floor = 0.1
//!
//! [execution]
//! num_threads = 8
//! batch_size = 250
//! progress_interval = 100
//!
//! [data]
//! orders_csv = "data/orders.csv"
//! output_json = "results/baseline.json"
//! ```
//!
//! Every section and field is optional.

use crate::api::SimulationRequest;
use crate::fitter::FitterConfig;
use crate::runner::ExecutionOptions;
use crate::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub experiment: ExperimentSettings,
    pub fitter: FitterConfig,
    pub execution: ExecutionOptions,
    pub data: DataSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExperimentSettings {
    pub name: String,
    pub seed: Option<u64>,
    pub num_simulations: usize,
    pub time_horizon: u32,
    pub distribution: String,
}

impl Default for ExperimentSettings {
    fn default() -> Self {
        let request = SimulationRequest::default();
        ExperimentSettings {
            name: "baseline".to_string(),
            seed: request.seed,
            num_simulations: request.num_simulations,
            time_horizon: request.time_horizon,
            distribution: request.distribution,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Order export used to derive gaps and the baseline cost
    pub orders_csv: Option<PathBuf>,
    /// Explicit gaps in days; take precedence over the order export
    pub inter_arrival_times: Option<Vec<f64>>,
    /// Where to write the JSON response; stdout when unset
    pub output_json: Option<PathBuf>,
}

impl ExperimentConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ExperimentConfig = toml::from_str(text)?;
        config.fitter.validate()?;
        Ok(config)
    }

    pub fn to_request(&self) -> SimulationRequest {
        SimulationRequest {
            num_simulations: self.experiment.num_simulations,
            time_horizon: self.experiment.time_horizon,
            distribution: self.experiment.distribution.clone(),
            inter_arrival_times: self.data.inter_arrival_times.clone(),
            seed: self.experiment.seed,
        }
    }
}
