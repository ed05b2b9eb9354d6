use crate::gamma::gamma;
use crate::{DistributionKind, FittedDistribution, Result, RiskError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SHAPE_FLOOR: f64 = 0.1;

/// Empirical exponent mapping the coefficient of variation to a Weibull shape
const CV_SHAPE_EXPONENT: f64 = -1.086;

/// Lower bound applied to the fitted Weibull shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitterConfig {
    pub shape_floor: f64,
}

impl Default for FitterConfig {
    fn default() -> Self {
        FitterConfig {
            shape_floor: DEFAULT_SHAPE_FLOOR,
        }
    }
}

impl FitterConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.shape_floor.is_finite() && self.shape_floor > 0.0) {
            return Err(RiskError::InvalidParameter(format!(
                "shape floor must be positive and finite, got {}",
                self.shape_floor
            )));
        }
        Ok(())
    }
}

/// Mean and population variance of the usable gaps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleMoments {
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
}

impl SampleMoments {
    /// Moments of the strictly positive, finite values in `sample`
    pub fn from_gaps(sample: &[f64]) -> Result<Self> {
        let usable: Vec<f64> = sample
            .iter()
            .copied()
            .filter(|gap| gap.is_finite() && *gap > 0.0)
            .collect();

        if usable.len() < 2 {
            return Err(RiskError::InsufficientData(format!(
                "need at least 2 positive inter-arrival times, got {}",
                usable.len()
            )));
        }

        let n = usable.len() as f64;
        let mean = usable.iter().sum::<f64>() / n;
        if !(mean.is_finite() && mean > 0.0) {
            return Err(RiskError::InsufficientData(format!(
                "mean inter-arrival time must be positive, got {mean}"
            )));
        }
        let variance = usable.iter().map(|gap| (gap - mean).powi(2)).sum::<f64>() / n;

        Ok(SampleMoments {
            count: usable.len(),
            mean,
            variance,
        })
    }

    pub fn coefficient_of_variation(&self) -> f64 {
        self.variance.sqrt() / self.mean
    }
}

/// Method-of-moments fitter for inter-arrival distributions
#[derive(Debug, Clone, Default)]
pub struct DistributionFitter {
    config: FitterConfig,
}

impl DistributionFitter {
    pub fn new(config: FitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(DistributionFitter { config })
    }

    pub fn fit(&self, sample: &[f64], kind: DistributionKind) -> Result<FittedDistribution> {
        let moments = SampleMoments::from_gaps(sample)?;

        let fitted = match kind {
            DistributionKind::Exponential => FittedDistribution::exponential(moments.mean),
            DistributionKind::Weibull => {
                let shape = self.weibull_shape(moments.coefficient_of_variation());
                let mean_factor = gamma(1.0 + 1.0 / shape)?;
                FittedDistribution::weibull(shape, moments.mean / mean_factor)
            }
        };

        if !fitted.is_valid() {
            return Err(RiskError::InvalidParameter(format!(
                "fitted {:?} has shape {} and scale {}",
                fitted.kind, fitted.shape, fitted.scale
            )));
        }

        tracing::debug!(
            kind = ?fitted.kind,
            shape = fitted.shape,
            scale = fitted.scale,
            samples = moments.count,
            mean = moments.mean,
            "fitted inter-arrival distribution"
        );
        Ok(fitted)
    }

    /// Shape from the coefficient of variation, never below the configured floor
    ///
    /// A zero or undefined CV means no spread to fit, so the floor is used.
    /// A vanishing CV can push the shape to infinity; `fit` rejects that.
    pub fn weibull_shape(&self, cv: f64) -> f64 {
        if !(cv.is_finite() && cv > 0.0) {
            return self.config.shape_floor;
        }
        cv.powf(CV_SHAPE_EXPONENT).max(self.config.shape_floor)
    }
}
