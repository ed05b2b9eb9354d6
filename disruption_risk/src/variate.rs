//! Inverse-CDF sampling of inter-arrival intervals

use crate::{DistributionKind, FittedDistribution};
use rand::Rng;
use rand_distr::Distribution;

/// Rate used when an exponential fit carries a non-positive scale
pub const FLOOR_RATE: f64 = 0.01;

impl FittedDistribution {
    /// Interval whose CDF value is `u`
    ///
    /// `u` is expected in `[0, 1)`. Values at or beyond 1 are pulled back so
    /// the tail probability stays positive, and negative or NaN values are
    /// treated as 0, so this never returns NaN or infinity for a valid fit.
    pub fn inverse_cdf(&self, u: f64) -> f64 {
        let u = if u.is_nan() || u < 0.0 { 0.0 } else { u };
        let tail = (1.0 - u).max(f64::MIN_POSITIVE);
        let exposure = (-tail.ln()).max(0.0);

        match self.kind {
            DistributionKind::Weibull => self.scale * exposure.powf(1.0 / self.shape),
            DistributionKind::Exponential => {
                let rate = if self.scale > 0.0 {
                    1.0 / self.scale
                } else {
                    FLOOR_RATE
                };
                exposure / rate
            }
        }
    }
}

impl Distribution<f64> for FittedDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inverse_cdf(rng.random::<f64>())
    }
}
