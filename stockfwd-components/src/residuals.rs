//! Stochastic recruitment residuals.
//!
//! Residuals are multiplicative deviations of observed recruitment from a stock-recruitment
//! model. [`log_residuals`] extracts them from a stock's history and a
//! [`ResidualSampler`] resamples them into the `(step, iteration)` array used by
//! [`Recruitment`](stockfwd_core::recruitment::Recruitment).

use crate::errors::{ComponentError, ComponentResult};
use ndarray::Array2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use stockfwd_core::dynamics::Timing;
use stockfwd_core::recruitment::StockRecruitment;
use stockfwd_core::timeline::{FloatValue, Slot, StockTimeline};

/// Resamples residuals with replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualSampler {
    /// Residuals on the log scale
    pub log_residuals: Vec<FloatValue>,
    /// Seed of the random number generator
    /// default: 0
    #[serde(default)]
    pub seed: u64,
}

impl ResidualSampler {
    pub fn new(log_residuals: Vec<FloatValue>, seed: u64) -> Self {
        Self {
            log_residuals,
            seed,
        }
    }

    /// Draws a multiplicative residual for every iteration of every step in `steps`.
    ///
    /// The result has shape `(n_steps, n_iters)`; steps outside `steps` are 1. The same seed
    /// always gives the same array.
    pub fn sample(
        &self,
        n_steps: usize,
        n_iters: usize,
        steps: Range<usize>,
    ) -> ComponentResult<Array2<FloatValue>> {
        if self.log_residuals.is_empty() {
            return Err(ComponentError::EmptyResiduals);
        }
        if steps.end > n_steps {
            return Err(ComponentError::StepsOutOfRange {
                first: steps.start,
                end: steps.end,
                n_steps,
            });
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut residuals = Array2::ones((n_steps, n_iters));
        for step in steps {
            for iteration in 0..n_iters {
                let index = rng.gen_range(0..self.log_residuals.len());
                residuals[[step, iteration]] = self.log_residuals[index].exp();
            }
        }
        Ok(residuals)
    }

    /// Samples residuals for the projection steps of `timeline`.
    pub fn sample_projection(&self, timeline: &StockTimeline) -> ComponentResult<Array2<FloatValue>> {
        self.sample(
            timeline.n_steps(),
            timeline.n_iters(),
            timeline.projection_steps(),
        )
    }
}

/// Log residuals of the observed recruitment at `steps` in one iteration.
///
/// The residual of step `t` is `ln(N[0, t] / R(SSB[t - 1]))` with the spawning stock
/// biomass of the previous step. Steps without a previous step, or with missing or
/// non-positive values, are skipped.
pub fn log_residuals(
    timeline: &StockTimeline,
    model: &dyn StockRecruitment,
    steps: Range<usize>,
    iteration: usize,
) -> ComponentResult<Vec<FloatValue>> {
    if steps.end > timeline.n_steps() {
        return Err(ComponentError::StepsOutOfRange {
            first: steps.start,
            end: steps.end,
            n_steps: timeline.n_steps(),
        });
    }
    let residuals: Vec<FloatValue> = steps
        .clone()
        .filter(|&step| step > 0)
        .filter_map(|step| {
            let observed = timeline.at_age(Slot::StockN, step, iteration)[0];
            let predicted = model.recruits(timeline.ssb(step - 1, iteration, Timing::Spawning));
            let residual = (observed / predicted).ln();
            residual.is_finite().then_some(residual)
        })
        .collect();
    if residuals.is_empty() {
        return Err(ComponentError::NoObservations {
            first: steps.start,
            end: steps.end,
        });
    }
    Ok(residuals)
}
