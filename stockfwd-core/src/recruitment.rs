//! Recruitment of new fish into the stock.
//!
//! A [`StockRecruitment`] model predicts recruits from spawning stock biomass. The
//! [`Recruitment`] wrapper adds optional multiplicative residuals per (step, iteration).
//! Concrete models live in the `stockfwd-components` crate; any type implementing the
//! trait can be used.

use crate::errors::ConfigurationError;
use crate::timeline::{FloatValue, StockTimeline};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Deterministic stock-recruitment relationship.
///
/// Implementations are serialised with an internal `type` tag so that they can be
/// selected from configuration files.
#[typetag::serde(tag = "type")]
pub trait StockRecruitment: Debug + Send + Sync {
    /// Recruits produced by a spawning stock biomass of `ssb`.
    fn recruits(&self, ssb: FloatValue) -> FloatValue;
}

/// A stock-recruitment model and its residuals.
#[derive(Debug, Serialize, Deserialize)]
pub struct Recruitment {
    model: Box<dyn StockRecruitment>,
    /// Multiplicative residuals indexed `(step, iteration)`.
    ///
    /// The step is the one receiving the recruits. A single iteration column is shared by
    /// all iterations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    residuals: Option<Array2<FloatValue>>,
}

impl Recruitment {
    pub fn new(model: impl StockRecruitment + 'static) -> Self {
        Self::from_boxed(Box::new(model))
    }

    pub fn from_boxed(model: Box<dyn StockRecruitment>) -> Self {
        Self {
            model,
            residuals: None,
        }
    }

    pub fn with_residuals(self, residuals: Array2<FloatValue>) -> Self {
        Self {
            model: self.model,
            residuals: Some(residuals),
        }
    }

    pub fn model(&self) -> &dyn StockRecruitment {
        self.model.as_ref()
    }

    pub fn residuals(&self) -> Option<&Array2<FloatValue>> {
        self.residuals.as_ref()
    }

    /// Multiplicative residual for recruits entering at `step`.
    ///
    /// Missing or non-finite residuals count as 1.
    pub fn residual(&self, step: usize, iteration: usize) -> FloatValue {
        let Some(residuals) = &self.residuals else {
            return 1.0;
        };
        let column = if residuals.ncols() == 1 { 0 } else { iteration };
        residuals
            .get((step, column))
            .copied()
            .filter(|x| x.is_finite())
            .unwrap_or(1.0)
    }

    /// Recruits entering at `step` given the spawning stock biomass of the previous step.
    pub fn predict(&self, ssb: FloatValue, step: usize, iteration: usize) -> FloatValue {
        self.model.recruits(ssb) * self.residual(step, iteration)
    }

    /// Checks the residual array against the timeline's steps and iterations.
    pub fn check_against(&self, timeline: &StockTimeline) -> Result<(), ConfigurationError> {
        if let Some(residuals) = &self.residuals {
            let (steps, iterations) = residuals.dim();
            if steps != timeline.n_steps() || (iterations != 1 && iterations != timeline.n_iters())
            {
                return Err(ConfigurationError::ResidualShape {
                    steps: timeline.n_steps(),
                    iterations: timeline.n_iters(),
                    found: (steps, iterations),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example_stock::{example_timeline, FixedRecruitment};
    use ndarray::array;

    #[test]
    fn residual_defaults_to_one() {
        let recruitment = Recruitment::new(FixedRecruitment { recruits: 500.0 });
        assert_eq!(recruitment.residual(3, 2), 1.0);
        assert_eq!(recruitment.predict(1.0e4, 3, 2), 500.0);
    }

    #[test]
    fn residuals_scale_predictions() {
        let recruitment = Recruitment::new(FixedRecruitment { recruits: 500.0 })
            .with_residuals(array![[1.0, 2.0], [f64::NAN, 0.5]]);
        assert_eq!(recruitment.predict(0.0, 0, 1), 1000.0);
        assert_eq!(recruitment.predict(0.0, 1, 0), 500.0);
        assert_eq!(recruitment.predict(0.0, 1, 1), 250.0);
        // Steps beyond the residual array fall back to the deterministic prediction
        assert_eq!(recruitment.predict(0.0, 9, 1), 500.0);
    }

    #[test]
    fn single_residual_column_is_shared() {
        let recruitment = Recruitment::new(FixedRecruitment { recruits: 10.0 })
            .with_residuals(array![[3.0]]);
        assert_eq!(recruitment.predict(0.0, 0, 7), 30.0);
    }

    #[test]
    fn residual_shape_is_checked() {
        let timeline = example_timeline(2);
        let recruitment = Recruitment::new(FixedRecruitment { recruits: 10.0 })
            .with_residuals(Array2::ones((timeline.n_steps(), 3)));
        assert!(matches!(
            recruitment.check_against(&timeline),
            Err(ConfigurationError::ResidualShape { .. })
        ));

        let recruitment = Recruitment::new(FixedRecruitment { recruits: 10.0 })
            .with_residuals(Array2::ones((timeline.n_steps(), 1)));
        assert_eq!(recruitment.check_against(&timeline), Ok(()));
    }

    #[test]
    fn round_trips_through_json() {
        let recruitment = Recruitment::new(FixedRecruitment { recruits: 10.0 });
        let json = serde_json::to_string(&recruitment).unwrap();
        assert_eq!(json, r#"{"model":{"type":"FixedRecruitment","recruits":10.0}}"#);
        let restored: Recruitment = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.predict(1.0, 0, 0), 10.0);
    }
}
