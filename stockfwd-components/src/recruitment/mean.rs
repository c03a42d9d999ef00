use crate::errors::{ComponentError, ComponentResult};
use ndarray::s;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use stockfwd_core::recruitment::StockRecruitment;
use stockfwd_core::timeline::{FloatValue, Slot, StockTimeline};

/// Recruitment fixed at a mean value regardless of the spawning stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantMean {
    /// unit: numbers
    pub recruits: FloatValue,
}

#[typetag::serde]
impl StockRecruitment for ConstantMean {
    fn recruits(&self, _ssb: FloatValue) -> FloatValue {
        self.recruits
    }
}

/// Recruitment fixed at the geometric mean of past recruitment
///
/// $$ R = \exp\left(\frac{1}{n} \sum_{t} \ln N_{0,t}\right) $$
///
/// over the chosen steps and every iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometricMean {
    recruits: FloatValue,
}

impl GeometricMean {
    /// Geometric mean of the numbers at the recruitment age over `steps`.
    ///
    /// Missing and non-positive numbers are skipped.
    pub fn from_history(timeline: &StockTimeline, steps: Range<usize>) -> ComponentResult<Self> {
        if steps.end > timeline.n_steps() || steps.is_empty() {
            return Err(ComponentError::StepsOutOfRange {
                first: steps.start,
                end: steps.end,
                n_steps: timeline.n_steps(),
            });
        }
        let observed = timeline
            .slot(Slot::StockN)
            .slice(s![0, steps.clone(), ..])
            .iter()
            .filter(|x| x.is_finite() && **x > 0.0)
            .map(|x| x.ln())
            .collect::<Vec<_>>();
        if observed.is_empty() {
            return Err(ComponentError::NoObservations {
                first: steps.start,
                end: steps.end,
            });
        }
        let recruits = (observed.iter().sum::<FloatValue>() / observed.len() as FloatValue).exp();
        tracing::debug!(
            first = steps.start,
            end = steps.end,
            n_obs = observed.len(),
            recruits,
            "Geometric mean recruitment"
        );
        Ok(Self { recruits })
    }

    pub fn mean(&self) -> FloatValue {
        self.recruits
    }
}

#[typetag::serde]
impl StockRecruitment for GeometricMean {
    fn recruits(&self, _ssb: FloatValue) -> FloatValue {
        self.recruits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stock::{small_timeline, N_HISTORY};
    use is_close::is_close;

    #[test]
    fn constant_mean_ignores_spawners() {
        let model = ConstantMean { recruits: 123.0 };
        assert_eq!(model.recruits(0.0), 123.0);
        assert_eq!(model.recruits(1.0e6), 123.0);
    }

    #[test]
    fn geometric_mean_of_history() {
        let timeline = small_timeline();
        let model = GeometricMean::from_history(&timeline, 0..N_HISTORY).unwrap();
        let expected = ((100.0f64.ln() + 200.0f64.ln() + 300.0f64.ln() + 400.0f64.ln()) / 4.0).exp();
        assert!(is_close!(model.mean(), expected));
        assert!(is_close!(model.recruits(10.0), expected));
    }

    #[test]
    fn projection_steps_have_no_observations() {
        let timeline = small_timeline();
        assert_eq!(
            GeometricMean::from_history(&timeline, N_HISTORY..N_HISTORY + 2),
            Err(ComponentError::NoObservations {
                first: N_HISTORY,
                end: N_HISTORY + 2
            })
        );
    }

    #[test]
    fn steps_must_exist() {
        let timeline = small_timeline();
        assert!(matches!(
            GeometricMean::from_history(&timeline, 2..20),
            Err(ComponentError::StepsOutOfRange { .. })
        ));
    }
}
