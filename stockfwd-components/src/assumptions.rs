//! Future biology from recent averages.

use ndarray::{s, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use stockfwd_core::dynamics::fbar;
use stockfwd_core::errors::{TimelineError, TimelineResult};
use stockfwd_core::timeline::{FloatValue, FutureAssumptions, Slot, StockTimeline};

/// Fills new steps with the mean of the most recent existing steps.
///
/// Weights, maturity, natural mortality, spawning fractions and the landed fraction are
/// averaged over the last `wts_nyears` steps. The harvest pattern is averaged over the last
/// `fbar_nyears` steps and, if `rescale_f` is set, scaled so that its Fbar equals the Fbar
/// of the last existing step. Each iteration is averaged separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanAssumptions {
    /// Number of steps averaged for the biological assumptions
    /// default: 3
    pub wts_nyears: usize,
    /// Number of steps averaged for the harvest pattern
    /// default: 3
    pub fbar_nyears: usize,
    /// default: false
    pub rescale_f: bool,
}

impl Default for MeanAssumptions {
    fn default() -> Self {
        Self {
            wts_nyears: 3,
            fbar_nyears: 3,
            rescale_f: false,
        }
    }
}

/// Mean of a slot over `window` steps, indexed `(age, iteration)`.
fn window_mean(
    timeline: &StockTimeline,
    slot: Slot,
    window: Range<usize>,
) -> TimelineResult<Array2<FloatValue>> {
    let available = window.end;
    let len = window.len();
    timeline
        .slot(slot)
        .slice(s![.., window, ..])
        .mean_axis(Axis(1))
        .ok_or(TimelineError::WindowTooLong {
            window: len,
            available,
        })
}

fn check_window(window: usize, available: usize) -> TimelineResult<Range<usize>> {
    if window == 0 || window > available {
        return Err(TimelineError::WindowTooLong { window, available });
    }
    Ok(available - window..available)
}

impl FutureAssumptions for MeanAssumptions {
    fn fill(&self, timeline: &mut StockTimeline, new_steps: Range<usize>) -> TimelineResult<()> {
        let available = new_steps.start;
        let wts_window = check_window(self.wts_nyears, available)?;
        let fbar_window = check_window(self.fbar_nyears, available)?;

        let mut means = Vec::with_capacity(Slot::ASSUMPTIONS.len() + 1);
        for slot in Slot::ASSUMPTIONS {
            means.push((slot, window_mean(timeline, slot, wts_window.clone())?));
        }

        let mut harvest = window_mean(timeline, Slot::Harvest, fbar_window)?;
        if self.rescale_f {
            let (first, last) = timeline.fbar_indexes();
            let last_step = available - 1;
            for (iteration, mut pattern) in harvest.axis_iter_mut(Axis(1)).enumerate() {
                let current = timeline.fbar(last_step, iteration);
                let mean = fbar(pattern.view(), first, last);
                if mean > 0.0 {
                    pattern.mapv_inplace(|f| f * current / mean);
                }
            }
        }
        means.push((Slot::Harvest, harvest));

        for (slot, mean) in means {
            for step in new_steps.clone() {
                timeline
                    .slot_mut(slot)
                    .slice_mut(s![.., step, ..])
                    .assign(&mean);
            }
        }
        tracing::debug!(
            first = new_steps.start,
            end = new_steps.end,
            wts_nyears = self.wts_nyears,
            fbar_nyears = self.fbar_nyears,
            rescale_f = self.rescale_f,
            "Filled future assumptions"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_stock::{small_timeline, N_HISTORY};
    use is_close::is_close;
    use stockfwd_core::timeline::TimeAxis;

    fn extended(assumptions: &MeanAssumptions) -> StockTimeline {
        // Drop the projection steps so that the history can be extended
        let history = small_timeline();
        let mut timeline = StockTimeline::new(
            history.ages(),
            TimeAxis::from_range(2000, N_HISTORY),
            history.n_iters(),
            N_HISTORY,
        )
        .unwrap()
        .with_fbar_range(1, 2)
        .unwrap();
        for slot in Slot::ALL {
            timeline
                .set_slot(slot, history.slot(slot).slice(s![.., ..N_HISTORY, ..]).to_owned())
                .unwrap();
        }
        timeline.extend(3, assumptions).unwrap();
        timeline
    }

    #[test]
    fn averages_recent_weights() {
        let timeline = extended(&MeanAssumptions::default());
        // Age 2 weight is 1 + year, so the mean of years 1..=3 is 3
        for step in N_HISTORY..N_HISTORY + 3 {
            assert!(is_close!(timeline.at_age(Slot::StockWt, step, 1)[2], 3.0));
            assert!(is_close!(timeline.at_age(Slot::CatchWt, step, 0)[3], 2.0));
            assert!(is_close!(timeline.at_age(Slot::M, step, 0)[0], 0.2));
            assert_eq!(timeline.at_age(Slot::LandedFraction, step, 0)[1], 1.0);
        }
        assert_eq!(timeline.check_projection_inputs(), Ok(()));
    }

    #[test]
    fn averages_recent_harvest() {
        let timeline = extended(&MeanAssumptions {
            fbar_nyears: 2,
            ..Default::default()
        });
        // Age 1 harvest is 0.1 * (year + 1), mean of years 2 and 3 is 0.35
        assert!(is_close!(timeline.at_age(Slot::Harvest, N_HISTORY, 0)[1], 0.35));
        assert!(is_close!(timeline.fbar(N_HISTORY, 0), (0.35 + 0.7) / 2.0));
    }

    #[test]
    fn rescales_to_last_fbar() {
        let timeline = extended(&MeanAssumptions {
            rescale_f: true,
            ..Default::default()
        });
        assert!(is_close!(
            timeline.fbar(N_HISTORY + 2, 1),
            timeline.fbar(N_HISTORY - 1, 1)
        ));
    }

    #[test]
    fn window_longer_than_history() {
        let history = small_timeline();
        let mut timeline = history.clone();
        let err = MeanAssumptions {
            wts_nyears: 10,
            ..Default::default()
        }
        .fill(&mut timeline, N_HISTORY..N_HISTORY + 2)
        .unwrap_err();
        assert_eq!(
            err,
            TimelineError::WindowTooLong {
                window: 10,
                available: N_HISTORY
            }
        );
    }

    #[test]
    fn partial_config_uses_defaults() {
        let assumptions: MeanAssumptions = serde_json::from_str(r#"{"rescale_f": true}"#).unwrap();
        assert_eq!(assumptions.wts_nyears, 3);
        assert!(assumptions.rescale_f);
    }
}
