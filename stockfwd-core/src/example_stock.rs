#![allow(dead_code)]

//! Stock and recruitment fixtures shared by the unit tests.

use crate::dynamics::Timing;
use crate::recruitment::StockRecruitment;
use crate::timeline::{AgeRange, FloatValue, Slot, StockTimeline, TimeAxis};
use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

pub(crate) const FIRST_YEAR: i32 = 2015;
pub(crate) const N_HISTORY: usize = 5;
pub(crate) const N_PROJECTION: usize = 4;

pub(crate) const M: f64 = 0.2;
pub(crate) const STOCK_WT: [f64; 7] = [0.1, 0.3, 0.6, 0.9, 1.2, 1.5, 1.8];
pub(crate) const MAT: [f64; 7] = [0.0, 0.2, 0.6, 1.0, 1.0, 1.0, 1.0];
pub(crate) const SELECTIVITY: [f64; 7] = [0.1, 0.4, 0.8, 1.0, 1.0, 1.0, 1.0];
pub(crate) const F_LEVEL: f64 = 0.4;
pub(crate) const RECRUITS: f64 = 1000.0;

/// Recruitment that ignores the spawning stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FixedRecruitment {
    pub recruits: FloatValue,
}

#[typetag::serde]
impl StockRecruitment for FixedRecruitment {
    fn recruits(&self, _ssb: FloatValue) -> FloatValue {
        self.recruits
    }
}

/// Recruitment proportional to the spawning stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ProportionalRecruitment {
    pub per_ssb: FloatValue,
}

#[typetag::serde]
impl StockRecruitment for ProportionalRecruitment {
    fn recruits(&self, ssb: FloatValue) -> FloatValue {
        self.per_ssb * ssb
    }
}

/// A 7-age stock (ages 1 to 7+) with five historical years and four projection years.
///
/// Every step carries the same biology and a harvest pattern of [`F_LEVEL`] times
/// [`SELECTIVITY`]. Numbers are only filled for the historical years.
pub(crate) fn example_timeline(n_iters: usize) -> StockTimeline {
    let ages = AgeRange::new(1, 7).unwrap();
    let time_axis = TimeAxis::from_range(FIRST_YEAR, N_HISTORY + N_PROJECTION);
    let mut timeline = StockTimeline::new(ages, time_axis, n_iters, N_HISTORY)
        .unwrap()
        .with_fbar_range(2, 5)
        .unwrap();

    let harvest: Vec<f64> = SELECTIVITY.iter().map(|s| s * F_LEVEL).collect();
    timeline.fill_by_age(Slot::M, &[M; 7]).unwrap();
    timeline.fill_by_age(Slot::StockWt, &STOCK_WT).unwrap();
    timeline.fill_by_age(Slot::CatchWt, &STOCK_WT).unwrap();
    timeline.fill_by_age(Slot::Mat, &MAT).unwrap();
    timeline.fill_by_age(Slot::Harvest, &harvest).unwrap();

    let initial = Array1::from(vec![1000.0, 700.0, 450.0, 300.0, 180.0, 100.0, 120.0]);
    for iteration in 0..n_iters {
        timeline
            .slot_mut(Slot::StockN)
            .slice_mut(s![.., 0, iteration])
            .assign(&initial);
        for step in 0..N_HISTORY - 1 {
            let mut next = timeline.biology(step, iteration).survivors(
                timeline.at_age(Slot::StockN, step, iteration),
                timeline.at_age(Slot::Harvest, step, iteration),
                true,
            );
            next[0] = RECRUITS;
            timeline
                .slot_mut(Slot::StockN)
                .slice_mut(s![.., step + 1, iteration])
                .assign(&next);
        }
    }
    timeline
}

/// Spawning stock biomass of the last historical year of [`example_timeline`].
pub(crate) fn last_historical_ssb(timeline: &StockTimeline) -> FloatValue {
    timeline.ssb(N_HISTORY - 1, 0, Timing::Spawning)
}
