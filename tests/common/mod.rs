#![allow(dead_code)]

use ndarray::s;
use stockfwd::components::assumptions::MeanAssumptions;
use stockfwd::timeline::{AgeRange, Slot, StockTimeline, TimeAxis};

pub const FIRST_YEAR: i32 = 2015;
pub const N_HISTORY: usize = 6;
pub const N_FUTURE: usize = 5;

const M: f64 = 0.2;
const STOCK_WT: [f64; 7] = [0.05, 0.2, 0.45, 0.7, 0.95, 1.2, 1.5];
const CATCH_WT: [f64; 7] = [0.08, 0.25, 0.5, 0.75, 1.0, 1.25, 1.55];
const MAT: [f64; 7] = [0.0, 0.1, 0.5, 0.9, 1.0, 1.0, 1.0];
const SELECTIVITY: [f64; 7] = [0.05, 0.3, 0.7, 1.0, 1.0, 0.9, 0.9];
const RECRUITS: [f64; N_HISTORY] = [1200.0, 900.0, 1500.0, 1100.0, 800.0, 1000.0];

/// Six years (2015 to 2020) of an observed 7-age stock with a plus group.
///
/// Fbar over ages 2 to 5 is 0.5 in every year. The projection starts after the last year,
/// so the timeline must be extended before it can be projected.
pub fn history(n_iters: usize) -> StockTimeline {
    let ages = AgeRange::new(1, 7).unwrap();
    let time_axis = TimeAxis::from_range(FIRST_YEAR, N_HISTORY);
    let mut timeline = StockTimeline::new(ages, time_axis, n_iters, N_HISTORY)
        .unwrap()
        .with_fbar_range(2, 5)
        .unwrap();

    let fbar_sel = SELECTIVITY[1..=4].iter().sum::<f64>() / 4.0;
    let harvest: Vec<f64> = SELECTIVITY.iter().map(|s| s * 0.5 / fbar_sel).collect();
    timeline.fill_by_age(Slot::M, &[M; 7]).unwrap();
    timeline.fill_by_age(Slot::StockWt, &STOCK_WT).unwrap();
    timeline.fill_by_age(Slot::CatchWt, &CATCH_WT).unwrap();
    timeline.fill_by_age(Slot::Mat, &MAT).unwrap();
    timeline.fill_by_age(Slot::Harvest, &harvest).unwrap();
    timeline
        .fill_by_age(Slot::LandedFraction, &[0.2, 0.8, 1.0, 1.0, 1.0, 1.0, 1.0])
        .unwrap();

    let initial = ndarray::arr1(&[1200.0, 800.0, 500.0, 300.0, 170.0, 90.0, 80.0]);
    for iteration in 0..n_iters {
        timeline
            .slot_mut(Slot::StockN)
            .slice_mut(s![.., 0, iteration])
            .assign(&initial);
        for step in 1..N_HISTORY {
            let mut next = timeline.biology(step - 1, iteration).survivors(
                timeline.at_age(Slot::StockN, step - 1, iteration),
                timeline.at_age(Slot::Harvest, step - 1, iteration),
                true,
            );
            next[0] = RECRUITS[step];
            timeline
                .slot_mut(Slot::StockN)
                .slice_mut(s![.., step, iteration])
                .assign(&next);
        }
    }
    timeline
}

/// [`history`] extended by [`N_FUTURE`] years of mean biology and harvest.
pub fn stock(n_iters: usize) -> StockTimeline {
    let mut timeline = history(n_iters);
    timeline
        .extend(N_FUTURE, &MeanAssumptions::default())
        .unwrap();
    timeline
}

/// Sets the fractions of F and M before spawning for every step from `from` onwards.
pub fn spawn_after_fishing(timeline: &mut StockTimeline, from: usize, fraction: f64) {
    let n_steps = timeline.n_steps();
    for slot in [Slot::HarvestSpwn, Slot::MSpwn] {
        timeline
            .slot_mut(slot)
            .slice_mut(s![.., from..n_steps, ..])
            .fill(fraction);
    }
}

pub fn year(step: usize) -> i32 {
    FIRST_YEAR + step as i32
}
