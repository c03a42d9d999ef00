#![allow(dead_code)]

//! A small stock used by the component tests.

use ndarray::s;
use stockfwd_core::timeline::{AgeRange, Slot, StockTimeline, TimeAxis};

pub(crate) const N_HISTORY: usize = 4;

/// Sets one step of a slot to the same age vector in every iteration.
fn set_step(timeline: &mut StockTimeline, slot: Slot, step: usize, by_age: [f64; 4]) {
    for (age, value) in by_age.into_iter().enumerate() {
        timeline
            .slot_mut(slot)
            .slice_mut(s![age, step, ..])
            .fill(value);
    }
}

/// Ages 0 to 3+ over four historical years and two projection years, with two iterations.
///
/// Weights and harvest change from year to year so that averages are distinct from any
/// single year. Recruits in historical year `t` are `100 * (t + 1)`.
pub(crate) fn small_timeline() -> StockTimeline {
    let ages = AgeRange::new(0, 3).unwrap();
    let mut timeline =
        StockTimeline::new(ages, TimeAxis::from_range(2000, N_HISTORY + 2), 2, N_HISTORY)
            .unwrap()
            .with_fbar_range(1, 2)
            .unwrap();

    timeline.fill_by_age(Slot::M, &[0.2; 4]).unwrap();
    timeline.fill_by_age(Slot::Mat, &[0.0, 0.5, 1.0, 1.0]).unwrap();
    for step in 0..N_HISTORY {
        let year = step as f64;
        set_step(&mut timeline, Slot::StockWt, step, [0.1, 0.5, 1.0 + year, 2.0]);
        set_step(&mut timeline, Slot::CatchWt, step, [0.1, 0.5, 1.0 + year, 2.0]);
        set_step(
            &mut timeline,
            Slot::Harvest,
            step,
            [0.0, 0.1 * (year + 1.0), 0.2 * (year + 1.0), 0.2],
        );
        set_step(
            &mut timeline,
            Slot::StockN,
            step,
            [100.0 * (year + 1.0), 80.0, 50.0, 30.0],
        );
    }
    timeline
}
