//! Age-structured stock over time and iterations.
//!
//! A [`StockTimeline`] stores one `Array3` per [`Slot`], indexed `(age, step, iteration)`.
//! Steps before [`StockTimeline::first_projection_step`] are historical and never modified
//! by the projection. Later steps carry assumed biology and are filled in by the solver.

use crate::dynamics::{fbar, StepBiology, Timing};
use crate::errors::{TimelineError, TimelineResult};
use crate::quantity::{QuantityKind, TimingClass};
use ndarray::{concatenate, s, Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

pub type FloatValue = f64;

/// Integer labels of the time steps, usually years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis {
    labels: Vec<i32>,
}

impl TimeAxis {
    /// Consecutive labels starting at `first`.
    pub fn from_range(first: i32, n_steps: usize) -> Self {
        Self {
            labels: (0..n_steps as i32).map(|i| first + i).collect(),
        }
    }

    pub fn from_labels(labels: Vec<i32>) -> TimelineResult<Self> {
        if labels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TimelineError::UnorderedTimeAxis);
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, step: usize) -> Option<i32> {
        self.labels.get(step).copied()
    }

    pub fn index_of(&self, label: i32) -> Option<usize> {
        self.labels.binary_search(&label).ok()
    }

    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Appends `n_steps` labels, each one greater than the last.
    fn extend(&mut self, n_steps: usize) {
        let last = self.labels.last().copied().unwrap_or(0);
        self.labels.extend((1..=n_steps as i32).map(|i| last + i));
    }
}

/// Per-age quantities stored in a [`StockTimeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    /// Numbers at age at the start of the step.
    StockN,
    /// Fishing mortality at age.
    Harvest,
    /// Natural mortality at age.
    M,
    /// Mean weight at age in the stock.
    StockWt,
    /// Mean weight at age in the catch.
    CatchWt,
    /// Proportion mature at age.
    Mat,
    /// Proportion of natural mortality before spawning.
    MSpwn,
    /// Proportion of fishing mortality before spawning.
    HarvestSpwn,
    /// Proportion of the catch numbers that are landed.
    LandedFraction,
}

impl Slot {
    pub const ALL: [Slot; 9] = [
        Slot::StockN,
        Slot::Harvest,
        Slot::M,
        Slot::StockWt,
        Slot::CatchWt,
        Slot::Mat,
        Slot::MSpwn,
        Slot::HarvestSpwn,
        Slot::LandedFraction,
    ];

    /// Slots that describe assumptions rather than the population response.
    pub const ASSUMPTIONS: [Slot; 7] = [
        Slot::M,
        Slot::StockWt,
        Slot::CatchWt,
        Slot::Mat,
        Slot::MSpwn,
        Slot::HarvestSpwn,
        Slot::LandedFraction,
    ];
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::StockN => "stock.n",
            Slot::Harvest => "harvest",
            Slot::M => "m",
            Slot::StockWt => "stock.wt",
            Slot::CatchWt => "catch.wt",
            Slot::Mat => "mat",
            Slot::MSpwn => "m.spwn",
            Slot::HarvestSpwn => "harvest.spwn",
            Slot::LandedFraction => "landed.fraction",
        };
        write!(f, "{}", name)
    }
}

/// Inclusive range of ages, the first of which is the recruitment age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn new(min: u32, max: u32) -> TimelineResult<Self> {
        if min > max {
            return Err(TimelineError::InvalidAges { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn len(&self) -> usize {
        (self.max - self.min + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn index_of(&self, age: u32) -> Option<usize> {
        (self.min..=self.max)
            .contains(&age)
            .then(|| (age - self.min) as usize)
    }
}

/// Populates the assumption slots of newly appended steps.
pub trait FutureAssumptions {
    /// Fill the slots of `new_steps` for every iteration.
    ///
    /// The timeline already has its final shape when this is called; the new steps hold NaN.
    fn fill(&self, timeline: &mut StockTimeline, new_steps: Range<usize>) -> TimelineResult<()>;
}

/// An age-structured stock over a time axis and a set of iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTimeline {
    ages: AgeRange,
    time_axis: TimeAxis,
    n_iters: usize,
    first_projection_step: usize,
    fbar_ages: AgeRange,
    plus_group: bool,
    stock_n: Array3<FloatValue>,
    harvest: Array3<FloatValue>,
    m: Array3<FloatValue>,
    stock_wt: Array3<FloatValue>,
    catch_wt: Array3<FloatValue>,
    mat: Array3<FloatValue>,
    m_spwn: Array3<FloatValue>,
    harvest_spwn: Array3<FloatValue>,
    landed_fraction: Array3<FloatValue>,
}

impl StockTimeline {
    /// Create a timeline with every slot unset.
    ///
    /// Spawning fractions default to zero and the landed fraction to one; all other slots
    /// are NaN. The Fbar range defaults to all ages and the oldest age is a plus group.
    pub fn new(
        ages: AgeRange,
        time_axis: TimeAxis,
        n_iters: usize,
        first_projection_step: usize,
    ) -> TimelineResult<Self> {
        if first_projection_step > time_axis.len() {
            return Err(TimelineError::StepOutOfRange {
                step: first_projection_step,
                n_steps: time_axis.len(),
            });
        }
        if n_iters == 0 {
            return Err(TimelineError::IterationOutOfRange {
                iteration: 0,
                n_iters,
            });
        }
        let shape = (ages.len(), time_axis.len(), n_iters);
        let nan = Array3::from_elem(shape, FloatValue::NAN);
        Ok(Self {
            ages,
            fbar_ages: ages,
            time_axis,
            n_iters,
            first_projection_step,
            plus_group: true,
            stock_n: nan.clone(),
            harvest: nan.clone(),
            m: nan.clone(),
            stock_wt: nan.clone(),
            catch_wt: nan.clone(),
            mat: nan,
            m_spwn: Array3::zeros(shape),
            harvest_spwn: Array3::zeros(shape),
            landed_fraction: Array3::ones(shape),
        })
    }

    pub fn with_fbar_range(mut self, min: u32, max: u32) -> TimelineResult<Self> {
        let valid = min <= max
            && self.ages.index_of(min).is_some()
            && self.ages.index_of(max).is_some();
        if !valid {
            return Err(TimelineError::InvalidFbarRange { min, max });
        }
        self.fbar_ages = AgeRange { min, max };
        Ok(self)
    }

    pub fn with_plus_group(mut self, plus_group: bool) -> Self {
        self.plus_group = plus_group;
        self
    }

    pub fn ages(&self) -> AgeRange {
        self.ages
    }

    pub fn fbar_ages(&self) -> AgeRange {
        self.fbar_ages
    }

    pub fn plus_group(&self) -> bool {
        self.plus_group
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    pub fn n_ages(&self) -> usize {
        self.ages.len()
    }

    pub fn n_steps(&self) -> usize {
        self.time_axis.len()
    }

    pub fn n_iters(&self) -> usize {
        self.n_iters
    }

    pub fn first_projection_step(&self) -> usize {
        self.first_projection_step
    }

    /// Steps filled in by a projection.
    pub fn projection_steps(&self) -> Range<usize> {
        self.first_projection_step..self.n_steps()
    }

    pub fn is_historical(&self, step: usize) -> bool {
        step < self.first_projection_step
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.n_ages(), self.n_steps(), self.n_iters)
    }

    pub fn slot(&self, slot: Slot) -> &Array3<FloatValue> {
        match slot {
            Slot::StockN => &self.stock_n,
            Slot::Harvest => &self.harvest,
            Slot::M => &self.m,
            Slot::StockWt => &self.stock_wt,
            Slot::CatchWt => &self.catch_wt,
            Slot::Mat => &self.mat,
            Slot::MSpwn => &self.m_spwn,
            Slot::HarvestSpwn => &self.harvest_spwn,
            Slot::LandedFraction => &self.landed_fraction,
        }
    }

    /// Mutable access to a slot.
    ///
    /// This bypasses the historical-step protection and is meant for setting up a timeline.
    pub fn slot_mut(&mut self, slot: Slot) -> &mut Array3<FloatValue> {
        match slot {
            Slot::StockN => &mut self.stock_n,
            Slot::Harvest => &mut self.harvest,
            Slot::M => &mut self.m,
            Slot::StockWt => &mut self.stock_wt,
            Slot::CatchWt => &mut self.catch_wt,
            Slot::Mat => &mut self.mat,
            Slot::MSpwn => &mut self.m_spwn,
            Slot::HarvestSpwn => &mut self.harvest_spwn,
            Slot::LandedFraction => &mut self.landed_fraction,
        }
    }

    /// Replace a whole slot.
    pub fn set_slot(&mut self, slot: Slot, values: Array3<FloatValue>) -> TimelineResult<()> {
        let expected = self.shape();
        if values.dim() != expected {
            return Err(TimelineError::ShapeMismatch {
                slot,
                expected,
                found: values.dim(),
            });
        }
        *self.slot_mut(slot) = values;
        Ok(())
    }

    /// Set a slot to the same age vector for every step and iteration.
    pub fn fill_by_age(&mut self, slot: Slot, values: &[FloatValue]) -> TimelineResult<()> {
        if values.len() != self.n_ages() {
            return Err(TimelineError::AgeCount {
                expected: self.n_ages(),
                found: values.len(),
            });
        }
        let by_age = ArrayView1::from(values);
        let target = self.slot_mut(slot);
        for mut lane in target.lanes_mut(Axis(0)) {
            lane.assign(&by_age);
        }
        Ok(())
    }

    /// Age vector of a slot at one step and iteration.
    pub fn at_age(&self, slot: Slot, step: usize, iteration: usize) -> ArrayView1<'_, FloatValue> {
        self.slot(slot).slice(s![.., step, iteration])
    }

    /// Age by step plane of a slot for one iteration.
    pub fn iteration_plane(&self, slot: Slot, iteration: usize) -> ArrayView2<'_, FloatValue> {
        self.slot(slot).slice(s![.., .., iteration])
    }

    pub(crate) fn check_step(&self, step: usize) -> TimelineResult<()> {
        if step >= self.n_steps() {
            return Err(TimelineError::StepOutOfRange {
                step,
                n_steps: self.n_steps(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_iteration(&self, iteration: usize) -> TimelineResult<()> {
        if iteration >= self.n_iters {
            return Err(TimelineError::IterationOutOfRange {
                iteration,
                n_iters: self.n_iters,
            });
        }
        Ok(())
    }

    fn check_position(&self, step: usize, iteration: usize) -> TimelineResult<()> {
        self.check_step(step)?;
        self.check_iteration(iteration)
    }

    /// Index range of the Fbar ages within the age dimension.
    pub fn fbar_indexes(&self) -> (usize, usize) {
        (
            (self.fbar_ages.min - self.ages.min) as usize,
            (self.fbar_ages.max - self.ages.min) as usize,
        )
    }

    /// Biology of one step and iteration, borrowed from the timeline.
    pub fn biology(&self, step: usize, iteration: usize) -> StepBiology<'_> {
        let at = move |slot| self.at_age(slot, step, iteration);
        StepBiology {
            m: at(Slot::M),
            stock_wt: at(Slot::StockWt),
            catch_wt: at(Slot::CatchWt),
            mat: at(Slot::Mat),
            m_spwn: at(Slot::MSpwn),
            harvest_spwn: at(Slot::HarvestSpwn),
            landed_fraction: at(Slot::LandedFraction),
        }
    }

    /// Appends `n_steps` future steps and lets `assumptions` populate them.
    pub fn extend(
        &mut self,
        n_steps: usize,
        assumptions: &impl FutureAssumptions,
    ) -> TimelineResult<()> {
        if n_steps == 0 {
            return Err(TimelineError::EmptyExtension);
        }
        let start = self.n_steps();
        let pad = Array3::from_elem((self.n_ages(), n_steps, self.n_iters), FloatValue::NAN);
        for slot in Slot::ALL {
            let current = self.slot(slot);
            let found = current.dim();
            let extended = concatenate(Axis(1), &[current.view(), pad.view()]).map_err(|_| {
                TimelineError::ShapeMismatch {
                    slot,
                    expected: (self.n_ages(), start, self.n_iters),
                    found,
                }
            })?;
            *self.slot_mut(slot) = extended;
        }
        self.time_axis.extend(n_steps);
        tracing::debug!(first = start, n_steps, "Extended stock timeline");
        assumptions.fill(self, start..start + n_steps)
    }

    /// Commits fishing mortality at age for a future step and writes the survivors into the
    /// next step.
    ///
    /// The recruitment age of the next step is left untouched; see
    /// [`set_recruitment`](Self::set_recruitment).
    pub fn realize(
        &mut self,
        step: usize,
        f_at_age: ArrayView1<FloatValue>,
        iteration: usize,
    ) -> TimelineResult<()> {
        self.check_position(step, iteration)?;
        if self.is_historical(step) {
            return Err(TimelineError::HistoricalStep { step });
        }
        if f_at_age.len() != self.n_ages() {
            return Err(TimelineError::AgeCount {
                expected: self.n_ages(),
                found: f_at_age.len(),
            });
        }
        self.harvest
            .slice_mut(s![.., step, iteration])
            .assign(&f_at_age);

        if step + 1 < self.n_steps() {
            let survivors = self.biology(step, iteration).survivors(
                self.at_age(Slot::StockN, step, iteration),
                f_at_age,
                self.plus_group,
            );
            self.stock_n
                .slice_mut(s![1.., step + 1, iteration])
                .assign(&survivors.slice(s![1..]));
        }
        Ok(())
    }

    /// Sets the numbers at the recruitment age of a future step.
    pub fn set_recruitment(
        &mut self,
        step: usize,
        iteration: usize,
        recruits: FloatValue,
    ) -> TimelineResult<()> {
        self.check_position(step, iteration)?;
        if self.is_historical(step) {
            return Err(TimelineError::HistoricalStep { step });
        }
        self.stock_n[[0, step, iteration]] = recruits;
        Ok(())
    }

    /// Overwrites the numbers and harvest planes of one iteration.
    pub(crate) fn write_iteration(
        &mut self,
        iteration: usize,
        stock_n: &Array2<FloatValue>,
        harvest: &Array2<FloatValue>,
    ) {
        let future = self.first_projection_step..;
        self.stock_n
            .slice_mut(s![.., future.clone(), iteration])
            .assign(&stock_n.slice(s![.., future.clone()]));
        self.harvest
            .slice_mut(s![.., future.clone(), iteration])
            .assign(&harvest.slice(s![.., future]));
    }

    pub fn catch_numbers(&self, step: usize, iteration: usize) -> Array1<FloatValue> {
        self.biology(step, iteration).catch_numbers(
            self.at_age(Slot::StockN, step, iteration),
            self.at_age(Slot::Harvest, step, iteration),
        )
    }

    pub fn catch_weight(&self, step: usize, iteration: usize) -> FloatValue {
        self.biology(step, iteration).catch_weight(
            self.at_age(Slot::StockN, step, iteration),
            self.at_age(Slot::Harvest, step, iteration),
        )
    }

    pub fn landings_weight(&self, step: usize, iteration: usize) -> FloatValue {
        self.biology(step, iteration).landings_weight(
            self.at_age(Slot::StockN, step, iteration),
            self.at_age(Slot::Harvest, step, iteration),
        )
    }

    pub fn discards_weight(&self, step: usize, iteration: usize) -> FloatValue {
        self.biology(step, iteration).discards_weight(
            self.at_age(Slot::StockN, step, iteration),
            self.at_age(Slot::Harvest, step, iteration),
        )
    }

    pub fn ssb(&self, step: usize, iteration: usize, timing: Timing) -> FloatValue {
        self.biology(step, iteration).ssb(
            self.at_age(Slot::StockN, step, iteration),
            self.at_age(Slot::Harvest, step, iteration),
            timing,
        )
    }

    pub fn biomass(&self, step: usize, iteration: usize, timing: Timing) -> FloatValue {
        self.biology(step, iteration).biomass(
            self.at_age(Slot::StockN, step, iteration),
            self.at_age(Slot::Harvest, step, iteration),
            timing,
        )
    }

    pub fn fbar(&self, step: usize, iteration: usize) -> FloatValue {
        let (first, last) = self.fbar_indexes();
        fbar(self.at_age(Slot::Harvest, step, iteration), first, last)
    }

    /// Realised value of a target quantity.
    ///
    /// Flash quantities on a step without fishing before spawning are read at the next
    /// step's spawning time, which must exist.
    pub fn quantity(
        &self,
        kind: QuantityKind,
        step: usize,
        iteration: usize,
    ) -> TimelineResult<FloatValue> {
        self.check_position(step, iteration)?;
        let spawn_step = match kind.timing_class() {
            TimingClass::Flash if !self.biology(step, iteration).fishes_before_spawning() => {
                self.check_step(step + 1)?;
                step + 1
            }
            _ => step,
        };
        let value = self.biology(spawn_step, iteration).quantity(
            kind,
            self.at_age(Slot::StockN, spawn_step, iteration),
            self.at_age(Slot::Harvest, spawn_step, iteration),
            self.fbar_indexes(),
        );
        Ok(value)
    }

    /// Checks that every value the projection reads is present.
    ///
    /// Future steps need all assumption slots and a harvest pattern. The step before the
    /// projection needs numbers and harvest unless the first projection step already has
    /// numbers for every age.
    pub fn check_projection_inputs(&self) -> TimelineResult<()> {
        let first = self.first_projection_step;
        for iteration in 0..self.n_iters {
            for step in self.projection_steps() {
                for slot in Slot::ASSUMPTIONS.into_iter().chain([Slot::Harvest]) {
                    self.require_finite(slot, step, iteration)?;
                }
            }
            if first < self.n_steps() && !self.has_numbers(first, iteration) {
                if first == 0 {
                    return Err(TimelineError::MissingValues {
                        slot: Slot::StockN,
                        step: first,
                        iteration,
                    });
                }
                for slot in Slot::ALL {
                    self.require_finite(slot, first - 1, iteration)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn has_numbers(&self, step: usize, iteration: usize) -> bool {
        self.at_age(Slot::StockN, step, iteration)
            .iter()
            .all(|x| x.is_finite())
    }

    fn require_finite(&self, slot: Slot, step: usize, iteration: usize) -> TimelineResult<()> {
        if self
            .at_age(slot, step, iteration)
            .iter()
            .all(|x| x.is_finite())
        {
            Ok(())
        } else {
            Err(TimelineError::MissingValues {
                slot,
                step,
                iteration,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::example_stock::{example_timeline, FIRST_YEAR, N_HISTORY};
    use is_close::is_close;
    use ndarray::array;

    struct CarryForward;

    impl FutureAssumptions for CarryForward {
        fn fill(
            &self,
            timeline: &mut StockTimeline,
            new_steps: Range<usize>,
        ) -> TimelineResult<()> {
            let last = new_steps.start - 1;
            for slot in Slot::ASSUMPTIONS.into_iter().chain([Slot::Harvest]) {
                let values = timeline.slot(slot).slice(s![.., last, ..]).to_owned();
                for step in new_steps.clone() {
                    timeline
                        .slot_mut(slot)
                        .slice_mut(s![.., step, ..])
                        .assign(&values);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn time_axis_lookup() {
        let axis = TimeAxis::from_range(2020, 3);
        assert_eq!(axis.labels(), &[2020, 2021, 2022]);
        assert_eq!(axis.index_of(2021), Some(1));
        assert_eq!(axis.index_of(2019), None);
        assert_eq!(
            TimeAxis::from_labels(vec![2020, 2020]),
            Err(TimelineError::UnorderedTimeAxis)
        );
    }

    #[test]
    fn new_timeline_defaults() {
        let timeline =
            StockTimeline::new(AgeRange::new(1, 4).unwrap(), TimeAxis::from_range(2000, 3), 2, 2)
                .unwrap();
        assert_eq!(timeline.slot(Slot::StockN).dim(), (4, 3, 2));
        assert!(timeline.slot(Slot::M).iter().all(|x| x.is_nan()));
        assert!(timeline.slot(Slot::HarvestSpwn).iter().all(|&x| x == 0.0));
        assert!(timeline.slot(Slot::LandedFraction).iter().all(|&x| x == 1.0));
        assert_eq!(timeline.projection_steps(), 2..3);
        assert!(timeline.is_historical(1));
    }

    #[test]
    fn invalid_fbar_range() {
        let timeline =
            StockTimeline::new(AgeRange::new(1, 4).unwrap(), TimeAxis::from_range(2000, 3), 1, 2)
                .unwrap();
        assert_eq!(
            timeline.with_fbar_range(2, 6).unwrap_err(),
            TimelineError::InvalidFbarRange { min: 2, max: 6 }
        );
    }

    #[test]
    fn set_slot_checks_shape() {
        let mut timeline = example_timeline(1);
        let err = timeline
            .set_slot(Slot::M, Array3::zeros((2, 2, 2)))
            .unwrap_err();
        assert!(matches!(err, TimelineError::ShapeMismatch { slot: Slot::M, .. }));
    }

    #[test]
    fn realize_rejects_historical_steps() {
        let mut timeline = example_timeline(1);
        let f = Array1::from_elem(timeline.n_ages(), 0.1);
        assert_eq!(
            timeline.realize(N_HISTORY - 1, f.view(), 0),
            Err(TimelineError::HistoricalStep {
                step: N_HISTORY - 1
            })
        );
    }

    #[test]
    fn realize_writes_survivors() {
        let mut timeline = example_timeline(1);
        let step = N_HISTORY;
        // Start the projection from known numbers
        let n0 = Array1::from_elem(timeline.n_ages(), 100.0);
        timeline
            .slot_mut(Slot::StockN)
            .slice_mut(s![.., step, 0])
            .assign(&n0);
        let f = Array1::from_elem(timeline.n_ages(), 0.3);
        timeline.realize(step, f.view(), 0).unwrap();
        timeline.set_recruitment(step + 1, 0, 42.0).unwrap();

        let next = timeline.at_age(Slot::StockN, step + 1, 0);
        assert_eq!(next[0], 42.0);
        assert!(is_close!(next[1], 100.0 * (-0.5f64).exp()));
        let last = timeline.n_ages() - 1;
        assert!(is_close!(next[last], 200.0 * (-0.5f64).exp()));
        assert!(is_close!(timeline.fbar(step, 0), 0.3));
    }

    #[test]
    fn extend_appends_steps() {
        let mut timeline = example_timeline(2);
        let n_steps = timeline.n_steps();
        timeline.extend(2, &CarryForward).unwrap();

        assert_eq!(timeline.n_steps(), n_steps + 2);
        assert_eq!(
            timeline.time_axis().label(n_steps + 1),
            Some(FIRST_YEAR + n_steps as i32 + 1)
        );
        assert_eq!(
            timeline.at_age(Slot::M, n_steps + 1, 1),
            timeline.at_age(Slot::M, n_steps - 1, 1)
        );
        assert!(timeline
            .at_age(Slot::StockN, n_steps, 0)
            .iter()
            .all(|x| x.is_nan()));
        assert_eq!(
            timeline.extend(0, &CarryForward),
            Err(TimelineError::EmptyExtension)
        );
    }

    #[test]
    fn quantities_match_direct_calculations() {
        let timeline = example_timeline(1);
        let step = N_HISTORY - 2;
        assert!(is_close!(
            timeline.quantity(QuantityKind::Catch, step, 0).unwrap(),
            timeline.catch_weight(step, 0)
        ));
        assert!(is_close!(
            timeline.quantity(QuantityKind::Srp, step, 0).unwrap(),
            timeline.ssb(step, 0, Timing::Spawning)
        ));
        assert!(is_close!(
            timeline.quantity(QuantityKind::SsbFlash, step, 0).unwrap(),
            timeline.ssb(step + 1, 0, Timing::Spawning)
        ));
    }

    #[test]
    fn flash_on_last_step_needs_a_next_step() {
        let timeline = example_timeline(1);
        let last = timeline.n_steps() - 1;
        assert!(matches!(
            timeline.quantity(QuantityKind::BiomassFlash, last, 0),
            Err(TimelineError::StepOutOfRange { .. })
        ));
    }

    #[test]
    fn missing_assumptions_are_reported() {
        let mut timeline = example_timeline(1);
        assert_eq!(timeline.check_projection_inputs(), Ok(()));
        timeline.slot_mut(Slot::Mat)[[2, N_HISTORY + 1, 0]] = f64::NAN;
        assert_eq!(
            timeline.check_projection_inputs(),
            Err(TimelineError::MissingValues {
                slot: Slot::Mat,
                step: N_HISTORY + 1,
                iteration: 0
            })
        );
    }

    #[test]
    fn fill_by_age_broadcasts() {
        let mut timeline =
            StockTimeline::new(AgeRange::new(0, 2).unwrap(), TimeAxis::from_range(2000, 2), 2, 1)
                .unwrap();
        timeline.fill_by_age(Slot::M, &[0.4, 0.3, 0.2]).unwrap();
        assert_eq!(timeline.at_age(Slot::M, 1, 1), array![0.4, 0.3, 0.2]);
        assert_eq!(
            timeline.fill_by_age(Slot::M, &[0.1]),
            Err(TimelineError::AgeCount {
                expected: 3,
                found: 1
            })
        );
    }
}
