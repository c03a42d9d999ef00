//! Population dynamics of a single time step.
//!
//! All functions here work on age vectors for one (step, iteration) pair and do not know
//! about the timeline they came from. Mortality is continuous within a step:
//!
//! $$ N_{a+1, t+1} = N_{a,t} e^{-(F_{a,t} + M_{a,t})} $$
//!
//! and catch follows the Baranov equation
//!
//! $$ C_{a,t} = N_{a,t} \frac{F_{a,t}}{F_{a,t} + M_{a,t}} \left(1 - e^{-(F_{a,t} + M_{a,t})}\right) $$

use crate::quantity::QuantityKind;
use crate::timeline::FloatValue;
use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// Point within a step at which a biomass is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timing {
    /// Before any mortality in the step.
    Start,
    /// After the fractions of F and M that occur before spawning.
    Spawning,
    /// After all of the step's mortality.
    End,
}

/// Baranov catch in numbers for a single age.
pub fn baranov_catch(n: FloatValue, f: FloatValue, m: FloatValue) -> FloatValue {
    let z = f + m;
    if z <= 0.0 {
        return 0.0;
    }
    n * f / z * (1.0 - (-z).exp())
}

/// Mean of `f` over the age indexes `first..=last`.
pub fn fbar(f: ArrayView1<FloatValue>, first: usize, last: usize) -> FloatValue {
    let window = f.slice(ndarray::s![first..=last]);
    window.sum() / window.len() as FloatValue
}

/// Biological and timing assumptions for one step of one iteration.
///
/// Fishing mortality and numbers are passed separately to the methods so that trial
/// F vectors can be evaluated without touching the timeline.
#[derive(Debug, Clone, Copy)]
pub struct StepBiology<'a> {
    pub m: ArrayView1<'a, FloatValue>,
    pub stock_wt: ArrayView1<'a, FloatValue>,
    pub catch_wt: ArrayView1<'a, FloatValue>,
    pub mat: ArrayView1<'a, FloatValue>,
    pub m_spwn: ArrayView1<'a, FloatValue>,
    pub harvest_spwn: ArrayView1<'a, FloatValue>,
    pub landed_fraction: ArrayView1<'a, FloatValue>,
}

impl<'a> StepBiology<'a> {
    /// True if any fishing at any age takes place before spawning.
    pub fn fishes_before_spawning(&self) -> bool {
        self.harvest_spwn.iter().any(|&x| x > 0.0)
    }

    /// Catch in numbers at age.
    pub fn catch_numbers(
        &self,
        n: ArrayView1<FloatValue>,
        f: ArrayView1<FloatValue>,
    ) -> Array1<FloatValue> {
        Zip::from(&n)
            .and(&f)
            .and(&self.m)
            .map_collect(|&n, &f, &m| baranov_catch(n, f, m))
    }

    pub fn catch_weight(&self, n: ArrayView1<FloatValue>, f: ArrayView1<FloatValue>) -> FloatValue {
        (self.catch_numbers(n, f) * self.catch_wt).sum()
    }

    pub fn landings_weight(
        &self,
        n: ArrayView1<FloatValue>,
        f: ArrayView1<FloatValue>,
    ) -> FloatValue {
        (self.catch_numbers(n, f) * self.landed_fraction * self.catch_wt).sum()
    }

    pub fn discards_weight(
        &self,
        n: ArrayView1<FloatValue>,
        f: ArrayView1<FloatValue>,
    ) -> FloatValue {
        let discarded = self.landed_fraction.mapv(|x| 1.0 - x);
        (self.catch_numbers(n, f) * discarded * self.catch_wt).sum()
    }

    /// Fraction of the numbers at the start of the step still alive at `timing`.
    fn survival_to(&self, f: ArrayView1<FloatValue>, timing: Timing) -> Array1<FloatValue> {
        match timing {
            Timing::Start => Array1::ones(f.len()),
            Timing::Spawning => Zip::from(&f)
                .and(&self.harvest_spwn)
                .and(&self.m)
                .and(&self.m_spwn)
                .map_collect(|&f, &hs, &m, &ms| (-(f * hs + m * ms)).exp()),
            Timing::End => Zip::from(&f)
                .and(&self.m)
                .map_collect(|&f, &m| (-(f + m)).exp()),
        }
    }

    /// Total biomass at `timing`.
    pub fn biomass(
        &self,
        n: ArrayView1<FloatValue>,
        f: ArrayView1<FloatValue>,
        timing: Timing,
    ) -> FloatValue {
        (self.survival_to(f, timing) * n * self.stock_wt).sum()
    }

    /// Spawning stock biomass at `timing`.
    pub fn ssb(
        &self,
        n: ArrayView1<FloatValue>,
        f: ArrayView1<FloatValue>,
        timing: Timing,
    ) -> FloatValue {
        (self.survival_to(f, timing) * n * self.mat * self.stock_wt).sum()
    }

    /// Value of `kind` measured within this step.
    ///
    /// Flash quantities are measured at this step's spawning time. Moving them to the next
    /// step's spawning time is up to the caller.
    pub fn quantity(
        &self,
        kind: QuantityKind,
        n: ArrayView1<FloatValue>,
        f: ArrayView1<FloatValue>,
        fbar_indexes: (usize, usize),
    ) -> FloatValue {
        match kind {
            QuantityKind::Fbar => fbar(f, fbar_indexes.0, fbar_indexes.1),
            QuantityKind::Catch => self.catch_weight(n, f),
            QuantityKind::Landings => self.landings_weight(n, f),
            QuantityKind::Discards => self.discards_weight(n, f),
            QuantityKind::SsbEnd => self.ssb(n, f, Timing::End),
            QuantityKind::BiomassEnd => self.biomass(n, f, Timing::End),
            QuantityKind::SsbSpawn | QuantityKind::SsbFlash | QuantityKind::Srp => {
                self.ssb(n, f, Timing::Spawning)
            }
            QuantityKind::BiomassSpawn | QuantityKind::BiomassFlash => {
                self.biomass(n, f, Timing::Spawning)
            }
        }
    }

    /// Numbers at the start of the next step.
    ///
    /// The first element (the recruitment age) is left as NaN; recruitment is supplied by
    /// the caller. If `plus_group` is set the oldest age accumulates its own survivors.
    pub fn survivors(
        &self,
        n: ArrayView1<FloatValue>,
        f: ArrayView1<FloatValue>,
        plus_group: bool,
    ) -> Array1<FloatValue> {
        let alive = self.survival_to(f, Timing::End) * n;
        let n_ages = alive.len();
        let mut next = Array1::from_elem(n_ages, FloatValue::NAN);
        for age in 1..n_ages {
            next[age] = alive[age - 1];
        }
        if plus_group && n_ages > 1 {
            next[n_ages - 1] += alive[n_ages - 1];
        }
        next
    }
}
