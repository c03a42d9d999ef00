//! Forward projection of a stock under a set of targets.
//!
//! The [`ForwardSolver`] walks the projection steps in order for each iteration. On every
//! step it scales the step's fishing mortality pattern so that the value target is met,
//! then re-solves for any bound the result violates, and finally commits F and advances
//! the population to the next step:
//!
//! $$ N_{0, t+1} = R(\mathrm{SSB}_t) \epsilon_{t+1} $$
//!
//! where $R$ is the stock-recruitment model and $\epsilon$ the recruitment residual.
//!
//! Iterations are independent and run in parallel. Each iteration works on its own copy of
//! the numbers and harvest planes; the results are merged into a copy of the input timeline
//! once every iteration has finished.

mod bisection;
mod config;
mod plan;

pub use config::SolverConfig;

use crate::control::{Column, ProjectionControl};
use crate::dynamics::{fbar, StepBiology, Timing};
use crate::errors::{FailureKind, StockFwdResult, TargetFailure, Warning};
use crate::quantity::{QuantityKind, Response, TimingClass};
use crate::recruitment::Recruitment;
use crate::timeline::{FloatValue, Slot, StockTimeline};
use bisection::{bisect, BisectionError, Status};
use ndarray::{s, Array1, Array2, ArrayView1};
use plan::{IterationPlan, PlacedTarget};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared flag used to stop a running projection.
///
/// The flag is checked before an iteration starts and between its steps. Iterations that
/// see it set are reported as [`IterationStatus::Cancelled`] and leave the timeline as it
/// was.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IterationStatus {
    Completed,
    /// The iteration stopped at the failed target. Steps before it are committed; numbers of
    /// later steps are NaN and their harvest is left as assumed.
    Failed(TargetFailure),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationOutcome {
    pub iteration: usize,
    pub status: IterationStatus,
    pub warnings: Vec<Warning>,
}

/// Result of a projection.
#[derive(Debug, Clone)]
pub struct Projection {
    pub timeline: StockTimeline,
    /// One outcome per iteration, in iteration order.
    pub outcomes: Vec<IterationOutcome>,
}

impl Projection {
    /// True if every iteration completed.
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == IterationStatus::Completed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TargetFailure> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            IterationStatus::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> {
        self.outcomes.iter().flat_map(|o| o.warnings.iter())
    }
}

/// Solves for the fishing mortality that meets a [`ProjectionControl`].
#[derive(Debug, Clone, Default)]
pub struct ForwardSolver {
    config: SolverConfig,
    cancellation: CancellationToken,
}

impl ForwardSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Projects every iteration of `timeline` forward.
    ///
    /// Malformed inputs are rejected before any iteration runs. Failures of individual
    /// targets are reported per iteration in the returned [`Projection`].
    pub fn project(
        &self,
        timeline: &StockTimeline,
        control: &ProjectionControl,
        recruitment: &Recruitment,
    ) -> StockFwdResult<Projection> {
        self.config.validate()?;
        control.check_against(timeline)?;
        recruitment.check_against(timeline)?;
        timeline.check_projection_inputs()?;

        info!(
            n_iters = timeline.n_iters(),
            n_targets = control.len(),
            first_step = timeline.first_projection_step(),
            n_steps = timeline.n_steps(),
            "Starting projection"
        );

        let results: Vec<(IterationOutcome, Option<Planes>)> = (0..timeline.n_iters())
            .into_par_iter()
            .map(|iteration| {
                IterationRun::new(self, timeline, control, recruitment, iteration).run()
            })
            .collect();

        let mut projected = timeline.clone();
        let mut outcomes = Vec::with_capacity(results.len());
        for (outcome, planes) in results {
            if let Some(planes) = planes {
                projected.write_iteration(outcome.iteration, &planes.stock_n, &planes.harvest);
            }
            if let IterationStatus::Failed(failure) = &outcome.status {
                warn!(
                    iteration = failure.iteration,
                    step = failure.step,
                    target_id = failure.target,
                    error = %failure.kind,
                    "Iteration failed"
                );
            }
            outcomes.push(outcome);
        }

        Ok(Projection {
            timeline: projected,
            outcomes,
        })
    }
}

/// Numbers and harvest of one iteration, indexed `(age, step)`.
struct Planes {
    stock_n: Array2<FloatValue>,
    harvest: Array2<FloatValue>,
}

/// State of a single iteration while it is being projected.
struct IterationRun<'a> {
    config: &'a SolverConfig,
    cancellation: &'a CancellationToken,
    timeline: &'a StockTimeline,
    control: &'a ProjectionControl,
    recruitment: &'a Recruitment,
    iteration: usize,
    planes: Planes,
}

impl<'a> IterationRun<'a> {
    fn new(
        solver: &'a ForwardSolver,
        timeline: &'a StockTimeline,
        control: &'a ProjectionControl,
        recruitment: &'a Recruitment,
        iteration: usize,
    ) -> Self {
        Self {
            config: &solver.config,
            cancellation: &solver.cancellation,
            timeline,
            control,
            recruitment,
            iteration,
            planes: Planes {
                stock_n: timeline
                    .iteration_plane(Slot::StockN, iteration)
                    .to_owned(),
                harvest: timeline
                    .iteration_plane(Slot::Harvest, iteration)
                    .to_owned(),
            },
        }
    }

    fn outcome(&self, status: IterationStatus, warnings: Vec<Warning>) -> IterationOutcome {
        IterationOutcome {
            iteration: self.iteration,
            status,
            warnings,
        }
    }

    fn run(mut self) -> (IterationOutcome, Option<Planes>) {
        if self.cancellation.is_cancelled() {
            return (self.outcome(IterationStatus::Cancelled, vec![]), None);
        }
        let plan = IterationPlan::build(self.control, self.timeline, self.iteration);
        let warnings = plan.warnings.clone();

        let steps = self.timeline.projection_steps();
        if let Some(first) = steps.clone().next() {
            if !self.timeline.has_numbers(first, self.iteration) {
                self.advance(first - 1, first);
            }
        }

        for step in steps {
            if self.cancellation.is_cancelled() {
                debug!(iteration = self.iteration, step, "Projection cancelled");
                return (self.outcome(IterationStatus::Cancelled, warnings), None);
            }
            let result = match plan.step(step) {
                Some(step_plan) => {
                    if let Some((target, kind)) = &step_plan.unreachable {
                        Err(self.failure(step, *target, kind.clone()))
                    } else {
                        self.solve_step(step, step_plan.value.as_ref(), &step_plan.bounds)
                    }
                }
                None => Ok(()),
            };
            if let Err(failure) = result {
                self.clear_after(step);
                let status = IterationStatus::Failed(failure);
                return (self.outcome(status, warnings), Some(self.planes));
            }
            if step + 1 < self.timeline.n_steps() {
                self.advance(step, step + 1);
            }
        }

        debug!(iteration = self.iteration, "Iteration completed");
        (
            self.outcome(IterationStatus::Completed, warnings),
            Some(self.planes),
        )
    }

    fn failure(&self, step: usize, target: usize, kind: FailureKind) -> TargetFailure {
        TargetFailure {
            step,
            iteration: self.iteration,
            target,
            kind,
        }
    }

    /// Marks the numbers after a failed step as unknown.
    fn clear_after(&mut self, step: usize) {
        if step + 1 < self.timeline.n_steps() {
            self.planes
                .stock_n
                .slice_mut(s![.., step + 1..])
                .fill(FloatValue::NAN);
        }
    }

    fn biology(&self, step: usize) -> StepBiology<'a> {
        self.timeline.biology(step, self.iteration)
    }

    fn numbers(&self, step: usize) -> ArrayView1<'_, FloatValue> {
        self.planes.stock_n.column(step)
    }

    fn harvest(&self, step: usize) -> ArrayView1<'_, FloatValue> {
        self.planes.harvest.column(step)
    }

    /// Numbers at the start of `to` from the numbers and harvest of `from` and recruitment.
    fn next_numbers(
        &self,
        from: usize,
        to: usize,
        f: ArrayView1<FloatValue>,
    ) -> Array1<FloatValue> {
        let bio = self.biology(from);
        let n = self.numbers(from);
        let mut next = bio.survivors(n, f, self.timeline.plus_group());
        let ssb = bio.ssb(n, f, Timing::Spawning);
        next[0] = self.recruitment.predict(ssb, to, self.iteration);
        next
    }

    /// Writes the numbers at the start of `to`.
    fn advance(&mut self, from: usize, to: usize) {
        let next = self.next_numbers(from, to, self.harvest(from));
        self.planes.stock_n.column_mut(to).assign(&next);
    }

    /// Value of `kind` at `step` if the step's F were `f`.
    fn trial(
        &self,
        kind: QuantityKind,
        step: usize,
        f: ArrayView1<FloatValue>,
    ) -> Result<FloatValue, FailureKind> {
        let bio = self.biology(step);
        if kind.timing_class() == TimingClass::Flash && !bio.fishes_before_spawning() {
            let next = step + 1;
            if next >= self.timeline.n_steps() {
                return Err(FailureKind::NonActionableTiming {
                    quantity: kind,
                    step,
                });
            }
            let n_next = self.next_numbers(step, next, f);
            return Ok(self.biology(next).quantity(
                kind,
                n_next.view(),
                self.harvest(next),
                self.timeline.fbar_indexes(),
            ));
        }
        Ok(bio.quantity(kind, self.numbers(step), f, self.timeline.fbar_indexes()))
    }

    /// Value of `kind` at `step` under the numbers and harvest already in place.
    fn realized(&self, kind: QuantityKind, step: usize) -> Result<FloatValue, FailureKind> {
        let next = step + 1;
        let reads_next = kind.timing_class() == TimingClass::Flash
            && !self.biology(step).fishes_before_spawning()
            && next < self.timeline.n_steps()
            && self.numbers(next).iter().all(|x| x.is_finite());
        if reads_next {
            return Ok(self.biology(next).quantity(
                kind,
                self.numbers(next),
                self.harvest(next),
                self.timeline.fbar_indexes(),
            ));
        }
        self.trial(kind, step, self.harvest(step))
    }

    /// A column of a target, scaled by the realised quantity if the target is relative.
    fn target_level(
        &self,
        target: &PlacedTarget,
        column: Column,
    ) -> Result<Option<FloatValue>, FailureKind> {
        let Some(value) = self.control.column(target.position, column, self.iteration) else {
            return Ok(None);
        };
        match target.relative_step {
            None => Ok(Some(value)),
            Some(relative_step) => {
                let reference = self.realized(target.quantity, relative_step)?;
                Ok(Some(value * reference))
            }
        }
    }

    fn solve_step(
        &mut self,
        step: usize,
        value: Option<&PlacedTarget>,
        bounds: &[PlacedTarget],
    ) -> Result<(), TargetFailure> {
        let mut f = self.harvest(step).to_owned();

        if let Some(target) = value {
            let level = self
                .target_level(target, Column::Value)
                .map_err(|reason| self.failure(step, target.id, reason))?;
            if let Some(level) = level {
                f = self.solve_f(target, level, f.view())?;
            }
        }

        for bound in bounds {
            let fail = |reason| self.failure(step, bound.id, reason);
            let current = self.trial(bound.quantity, step, f.view()).map_err(fail)?;
            let min = self.target_level(bound, Column::Min).map_err(fail)?;
            let max = self.target_level(bound, Column::Max).map_err(fail)?;
            let violated = match (min, max) {
                (Some(min), _) if current < min => Some(min),
                (_, Some(max)) if current > max => Some(max),
                _ => None,
            };
            if let Some(level) = violated {
                debug!(
                    iteration = self.iteration,
                    step,
                    target_id = bound.id,
                    quantity = %bound.quantity,
                    current,
                    bound = level,
                    "Bound violated"
                );
                f = self.solve_f(bound, level, f.view())?;
            }
        }

        self.planes.harvest.column_mut(step).assign(&f);
        Ok(())
    }

    /// Scales the F pattern `pattern` at the target's step so that its quantity equals
    /// `level`.
    fn solve_f(
        &self,
        target: &PlacedTarget,
        level: FloatValue,
        pattern: ArrayView1<FloatValue>,
    ) -> Result<Array1<FloatValue>, TargetFailure> {
        let step = target.step;
        let kind = target.quantity;
        let fail = |reason| self.failure(step, target.id, reason);

        let (first, last) = self.timeline.fbar_indexes();
        let pattern = if pattern.iter().all(|&x| x == 0.0) {
            let mut flat = Array1::zeros(pattern.len());
            flat.slice_mut(s![first..=last]).fill(1.0);
            flat
        } else {
            pattern.to_owned()
        };
        // Multipliers are measured against the pattern's Fbar, or against its largest F
        // when no Fbar age is fished
        let pattern_fbar = fbar(pattern.view(), first, last);
        let reference = if pattern_fbar > 0.0 && pattern_fbar.is_finite() {
            pattern_fbar
        } else {
            pattern.fold(0.0, |acc: FloatValue, &x| acc.max(x))
        };
        let scale = if level == 0.0 { 1.0 } else { level.abs() };

        let residual_at = |multiplier: FloatValue| -> Result<FloatValue, FailureKind> {
            let f = &pattern * multiplier;
            let value = self.trial(kind, step, f.view())?;
            let residual = (value - level) / scale;
            if residual.is_finite() {
                Ok(residual)
            } else {
                Err(FailureKind::NonFiniteQuantity {
                    quantity: kind,
                    multiplier,
                })
            }
        };

        let lower_residual = residual_at(0.0).map_err(fail)?;
        let ceiling = self.config.max_fbar.map(|max_fbar| max_fbar / reference);
        let mut upper = match ceiling {
            Some(ceiling) => ceiling.min(1.0 / reference),
            None => 1.0 / reference,
        };

        // Fishing can only move the quantity away from its unfished value in one direction
        let reachable = lower_residual.abs() <= self.config.residual_tol
            || match kind.response() {
                Response::Increasing => lower_residual < 0.0,
                Response::Decreasing => lower_residual > 0.0,
            };
        let mut upper_residual = residual_at(upper).map_err(fail)?;
        if reachable {
            let mut expansions = 0;
            while upper_residual.signum() == lower_residual.signum()
                && upper_residual.abs() > self.config.residual_tol
                && expansions < self.config.max_expansions
                && ceiling.map_or(true, |ceiling| upper < ceiling)
            {
                upper = match ceiling {
                    Some(ceiling) => (upper * 2.0).min(ceiling),
                    None => upper * 2.0,
                };
                upper_residual = residual_at(upper).map_err(fail)?;
                expansions += 1;
            }
        }

        let no_root = || {
            fail(FailureKind::NoRootInRange {
                quantity: kind,
                target: level,
                lower_value: lower_residual * scale + level,
                upper_value: upper_residual * scale + level,
                max_fbar: upper * pattern_fbar,
            })
        };
        if !reachable {
            return Err(no_root());
        }

        let root = match bisect(
            |multiplier| residual_at(multiplier).unwrap_or(FloatValue::NAN),
            [0.0, upper],
            self.config,
        ) {
            Ok(root) => root,
            Err(BisectionError::NoBracket { .. }) => return Err(no_root()),
            Err(BisectionError::NonFiniteResidual { x, .. }) => {
                return Err(fail(FailureKind::NonFiniteQuantity {
                    quantity: kind,
                    multiplier: x,
                }))
            }
        };
        if root.status == Status::MaxIters {
            return Err(fail(FailureKind::Convergence {
                iterations: root.iters,
                residual: root.residual,
            }));
        }

        debug!(
            iteration = self.iteration,
            step,
            target_id = target.id,
            quantity = %kind,
            level,
            multiplier = root.x,
            iters = root.iters,
            "Target solved"
        );
        Ok(&pattern * root.x)
    }
}
