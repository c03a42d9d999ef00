//! Placement of targets on the steps whose fishing mortality controls them.
//!
//! A spawning-time target on a step with no fishing before spawning cannot be reached by
//! that step's F. It is moved to the next step, which must itself fish before spawning.
//! Placement depends on `harvest_spwn`, so a plan is built per iteration.

use crate::control::{ProjectionControl, TargetRole};
use crate::errors::{FailureKind, Warning};
use crate::quantity::{QuantityKind, TimingClass};
use crate::timeline::StockTimeline;

/// A target placed on the step whose F is solved for.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlacedTarget {
    /// Position in the control's resolution order.
    pub position: usize,
    pub id: usize,
    pub quantity: QuantityKind,
    pub step: usize,
    pub relative_step: Option<usize>,
    pub deferred: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StepPlan {
    pub value: Option<PlacedTarget>,
    pub bounds: Vec<PlacedTarget>,
    /// A target set on this step that no remaining F can reach.
    pub unreachable: Option<(usize, FailureKind)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IterationPlan {
    first_step: usize,
    steps: Vec<StepPlan>,
    pub warnings: Vec<Warning>,
}

impl IterationPlan {
    pub fn build(control: &ProjectionControl, timeline: &StockTimeline, iteration: usize) -> Self {
        let projection = timeline.projection_steps();
        let mut plan = Self {
            first_step: projection.start,
            steps: vec![StepPlan::default(); projection.len()],
            warnings: vec![],
        };
        let fishes_before_spawning =
            |step: usize| timeline.biology(step, iteration).fishes_before_spawning();

        for (position, target) in control.targets().iter().enumerate() {
            let step = target.record.step;
            let quantity = target.record.quantity;
            let next_exists = step + 1 < timeline.n_steps();

            let placed = match quantity.timing_class() {
                TimingClass::Spawning if !fishes_before_spawning(step) => {
                    if next_exists && fishes_before_spawning(step + 1) {
                        Some(PlacedTarget {
                            position,
                            id: target.id,
                            quantity,
                            step: step + 1,
                            relative_step: target.record.relative_step,
                            deferred: true,
                        })
                    } else {
                        None
                    }
                }
                TimingClass::Flash if !fishes_before_spawning(step) && !next_exists => None,
                _ => Some(PlacedTarget {
                    position,
                    id: target.id,
                    quantity,
                    step,
                    relative_step: target.record.relative_step,
                    deferred: false,
                }),
            };

            let Some(placed) = placed else {
                let slot = plan.step_mut(step);
                if slot.unreachable.is_none() {
                    slot.unreachable =
                        Some((target.id, FailureKind::NonActionableTiming { quantity, step }));
                }
                continue;
            };
            if placed.deferred {
                tracing::debug!(
                    target_id = target.id,
                    quantity = %quantity,
                    from = step,
                    to = placed.step,
                    iteration,
                    "Deferred spawning target to the next step"
                );
            }
            match target.role {
                TargetRole::Value => plan.place_value(placed),
                TargetRole::Bound => plan.step_mut(placed.step).bounds.push(placed),
            }
        }
        plan
    }

    fn step_mut(&mut self, step: usize) -> &mut StepPlan {
        &mut self.steps[step - self.first_step]
    }

    /// Places a value target, keeping the explicit one if a deferred target lands on the
    /// same step.
    fn place_value(&mut self, placed: PlacedTarget) {
        let step = placed.step;
        let slot = self.step_mut(step);
        let (kept, dropped) = match slot.value.take() {
            None => (placed, None),
            Some(existing) if existing.deferred => (placed, Some(existing)),
            Some(existing) => (existing, Some(placed)),
        };
        let explicit_target = kept.id;
        slot.value = Some(kept);
        if let Some(dropped) = dropped {
            tracing::warn!(
                step,
                deferred_target = dropped.id,
                explicit_target,
                "Deferred target conflicts with an explicit value target"
            );
            self.warnings.push(Warning::AmbiguousComposition {
                step,
                deferred_target: dropped.id,
                explicit_target,
            });
        }
    }

    pub fn step(&self, step: usize) -> Option<&StepPlan> {
        step.checked_sub(self.first_step)
            .and_then(|index| self.steps.get(index))
    }
}
