//! Projection targets.
//!
//! A [`ProjectionControl`] is an ordered list of [`Target`]s plus a value array of shape
//! `(target, 3, iteration)` holding the min, value and max columns of every target for
//! every iteration. Unset columns are NaN.
//!
//! A target with a value is a *value target*; it fixes the fishing mortality of its step.
//! A target with only a min and/or max is a *bound target*; it only changes F if the
//! quantity implied by the step's F falls outside the bounds. Construction sorts the
//! targets so that, within a step, the value target always comes before the bounds.

use crate::errors::ConfigurationError;
use crate::quantity::QuantityKind;
use crate::timeline::{FloatValue, StockTimeline};
use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the three value columns of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Min,
    Value,
    Max,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Min, Column::Value, Column::Max];

    pub fn index(&self) -> usize {
        match self {
            Column::Min => 0,
            Column::Value => 1,
            Column::Max => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Column::Min => "min",
            Column::Value => "value",
            Column::Max => "max",
        }
    }
}

/// Where and what a target controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Step whose fishing mortality is solved for.
    pub step: usize,
    pub quantity: QuantityKind,
    /// If set, the target's columns are multipliers of the same quantity realised at this
    /// step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_step: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRole {
    Value,
    Bound,
}

/// A validated target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    /// Position of the target in the order it was supplied.
    pub id: usize,
    pub record: TargetRecord,
    pub role: TargetRole,
}

/// Builder for a single target.
///
/// Columns hold either one value shared by all iterations or one value per iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    record: TargetRecord,
    columns: [Vec<FloatValue>; 3],
}

impl TargetSpec {
    /// A target with no columns set.
    pub fn new(step: usize, quantity: QuantityKind) -> Self {
        Self {
            record: TargetRecord {
                step,
                quantity,
                relative_step: None,
            },
            columns: [vec![], vec![], vec![]],
        }
    }

    pub fn value(step: usize, quantity: QuantityKind, value: FloatValue) -> Self {
        Self::new(step, quantity).with_column(Column::Value, vec![value])
    }

    pub fn min(step: usize, quantity: QuantityKind, min: FloatValue) -> Self {
        Self::new(step, quantity).with_column(Column::Min, vec![min])
    }

    pub fn max(step: usize, quantity: QuantityKind, max: FloatValue) -> Self {
        Self::new(step, quantity).with_column(Column::Max, vec![max])
    }

    pub fn bounds(step: usize, quantity: QuantityKind, min: FloatValue, max: FloatValue) -> Self {
        Self::min(step, quantity, min).with_column(Column::Max, vec![max])
    }

    /// Makes the target relative to the quantity realised at `step`.
    pub fn relative_to(mut self, step: usize) -> Self {
        self.record.relative_step = Some(step);
        self
    }

    /// Replaces a column with per-iteration values.
    pub fn with_column(mut self, column: Column, values: Vec<FloatValue>) -> Self {
        self.columns[column.index()] = values;
        self
    }
}

/// Ordered projection targets and their per-iteration values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionControl {
    targets: Vec<Target>,
    values: Array3<FloatValue>,
}

impl ProjectionControl {
    /// Validates the records and values and sorts them into resolution order.
    ///
    /// `values` has shape `(records.len(), 3, n_iters)` with columns ordered min, value,
    /// max. An iteration extent of 1 is shared by all iterations.
    pub fn new(
        records: Vec<TargetRecord>,
        values: Array3<FloatValue>,
    ) -> Result<Self, ConfigurationError> {
        let (n_targets, n_columns, n_iters) = values.dim();
        if n_targets != records.len() || n_columns != 3 || n_iters == 0 {
            return Err(ConfigurationError::ValueShape {
                targets: records.len(),
                found: values.dim(),
            });
        }

        let mut targets = Vec::with_capacity(records.len());
        let mut value_targets: HashMap<usize, usize> = HashMap::new();
        for (id, record) in records.into_iter().enumerate() {
            let role = classify(id, &values, &record)?;
            if let Some(relative_step) = record.relative_step {
                if relative_step >= record.step {
                    return Err(ConfigurationError::RelativeStepNotResolved {
                        target: id,
                        step: record.step,
                        relative_step,
                    });
                }
            }
            if role == TargetRole::Value {
                if let Some(first) = value_targets.insert(record.step, id) {
                    return Err(ConfigurationError::ConflictingValueTargets {
                        step: record.step,
                        first,
                        second: id,
                    });
                }
            }
            targets.push(Target { id, record, role });
        }

        // Value targets before bounds within each step, otherwise keep insertion order
        targets.sort_by_key(|t| (t.record.step, t.role == TargetRole::Bound));
        let order: Vec<usize> = targets.iter().map(|t| t.id).collect();
        let values = values.select(Axis(0), &order);

        Ok(Self { targets, values })
    }

    /// Builds a control from target specifications.
    pub fn from_specs(specs: Vec<TargetSpec>) -> Result<Self, ConfigurationError> {
        let n_iters = specs
            .iter()
            .flat_map(|spec| spec.columns.iter().map(Vec::len))
            .max()
            .unwrap_or(1)
            .max(1);

        let mut values = Array3::from_elem((specs.len(), 3, n_iters), FloatValue::NAN);
        let mut records = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            for column in Column::ALL {
                let given = &spec.columns[column.index()];
                match given.len() {
                    0 => {}
                    1 => values
                        .slice_mut(ndarray::s![index, column.index(), ..])
                        .fill(given[0]),
                    len if len == n_iters => values
                        .slice_mut(ndarray::s![index, column.index(), ..])
                        .assign(&ndarray::ArrayView1::from(given.as_slice())),
                    len => {
                        return Err(ConfigurationError::IterationMismatch {
                            what: "Target column",
                            expected: n_iters,
                            found: len,
                        })
                    }
                }
            }
            records.push(spec.record);
        }
        Self::new(records, values)
    }

    /// Targets in resolution order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn n_iters(&self) -> usize {
        self.values.len_of(Axis(2))
    }

    /// A column of the target at `position` (in resolution order) for one iteration.
    pub fn column(&self, position: usize, column: Column, iteration: usize) -> Option<FloatValue> {
        let iteration = if self.n_iters() == 1 { 0 } else { iteration };
        self.values
            .get((position, column.index(), iteration))
            .copied()
            .filter(|x| !x.is_nan())
    }

    /// Checks the targets against the stock they will be applied to.
    pub fn check_against(&self, timeline: &StockTimeline) -> Result<(), ConfigurationError> {
        if self.n_iters() != 1 && self.n_iters() != timeline.n_iters() {
            return Err(ConfigurationError::IterationMismatch {
                what: "Projection control",
                expected: timeline.n_iters(),
                found: self.n_iters(),
            });
        }
        let steps = timeline.projection_steps();
        for target in &self.targets {
            if !steps.contains(&target.record.step) {
                return Err(ConfigurationError::StepOutsideProjection {
                    target: target.id,
                    step: target.record.step,
                    first: steps.start,
                    end: steps.end,
                });
            }
        }
        Ok(())
    }
}

/// Determines whether a record is a value or bound target and checks its columns.
fn classify(
    id: usize,
    values: &Array3<FloatValue>,
    record: &TargetRecord,
) -> Result<TargetRole, ConfigurationError> {
    let row = values.index_axis(Axis(0), id);
    let mut is_set = [false; 3];
    for column in Column::ALL {
        let lane = row.index_axis(Axis(0), column.index());
        let set = lane.iter().filter(|x| !x.is_nan()).count();
        if set != 0 && set != lane.len() {
            return Err(ConfigurationError::PartialColumn {
                target: id,
                column: column.name(),
            });
        }
        for (iteration, &value) in lane.iter().enumerate() {
            if value < 0.0 || value.is_infinite() {
                return Err(ConfigurationError::InvalidValue {
                    target: id,
                    column: column.name(),
                    value,
                    iteration,
                });
            }
        }
        is_set[column.index()] = set != 0;
    }

    let [has_min, has_value, has_max] = is_set;
    if has_min && has_max {
        for (iteration, (&min, &max)) in row
            .index_axis(Axis(0), Column::Min.index())
            .iter()
            .zip(row.index_axis(Axis(0), Column::Max.index()).iter())
            .enumerate()
        {
            if min > max {
                return Err(ConfigurationError::InvertedBounds {
                    target: id,
                    min,
                    max,
                    iteration,
                });
            }
        }
    }

    match (has_value, has_min || has_max) {
        (true, false) => Ok(TargetRole::Value),
        (false, true) => Ok(TargetRole::Bound),
        (true, true) => Err(ConfigurationError::ValueWithBounds { target: id }),
        (false, false) => {
            tracing::warn!(target_id = id, quantity = %record.quantity, "Target has no values");
            Err(ConfigurationError::EmptyTarget { target: id })
        }
    }
}
