use crate::quantity::QuantityKind;
use crate::timeline::Slot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Malformed projection inputs.
///
/// These are detected once, before any iteration is solved, and abort the whole run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Unknown quantity '{0}'")]
    UnknownQuantity(String),
    #[error("Target {target} sets neither a value nor a min/max bound")]
    EmptyTarget { target: usize },
    #[error("Target {target} sets both a value and a bound. Use a separate bound target")]
    ValueWithBounds { target: usize },
    #[error("Target {target} sets its {column} column for some iterations only")]
    PartialColumn { target: usize, column: &'static str },
    #[error("Target {target} has {column} {value} in iteration {iteration}, expected a finite non-negative value")]
    InvalidValue {
        target: usize,
        column: &'static str,
        value: f64,
        iteration: usize,
    },
    #[error("Target {target} has min {min} greater than max {max} in iteration {iteration}")]
    InvertedBounds {
        target: usize,
        min: f64,
        max: f64,
        iteration: usize,
    },
    #[error("Target {target} on step {step} is relative to step {relative_step}, which is not resolved before it")]
    RelativeStepNotResolved {
        target: usize,
        step: usize,
        relative_step: usize,
    },
    #[error("Target {target} is on step {step}, outside the projection steps {first}..{end}")]
    StepOutsideProjection {
        target: usize,
        step: usize,
        first: usize,
        end: usize,
    },
    #[error("Step {step} has more than one value target ({first} and {second})")]
    ConflictingValueTargets {
        step: usize,
        first: usize,
        second: usize,
    },
    #[error("Target values have shape {found:?}, expected ({targets}, 3, n_iters)")]
    ValueShape {
        targets: usize,
        found: (usize, usize, usize),
    },
    #[error("{what} has {found} iterations but the stock has {expected}")]
    IterationMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Recruitment residuals have shape {found:?}, expected ({steps}, 1 or {iterations})")]
    ResidualShape {
        steps: usize,
        iterations: usize,
        found: (usize, usize),
    },
    #[error("Invalid solver config: {0}")]
    InvalidSolverConfig(&'static str),
}

/// Errors raised while reading or writing a [`StockTimeline`](crate::timeline::StockTimeline).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    #[error("Slot {slot} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        slot: Slot,
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    #[error("Expected {expected} ages, got {found}")]
    AgeCount { expected: usize, found: usize },
    #[error("Invalid age range {min}..={max}")]
    InvalidAges { min: u32, max: u32 },
    #[error("Fbar range {min}..={max} is not within the stock ages")]
    InvalidFbarRange { min: u32, max: u32 },
    #[error("Time axis labels must be strictly increasing")]
    UnorderedTimeAxis,
    #[error("Step {step} is out of range for a timeline with {n_steps} steps")]
    StepOutOfRange { step: usize, n_steps: usize },
    #[error("Iteration {iteration} is out of range for a timeline with {n_iters} iterations")]
    IterationOutOfRange { iteration: usize, n_iters: usize },
    #[error("Step {step} is historical and cannot be modified")]
    HistoricalStep { step: usize },
    #[error("Slot {slot} is missing values at step {step}, iteration {iteration}")]
    MissingValues {
        slot: Slot,
        step: usize,
        iteration: usize,
    },
    #[error("Averaging window of {window} steps needs at least {window} existing steps, found {available}")]
    WindowTooLong { window: usize, available: usize },
    #[error("Cannot extend a timeline by zero steps")]
    EmptyExtension,
}

/// Why a single target could not be resolved in one iteration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureKind {
    #[error("{quantity} cannot reach {target}: attainable range is {lower_value}..{upper_value} for Fbar up to {max_fbar}")]
    NoRootInRange {
        quantity: QuantityKind,
        target: f64,
        lower_value: f64,
        upper_value: f64,
        max_fbar: f64,
    },
    #[error("Root finding did not converge after {iterations} iterations (residual {residual})")]
    Convergence { iterations: usize, residual: f64 },
    #[error("{quantity} is not finite with the F pattern scaled by {multiplier}")]
    NonFiniteQuantity {
        quantity: QuantityKind,
        multiplier: f64,
    },
    #[error("{quantity} at step {step} is not affected by fishing in any remaining step")]
    NonActionableTiming { quantity: QuantityKind, step: usize },
}

/// A failed target together with where it failed.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("Target {target} failed at step {step}, iteration {iteration}: {kind}")]
pub struct TargetFailure {
    pub step: usize,
    pub iteration: usize,
    pub target: usize,
    pub kind: FailureKind,
}

/// Recoverable conditions reported alongside an iteration's result.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// A spawning target deferred from the previous step landed on a step that already has
    /// its own value target. The explicit target is kept and the deferred one dropped.
    #[error("Target {deferred_target} was deferred to step {step} which already has target {explicit_target}; keeping target {explicit_target}")]
    AmbiguousComposition {
        step: usize,
        deferred_target: usize,
        explicit_target: usize,
    },
}

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum StockFwdError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Target(#[from] TargetFailure),
}

/// Convenience type for `Result<T, StockFwdError>`.
pub type StockFwdResult<T> = Result<T, StockFwdError>;

/// Convenience type for `Result<T, TimelineError>`.
pub type TimelineResult<T> = Result<T, TimelineError>;
