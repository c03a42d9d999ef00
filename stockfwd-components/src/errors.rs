use stockfwd_core::errors::TimelineError;
use thiserror::Error;

/// Errors raised while deriving components from a stock's history.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("No usable recruitment observations in steps {first}..{end}")]
    NoObservations { first: usize, end: usize },
    #[error("Cannot sample from an empty set of residuals")]
    EmptyResiduals,
    #[error("Residual steps {first}..{end} are outside the {n_steps} available steps")]
    StepsOutOfRange {
        first: usize,
        end: usize,
        n_steps: usize,
    },
    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

/// Convenience type for `Result<T, ComponentError>`.
pub type ComponentResult<T> = Result<T, ComponentError>;
