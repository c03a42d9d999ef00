use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Root-finding settings shared by every target.
///
/// The solver searches for a multiplier on the step's F pattern. Tolerances on the
/// multiplier are absolute plus relative; the residual tolerance is relative to the target
/// value (absolute when the target is zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum number of bisection iterations per target.
    pub max_iters: usize,
    pub x_abs_tol: f64,
    pub x_rel_tol: f64,
    pub residual_tol: f64,
    /// Number of times the upper end of the bracket may be doubled.
    pub max_expansions: usize,
    /// Optional ceiling on the Fbar the solver may try.
    pub max_fbar: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iters: 200,
            x_abs_tol: 1e-12,
            x_rel_tol: 1e-12,
            residual_tol: 1e-10,
            max_expansions: 10,
            max_fbar: None,
        }
    }
}

impl SolverConfig {
    /// Checks that the iteration budget is positive and all tolerances are finite and
    /// non-negative.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_iters == 0 {
            return Err(ConfigurationError::InvalidSolverConfig(
                "max_iters must be positive",
            ));
        }
        if !self.x_abs_tol.is_finite() || self.x_abs_tol < 0.0 {
            return Err(ConfigurationError::InvalidSolverConfig(
                "x_abs_tol must be finite and non-negative",
            ));
        }
        if !self.x_rel_tol.is_finite() || self.x_rel_tol < 0.0 {
            return Err(ConfigurationError::InvalidSolverConfig(
                "x_rel_tol must be finite and non-negative",
            ));
        }
        if !self.residual_tol.is_finite() || self.residual_tol < 0.0 {
            return Err(ConfigurationError::InvalidSolverConfig(
                "residual_tol must be finite and non-negative",
            ));
        }
        if let Some(max_fbar) = self.max_fbar {
            if !max_fbar.is_finite() || max_fbar <= 0.0 {
                return Err(ConfigurationError::InvalidSolverConfig(
                    "max_fbar must be finite and positive",
                ));
            }
        }
        Ok(())
    }
}
