//! Bracketing bisection on a scalar function.

use super::config::SolverConfig;

/// How a bisection search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Converged,
    MaxIters,
}

/// Best point found by [`bisect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Root {
    pub x: f64,
    pub residual: f64,
    pub status: Status,
    pub iters: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BisectionError {
    /// The residuals at the ends of the bracket have the same sign.
    NoBracket {
        left_residual: f64,
        right_residual: f64,
    },
    NonFiniteResidual {
        x: f64,
        residual: f64,
    },
}

/// Finds `x` in `[left, right]` with `residual(x)` close to zero.
///
/// The bracket must have a sign change. The search stops when the bracket is narrower than
/// `x_abs_tol + x_rel_tol * |mid|` or the residual is within `residual_tol`; if the
/// iteration budget runs out the best point seen is returned with [`Status::MaxIters`].
pub(crate) fn bisect(
    mut residual: impl FnMut(f64) -> f64,
    [mut left, mut right]: [f64; 2],
    config: &SolverConfig,
) -> Result<Root, BisectionError> {
    let mut left_residual = checked(&mut residual, left)?;
    if left_residual.abs() <= config.residual_tol {
        return Ok(Root {
            x: left,
            residual: left_residual,
            status: Status::Converged,
            iters: 0,
        });
    }
    let right_residual = checked(&mut residual, right)?;
    if right_residual.abs() <= config.residual_tol {
        return Ok(Root {
            x: right,
            residual: right_residual,
            status: Status::Converged,
            iters: 0,
        });
    }
    if left_residual.signum() == right_residual.signum() {
        return Err(BisectionError::NoBracket {
            left_residual,
            right_residual,
        });
    }

    let mut best = if left_residual.abs() <= right_residual.abs() {
        (left, left_residual)
    } else {
        (right, right_residual)
    };

    for iters in 1..=config.max_iters {
        let mid = 0.5 * (left + right);
        let mid_residual = checked(&mut residual, mid)?;

        let x_converged = (right - left).abs() <= config.x_abs_tol + config.x_rel_tol * mid.abs();
        if x_converged || mid_residual.abs() <= config.residual_tol {
            return Ok(Root {
                x: mid,
                residual: mid_residual,
                status: Status::Converged,
                iters,
            });
        }
        if mid_residual.abs() < best.1.abs() {
            best = (mid, mid_residual);
        }

        if left_residual.signum() == mid_residual.signum() {
            left = mid;
            left_residual = mid_residual;
        } else {
            right = mid;
        }
    }

    Ok(Root {
        x: best.0,
        residual: best.1,
        status: Status::MaxIters,
        iters: config.max_iters,
    })
}

fn checked(residual: &mut impl FnMut(f64) -> f64, x: f64) -> Result<f64, BisectionError> {
    let r = residual(x);
    if r.is_finite() {
        Ok(r)
    } else {
        Err(BisectionError::NonFiniteResidual { x, residual: r })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn finds_square_root() {
        let root = bisect(|x| x * x - 2.0, [0.0, 2.0], &SolverConfig::default()).unwrap();
        assert_eq!(root.status, Status::Converged);
        assert!(is_close!(root.x, 2.0f64.sqrt()));
    }

    #[test]
    fn decreasing_function() {
        let root = bisect(|x| 1.0 - 4.0 * x, [0.0, 1.0], &SolverConfig::default()).unwrap();
        assert!(is_close!(root.x, 0.25));
    }

    #[test]
    fn root_at_bracket_end() {
        let root = bisect(|x| x, [0.0, 3.0], &SolverConfig::default()).unwrap();
        assert_eq!(root.x, 0.0);
        assert_eq!(root.iters, 0);
    }

    #[test]
    fn no_sign_change() {
        let err = bisect(|x| x + 1.0, [0.0, 3.0], &SolverConfig::default()).unwrap_err();
        assert_eq!(
            err,
            BisectionError::NoBracket {
                left_residual: 1.0,
                right_residual: 4.0
            }
        );
    }

    #[test]
    fn budget_exhaustion_reports_best_point() {
        let config = SolverConfig {
            max_iters: 3,
            x_abs_tol: 0.0,
            x_rel_tol: 0.0,
            residual_tol: 0.0,
            ..Default::default()
        };
        let root = bisect(|x| x - 0.3, [0.0, 1.0], &config).unwrap();
        assert_eq!(root.status, Status::MaxIters);
        assert_eq!(root.iters, 3);
        assert!(is_close!(root.x, 0.25));
    }

    #[test]
    fn non_finite_residual() {
        let err = bisect(|x| (x - 0.5).ln(), [0.0, 1.0], &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, BisectionError::NonFiniteResidual { x, .. } if x == 0.0));
    }
}
