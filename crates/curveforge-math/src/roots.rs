//! Vector root finding for joint curve calibration.
//!
//! The calibration engine solves `f(x) = 0` where `x` is the concatenated
//! parameter vector of every curve in a group and `f` is the vector of
//! par-spread residuals. The solver is a Broyden quasi-Newton method: the
//! Jacobian is evaluated once at the starting point (it is expensive, each
//! column re-prices every instrument) and then maintained with rank-one
//! secant updates.

use nalgebra::{DMatrix, DVector};

use crate::error::MathError;
use crate::linear_algebra;

/// A fallible vector-valued function of a parameter vector.
pub type VectorFunction<'a, E> = dyn Fn(&DVector<f64>) -> Result<DVector<f64>, E> + 'a;

/// Tolerances and iteration cap for the root finder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootFinderConfig {
    /// Absolute tolerance on the residual norm.
    pub absolute_tolerance: f64,
    /// Relative tolerance on the step size.
    pub relative_tolerance: f64,
    /// Maximum number of iterations before declaring non-convergence.
    pub max_iterations: u32,
}

impl Default for RootFinderConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-10,
            relative_tolerance: 1e-10,
            max_iterations: 100,
        }
    }
}

/// Outcome of a successful root-finding run.
#[derive(Debug, Clone)]
pub struct RootFinderReport {
    /// The solved parameter vector.
    pub root: DVector<f64>,
    /// Iterations consumed.
    pub iterations: u32,
    /// Residual norm (infinity norm) at the root.
    pub residual_norm: f64,
}

/// Finds a root of `f` starting from `x0` using Broyden's method.
///
/// `jacobian` supplies the initial Jacobian `df/dx` at `x0`; subsequent
/// iterations maintain it with secant updates, so `f` is the only function
/// evaluated inside the loop.
///
/// Convergence is declared when the residual infinity norm falls below
/// `absolute_tolerance`, or when every step component is below
/// `absolute_tolerance + relative_tolerance * |x_i|`.
///
/// # Errors
///
/// Propagates errors from `f`/`jacobian`, and returns
/// `MathError::ConvergenceFailed` (via `E: From<MathError>`) when
/// `max_iterations` is exhausted.
pub fn broyden_root<E, F, J>(
    f: F,
    jacobian: J,
    x0: DVector<f64>,
    config: &RootFinderConfig,
) -> Result<RootFinderReport, E>
where
    E: From<MathError>,
    F: Fn(&DVector<f64>) -> Result<DVector<f64>, E>,
    J: Fn(&DVector<f64>) -> Result<DMatrix<f64>, E>,
{
    let mut x = x0;
    let mut fx = f(&x)?;
    if fx.len() != x.len() {
        return Err(MathError::DimensionMismatch {
            expected: x.len(),
            got: fx.len(),
        }
        .into());
    }
    if fx.amax() <= config.absolute_tolerance {
        return Ok(RootFinderReport {
            residual_norm: fx.amax(),
            root: x,
            iterations: 0,
        });
    }

    let mut jac = jacobian(&x)?;

    for iteration in 1..=config.max_iterations {
        let dx = linear_algebra::solve(&jac, &fx).map_err(E::from)?;
        let x_new = &x - &dx;
        let f_new = f(&x_new)?;

        if f_new.amax() <= config.absolute_tolerance
            || step_converged(&dx, &x_new, config)
        {
            return Ok(RootFinderReport {
                residual_norm: f_new.amax(),
                root: x_new,
                iterations: iteration,
            });
        }

        // Broyden rank-one secant update: J += (y - J s) s^T / (s . s)
        let s = &x_new - &x;
        let y = &f_new - &fx;
        let ss = s.dot(&s);
        if ss > 0.0 {
            let correction = (&y - &jac * &s) * (1.0 / ss);
            jac += correction * s.transpose();
        }

        x = x_new;
        fx = f_new;
    }

    Err(MathError::convergence_failed(config.max_iterations, fx.amax()).into())
}

fn step_converged(dx: &DVector<f64>, x: &DVector<f64>, config: &RootFinderConfig) -> bool {
    dx.iter()
        .zip(x.iter())
        .all(|(d, v)| d.abs() <= config.absolute_tolerance + config.relative_tolerance * v.abs())
}
