//! One-dimensional interpolation over curve node points.
//!
//! Curves store (time, ordinate) node pairs; queries between nodes are
//! answered by the configured [`Interpolation`] method and queries outside
//! the node range by the configured [`Extrapolation`].

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};

/// Interpolation method between curve nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Interpolation {
    /// Piecewise-linear in the ordinate.
    #[default]
    Linear,
    /// Piecewise-linear in the natural log of the ordinate.
    ///
    /// The usual choice for discount-factor curves; requires strictly
    /// positive ordinates.
    LogLinear,
}

/// Extrapolation behaviour outside the node range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Extrapolation {
    /// Repeat the boundary ordinate.
    #[default]
    Flat,
    /// Extend the boundary segment's slope.
    Linear,
}

impl Interpolation {
    /// Validates node arrays for use with this method.
    ///
    /// # Errors
    ///
    /// Fails on fewer than two nodes, non-increasing abscissae or (for
    /// log-linear) non-positive ordinates.
    pub fn validate(&self, xs: &[f64], ys: &[f64]) -> MathResult<()> {
        if xs.len() < 2 {
            return Err(MathError::InsufficientPoints {
                required: 2,
                got: xs.len(),
            });
        }
        if xs.len() != ys.len() {
            return Err(MathError::DimensionMismatch {
                expected: xs.len(),
                got: ys.len(),
            });
        }
        for i in 1..xs.len() {
            if xs[i] <= xs[i - 1] {
                return Err(MathError::NonMonotonicAbscissae {
                    index: i,
                    prev: xs[i - 1],
                    current: xs[i],
                });
            }
        }
        if *self == Interpolation::LogLinear {
            for (i, &y) in ys.iter().enumerate() {
                if y <= 0.0 {
                    return Err(MathError::NonPositiveOrdinate { index: i, value: y });
                }
            }
        }
        Ok(())
    }

    /// Interpolates at `x` over validated node arrays.
    ///
    /// Outside the node range the `extrapolation` mode applies.
    #[must_use]
    pub fn interpolate(
        &self,
        xs: &[f64],
        ys: &[f64],
        x: f64,
        left: Extrapolation,
        right: Extrapolation,
    ) -> f64 {
        let n = xs.len();
        if x <= xs[0] {
            return match left {
                Extrapolation::Flat => ys[0],
                Extrapolation::Linear => self.segment(xs, ys, 0, x),
            };
        }
        if x >= xs[n - 1] {
            return match right {
                Extrapolation::Flat => ys[n - 1],
                Extrapolation::Linear => self.segment(xs, ys, n - 2, x),
            };
        }
        // partition_point: first index with xs[i] > x; the segment is [i-1, i]
        let hi = xs.partition_point(|&v| v <= x);
        self.segment(xs, ys, hi - 1, x)
    }

    fn segment(&self, xs: &[f64], ys: &[f64], i: usize, x: f64) -> f64 {
        let w = (x - xs[i]) / (xs[i + 1] - xs[i]);
        match self {
            Interpolation::Linear => ys[i] + w * (ys[i + 1] - ys[i]),
            Interpolation::LogLinear => {
                (ys[i].ln() + w * (ys[i + 1].ln() - ys[i].ln())).exp()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const XS: [f64; 4] = [0.25, 0.5, 1.0, 2.0];
    const YS: [f64; 4] = [0.01, 0.012, 0.015, 0.02];

    #[test]
    fn test_linear_at_nodes() {
        for (x, y) in XS.iter().zip(YS.iter()) {
            let v = Interpolation::Linear.interpolate(
                &XS,
                &YS,
                *x,
                Extrapolation::Flat,
                Extrapolation::Flat,
            );
            assert_relative_eq!(v, *y);
        }
    }

    #[test]
    fn test_linear_midpoint() {
        let v = Interpolation::Linear.interpolate(
            &XS,
            &YS,
            0.75,
            Extrapolation::Flat,
            Extrapolation::Flat,
        );
        assert_relative_eq!(v, 0.0135, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_extrapolation() {
        let interp = Interpolation::Linear;
        let lo = interp.interpolate(&XS, &YS, 0.0, Extrapolation::Flat, Extrapolation::Flat);
        let hi = interp.interpolate(&XS, &YS, 5.0, Extrapolation::Flat, Extrapolation::Flat);
        assert_relative_eq!(lo, 0.01);
        assert_relative_eq!(hi, 0.02);
    }

    #[test]
    fn test_linear_extrapolation() {
        let interp = Interpolation::Linear;
        let hi = interp.interpolate(&XS, &YS, 3.0, Extrapolation::Flat, Extrapolation::Linear);
        // Slope of last segment is 0.005 per year
        assert_relative_eq!(hi, 0.025, epsilon = 1e-12);
    }

    #[test]
    fn test_log_linear_exact_on_exponentials() {
        let xs = [1.0, 2.0];
        let ys = [(-0.03f64).exp(), (-0.06f64).exp()];
        let v = Interpolation::LogLinear.interpolate(
            &xs,
            &ys,
            1.5,
            Extrapolation::Flat,
            Extrapolation::Flat,
        );
        assert_relative_eq!(v, (-0.045f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_validation() {
        assert!(Interpolation::Linear.validate(&[1.0], &[1.0]).is_err());
        assert!(Interpolation::Linear
            .validate(&[1.0, 1.0], &[1.0, 2.0])
            .is_err());
        assert!(Interpolation::LogLinear
            .validate(&[1.0, 2.0], &[1.0, 0.0])
            .is_err());
        assert!(Interpolation::LogLinear
            .validate(&[1.0, 2.0], &[1.0, 0.5])
            .is_ok());
    }
}
