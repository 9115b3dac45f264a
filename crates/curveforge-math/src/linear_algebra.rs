//! Matrix inversion and solve helpers over nalgebra.
//!
//! The calibration Jacobians are small (node count per curve group, rarely
//! above a few hundred), so dense LU is the workhorse; an SVD pseudo-inverse
//! backs it up when the Jacobian is numerically close to singular.

use nalgebra::{DMatrix, DVector};

use crate::error::{MathError, MathResult};

/// Relative singular-value cutoff for the SVD fallback.
const SVD_EPSILON: f64 = 1e-12;

/// Inverts a square matrix.
///
/// Tries LU first; falls back to an SVD pseudo-inverse for near-singular
/// input. A matrix whose largest singular value is zero is rejected.
///
/// # Errors
///
/// Returns `MathError::SingularMatrix` if no inverse can be produced.
pub fn invert(matrix: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    if !matrix.is_square() {
        return Err(MathError::DimensionMismatch {
            expected: matrix.nrows(),
            got: matrix.ncols(),
        });
    }
    if let Some(inv) = matrix.clone().try_inverse() {
        if inv.iter().all(|v| v.is_finite()) {
            return Ok(inv);
        }
    }
    matrix
        .clone()
        .svd(true, true)
        .pseudo_inverse(SVD_EPSILON)
        .map_err(|_| MathError::SingularMatrix {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        })
}

/// Solves the linear system `A x = b`.
///
/// # Errors
///
/// Returns `MathError::SingularMatrix` when `A` has no usable factorization,
/// or `MathError::DimensionMismatch` when shapes disagree.
pub fn solve(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    if a.nrows() != b.len() {
        return Err(MathError::DimensionMismatch {
            expected: a.nrows(),
            got: b.len(),
        });
    }
    let lu = a.clone().lu();
    if let Some(x) = lu.solve(b) {
        if x.iter().all(|v| v.is_finite()) {
            return Ok(x);
        }
    }
    // Near-singular Jacobian: least-squares answer via pseudo-inverse
    let pinv = invert(a)?;
    Ok(&pinv * b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invert_identity() {
        let m = DMatrix::<f64>::identity(3, 3);
        let inv = invert(&m).unwrap();
        assert_relative_eq!((inv - m).norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_invert_roundtrip() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 2.0, 3.0]);
        let inv = invert(&m).unwrap();
        let prod = &m * &inv;
        assert_relative_eq!((prod - DMatrix::identity(2, 2)).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
        let b = DVector::from_row_slice(&[1.0, 2.0]);
        let x = solve(&a, &b).unwrap();
        assert_relative_eq!(x[0], 0.5);
        assert_relative_eq!(x[1], 0.5);
    }

    #[test]
    fn test_non_square_rejected() {
        let m = DMatrix::<f64>::zeros(2, 3);
        assert!(invert(&m).is_err());
    }
}
