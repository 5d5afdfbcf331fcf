//! conversion::lscov — generalized least squares with covariance models.
//!
//! Purpose
//! -------
//! Solve the linear least-squares problem `min ‖A x − b‖_V` for an
//! arbitrary observation-covariance matrix `V`, optionally propagating
//! per-coefficient standard errors. The algorithm is the complete
//! orthogonal decomposition route of the classic `lscov` routine:
//!
//! ```text
//! A = [Q1 Q2] [R; 0],      g = Q2ᵀ V Q2,   f = Q1ᵀ V Q2,
//! c = Q1ᵀ b,  d = Q2ᵀ b,   R x = c − f g⁻¹ d.
//! ```
//!
//! A diagonal `V` reproduces weighted least squares; the identity (the
//! default when no covariance is supplied) reproduces ordinary least
//! squares.
//!
//! Key behaviors
//! -------------
//! - [`lscov`] returns the coefficient vector only; [`lscov_se`]
//!   additionally whitens the system by the Cholesky factor of `V` and
//!   derives standard errors from the whitened design's triangular
//!   factor and a residual mean-squared-error estimate with `m − n`
//!   degrees of freedom.
//! - Rank deficiency of `A` is detected on the diagonal of `R` with a
//!   relative tolerance and reported as [`LscovError::SingularSystem`];
//!   callers running many small fits recover it locally.
//!
//! Invariants & assumptions
//! ------------------------
//! - `m ≥ n` (over- or exactly-determined); `m < n` is
//!   [`LscovError::Underdetermined`].
//! - `V`, when supplied, is `m×m`; [`lscov_se`] additionally requires it
//!   to be positive definite (Cholesky must exist).
//! - With `m = n` the residual degrees of freedom are zero and the
//!   returned standard errors are NaN.
//! - NaN entries in `b` propagate silently into the coefficients, in
//!   keeping with the crate-wide "NaN means missing" convention.
//!
//! Conventions
//! -----------
//! - Data enters as `nalgebra` dynamic matrices; the windowed estimator
//!   bridges from its `ndarray` storage the same way the Hessian-based
//!   inference code of comparable crates does.
//! - The complete decomposition is obtained by Householder QR of `A`
//!   padded to `m×m` with zero columns: the padding contributes no
//!   further reflections, so the orthogonal factor's trailing columns
//!   span the complement of the column space.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the dimension guards, a hand-computed OLS fit with
//!   standard errors, the scale invariance that makes uniform weighting
//!   degenerate to OLS, the weighted fit pinning the line to low-sigma
//!   observations, and the singular-system rejection.

use nalgebra::{DMatrix, DVector};

use crate::conversion::errors::{LscovError, LscovResult};

/// Relative tolerance on the `R` diagonal below which the design matrix
/// is treated as rank deficient.
const RANK_EPS: f64 = f64::EPSILON;

/// Solve the generalized least-squares problem.
///
/// Parameters
/// ----------
/// - `a`: `&DMatrix<f64>`
///   Design matrix, `m` rows by `n ≤ m` columns.
/// - `b`: `&DVector<f64>`
///   Target vector of length `m`.
/// - `v`: `Option<&DMatrix<f64>>`
///   Observation covariance, `m×m`. `None` selects the identity
///   (ordinary least squares).
///
/// Returns
/// -------
/// `LscovResult<DVector<f64>>`
///   The length-`n` coefficient vector minimizing the generalized
///   residual norm.
///
/// Errors
/// ------
/// - `LscovError::Underdetermined` when `m < n`.
/// - `LscovError::CovarianceShape` when `v` is not `m×m`.
/// - `LscovError::SingularSystem` when `A` is rank deficient or the
///   reduced covariance projection cannot be solved.
///
/// Examples
/// --------
/// ```rust
/// # use nalgebra::{DMatrix, DVector};
/// # use masschange::conversion::lscov::lscov;
/// // Exact fit of y = 2 + 3 t.
/// let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
/// let b = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
/// let x = lscov(&a, &b, None).unwrap();
/// assert!((x[0] - 2.0).abs() < 1e-12);
/// assert!((x[1] - 3.0).abs() < 1e-12);
/// ```
pub fn lscov(
    a: &DMatrix<f64>, b: &DVector<f64>, v: Option<&DMatrix<f64>>,
) -> LscovResult<DVector<f64>> {
    let (x, _whitening) = solve_gls(a, b, v)?;
    Ok(x)
}

/// Solve the generalized least-squares problem with standard errors.
///
/// Identical to [`lscov`] in the coefficient computation; additionally
/// Cholesky-factors `V`, whitens `A` and `b` by the factor, estimates the
/// residual mean squared error with `m − n` degrees of freedom, and
/// derives each coefficient's standard error from the row norms of the
/// inverse triangular factor of the whitened design matrix.
///
/// Returns
/// -------
/// `LscovResult<(DVector<f64>, DVector<f64>)>`
///   `(x, se)` where `se[j]` is the standard error of `x[j]`. With
///   `m = n` the degrees of freedom vanish and `se` is NaN.
///
/// Errors
/// ------
/// - Everything [`lscov`] raises, plus `LscovError::SingularSystem` when
///   `V` has no Cholesky factor (not positive definite).
pub fn lscov_se(
    a: &DMatrix<f64>, b: &DVector<f64>, v: Option<&DMatrix<f64>>,
) -> LscovResult<(DVector<f64>, DVector<f64>)> {
    let (m, n) = a.shape();
    let (x, v_owned) = solve_gls(a, b, v)?;

    // Whiten by the transposed Cholesky factor of V.
    let chol = v_owned.cholesky().ok_or(LscovError::SingularSystem)?;
    let u = chol.l().transpose();
    let z = u.solve_upper_triangular(b).ok_or(LscovError::SingularSystem)?;
    let w = u.solve_upper_triangular(a).ok_or(LscovError::SingularSystem)?;

    // Residual MSE with m - n degrees of freedom. The numerator is a
    // difference of near-equal quantities for near-exact fits and can
    // round below zero; clamp without masking NaN propagation.
    let mut mse = if m > n {
        (z.dot(&z) - x.dot(&(w.transpose() * &z))) / (m - n) as f64
    } else {
        f64::NAN
    };
    if mse < 0.0 {
        mse = 0.0;
    }

    let r_w = w.qr().r();
    let r_inv = r_w
        .solve_upper_triangular(&DMatrix::identity(n, n))
        .ok_or(LscovError::SingularSystem)?;

    let mut se = DVector::zeros(n);
    for j in 0..n {
        se[j] = (r_inv.row(j).norm_squared() * mse).sqrt();
    }
    Ok((x, se))
}

// ---- Helper methods ----

/// Core complete-orthogonal-decomposition solve shared by both entry
/// points. Returns the coefficients together with the owned covariance
/// (identity when none was supplied) for reuse in the whitening pass.
fn solve_gls(
    a: &DMatrix<f64>, b: &DVector<f64>, v: Option<&DMatrix<f64>>,
) -> LscovResult<(DVector<f64>, DMatrix<f64>)> {
    let (m, n) = a.shape();
    if m < n {
        return Err(LscovError::Underdetermined { rows: m, cols: n });
    }
    let v_owned = match v {
        Some(v) => {
            if v.nrows() != m || v.ncols() != m {
                return Err(LscovError::CovarianceShape {
                    rows: v.nrows(),
                    cols: v.ncols(),
                    expected: m,
                });
            }
            v.clone()
        }
        None => DMatrix::identity(m, m),
    };

    // Complete QR: pad A with zero columns to m x m so the orthogonal
    // factor carries the complement basis in its trailing columns.
    let mut padded = DMatrix::zeros(m, m);
    padded.view_mut((0, 0), (m, n)).copy_from(a);
    let qr = padded.qr();
    let q = qr.q();
    let r = qr.r().view((0, 0), (n, n)).into_owned();

    check_rank(&r, m)?;

    let q1 = q.columns(0, n).into_owned();
    let q2 = q.columns(n, m - n).into_owned();

    let c = q1.transpose() * b;
    let rhs = if m > n {
        let g = q2.transpose() * &v_owned * &q2;
        let f = q1.transpose() * &v_owned * &q2;
        let d = q2.transpose() * b;
        let y = g.lu().solve(&d).ok_or(LscovError::SingularSystem)?;
        c - f * y
    } else {
        c
    };

    let x = r.solve_upper_triangular(&rhs).ok_or(LscovError::SingularSystem)?;
    Ok((x, v_owned))
}

/// Reject triangular factors whose diagonal signals rank deficiency.
fn check_rank(r: &DMatrix<f64>, m: usize) -> LscovResult<()> {
    let n = r.ncols();
    let diag_max = (0..n).map(|i| r[(i, i)].abs()).fold(0.0_f64, f64::max);
    if diag_max == 0.0 {
        return Err(LscovError::SingularSystem);
    }
    let tol = m.max(n) as f64 * RANK_EPS * diag_max;
    for i in 0..n {
        if r[(i, i)].abs() < tol {
            return Err(LscovError::SingularSystem);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Dimension guards (underdetermined systems, covariance shape).
    // - Exact and least-squares fits against hand-computed coefficients
    //   and standard errors.
    // - Degeneracy of uniform weighting to ordinary least squares.
    // - The singular-system rejection for a rank-deficient design.
    //
    // They intentionally DO NOT cover:
    // - Window selection and edge policies (tested in `dm_to_dmdt`).
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-10;

    fn line_design(epochs: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(epochs.len(), 2, |i, j| if j == 0 { 1.0 } else { epochs[i] })
    }

    #[test]
    // Purpose
    // -------
    // Verify the over-determination guard and the covariance shape guard.
    //
    // Given
    // -----
    // - A 1x2 system, and a 3x2 system with a 2x2 covariance.
    //
    // Expect
    // ------
    // - `Underdetermined { rows: 1, cols: 2 }` and
    //   `CovarianceShape { expected: 3, .. }` respectively.
    fn dimension_guards_reject_malformed_input() {
        // Arrange
        let short = line_design(&[1.0]);
        let b_short = DVector::from_row_slice(&[1.0]);
        let a = line_design(&[0.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[0.0, 1.0, 2.0]);
        let bad_v = DMatrix::identity(2, 2);

        // Act / Assert
        match lscov(&short, &b_short, None) {
            Err(LscovError::Underdetermined { rows: 1, cols: 2 }) => (),
            other => panic!("expected Underdetermined error, got {other:?}"),
        }
        match lscov(&a, &b, Some(&bad_v)) {
            Err(LscovError::CovarianceShape { expected: 3, .. }) => (),
            other => panic!("expected CovarianceShape error, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Validate coefficients and standard errors against a hand-computed
    // ordinary least-squares fit.
    //
    // Given
    // -----
    // - Points (0,0), (1,1), (2,0): slope 0, intercept 1/3,
    //   SSE = 2/3 with one residual degree of freedom, Sxx = 2.
    //
    // Expect
    // ------
    // - `x = [1/3, 0]`; `se = [sqrt(5/9), sqrt(1/3)]`.
    fn lscov_se_matches_hand_computed_ols() {
        // Arrange
        let a = line_design(&[0.0, 1.0, 2.0]);
        let b = DVector::from_row_slice(&[0.0, 1.0, 0.0]);

        // Act
        let (x, se) = lscov_se(&a, &b, None).unwrap();

        // Assert
        assert_relative_eq!(x[0], 1.0 / 3.0, epsilon = TOL);
        assert_relative_eq!(x[1], 0.0, epsilon = TOL);
        assert_relative_eq!(se[0], (5.0_f64 / 9.0).sqrt(), epsilon = TOL);
        assert_relative_eq!(se[1], (1.0_f64 / 3.0).sqrt(), epsilon = TOL);
    }

    #[test]
    // Purpose
    // -------
    // Verify that an exact linear fit produces (clamped) zero standard
    // errors rather than NaN from tiny negative rounding of the MSE.
    //
    // Given
    // -----
    // - Four collinear points on y = 2 + 3t.
    //
    // Expect
    // ------
    // - Coefficients [2, 3]; standard errors ~0.
    fn lscov_se_exact_fit_yields_zero_errors() {
        // Arrange
        let a = line_design(&[0.0, 1.0, 2.0, 3.0]);
        let b = DVector::from_row_slice(&[2.0, 5.0, 8.0, 11.0]);

        // Act
        let (x, se) = lscov_se(&a, &b, None).unwrap();

        // Assert
        assert_relative_eq!(x[0], 2.0, epsilon = TOL);
        assert_relative_eq!(x[1], 3.0, epsilon = TOL);
        assert!(se[0].abs() < 1e-6, "intercept se should be ~0, got {}", se[0]);
        assert!(se[1].abs() < 1e-6, "slope se should be ~0, got {}", se[1]);
    }

    #[test]
    // Purpose
    // -------
    // Verify that a uniformly scaled covariance leaves the coefficients
    // unchanged (weighting degenerates to OLS when all weights agree).
    //
    // Given
    // -----
    // - A noisy five-point system solved with V = I and V = 4I.
    //
    // Expect
    // ------
    // - Identical coefficient vectors up to numerical tolerance.
    fn uniform_covariance_degenerates_to_ols() {
        // Arrange
        let a = line_design(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let b = DVector::from_row_slice(&[0.1, 0.9, 2.2, 2.8, 4.1]);
        let scaled = DMatrix::identity(5, 5) * 4.0;

        // Act
        let x_ols = lscov(&a, &b, None).unwrap();
        let x_scaled = lscov(&a, &b, Some(&scaled)).unwrap();

        // Assert
        assert_relative_eq!(x_ols[0], x_scaled[0], epsilon = TOL);
        assert_relative_eq!(x_ols[1], x_scaled[1], epsilon = TOL);
    }

    #[test]
    // Purpose
    // -------
    // Verify that low-variance observations dominate a weighted fit.
    //
    // Given
    // -----
    // - Four points where the two tight-sigma observations lie exactly on
    //   y = t and the two loose-sigma observations are displaced.
    //
    // Expect
    // ------
    // - The weighted slope lies much closer to 1 than the OLS slope.
    fn diagonal_covariance_pins_fit_to_tight_observations() {
        // Arrange
        let a = line_design(&[0.0, 1.0, 2.0, 3.0]);
        let b = DVector::from_row_slice(&[0.0, 1.0, 5.0, 6.0]);
        let v = DMatrix::from_diagonal(&DVector::from_row_slice(&[
            1e-6, 1e-6, 100.0, 100.0,
        ]));

        // Act
        let x_weighted = lscov(&a, &b, Some(&v)).unwrap();
        let x_ols = lscov(&a, &b, None).unwrap();

        // Assert
        assert!(
            (x_weighted[1] - 1.0).abs() < 0.05,
            "weighted slope should track the tight observations, got {}",
            x_weighted[1]
        );
        assert!(
            (x_ols[1] - 1.0).abs() > 0.5,
            "OLS slope should be pulled by the displaced points, got {}",
            x_ols[1]
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify that a rank-deficient design matrix is rejected with
    // `SingularSystem` rather than producing garbage coefficients.
    //
    // Given
    // -----
    // - A = [[1,1],[1,1]], b = [1,1] (identical rows, rank 1).
    //
    // Expect
    // ------
    // - `Err(LscovError::SingularSystem)`.
    fn rank_deficient_design_returns_singular_system() {
        // Arrange
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let b = DVector::from_row_slice(&[1.0, 1.0]);

        // Act / Assert
        match lscov(&a, &b, None) {
            Err(LscovError::SingularSystem) => (),
            other => panic!("expected SingularSystem error, got {other:?}"),
        }
    }
}
