//! Ordinary least squares.
//!
//! Every model in this project reduces to a straight line in (possibly
//! log-transformed) coordinates:
//!
//! ```text
//! minimize Σ (y_i - (b0 + b1 x_i))^2
//! ```
//!
//! We still go through a design matrix and SVD rather than the closed-form
//! covariance/variance ratio: the SVD exposes the numerical rank, which is how a
//! singular design gets reported instead of producing garbage coefficients.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;

/// Singular values below this (relative to the largest) count as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the design is rank-deficient or the solution is not finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    let max_sv = svd.singular_values.max();
    if !(max_sv.is_finite() && max_sv > 0.0) {
        return None;
    }
    let eps = RANK_TOLERANCE * max_sv;
    if svd.rank(eps) < x.ncols() {
        return None;
    }

    let beta = svd.solve(y, eps).ok()?;
    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// A fitted straight line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to `[0, 1]`.
    pub r_squared: f64,
    pub sse: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `y = slope * x + intercept` by OLS.
///
/// Degenerate inputs are errors, never silently defaulted:
/// fewer than 2 points, fewer than 2 distinct `x` values, a rank-deficient
/// design, non-finite values, or a constant response (R² undefined).
pub fn fit_line(x: &[f64], y: &[f64]) -> Result<LineFit, AppError> {
    if x.len() != y.len() {
        return Err(AppError::degenerate(format!(
            "Predictor and response lengths differ ({} vs {}).",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(AppError::degenerate(format!("Need at least 2 observations, got {n}.")));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(AppError::degenerate("Non-finite value in regression input."));
    }
    let distinct = distinct_count(x);
    if distinct < 2 {
        return Err(AppError::degenerate(format!(
            "Predictor has {distinct} distinct value(s); need at least 2."
        )));
    }

    let y_mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    if sst <= (f64::EPSILON * y_mean.abs().max(1.0)).powi(2) * n as f64 {
        return Err(AppError::degenerate(
            "Response has zero variance; R² is undefined.",
        ));
    }

    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi;
    }
    let obs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &obs)
        .ok_or_else(|| AppError::degenerate("Design matrix is singular (rank < 2)."))?;
    let intercept = beta[0];
    let slope = beta[1];

    let sse: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - (slope * xi + intercept)).powi(2))
        .sum();
    let r_squared = (1.0 - sse / sst).clamp(0.0, 1.0);

    if !(slope.is_finite() && intercept.is_finite() && r_squared.is_finite()) {
        return Err(AppError::degenerate("Regression produced non-finite coefficients."));
    }

    Ok(LineFit {
        slope,
        intercept,
        r_squared,
        sse,
    })
}

fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_rejects_collinear_columns() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn perfect_line_has_unit_r_squared() {
        let x: Vec<f64> = (1..=20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 4.25 * v - 7.5).collect();
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 4.25).abs() < 1e-9);
        assert!((fit.intercept + 7.5).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_line_has_r_squared_below_one() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.2, 1.9, 3.3, 3.8, 5.1];
        let fit = fit_line(&x, &y).unwrap();
        assert!(fit.r_squared > 0.9 && fit.r_squared < 1.0);
        assert!((fit.predict(3.0) - 3.06).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        let single = fit_line(&[1.0], &[2.0]).unwrap_err();
        assert_eq!(single.kind(), ErrorKind::DegenerateFit);

        let constant_x = fit_line(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(constant_x.kind(), ErrorKind::DegenerateFit);

        let constant_y = fit_line(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).unwrap_err();
        assert_eq!(constant_y.kind(), ErrorKind::DegenerateFit);

        assert!(fit_line(&[1.0, f64::NAN], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn small_response_variation_is_not_mistaken_for_constant() {
        let y = [1.0, 1.0 + 1e-8, 1.0 + 2e-8];
        let line = fit_line(&[0.0, 1.0, 2.0], &y).unwrap();
        assert!((line.slope - 1e-8).abs() < 1e-12);
        assert!(line.r_squared > 0.99);
    }
}
