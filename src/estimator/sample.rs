//! # Sample Moments
//!
//! $$
//! \rho_{ij} = \frac{\Sigma_{ij}}{\sigma_i \sigma_j}
//! $$
//!
//! Unbiased sample covariance and correlation/covariance conversions.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray_stats::CorrelationExt;

use crate::error::EstimationError;

pub(crate) fn ensure_finite_window(window: &ArrayView2<f64>) -> Result<(), EstimationError> {
  if window.iter().any(|v| !v.is_finite()) {
    return Err(EstimationError::InvalidInput(
      "return window contains non-finite values".to_string(),
    ));
  }
  Ok(())
}

pub(crate) fn ensure_square_symmetric_finite(
  matrix: &Array2<f64>,
  tol: f64,
) -> Result<(), EstimationError> {
  let n = matrix.nrows();
  if n == 0 || matrix.ncols() != n {
    return Err(EstimationError::InvalidInput(format!(
      "expected a non-empty square matrix, got {}x{}",
      matrix.nrows(),
      matrix.ncols()
    )));
  }

  for i in 0..n {
    for j in 0..n {
      let v = matrix[[i, j]];
      if !v.is_finite() {
        return Err(EstimationError::InvalidInput(format!(
          "matrix entry [{i}, {j}] is not finite"
        )));
      }
      if (v - matrix[[j, i]]).abs() > tol {
        return Err(EstimationError::InvalidInput(format!(
          "matrix is not symmetric at [{i}, {j}]"
        )));
      }
    }
  }

  Ok(())
}

/// Unbiased (N-1 normalized) sample covariance of a T x N return window.
pub fn sample_covariance(window: &ArrayView2<f64>) -> Result<Array2<f64>, EstimationError> {
  let t = window.nrows();
  if t < 2 {
    return Err(EstimationError::InvalidInput(format!(
      "sample covariance needs at least 2 periods, got {t}"
    )));
  }
  ensure_finite_window(window)?;

  // CorrelationExt expects variables on rows, observations on columns.
  let cov = window
    .t()
    .cov(1.0)
    .map_err(|_| EstimationError::InvalidInput("empty return window".to_string()))?;

  Ok(symmetrize(cov))
}

/// Split a covariance matrix into its correlation matrix and volatilities.
///
/// Zero-variance assets get zero off-diagonal correlation, matching the
/// covariance they came from.
pub fn correlation_from_covariance(cov: &Array2<f64>) -> (Array2<f64>, Array1<f64>) {
  let n = cov.nrows();
  let sigmas = Array1::from_iter((0..n).map(|i| cov[[i, i]].max(0.0).sqrt()));

  let mut corr = Array2::<f64>::zeros((n, n));
  for i in 0..n {
    corr[[i, i]] = 1.0;
    for j in (i + 1)..n {
      let denom = sigmas[i] * sigmas[j];
      let r = if denom > 1e-15 {
        (cov[[i, j]] / denom).clamp(-1.0, 1.0)
      } else {
        0.0
      };
      corr[[i, j]] = r;
      corr[[j, i]] = r;
    }
  }

  (corr, sigmas)
}

/// Rebuild a covariance matrix from a correlation matrix and volatilities.
pub fn covariance_from_correlation(corr: &Array2<f64>, sigmas: &Array1<f64>) -> Array2<f64> {
  let n = sigmas.len();
  let mut cov = Array2::<f64>::zeros((n, n));

  for i in 0..n {
    for j in 0..n {
      cov[[i, j]] = sigmas[i] * sigmas[j] * corr[[i, j]];
    }
  }

  cov
}

/// Average a matrix with its transpose to absorb floating-point asymmetry.
pub(crate) fn symmetrize(matrix: Array2<f64>) -> Array2<f64> {
  let n = matrix.nrows();
  let mut out = matrix;

  for i in 0..n {
    for j in (i + 1)..n {
      let avg = 0.5 * (out[[i, j]] + out[[j, i]]);
      out[[i, j]] = avg;
      out[[j, i]] = avg;
    }
  }

  out
}
