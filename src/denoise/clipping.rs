//! # Correlation Clipping
//!
//! $$
//! \lambda_+ = \left(1 + \sqrt{N/T}\right)^2
//! $$
//!
//! Random-matrix denoising of the sample correlation matrix: eigenvalues
//! inside the Marchenko-Pastur noise band are replaced by a single
//! trace-preserving value, the matrix is rebuilt from the modified
//! spectrum, its diagonal is re-scaled to one, and the result is mapped
//! back to covariance through the original volatilities.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;

use super::Denoiser;
use super::SYMMETRY_TOL;
use crate::error::EstimationError;
use crate::estimator::sample::correlation_from_covariance;
use crate::estimator::sample::covariance_from_correlation;
use crate::estimator::sample::ensure_square_symmetric_finite;
use crate::estimator::sample::symmetrize;
use crate::linalg::symmetric_eigen;

/// Clipping tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct ClippingConfig {
  /// Multiplier on the Marchenko-Pastur upper edge.
  pub edge_scale: f64,
}

impl Default for ClippingConfig {
  fn default() -> Self {
    Self { edge_scale: 1.0 }
  }
}

impl ClippingConfig {
  pub fn validate(&self) -> Result<(), EstimationError> {
    if !self.edge_scale.is_finite() || self.edge_scale <= 0.0 {
      return Err(EstimationError::Configuration(format!(
        "edge scale must be a positive finite number, got {}",
        self.edge_scale
      )));
    }
    Ok(())
  }
}

/// Eigenvalue-clipping denoiser.
#[derive(Clone, Debug, Default)]
pub struct CorrelationClipping {
  config: ClippingConfig,
}

impl CorrelationClipping {
  pub fn new(config: ClippingConfig) -> Result<Self, EstimationError> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &ClippingConfig {
    &self.config
  }
}

impl Denoiser for CorrelationClipping {
  fn name(&self) -> &'static str {
    "clipping"
  }

  fn denoise(
    &self,
    cov: &Array2<f64>,
    window: &ArrayView2<f64>,
  ) -> Result<Array2<f64>, EstimationError> {
    ensure_square_symmetric_finite(cov, SYMMETRY_TOL)?;

    let n = cov.nrows();
    let t = window.nrows();
    if t == 0 {
      return Err(EstimationError::InvalidInput(
        "in-sample window is empty".to_string(),
      ));
    }
    if window.ncols() != n {
      return Err(EstimationError::InvalidInput(format!(
        "window has {} assets but covariance is {n}x{n}",
        window.ncols()
      )));
    }

    let (corr, sigmas) = correlation_from_covariance(cov);

    let q = n as f64 / t as f64;
    let edge = self.config.edge_scale * (1.0 + q.sqrt()).powi(2);

    let spectrum = symmetric_eigen(&corr)?;
    let mut eigenvalues = spectrum.eigenvalues.clone();

    let mut kept_sum = 0.0;
    let mut clipped = 0usize;
    for &ev in eigenvalues.iter() {
      if ev > edge {
        kept_sum += ev;
      } else {
        clipped += 1;
      }
    }

    // Trace of the unit-diagonal correlation matrix is exactly n.
    if clipped > 0 {
      let replacement = (n as f64 - kept_sum) / clipped as f64;
      for ev in eigenvalues.iter_mut() {
        if *ev <= edge {
          *ev = replacement;
        }
      }
    }

    let rebuilt = spectrum.reconstruct(&eigenvalues);
    let rescaled = rescale_to_unit_diagonal(&rebuilt)?;

    Ok(symmetrize(covariance_from_correlation(&rescaled, &sigmas)))
  }
}

fn rescale_to_unit_diagonal(matrix: &Array2<f64>) -> Result<Array2<f64>, EstimationError> {
  let n = matrix.nrows();
  let diag = Array1::from_iter((0..n).map(|i| matrix[[i, i]]));

  if diag.iter().any(|&d| d <= 1e-15) {
    return Err(EstimationError::InvalidInput(
      "clipped spectrum collapsed a diagonal entry to zero".to_string(),
    ));
  }

  let mut out = Array2::<f64>::zeros((n, n));
  for i in 0..n {
    out[[i, i]] = 1.0;
    for j in (i + 1)..n {
      let r = matrix[[i, j]] / (diag[i] * diag[j]).sqrt();
      out[[i, j]] = r;
      out[[j, i]] = r;
    }
  }

  Ok(out)
}
