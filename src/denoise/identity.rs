//! # Baseline Denoiser
//!
//! Pass-through control condition. Unlike the filtering variants it
//! refuses the degenerate regime where the asset count exceeds the sample
//! length, because the raw sample covariance is rank-deficient there.

use ndarray::Array2;
use ndarray::ArrayView2;

use super::Denoiser;
use super::SYMMETRY_TOL;
use crate::error::EstimationError;
use crate::estimator::sample::ensure_square_symmetric_finite;

/// The identity transform: returns the sample matrix unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Denoiser for Identity {
  fn name(&self) -> &'static str {
    "baseline"
  }

  fn denoise(
    &self,
    cov: &Array2<f64>,
    window: &ArrayView2<f64>,
  ) -> Result<Array2<f64>, EstimationError> {
    ensure_square_symmetric_finite(cov, SYMMETRY_TOL)?;

    let assets = cov.nrows();
    let periods = window.nrows();
    if assets > periods {
      return Err(EstimationError::DegenerateEstimation { assets, periods });
    }

    Ok(cov.clone())
  }
}
