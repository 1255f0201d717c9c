//! # Bootstrap-Averaged Hierarchical Clustering
//!
//! $$
//! \Sigma^\* = \frac{1}{B}\sum_{b=1}^{B} \mathrm{HC}\!\left(\hat\Sigma^{(b)}\right)
//! $$
//!
//! Resamples the in-sample window with replacement, filters each
//! resample's correlation matrix through the dendrogram filter, and
//! averages the filtered covariance estimates across draws. The PRNG is
//! explicit and seeded, never process-wide state, so a seed pins the full
//! resample sequence bit for bit.

use ndarray::Array2;
use ndarray::ArrayView2;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use super::Denoiser;
use super::SYMMETRY_TOL;
use super::linkage::filter_correlation;
pub use super::linkage::Linkage;
use crate::error::EstimationError;
use crate::estimator::sample::correlation_from_covariance;
use crate::estimator::sample::covariance_from_correlation;
use crate::estimator::sample::ensure_finite_window;
use crate::estimator::sample::ensure_square_symmetric_finite;
use crate::estimator::sample::sample_covariance;
use crate::estimator::sample::symmetrize;

/// BAHC tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct BahcConfig {
  /// Bootstrap draw count B, at least 1.
  pub draws: usize,
  /// Cluster-distance update rule.
  pub linkage: Linkage,
  /// Seed for the resample stream; `None` draws from entropy.
  pub seed: Option<u64>,
  /// Disable to average plain bootstrap covariances without filtering.
  pub apply_filter: bool,
}

impl Default for BahcConfig {
  fn default() -> Self {
    Self {
      draws: 100,
      linkage: Linkage::Average,
      seed: None,
      apply_filter: true,
    }
  }
}

impl BahcConfig {
  pub fn validate(&self) -> Result<(), EstimationError> {
    if self.draws == 0 {
      return Err(EstimationError::Configuration(
        "bootstrap draw count must be at least 1".to_string(),
      ));
    }
    Ok(())
  }
}

/// Bootstrap-averaged hierarchical clustering denoiser.
#[derive(Clone, Debug)]
pub struct Bahc {
  config: BahcConfig,
}

impl Bahc {
  pub fn new(config: BahcConfig) -> Result<Self, EstimationError> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &BahcConfig {
    &self.config
  }

  /// Copy of this denoiser pinned to an explicit seed.
  pub fn with_seed(&self, seed: u64) -> Self {
    let mut config = self.config;
    config.seed = Some(seed);
    Self { config }
  }
}

impl Denoiser for Bahc {
  fn name(&self) -> &'static str {
    "bahc"
  }

  fn denoise(
    &self,
    cov: &Array2<f64>,
    window: &ArrayView2<f64>,
  ) -> Result<Array2<f64>, EstimationError> {
    ensure_square_symmetric_finite(cov, SYMMETRY_TOL)?;
    ensure_finite_window(window)?;

    let (t, n) = window.dim();
    if n != cov.nrows() {
      return Err(EstimationError::InvalidInput(format!(
        "window has {n} assets but covariance is {}x{}",
        cov.nrows(),
        cov.ncols()
      )));
    }
    if t < 2 {
      return Err(EstimationError::InvalidInput(format!(
        "bootstrap needs at least 2 in-sample periods, got {t}"
      )));
    }

    let mut rng = match self.config.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };

    let mut acc = Array2::<f64>::zeros((n, n));
    for _ in 0..self.config.draws {
      let resample = bootstrap_rows(window, &mut rng);
      let cov_b = sample_covariance(&resample.view())?;

      let contribution = if self.config.apply_filter {
        let (corr, sigmas) = correlation_from_covariance(&cov_b);
        let filtered = filter_correlation(&corr, self.config.linkage);
        covariance_from_correlation(&filtered, &sigmas)
      } else {
        cov_b
      };

      acc += &contribution;
    }

    acc /= self.config.draws as f64;
    Ok(symmetrize(acc))
  }
}

/// Resample window rows with replacement, keeping the period count.
fn bootstrap_rows(window: &ArrayView2<f64>, rng: &mut StdRng) -> Array2<f64> {
  let (t, n) = window.dim();
  let dist = Uniform::new(0, t);

  let mut out = Array2::<f64>::zeros((t, n));
  for row in 0..t {
    let source = rng.sample(dist);
    out.row_mut(row).assign(&window.row(source));
  }

  out
}
