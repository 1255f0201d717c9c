//! # Rolling Estimator
//!
//! $$
//! k = \left\lfloor \frac{L - W}{S} \right\rfloor + 1
//! $$
//!
//! Lazy sequence of (in-sample window, sample matrix) pairs over a return
//! panel. The iterator holds no hidden state beyond its position, so a
//! rerun from a fresh iterator reproduces the sequence exactly.

use ndarray::Array2;
use ndarray::ArrayView2;

use super::sample::correlation_from_covariance;
use super::sample::sample_covariance;
use crate::error::EstimationError;
use crate::panel::ReturnPanel;

/// Output flavor of the rolling estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EstimatorMode {
  /// Unbiased sample covariance.
  #[default]
  Covariance,
  /// Sample correlation with unit diagonal.
  Correlation,
}

/// Rolling window parameters.
#[derive(Clone, Copy, Debug)]
pub struct RollingConfig {
  /// In-sample window length W, in periods.
  pub window: usize,
  /// Step size S between consecutive window starts, in periods.
  pub step: usize,
  /// Covariance or correlation output.
  pub mode: EstimatorMode,
}

impl RollingConfig {
  pub fn validate(&self) -> Result<(), EstimationError> {
    if self.window < 2 {
      return Err(EstimationError::Configuration(format!(
        "window length must be at least 2, got {}",
        self.window
      )));
    }
    if self.step == 0 {
      return Err(EstimationError::Configuration(
        "step size must be positive".to_string(),
      ));
    }
    Ok(())
  }
}

/// One in-sample segment of a rolling window.
#[derive(Clone, Debug)]
pub struct InSampleWindow<'a> {
  /// Zero-based rolling position.
  pub index: usize,
  /// First panel row of the in-sample segment.
  pub start: usize,
  /// In-sample return rows, shape W x N.
  pub returns: ArrayView2<'a, f64>,
}

/// Lazy rolling covariance/correlation estimator over a panel.
pub struct RollingCovariance<'a> {
  panel: &'a ReturnPanel,
  config: RollingConfig,
  position: usize,
}

impl<'a> RollingCovariance<'a> {
  pub fn new(panel: &'a ReturnPanel, config: RollingConfig) -> Result<Self, EstimationError> {
    config.validate()?;
    Ok(Self {
      panel,
      config,
      position: 0,
    })
  }

  /// Number of rolling positions: `floor((L - W) / S) + 1`, zero if `L < W`.
  pub fn n_windows(&self) -> usize {
    let l = self.panel.n_periods();
    if l < self.config.window {
      0
    } else {
      (l - self.config.window) / self.config.step + 1
    }
  }
}

impl<'a> Iterator for RollingCovariance<'a> {
  // The window identity travels next to the estimate so a failed window
  // can still be reported by position.
  type Item = (InSampleWindow<'a>, Result<Array2<f64>, EstimationError>);

  fn next(&mut self) -> Option<Self::Item> {
    if self.position >= self.n_windows() {
      return None;
    }

    let index = self.position;
    let start = index * self.config.step;
    self.position += 1;

    let returns = self.panel.window(start, self.config.window);
    let window = InSampleWindow {
      index,
      start,
      returns,
    };

    let estimate = sample_covariance(&returns).map(|cov| match self.config.mode {
      EstimatorMode::Covariance => cov,
      EstimatorMode::Correlation => correlation_from_covariance(&cov).0,
    });

    Some((window, estimate))
  }
}
