//! # Errors
//!
//! $$
//! \kappa(C) = \frac{|\lambda|_{\max}}{|\lambda|_{\min}}
//! $$
//!
//! Shared error taxonomy for estimation, denoising and weight solving.

use thiserror::Error;

/// Errors surfaced by the covariance pipeline.
#[derive(Debug, Error)]
pub enum EstimationError {
  /// Panel or matrix input contains non-finite or malformed data.
  #[error("invalid input: {0}")]
  InvalidInput(String),
  /// Sample estimator is degenerate: more assets than in-sample periods.
  #[error("degenerate estimation: {assets} assets with only {periods} in-sample periods")]
  DegenerateEstimation {
    /// Number of assets in the window.
    assets: usize,
    /// Number of in-sample periods in the window.
    periods: usize,
  },
  /// Covariance matrix is not invertible within numerical tolerance.
  #[error("singular covariance matrix: condition number {condition:.3e} exceeds {limit:.3e}")]
  SingularMatrix {
    /// Observed condition number.
    condition: f64,
    /// Configured condition limit.
    limit: f64,
  },
  /// Run configuration rejected before any window was processed.
  #[error("invalid configuration: {0}")]
  Configuration(String),
}
