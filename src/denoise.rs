//! # Covariance Denoising
//!
//! $$
//! \hat\Sigma \mapsto \Sigma^\*
//! $$
//!
//! Polymorphic denoising transforms over a raw sample covariance matrix:
//! the identity baseline, bootstrap-averaged hierarchical clustering, and
//! eigenvalue clipping of the correlation spectrum.

pub mod bahc;
pub mod clipping;
pub mod identity;
pub mod linkage;

use std::fmt::Display;

use ndarray::Array2;
use ndarray::ArrayView2;

pub use bahc::Bahc;
pub use bahc::BahcConfig;
pub use bahc::Linkage;
pub use clipping::ClippingConfig;
pub use clipping::CorrelationClipping;
pub use identity::Identity;

use crate::error::EstimationError;

/// Symmetry tolerance applied to denoiser inputs.
pub(crate) const SYMMETRY_TOL: f64 = 1e-9;

/// A covariance denoising transform.
///
/// Input is one square symmetric matrix plus the in-sample return window
/// it was estimated from; output is a same-shape square symmetric matrix.
pub trait Denoiser: Send + Sync {
  /// Method name used in reports and artifact columns.
  fn name(&self) -> &'static str;

  fn denoise(
    &self,
    cov: &Array2<f64>,
    window: &ArrayView2<f64>,
  ) -> Result<Array2<f64>, EstimationError>;
}

/// Supported denoising methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
  /// Raw sample covariance, the control condition.
  Baseline,
  /// Bootstrap-averaged hierarchical clustering.
  Bahc,
  /// Trace-preserving eigenvalue clipping of the correlation matrix.
  Clipping,
}

impl Method {
  /// Parse a string into a [`Method`].
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "bahc" | "bootstrap" => Self::Bahc,
      "clip" | "clipping" | "rmt" => Self::Clipping,
      _ => Self::Baseline,
    }
  }

  /// All methods, in reporting order.
  pub fn all() -> Vec<Self> {
    vec![Self::Baseline, Self::Bahc, Self::Clipping]
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::Baseline => "baseline",
      Self::Bahc => "bahc",
      Self::Clipping => "clipping",
    }
  }
}

impl Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn method_parses_aliases() {
    assert_eq!(Method::from_str("BAHC"), Method::Bahc);
    assert_eq!(Method::from_str("rmt"), Method::Clipping);
    assert_eq!(Method::from_str("sample"), Method::Baseline);
  }

  #[test]
  fn method_names_round_trip() {
    for method in Method::all() {
      assert_eq!(Method::from_str(method.name()), method);
    }
  }
}
