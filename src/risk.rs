//! # Risk Evaluation
//!
//! $$
//! \sigma_{\text{in}}^2 = w^\top C w, \qquad
//! \sigma_{\text{out}}^2 = \operatorname{Var}\!\left(\textstyle\sum_i w_i r_{i,t}\right)
//! $$
//!
//! Analytic in-sample risk against the covariance that produced the
//! weights, and realized out-of-sample risk of the weighted portfolio
//! return series. Realized dispersion uses the population variance, so a
//! single out-of-sample period is well-defined.

use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use statrs::statistics::Statistics;

use crate::error::EstimationError;
use crate::estimator::sample::ensure_finite_window;

/// How risk numbers are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RiskMetric {
  /// Portfolio variance.
  #[default]
  Variance,
  /// Portfolio standard deviation.
  StdDev,
}

impl RiskMetric {
  /// Parse a string into a [`RiskMetric`], defaulting to variance.
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "std" | "stddev" | "std-dev" | "volatility" => Self::StdDev,
      _ => Self::Variance,
    }
  }

  fn from_variance(&self, variance: f64) -> f64 {
    let variance = variance.max(0.0);
    match self {
      Self::Variance => variance,
      Self::StdDev => variance.sqrt(),
    }
  }
}

/// Risk pair for one (window, method).
#[derive(Clone, Copy, Debug)]
pub struct RiskEstimate {
  /// Analytic `w' C w`, transformed per the metric.
  pub in_sample: f64,
  /// Realized out-of-sample dispersion, transformed per the metric.
  pub out_of_sample: f64,
}

/// Evaluates in-sample and out-of-sample portfolio risk.
#[derive(ImplNew, Clone, Copy, Debug, Default)]
pub struct RiskEvaluator {
  /// Variance or standard deviation reporting.
  pub metric: RiskMetric,
}

impl RiskEvaluator {
  pub fn evaluate(
    &self,
    weights: &Array1<f64>,
    cov: &Array2<f64>,
    out_sample: &ArrayView2<f64>,
  ) -> Result<RiskEstimate, EstimationError> {
    let n = weights.len();
    if cov.nrows() != n || cov.ncols() != n {
      return Err(EstimationError::InvalidInput(format!(
        "covariance is {}x{} but there are {n} weights",
        cov.nrows(),
        cov.ncols()
      )));
    }
    if out_sample.ncols() != n {
      return Err(EstimationError::InvalidInput(format!(
        "out-of-sample segment has {} assets but there are {n} weights",
        out_sample.ncols()
      )));
    }
    if out_sample.nrows() == 0 {
      return Err(EstimationError::InvalidInput(
        "out-of-sample segment is empty".to_string(),
      ));
    }
    if weights.iter().any(|w| !w.is_finite()) {
      return Err(EstimationError::InvalidInput(
        "weight vector contains non-finite values".to_string(),
      ));
    }
    ensure_finite_window(out_sample)?;

    let in_variance = weights.dot(&cov.dot(weights));

    let portfolio_returns: Vec<f64> = out_sample
      .rows()
      .into_iter()
      .map(|row| row.dot(weights))
      .collect();
    let out_variance = portfolio_returns.population_variance();

    Ok(RiskEstimate {
      in_sample: self.metric.from_variance(in_variance),
      out_of_sample: self.metric.from_variance(out_variance),
    })
  }
}
