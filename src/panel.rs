//! # Return Panel
//!
//! $$
//! R \in \mathbb{R}^{T \times N}
//! $$
//!
//! Immutable date-indexed panel of asset returns. Rows are periods,
//! columns are assets; `NaN` is the explicit missing marker.

pub mod loader;

use chrono::NaiveDate;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::s;

use crate::error::EstimationError;

/// A validated T x N panel of asset returns.
///
/// Invariants enforced at construction: dates are strictly increasing and
/// unique, asset names are unique, and the return matrix shape matches
/// both axes. The panel is never mutated after construction; all derived
/// artifacts are recomputed from it.
#[derive(Clone, Debug)]
pub struct ReturnPanel {
  dates: Vec<NaiveDate>,
  assets: Vec<String>,
  returns: Array2<f64>,
}

impl ReturnPanel {
  pub fn new(
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    returns: Array2<f64>,
  ) -> Result<Self, EstimationError> {
    if returns.nrows() != dates.len() {
      return Err(EstimationError::InvalidInput(format!(
        "panel has {} rows but {} dates",
        returns.nrows(),
        dates.len()
      )));
    }
    if returns.ncols() != assets.len() {
      return Err(EstimationError::InvalidInput(format!(
        "panel has {} columns but {} assets",
        returns.ncols(),
        assets.len()
      )));
    }

    for pair in dates.windows(2) {
      if pair[1] <= pair[0] {
        return Err(EstimationError::InvalidInput(format!(
          "dates must be strictly increasing, got {} after {}",
          pair[1], pair[0]
        )));
      }
    }

    for (i, name) in assets.iter().enumerate() {
      if assets[..i].contains(name) {
        return Err(EstimationError::InvalidInput(format!(
          "duplicate asset identifier {name}"
        )));
      }
    }

    Ok(Self {
      dates,
      assets,
      returns,
    })
  }

  /// Number of periods (rows).
  pub fn n_periods(&self) -> usize {
    self.returns.nrows()
  }

  /// Number of assets (columns).
  pub fn n_assets(&self) -> usize {
    self.returns.ncols()
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn returns(&self) -> ArrayView2<'_, f64> {
    self.returns.view()
  }

  /// Contiguous row slice `[start, start + len)`.
  ///
  /// Callers are responsible for keeping the range inside the panel; the
  /// rolling estimator always does.
  pub fn window(&self, start: usize, len: usize) -> ArrayView2<'_, f64> {
    self.returns.slice(s![start..start + len, ..])
  }
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;

  fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  #[test]
  fn panel_accepts_consistent_inputs() {
    let panel = ReturnPanel::new(
      vec![d("2008-07-01"), d("2008-07-02")],
      vec!["AAPL".into(), "MSFT".into()],
      array![[0.01, -0.02], [0.00, 0.03]],
    )
    .unwrap();

    assert_eq!(panel.n_periods(), 2);
    assert_eq!(panel.n_assets(), 2);
  }

  #[test]
  fn panel_rejects_unsorted_dates() {
    let result = ReturnPanel::new(
      vec![d("2008-07-02"), d("2008-07-01")],
      vec!["AAPL".into()],
      array![[0.01], [0.02]],
    );

    assert!(matches!(result, Err(EstimationError::InvalidInput(_))));
  }

  #[test]
  fn panel_rejects_duplicate_dates() {
    let result = ReturnPanel::new(
      vec![d("2008-07-01"), d("2008-07-01")],
      vec!["AAPL".into()],
      array![[0.01], [0.02]],
    );

    assert!(result.is_err());
  }

  #[test]
  fn panel_rejects_shape_mismatch() {
    let result = ReturnPanel::new(
      vec![d("2008-07-01")],
      vec!["AAPL".into(), "MSFT".into()],
      array![[0.01]],
    );

    assert!(result.is_err());
  }

  #[test]
  fn panel_rejects_duplicate_assets() {
    let result = ReturnPanel::new(
      vec![d("2008-07-01")],
      vec!["AAPL".into(), "AAPL".into()],
      array![[0.01, 0.02]],
    );

    assert!(result.is_err());
  }

  #[test]
  fn window_slices_rows() {
    let panel = ReturnPanel::new(
      vec![d("2008-07-01"), d("2008-07-02"), d("2008-07-03")],
      vec!["AAPL".into()],
      array![[0.01], [0.02], [0.03]],
    )
    .unwrap();

    let w = panel.window(1, 2);
    assert_eq!(w.nrows(), 2);
    assert_eq!(w[[0, 0]], 0.02);
  }
}
