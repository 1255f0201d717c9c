//! # Minimum-Variance Weights
//!
//! $$
//! w = \frac{C^{-1}\mathbf{1}}{\mathbf{1}^\top C^{-1}\mathbf{1}}
//! $$
//!
//! Global minimum-variance portfolio from a covariance matrix. The solver
//! only signals failure; skipping the window, falling back to a
//! pseudo-inverse or aborting is the caller's policy.

use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Array2;

use crate::denoise::SYMMETRY_TOL;
use crate::error::EstimationError;
use crate::estimator::sample::ensure_square_symmetric_finite;
use crate::linalg::symmetric_eigen;

/// Default ceiling on the covariance condition number.
pub const DEFAULT_MAX_CONDITION: f64 = 1e12;

/// Closed-form global minimum-variance solver.
#[derive(ImplNew, Clone, Copy, Debug)]
pub struct MinVarianceSolver {
  /// Condition numbers above this are reported as singular.
  pub max_condition: f64,
}

impl Default for MinVarianceSolver {
  fn default() -> Self {
    Self {
      max_condition: DEFAULT_MAX_CONDITION,
    }
  }
}

impl MinVarianceSolver {
  /// Weights summing to one that minimize `w' C w`.
  pub fn weights(&self, cov: &Array2<f64>) -> Result<Array1<f64>, EstimationError> {
    ensure_square_symmetric_finite(cov, SYMMETRY_TOL)?;

    let spectrum = symmetric_eigen(cov)?;
    let condition = spectrum.condition_number();
    if !(condition <= self.max_condition) {
      return Err(EstimationError::SingularMatrix {
        condition,
        limit: self.max_condition,
      });
    }

    let ones = Array1::<f64>::ones(cov.nrows());
    let x = spectrum.solve(&ones);
    let budget = x.sum();
    if budget.abs() < 1e-15 {
      return Err(EstimationError::SingularMatrix {
        condition: f64::INFINITY,
        limit: self.max_condition,
      });
    }

    Ok(x / budget)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::Array2;
  use ndarray::array;

  use super::*;

  #[test]
  fn weights_sum_to_one() {
    let cov = array![
      [0.04, 0.01, 0.00],
      [0.01, 0.09, 0.02],
      [0.00, 0.02, 0.16],
    ];

    let w = MinVarianceSolver::default().weights(&cov).unwrap();
    assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-8);
  }

  #[test]
  fn scaled_identity_gives_equal_weights() {
    for c in [0.5, 1.0, 7.3] {
      let cov = Array2::<f64>::eye(4) * c;
      let w = MinVarianceSolver::default().weights(&cov).unwrap();

      for i in 0..4 {
        assert_relative_eq!(w[i], 0.25, epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn known_two_asset_solution() {
    // Uncorrelated assets: weights proportional to inverse variances.
    let cov = array![[0.01, 0.0], [0.0, 0.04]];
    let w = MinVarianceSolver::default().weights(&cov).unwrap();

    assert_relative_eq!(w[0], 0.8, epsilon = 1e-12);
    assert_relative_eq!(w[1], 0.2, epsilon = 1e-12);
  }

  #[test]
  fn singular_matrix_is_reported() {
    // Rank one: second asset is a copy of the first.
    let cov = array![[0.04, 0.04], [0.04, 0.04]];
    let result = MinVarianceSolver::default().weights(&cov);

    assert!(matches!(
      result,
      Err(EstimationError::SingularMatrix { .. })
    ));
  }

  #[test]
  fn condition_limit_is_respected() {
    let cov = array![[1.0, 0.0], [0.0, 1e-8]];

    // Condition number is 1e8: fine by default, singular under a tight limit.
    assert!(MinVarianceSolver::default().weights(&cov).is_ok());
    let tight = MinVarianceSolver::new(1e6);
    assert!(tight.weights(&cov).is_err());
  }

  #[test]
  fn non_finite_matrix_is_rejected() {
    let cov = array![[f64::NAN, 0.0], [0.0, 1.0]];
    assert!(matches!(
      MinVarianceSolver::default().weights(&cov),
      Err(EstimationError::InvalidInput(_))
    ));
  }
}
