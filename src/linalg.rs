//! # Symmetric Linear Algebra
//!
//! $$
//! C = V \Lambda V^\top
//! $$
//!
//! Eigen-solver capability used by the clipping denoiser and the weight
//! solver. Everything symmetric goes through [`symmetric_eigen`] so the
//! backing implementation stays swappable in one place.

use nalgebra::DMatrix;
use ndarray::Array1;
use ndarray::Array2;

use crate::error::EstimationError;

/// Eigen-decomposition of a real symmetric matrix.
#[derive(Clone, Debug)]
pub struct SymmetricSpectrum {
  /// Eigenvalues, in the order produced by the solver.
  pub eigenvalues: Array1<f64>,
  /// Eigenvectors as matrix columns, matching `eigenvalues` order.
  pub eigenvectors: Array2<f64>,
}

impl SymmetricSpectrum {
  /// Ratio of largest to smallest absolute eigenvalue.
  ///
  /// Returns `f64::INFINITY` when the smallest absolute eigenvalue is zero.
  pub fn condition_number(&self) -> f64 {
    let mut min_abs = f64::INFINITY;
    let mut max_abs = 0.0_f64;

    for &ev in self.eigenvalues.iter() {
      let a = ev.abs();
      min_abs = min_abs.min(a);
      max_abs = max_abs.max(a);
    }

    if min_abs == 0.0 {
      f64::INFINITY
    } else {
      max_abs / min_abs
    }
  }

  /// Solve `C x = b` through the spectrum: `x = V diag(1/lambda) V^T b`.
  pub fn solve(&self, b: &Array1<f64>) -> Array1<f64> {
    let n = self.eigenvalues.len();
    let mut x = Array1::<f64>::zeros(n);

    for k in 0..n {
      let v_k = self.eigenvectors.column(k);
      let proj = v_k.dot(b) / self.eigenvalues[k];
      for i in 0..n {
        x[i] += proj * v_k[i];
      }
    }

    x
  }

  /// Reconstruct the matrix from (possibly modified) eigenvalues.
  pub fn reconstruct(&self, eigenvalues: &Array1<f64>) -> Array2<f64> {
    let n = eigenvalues.len();
    let mut out = Array2::<f64>::zeros((n, n));

    for k in 0..n {
      let v_k = self.eigenvectors.column(k);
      let lambda = eigenvalues[k];
      for i in 0..n {
        for j in 0..n {
          out[[i, j]] += lambda * v_k[i] * v_k[j];
        }
      }
    }

    out
  }
}

/// Decompose a square symmetric matrix.
///
/// The input is assumed validated (square, finite); symmetry deviations at
/// floating tolerance are absorbed by averaging with the transpose.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<SymmetricSpectrum, EstimationError> {
  let n = matrix.nrows();
  if n == 0 || matrix.ncols() != n {
    return Err(EstimationError::InvalidInput(format!(
      "expected a non-empty square matrix, got {}x{}",
      matrix.nrows(),
      matrix.ncols()
    )));
  }

  let mut dm = DMatrix::<f64>::zeros(n, n);
  for i in 0..n {
    for j in 0..n {
      dm[(i, j)] = 0.5 * (matrix[[i, j]] + matrix[[j, i]]);
    }
  }

  let eigen = dm.symmetric_eigen();

  let eigenvalues = Array1::from_iter(eigen.eigenvalues.iter().copied());
  let mut eigenvectors = Array2::<f64>::zeros((n, n));
  for i in 0..n {
    for j in 0..n {
      eigenvectors[[i, j]] = eigen.eigenvectors[(i, j)];
    }
  }

  Ok(SymmetricSpectrum {
    eigenvalues,
    eigenvectors,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn spectrum_reconstructs_input() {
    let m = array![[4.0, 1.0], [1.0, 3.0]];
    let spectrum = symmetric_eigen(&m).unwrap();
    let back = spectrum.reconstruct(&spectrum.eigenvalues);

    for i in 0..2 {
      for j in 0..2 {
        assert_relative_eq!(back[[i, j]], m[[i, j]], epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn solve_matches_direct_inverse() {
    let m = array![[2.0, 0.5], [0.5, 1.0]];
    let b = array![1.0, 1.0];
    let spectrum = symmetric_eigen(&m).unwrap();
    let x = spectrum.solve(&b);

    // m * x should give back b
    let r0 = m[[0, 0]] * x[0] + m[[0, 1]] * x[1];
    let r1 = m[[1, 0]] * x[0] + m[[1, 1]] * x[1];
    assert_relative_eq!(r0, 1.0, epsilon = 1e-12);
    assert_relative_eq!(r1, 1.0, epsilon = 1e-12);
  }

  #[test]
  fn condition_number_of_identity_is_one() {
    let m = Array2::<f64>::eye(3);
    let spectrum = symmetric_eigen(&m).unwrap();
    assert_relative_eq!(spectrum.condition_number(), 1.0, epsilon = 1e-12);
  }

  #[test]
  fn empty_matrix_is_rejected() {
    let m = Array2::<f64>::zeros((0, 0));
    assert!(symmetric_eigen(&m).is_err());
  }
}
