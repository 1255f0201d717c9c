//! # Hierarchical Clustering Filter
//!
//! $$
//! d_{ij} = \sqrt{\tfrac{1}{2}(1-\rho_{ij})}
//! $$
//!
//! Agglomerative clustering over the correlation distance, plus the
//! dendrogram filter: every pair of assets gets the average raw
//! correlation of the two clusters merged at their first common ancestor.

use ndarray::Array2;

/// Cluster-distance update rule used while merging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Linkage {
  Single,
  #[default]
  Average,
  Complete,
}

impl Linkage {
  /// Parse a string into a [`Linkage`], defaulting to average.
  pub fn from_str(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "single" | "min" => Self::Single,
      "complete" | "max" => Self::Complete,
      _ => Self::Average,
    }
  }

  fn merge(&self, d_a: f64, d_b: f64, size_a: usize, size_b: usize) -> f64 {
    match self {
      Self::Single => d_a.min(d_b),
      Self::Complete => d_a.max(d_b),
      Self::Average => {
        (size_a as f64 * d_a + size_b as f64 * d_b) / (size_a + size_b) as f64
      }
    }
  }
}

/// Replace every off-diagonal correlation with the cross-cluster average
/// taken at the dendrogram merge joining the two assets.
pub fn filter_correlation(corr: &Array2<f64>, linkage: Linkage) -> Array2<f64> {
  let n = corr.nrows();
  let mut filtered = Array2::<f64>::eye(n);
  if n <= 1 {
    return filtered;
  }

  let mut d = Array2::<f64>::zeros((n, n));
  for i in 0..n {
    for j in 0..n {
      if i != j {
        d[[i, j]] = (0.5 * (1.0 - corr[[i, j]]).max(0.0)).sqrt();
      }
    }
  }

  let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
  let mut active = vec![true; n];

  for _ in 0..(n - 1) {
    let mut min_d = f64::INFINITY;
    let mut mi = 0;
    let mut mj = 0;

    for i in 0..n {
      if !active[i] {
        continue;
      }
      for j in (i + 1)..n {
        if !active[j] {
          continue;
        }
        if d[[i, j]] < min_d {
          min_d = d[[i, j]];
          mi = i;
          mj = j;
        }
      }
    }

    // Average raw correlation across the two merging blocks.
    let mut acc = 0.0;
    for &a in &members[mi] {
      for &b in &members[mj] {
        acc += corr[[a, b]];
      }
    }
    let avg = acc / (members[mi].len() * members[mj].len()) as f64;
    for &a in &members[mi] {
      for &b in &members[mj] {
        filtered[[a, b]] = avg;
        filtered[[b, a]] = avg;
      }
    }

    let size_a = members[mi].len();
    let size_b = members[mj].len();
    for k in 0..n {
      if !active[k] || k == mi || k == mj {
        continue;
      }
      let merged = linkage.merge(d[[mi, k]], d[[mj, k]], size_a, size_b);
      d[[mi, k]] = merged;
      d[[k, mi]] = merged;
    }

    let absorbed = std::mem::take(&mut members[mj]);
    members[mi].extend(absorbed);
    active[mj] = false;
  }

  filtered
}
