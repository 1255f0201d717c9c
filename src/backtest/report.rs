//! # Run Report
//!
//! $$
//! \bar\sigma^2_k = \frac{1}{\min(k+1, m)} \sum_{j} \sigma^2_j
//! $$
//!
//! Read-only aggregation of a backtest run: per-(window, method) records,
//! skip entries with reasons, derived risk series, moving averages, and
//! printable summary tables.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ndarray::Array1;
use prettytable::Table;
use prettytable::row;

use crate::denoise::Method;
use crate::risk::RiskEstimate;
use crate::risk::RiskMetric;

/// One successful (window, method) evaluation.
#[derive(Clone, Debug)]
pub struct WindowRecord {
  /// Zero-based rolling position.
  pub window: usize,
  /// Last in-sample date of the window.
  pub date: NaiveDate,
  pub method: Method,
  /// Minimum-variance weights, one per asset.
  pub weights: Array1<f64>,
  pub risk: RiskEstimate,
}

/// One excluded (window, method) pair and why it was excluded.
#[derive(Clone, Debug)]
pub struct SkippedWindow {
  pub window: usize,
  pub date: NaiveDate,
  pub method: Method,
  pub reason: String,
}

/// Aggregated output of one backtest run.
#[derive(Clone, Debug)]
pub struct RunReport {
  /// Asset identifiers, in panel column order.
  pub assets: Vec<String>,
  /// Methods compared, in reporting order.
  pub methods: Vec<Method>,
  pub metric: RiskMetric,
  /// Total rolling positions, including skipped ones.
  pub n_windows: usize,
  pub records: Vec<WindowRecord>,
  pub skipped: Vec<SkippedWindow>,
}

impl RunReport {
  /// Records for one method, in window order.
  pub fn records_for(&self, method: Method) -> impl Iterator<Item = &WindowRecord> {
    self.records.iter().filter(move |r| r.method == method)
  }

  /// (window, risk) series for one method, skipped windows absent.
  pub fn risk_series(&self, method: Method) -> Vec<(usize, RiskEstimate)> {
    self
      .records_for(method)
      .map(|r| (r.window, r.risk))
      .collect()
  }

  /// Window date lookup over every processed window.
  pub fn window_dates(&self) -> BTreeMap<usize, NaiveDate> {
    let mut dates = BTreeMap::new();
    for record in &self.records {
      dates.insert(record.window, record.date);
    }
    for skip in &self.skipped {
      dates.insert(skip.window, skip.date);
    }
    dates
  }

  /// Per-method counts and mean risks.
  pub fn summary_table(&self) -> Table {
    let mut table = Table::new();
    table.set_titles(row![
      "method",
      "windows",
      "skipped",
      "mean in-sample risk",
      "mean out-of-sample risk"
    ]);

    for &method in &self.methods {
      let records: Vec<&WindowRecord> = self.records_for(method).collect();
      let skipped = self.skipped.iter().filter(|s| s.method == method).count();

      let (mean_in, mean_out) = if records.is_empty() {
        (f64::NAN, f64::NAN)
      } else {
        let k = records.len() as f64;
        (
          records.iter().map(|r| r.risk.in_sample).sum::<f64>() / k,
          records.iter().map(|r| r.risk.out_of_sample).sum::<f64>() / k,
        )
      };

      table.add_row(row![
        method.name(),
        records.len(),
        skipped,
        format!("{mean_in:.3e}"),
        format!("{mean_out:.3e}")
      ]);
    }

    table
  }

  /// Skip detail: which windows/methods were excluded and why.
  pub fn skip_table(&self) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["window", "date", "method", "reason"]);

    for skip in &self.skipped {
      table.add_row(row![
        skip.window,
        skip.date,
        skip.method.name(),
        skip.reason
      ]);
    }

    table
  }
}

/// Trailing moving average with a ramp-up over the first `span - 1` points.
pub fn moving_average(values: &[f64], span: usize) -> Vec<f64> {
  let span = span.max(1);
  let mut out = Vec::with_capacity(values.len());
  let mut running = 0.0;

  for (i, &v) in values.iter().enumerate() {
    running += v;
    if i >= span {
      running -= values[i - span];
    }
    out.push(running / span.min(i + 1) as f64);
  }

  out
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::*;

  fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2008, 7, day).unwrap()
  }

  fn record(window: usize, method: Method, in_risk: f64, out_risk: f64) -> WindowRecord {
    WindowRecord {
      window,
      date: d(window as u32 + 1),
      method,
      weights: array![0.5, 0.5],
      risk: RiskEstimate {
        in_sample: in_risk,
        out_of_sample: out_risk,
      },
    }
  }

  fn sample_report() -> RunReport {
    RunReport {
      assets: vec!["A0".into(), "A1".into()],
      methods: vec![Method::Baseline, Method::Bahc],
      metric: RiskMetric::Variance,
      n_windows: 3,
      records: vec![
        record(0, Method::Baseline, 1.0, 2.0),
        record(0, Method::Bahc, 0.8, 1.5),
        record(2, Method::Baseline, 3.0, 4.0),
      ],
      skipped: vec![SkippedWindow {
        window: 1,
        date: d(2),
        method: Method::Baseline,
        reason: "singular covariance".into(),
      }],
    }
  }

  #[test]
  fn risk_series_filters_by_method() {
    let report = sample_report();
    let series = report.risk_series(Method::Baseline);

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].0, 0);
    assert_eq!(series[1].0, 2);
    assert_relative_eq!(series[1].1.out_of_sample, 4.0);
  }

  #[test]
  fn window_dates_cover_records_and_skips() {
    let report = sample_report();
    let dates = report.window_dates();

    assert_eq!(dates.len(), 3);
    assert_eq!(dates[&1], d(2));
  }

  #[test]
  fn moving_average_ramps_then_rolls() {
    let values = [1.0, 2.0, 3.0, 4.0, 5.0];
    let ma = moving_average(&values, 3);

    assert_relative_eq!(ma[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(ma[1], 1.5, epsilon = 1e-12);
    assert_relative_eq!(ma[2], 2.0, epsilon = 1e-12);
    assert_relative_eq!(ma[3], 3.0, epsilon = 1e-12);
    assert_relative_eq!(ma[4], 4.0, epsilon = 1e-12);
  }

  #[test]
  fn summary_table_has_one_row_per_method() {
    let report = sample_report();
    let table = report.summary_table();

    assert_eq!(table.len(), 2);
  }

  #[test]
  fn skip_table_lists_reasons() {
    let report = sample_report();
    let table = report.skip_table();

    assert_eq!(table.len(), 1);
    assert!(table.to_string().contains("singular covariance"));
  }
}
