//! # Persisted Artifacts
//!
//! CSV outputs of a run, one file per experiment artifact: rolling risk
//! series (in- and out-of-sample), rolling weight vectors per method, and
//! moving-average summaries. First column is the window index, second the
//! window date; remaining columns are method or asset identifiers.
//! Skipped (window, method) pairs appear as empty cells.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;

use crate::denoise::Method;

use super::report::RunReport;
use super::report::moving_average;

/// Which risk leg an artifact reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskLeg {
  InSample,
  OutOfSample,
}

impl RiskLeg {
  fn pick(&self, record: &super::report::WindowRecord) -> f64 {
    match self {
      Self::InSample => record.risk.in_sample,
      Self::OutOfSample => record.risk.out_of_sample,
    }
  }
}

/// Write one risk series per method, indexed by window.
pub fn write_risk_series<P: AsRef<Path>>(
  path: P,
  report: &RunReport,
  leg: RiskLeg,
) -> Result<()> {
  let path = path.as_ref();
  let mut writer = csv::Writer::from_path(path)
    .with_context(|| format!("failed to create artifact {}", path.display()))?;

  let mut header = vec!["window".to_string(), "date".to_string()];
  header.extend(report.methods.iter().map(|m| m.name().to_string()));
  writer.write_record(&header)?;

  let values: HashMap<(usize, Method), f64> = report
    .records
    .iter()
    .map(|r| ((r.window, r.method), leg.pick(r)))
    .collect();

  for (window, date) in report.window_dates() {
    let mut row = vec![window.to_string(), date.to_string()];
    for &method in &report.methods {
      row.push(match values.get(&(window, method)) {
        Some(v) => format!("{v:e}"),
        None => String::new(),
      });
    }
    writer.write_record(&row)?;
  }

  writer
    .flush()
    .with_context(|| format!("failed to flush artifact {}", path.display()))?;
  Ok(())
}

/// Write one method's rolling weight vectors, one column per asset.
pub fn write_weights<P: AsRef<Path>>(
  path: P,
  report: &RunReport,
  method: Method,
) -> Result<()> {
  let path = path.as_ref();
  let mut writer = csv::Writer::from_path(path)
    .with_context(|| format!("failed to create artifact {}", path.display()))?;

  let mut header = vec!["window".to_string(), "date".to_string()];
  header.extend(report.assets.iter().cloned());
  writer.write_record(&header)?;

  for record in report.records_for(method) {
    let mut row = vec![record.window.to_string(), record.date.to_string()];
    row.extend(record.weights.iter().map(|w| format!("{w:e}")));
    writer.write_record(&row)?;
  }

  writer
    .flush()
    .with_context(|| format!("failed to flush artifact {}", path.display()))?;
  Ok(())
}

/// Write trailing moving averages of one risk leg, per method.
pub fn write_moving_average<P: AsRef<Path>>(
  path: P,
  report: &RunReport,
  leg: RiskLeg,
  span: usize,
) -> Result<()> {
  let path = path.as_ref();
  let mut writer = csv::Writer::from_path(path)
    .with_context(|| format!("failed to create artifact {}", path.display()))?;

  let mut header = vec!["window".to_string(), "date".to_string()];
  header.extend(report.methods.iter().map(|m| m.name().to_string()));
  writer.write_record(&header)?;

  // The average runs over each method's own surviving series.
  let mut smoothed: HashMap<(usize, Method), f64> = HashMap::new();
  for &method in &report.methods {
    let series: Vec<(usize, f64)> = report
      .records_for(method)
      .map(|r| (r.window, leg.pick(r)))
      .collect();
    let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
    for ((window, _), ma) in series.iter().zip(moving_average(&values, span)) {
      smoothed.insert((*window, method), ma);
    }
  }

  for (window, date) in report.window_dates() {
    let mut row = vec![window.to_string(), date.to_string()];
    for &method in &report.methods {
      row.push(match smoothed.get(&(window, method)) {
        Some(v) => format!("{v:e}"),
        None => String::new(),
      });
    }
    writer.write_record(&row)?;
  }

  writer
    .flush()
    .with_context(|| format!("failed to flush artifact {}", path.display()))?;
  Ok(())
}
