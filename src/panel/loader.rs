//! # Panel Loader
//!
//! Reads an already-cleaned tabular return panel from CSV: first column is
//! the date, remaining columns are one asset each. Empty cells become the
//! `NaN` missing marker. Raw quote-file ingestion stays outside this crate.

use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use chrono::NaiveDate;
use ndarray::Array2;

use crate::panel::ReturnPanel;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Load a return panel from a CSV file with a header row.
pub fn load_csv_panel<P: AsRef<Path>>(path: P) -> Result<ReturnPanel> {
  let path = path.as_ref();
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .trim(csv::Trim::All)
    .from_path(path)
    .with_context(|| format!("failed to open panel file {}", path.display()))?;

  let headers = reader
    .headers()
    .with_context(|| format!("failed to read header of {}", path.display()))?
    .clone();
  if headers.len() < 2 {
    bail!("panel file needs a date column and at least one asset column");
  }

  let assets: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

  let mut dates = Vec::new();
  let mut values = Vec::new();

  for (row_idx, record) in reader.records().enumerate() {
    let record = record.with_context(|| format!("failed to read row {}", row_idx + 2))?;
    if record.len() != headers.len() {
      bail!(
        "row {} has {} fields, expected {}",
        row_idx + 2,
        record.len(),
        headers.len()
      );
    }

    let date = NaiveDate::parse_from_str(&record[0], DATE_FORMAT)
      .with_context(|| format!("row {}: invalid date {:?}", row_idx + 2, &record[0]))?;
    dates.push(date);

    for field in record.iter().skip(1) {
      if field.is_empty() {
        values.push(f64::NAN);
      } else {
        let value: f64 = field
          .parse()
          .with_context(|| format!("row {}: invalid return {field:?}", row_idx + 2))?;
        values.push(value);
      }
    }
  }

  let returns = Array2::from_shape_vec((dates.len(), assets.len()), values)
    .context("panel rows do not form a rectangular matrix")?;

  Ok(ReturnPanel::new(dates, assets, returns)?)
}
