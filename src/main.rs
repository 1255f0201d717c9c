use std::env;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Normal;

use covariance_rs::backtest::BacktestConfig;
use covariance_rs::backtest::BacktestEngine;
use covariance_rs::backtest::RiskLeg;
use covariance_rs::backtest::write_moving_average;
use covariance_rs::backtest::write_risk_series;
use covariance_rs::backtest::write_weights;
use covariance_rs::panel::ReturnPanel;
use covariance_rs::panel::loader::load_csv_panel;

const SYNTHETIC_PERIODS: usize = 500;
const SYNTHETIC_ASSETS: usize = 12;
const MA_SPAN: usize = 5;

fn main() -> Result<()> {
  let mut args = env::args().skip(1);
  let panel = match args.next() {
    Some(path) => {
      println!("Loading panel from {path}");
      load_csv_panel(&path)?
    }
    None => {
      println!(
        "No panel given, simulating {SYNTHETIC_ASSETS} assets over {SYNTHETIC_PERIODS} periods"
      );
      synthetic_panel(SYNTHETIC_PERIODS, SYNTHETIC_ASSETS, 20080701)?
    }
  };
  let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "artifacts".to_string()));
  std::fs::create_dir_all(&out_dir)?;

  let config = BacktestConfig {
    seed: 42,
    ..Default::default()
  };
  let engine = BacktestEngine::new(config)?;

  let bar = ProgressBar::new(0).with_style(ProgressStyle::with_template(
    "{bar:40} {pos}/{len} windows",
  )?);
  let report = engine.run_with_progress(&panel, |_, total| {
    bar.set_length(total as u64);
    bar.inc(1);
  })?;
  bar.finish();

  write_risk_series(out_dir.join("risk_in_sample.csv"), &report, RiskLeg::InSample)?;
  write_risk_series(
    out_dir.join("risk_out_of_sample.csv"),
    &report,
    RiskLeg::OutOfSample,
  )?;
  for &method in &report.methods {
    write_weights(
      out_dir.join(format!("weights_{}.csv", method.name())),
      &report,
      method,
    )?;
  }
  write_moving_average(
    out_dir.join("risk_out_of_sample_ma.csv"),
    &report,
    RiskLeg::OutOfSample,
    MA_SPAN,
  )?;

  println!("\nRun summary ({} windows):", report.n_windows);
  report.summary_table().printstd();
  if !report.skipped.is_empty() {
    println!("Skipped windows:");
    report.skip_table().printstd();
  }
  println!("Artifacts written to {}", out_dir.display());

  Ok(())
}

/// One-factor market panel: a common driver plus idiosyncratic noise.
fn synthetic_panel(periods: usize, assets: usize, seed: u64) -> Result<ReturnPanel> {
  let mut rng = StdRng::seed_from_u64(seed);

  let market = Array2::<f64>::random_using(
    (periods, 1),
    Normal::new(0.0, 0.009).unwrap(),
    &mut rng,
  );
  let idio = Array2::<f64>::random_using(
    (periods, assets),
    Normal::new(0.0, 0.012).unwrap(),
    &mut rng,
  );

  let returns = Array2::from_shape_fn((periods, assets), |(t, a)| {
    let beta = 0.6 + 0.08 * a as f64;
    beta * market[[t, 0]] + idio[[t, a]]
  });

  let start = NaiveDate::from_ymd_opt(2008, 7, 1).unwrap();
  let dates = (0..periods)
    .map(|i| start + chrono::Duration::days(i as i64))
    .collect();
  let names = (0..assets).map(|i| format!("A{i:02}")).collect();

  Ok(ReturnPanel::new(dates, names, returns)?)
}
