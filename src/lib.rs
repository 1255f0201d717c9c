//! # Covariance Denoising and Portfolio Risk
//!
//! `covariance_rs` compares covariance-matrix denoising techniques against
//! the raw sample estimator in a rolling minimum-variance backtest: weights
//! are fitted on an in-sample window and judged on the realized risk of the
//! following out-of-sample segment.
//!
//! ## Modules
//!
//! | Module        | Description                                                              |
//! |---------------|--------------------------------------------------------------------------|
//! | [`panel`]     | Immutable date-indexed return panel and its CSV loader.                  |
//! | [`estimator`] | Sample covariance/correlation and the rolling-window estimator.          |
//! | [`denoise`]   | Denoising transforms: baseline, BAHC, and correlation clipping.          |
//! | [`solver`]    | Closed-form global minimum-variance weights.                             |
//! | [`risk`]      | In-sample analytic and out-of-sample realized portfolio risk.            |
//! | [`backtest`]  | Rolling engine, run report, and persisted CSV artifacts.                 |
//! | [`linalg`]    | Symmetric eigen-solver capability shared by clipping and the solver.     |
//! | [`error`]     | Shared error taxonomy.                                                   |
//!
//! ## Determinism
//!
//! BAHC resampling runs on an explicit seeded PRNG. The engine derives one
//! stream per (window, method) pair from the configured base seed, so a
//! rerun with the same configuration reproduces every artifact bit for bit.
//!
//! ## Example Usage
//!
//! ```rust
//! use covariance_rs::backtest::{BacktestConfig, BacktestEngine};
//! use covariance_rs::panel::loader::load_csv_panel;
//!
//! let panel = load_csv_panel("returns.csv")?;
//! let engine = BacktestEngine::new(BacktestConfig::default())?;
//! let report = engine.run(&panel)?;
//! report.summary_table().printstd();
//! ```

pub mod backtest;
pub mod denoise;
pub mod error;
pub mod estimator;
pub mod linalg;
pub mod panel;
pub mod risk;
pub mod solver;

pub use backtest::BacktestConfig;
pub use backtest::BacktestEngine;
pub use backtest::RunReport;
pub use denoise::Bahc;
pub use denoise::BahcConfig;
pub use denoise::ClippingConfig;
pub use denoise::CorrelationClipping;
pub use denoise::Denoiser;
pub use denoise::Identity;
pub use denoise::Linkage;
pub use denoise::Method;
pub use error::EstimationError;
pub use panel::ReturnPanel;
pub use risk::RiskEvaluator;
pub use risk::RiskMetric;
pub use solver::MinVarianceSolver;
