//! # Rolling Backtest
//!
//! $$
//! \text{panel} \to \{(\text{window}, \text{method}) \mapsto (w, \sigma^2_{\text{in}}, \sigma^2_{\text{out}})\}
//! $$
//!
//! Orchestration of the full comparison: rolling estimation, denoising per
//! method, weight solving, risk evaluation, and aggregation into a
//! run-level report with per-window failure isolation.

pub mod artifacts;
pub mod engine;
pub mod report;

pub use artifacts::RiskLeg;
pub use artifacts::write_moving_average;
pub use artifacts::write_risk_series;
pub use artifacts::write_weights;
pub use engine::BacktestConfig;
pub use engine::BacktestEngine;
pub use report::RunReport;
pub use report::SkippedWindow;
pub use report::WindowRecord;
pub use report::moving_average;
