//! # Covariance Estimation
//!
//! $$
//! \hat\Sigma = \frac{1}{T-1} \sum_{t=1}^{T} (r_t-\bar r)(r_t-\bar r)^\top
//! $$
//!
//! Sample covariance/correlation construction and the rolling-window
//! estimator that feeds the denoisers.

pub mod rolling;
pub mod sample;

pub use rolling::EstimatorMode;
pub use rolling::InSampleWindow;
pub use rolling::RollingConfig;
pub use rolling::RollingCovariance;
pub use sample::correlation_from_covariance;
pub use sample::covariance_from_correlation;
pub use sample::sample_covariance;
