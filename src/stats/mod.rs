//! Stats module - descriptive statistics, correlation funnel and regression

mod calculator;
pub mod correlation;
pub mod regression;

pub use calculator::{GroupStats, Histogram, StatsCalculator};
pub use correlation::{FeatureCorrelation, FunnelConfig, FunnelError};
pub use regression::{Coefficient, FittedModel, Metrics, RegressionError, Split};
