//! Analytics over pest observations and model forecasts: filtering, KPI
//! aggregation, week-over-week trends, forecast stitching and seasonal
//! benchmarks. Every function here is pure; the [`dashboard`] reducer ties
//! them together into one snapshot per state change.

pub mod benchmark;
pub mod breakdown;
pub mod dashboard;
pub mod filter;
pub mod insight;
pub mod kpi;
pub mod risk;
pub mod stitch;
pub mod trend;

pub use benchmark::{align_benchmarks, BenchmarkPoint};
pub use dashboard::{reduce, Action, DashboardSnapshot, DashboardState, DataStatus};
pub use filter::{filter_observations, FilterOptions};
pub use insight::{MetricContext, Sentiment};
pub use kpi::{calculate_kpis, KpiMetrics};
pub use stitch::{stitch_forecast, ChartSeriesPoint};
pub use trend::{compute_trends, relative_change, KpiTrends};
