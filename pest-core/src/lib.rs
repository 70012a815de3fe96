//! Core types for pest monitoring: observations, model forecasts, filter
//! criteria, and the feed readers that produce them.

pub mod criteria;
pub mod date_range;
pub mod error;
pub mod feed;
pub mod forecast;
pub mod observation;
pub mod pest;
mod serde_date;

pub use criteria::{ActionStatus, Choice, FilterCriteria, ThresholdStatus};
pub use date_range::DateRange;
pub use error::FeedError;
pub use feed::{FeedOrigin, ForecastFeed};
pub use forecast::{ForecastPoint, Horizon};
pub use observation::Observation;
pub use pest::{PestType, Season};
