//! Time-series grouping of availability readings.
//!
//! Readings are bucketed by hour, weekday, weekday and hour, or weekday type
//! and hour, reduced with mean/max/min, and labeled for charting.

pub mod analyzer;
pub mod grouping;
pub mod labels;
pub mod types;
pub mod utility;

pub use grouping::group_readings;
pub use types::{
    AggregationFunction, ChartKind, GroupedSeries, GroupingMode, SentinelPolicy, SeriesPoint,
    TransformError,
};
