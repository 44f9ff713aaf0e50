//! Parameter enums and output types of the grouping pipeline.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::models::AvailabilityReading;

/// Rejected transform parameters. The accepted values form closed sets, so
/// anything else is a wiring mistake and is reported instead of defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("unknown grouping mode '{0}'")]
    UnknownGrouping(String),
    #[error("unknown aggregation function '{0}'")]
    UnknownAggregation(String),
    #[error("unknown chart kind '{0}'")]
    UnknownChartKind(String),
    #[error("unknown sentinel policy '{0}'")]
    UnknownSentinelPolicy(String),
}

/// How readings are bucketed by their timestamp before aggregation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GroupingMode {
    #[default]
    None,
    Hour,
    Weekday,
    WeekdayHour,
    WeekdayTypeHour,
}

impl GroupingMode {
    pub fn parse(s: &str) -> Result<Self, TransformError> {
        s.parse()
            .map_err(|_| TransformError::UnknownGrouping(s.to_string()))
    }

    /// Upper bound on the number of groups this mode can produce.
    pub fn max_groups(&self) -> Option<usize> {
        match self {
            GroupingMode::None => None,
            GroupingMode::Hour => Some(24),
            GroupingMode::Weekday => Some(7),
            GroupingMode::WeekdayHour => Some(7 * 24),
            GroupingMode::WeekdayTypeHour => Some(2 * 24),
        }
    }
}

/// Reduction applied to the remaining car spaces of each group.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AggregationFunction {
    #[default]
    Mean,
    Max,
    Min,
}

impl AggregationFunction {
    pub fn parse(s: &str) -> Result<Self, TransformError> {
        s.parse()
            .map_err(|_| TransformError::UnknownAggregation(s.to_string()))
    }
}

/// Chart type used by the projection in [`crate::chart`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Box,
    Scatter,
    Heatmap,
}

impl ChartKind {
    pub fn parse(s: &str) -> Result<Self, TransformError> {
        s.parse()
            .map_err(|_| TransformError::UnknownChartKind(s.to_string()))
    }
}

/// Whether readings carrying the unknown placeholder take part in grouping.
///
/// `Include` keeps the historical behaviour where -9 is averaged like any
/// other count.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SentinelPolicy {
    #[default]
    Include,
    Exclude,
}

impl SentinelPolicy {
    pub fn parse(s: &str) -> Result<Self, TransformError> {
        s.parse()
            .map_err(|_| TransformError::UnknownSentinelPolicy(s.to_string()))
    }
}

/// One labeled value ready for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
    /// Number of readings that formed this point.
    pub count: usize,
}

/// Result of [`crate::analyzers::grouping::group_readings`]: the charted
/// points plus the raw records for the tabular view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSeries {
    pub grouping: GroupingMode,
    pub aggregation: AggregationFunction,
    pub points: Vec<SeriesPoint>,
    pub records: Vec<AvailabilityReading>,
}

impl GroupedSeries {
    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_known_values() {
        assert_eq!(GroupingMode::parse("weekday_type_hour"), Ok(GroupingMode::WeekdayTypeHour));
        assert_eq!(GroupingMode::parse("Hour"), Ok(GroupingMode::Hour));
        assert_eq!(AggregationFunction::parse("max"), Ok(AggregationFunction::Max));
        assert_eq!(ChartKind::parse("heatmap"), Ok(ChartKind::Heatmap));
        assert_eq!(SentinelPolicy::parse("exclude"), Ok(SentinelPolicy::Exclude));
    }

    #[test]
    fn test_parse_rejects_unknown_values() {
        assert_eq!(
            GroupingMode::parse("month"),
            Err(TransformError::UnknownGrouping("month".to_string()))
        );
        assert!(AggregationFunction::parse("median").is_err());
        assert!(ChartKind::parse("pie").is_err());
        assert!(SentinelPolicy::parse("").is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mode in GroupingMode::iter() {
            assert_eq!(GroupingMode::parse(&mode.to_string()), Ok(mode));
        }
        for kind in ChartKind::iter() {
            assert_eq!(ChartKind::parse(kind.as_ref()), Ok(kind));
        }
    }

    #[test]
    fn test_defaults_match_initial_selection() {
        assert_eq!(GroupingMode::default(), GroupingMode::None);
        assert_eq!(AggregationFunction::default(), AggregationFunction::Mean);
        assert_eq!(ChartKind::default(), ChartKind::Line);
        assert_eq!(SentinelPolicy::default(), SentinelPolicy::Include);
    }
}
