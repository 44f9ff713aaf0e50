use crate::analyzers::labels::{hour_label, weekday_label, weekday_type, weekday_type_label};
use crate::analyzers::types::{
    AggregationFunction, GroupedSeries, GroupingMode, SentinelPolicy, SeriesPoint,
};
use crate::analyzers::utility::{max, mean, min};
use crate::models::{AvailabilityReading, TIME_FORMAT};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::collections::BTreeMap;

/// Sort key of a group. The meaning of each half depends on the mode, but
/// every mode orders by the first component and then the second.
type GroupKey = (u32, u32);

fn group_key(mode: GroupingMode, time: &NaiveDateTime) -> GroupKey {
    let hour = time.hour();
    let weekday = time.weekday().num_days_from_monday();

    match mode {
        GroupingMode::None | GroupingMode::Hour => (0, hour),
        GroupingMode::Weekday => (weekday, 0),
        GroupingMode::WeekdayHour => (weekday, hour),
        GroupingMode::WeekdayTypeHour => (weekday_type(weekday), hour),
    }
}

fn group_label(mode: GroupingMode, (first, second): GroupKey) -> String {
    match mode {
        GroupingMode::None | GroupingMode::Hour => hour_label(second),
        GroupingMode::Weekday => weekday_label(first).to_string(),
        GroupingMode::WeekdayHour => format!("{} {}", weekday_label(first), hour_label(second)),
        GroupingMode::WeekdayTypeHour => {
            format!("{} {}", weekday_type_label(first), hour_label(second))
        }
    }
}

fn reduce(aggregation: AggregationFunction, values: &[i64]) -> f64 {
    match aggregation {
        AggregationFunction::Mean => mean(values),
        AggregationFunction::Max => max(values).unwrap_or_default() as f64,
        AggregationFunction::Min => min(values).unwrap_or_default() as f64,
    }
}

/// Groups readings by a time component and reduces the remaining car spaces
/// of each group into one labeled point.
///
/// With [`GroupingMode::None`] every reading becomes its own point in input
/// order. Other modes emit only the groups that received at least one
/// reading, ascending by group key. The input is left untouched and is
/// echoed into [`GroupedSeries::records`] for the tabular view.
pub fn group_readings(
    readings: &[AvailabilityReading],
    grouping: GroupingMode,
    aggregation: AggregationFunction,
    sentinel: SentinelPolicy,
) -> GroupedSeries {
    let kept = readings
        .iter()
        .filter(|r| sentinel == SentinelPolicy::Include || !r.is_unknown());

    let points = if grouping == GroupingMode::None {
        kept.map(|r| SeriesPoint {
            label: r.time.format(TIME_FORMAT).to_string(),
            value: r.remaining_parking_spaces as f64,
            count: 1,
        })
        .collect()
    } else {
        let mut groups: BTreeMap<GroupKey, Vec<i64>> = BTreeMap::new();

        for reading in kept {
            groups
                .entry(group_key(grouping, &reading.time))
                .or_default()
                .push(reading.remaining_parking_spaces);
        }

        groups
            .into_iter()
            .map(|(key, values)| SeriesPoint {
                label: group_label(grouping, key),
                value: reduce(aggregation, &values),
                count: values.len(),
            })
            .collect()
    };

    GroupedSeries {
        grouping,
        aggregation,
        points,
        records: readings.to_vec(),
    }
}
