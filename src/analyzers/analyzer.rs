use crate::analyzers::grouping::group_readings;
use crate::analyzers::types::{AggregationFunction, GroupedSeries, GroupingMode, SentinelPolicy};
use crate::models::AvailabilityReading;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Parameters of one analysis run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisParams {
    pub grouping: GroupingMode,
    pub aggregation: AggregationFunction,
    pub sentinel: SentinelPolicy,
}

/// Loads a readings CSV and groups it.
pub fn analyze_file(path: &Path, params: AnalysisParams) -> Result<GroupedSeries> {
    let readings = load_readings(path)?;
    let series = group_readings(&readings, params.grouping, params.aggregation, params.sentinel);

    info!(
        path = %path.display(),
        readings = readings.len(),
        points = series.points.len(),
        grouping = %params.grouping,
        aggregation = %params.aggregation,
        "Readings analyzed"
    );

    Ok(series)
}

/// Reads every row of a readings CSV with the columns of
/// [`AvailabilityReading::columns`].
pub fn load_readings(path: &Path) -> Result<Vec<AvailabilityReading>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: AvailabilityReading =
            result.with_context(|| format!("bad reading row in {}", path.display()))?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded readings CSV");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_load_readings_with_blank_counts() {
        let path = temp_path("parking_dashboard_test_load.csv");
        fs::write(
            &path,
            "time,remaining_parking_spaces,remaining_motorcycle_spaces,remaining_charging_stations\n\
             2024-03-04 10:00:00,5,,\n\
             2024-03-04T10:30:00,7,3,1\n",
        )
        .unwrap();

        let rows = load_readings(&path).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].remaining_motorcycle_spaces, -9);
        assert_eq!(rows[1].remaining_charging_stations, 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_analyze_file_groups_by_hour() {
        let path = temp_path("parking_dashboard_test_analyze.csv");
        fs::write(
            &path,
            "time,remaining_parking_spaces\n\
             2024-03-04 10:00:00,5\n\
             2024-03-04 10:30:00,7\n\
             2024-03-04 11:00:00,9\n",
        )
        .unwrap();

        let params = AnalysisParams {
            grouping: GroupingMode::Hour,
            ..Default::default()
        };
        let series = analyze_file(&path, params).unwrap();

        assert_eq!(series.labels(), vec!["10:00-11:00", "11:00-12:00"]);
        assert_eq!(series.values(), vec![6.0, 9.0]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = load_readings(&temp_path("parking_dashboard_does_not_exist.csv"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_bad_time() {
        let path = temp_path("parking_dashboard_test_bad_time.csv");
        fs::write(&path, "time,remaining_parking_spaces\nyesterday,5\n").unwrap();

        assert!(load_readings(&path).is_err());

        fs::remove_file(&path).unwrap();
    }
}
