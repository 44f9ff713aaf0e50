//! Output formatting and persistence for grouped series.
//!
//! Supports pretty-printing, JSON serialization, and CSV export of both the
//! tabular view and the charted points.

use anyhow::Result;
use tracing::{debug, info};

use crate::analyzers::types::GroupedSeries;
use crate::models::AvailabilityReading;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Logs a series using Rust's debug pretty-print format.
pub fn print_pretty(series: &GroupedSeries) {
    debug!("{:#?}", series);
}

/// Logs a series as pretty-printed JSON.
pub fn print_json(series: &GroupedSeries) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(series)?);
    Ok(())
}

/// Writes the raw records as CSV with a header row.
pub fn write_table<W: Write>(writer: W, records: &[AvailabilityReading]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);

    if records.is_empty() {
        writer.write_record(AvailabilityReading::columns())?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the raw records to a CSV file, replacing it if present.
pub fn write_table_csv(path: &Path, records: &[AvailabilityReading]) -> Result<()> {
    debug!(path = %path.display(), rows = records.len(), "Writing table CSV");
    write_table(File::create(path)?, records)
}

/// Writes `label,value,count` rows for the charted points.
pub fn write_points_csv(path: &Path, series: &GroupedSeries) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(File::create(path)?);

    if series.points.is_empty() {
        writer.write_record(["label", "value", "count"])?;
    }
    for point in &series.points {
        writer.serialize(point)?;
    }
    writer.flush()?;

    Ok(())
}
