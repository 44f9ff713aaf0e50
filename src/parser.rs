//! Decoder for BigQuery `jobs.query` / `jobs.getQueryResults` responses.
//!
//! BigQuery returns rows as positional cells (`{"f": [{"v": ...}]}`) with
//! every scalar encoded as a string, so each row is read through the
//! response schema by column name.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;

use crate::models::{UNKNOWN, parse_time};

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub v: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub f: Vec<Cell>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub schema: Option<TableSchema>,
    pub job_reference: Option<JobReference>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    pub page_token: Option<String>,
    pub job_complete: Option<bool>,
}

impl QueryResponse {
    /// Responses that omit `jobComplete` carry their rows inline.
    pub fn is_complete(&self) -> bool {
        self.job_complete.unwrap_or(true)
    }

    /// Binds each row to the schema.
    pub fn rows(&self) -> Result<Vec<Row<'_>>> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| anyhow!("query response has rows but no schema"))?;

        Ok(self
            .rows
            .iter()
            .map(|r| Row {
                fields: &schema.fields,
                cells: &r.f,
            })
            .collect())
    }
}

/// One result row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    fields: &'a [FieldSchema],
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    fn column(&self, name: &str) -> Option<(&'a FieldSchema, &'a serde_json::Value)> {
        let idx = self.fields.iter().position(|f| f.name == name)?;
        Some((&self.fields[idx], &self.cells.get(idx)?.v))
    }

    /// Raw cell text, `None` for a missing column or NULL.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.column(name).and_then(|(_, v)| v.as_str())
    }

    /// Cell text with NULL read as an empty string.
    pub fn string(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// An INTEGER cell, with NULL read as [`UNKNOWN`].
    pub fn count(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            None => Ok(UNKNOWN),
            Some(raw) => raw
                .parse()
                .with_context(|| format!("column '{name}' is not an integer: '{raw}'")),
        }
    }

    /// A TIMESTAMP or DATETIME cell. TIMESTAMPs are read in UTC.
    pub fn time(&self, name: &str) -> Result<NaiveDateTime> {
        let (field, value) = self
            .column(name)
            .ok_or_else(|| anyhow!("column '{name}' missing from result"))?;
        let raw = value
            .as_str()
            .ok_or_else(|| anyhow!("column '{name}' is NULL"))?;

        let parsed = match field.field_type.as_str() {
            "TIMESTAMP" => parse_timestamp(raw),
            _ => parse_time(raw),
        };
        parsed.ok_or_else(|| anyhow!("column '{name}' has invalid time '{raw}'"))
    }
}

/// TIMESTAMP cells are either integer microseconds (with
/// `formatOptions.useInt64Timestamp`) or float seconds such as `1.7095464E9`.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(micros) = raw.parse::<i64>() {
        return DateTime::from_timestamp_micros(micros).map(|t| t.naive_utc());
    }
    let secs: f64 = raw.parse().ok()?;
    let micros = (secs * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_micros(micros).map(|t| t.naive_utc())
}

/// Decodes a JSON query response body.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid BigQuery query response.
pub fn parse_query_response(bytes: &[u8]) -> Result<QueryResponse> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_result() {
        let json = br#"{"kind": "bigquery#queryResponse", "jobComplete": true, "totalRows": "0"}"#;
        let response = parse_query_response(json).unwrap();

        assert!(response.is_complete());
        assert!(response.rows().unwrap().is_empty());
        assert!(response.page_token.is_none());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        assert!(parse_query_response(&[0xFF, 0xFE, 0x00]).is_err());
    }

    #[test]
    fn test_incomplete_job_keeps_reference() {
        let json = br#"{
            "jobComplete": false,
            "jobReference": {"projectId": "demo", "jobId": "job_1", "location": "asia-east1"}
        }"#;
        let response = parse_query_response(json).unwrap();

        assert!(!response.is_complete());
        let job = response.job_reference.unwrap();
        assert_eq!(job.job_id, "job_1");
        assert_eq!(job.location.as_deref(), Some("asia-east1"));
    }

    #[test]
    fn test_rows_read_by_column_name() {
        let response = parse_query_response(sample_response()).unwrap();
        let rows = response.rows().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].string("official_id"), "TP-001");
        assert_eq!(rows[0].count("remaining_parking_spaces").unwrap(), 12);
        assert_eq!(rows[1].count("remaining_parking_spaces").unwrap(), UNKNOWN);
        assert_eq!(rows[1].string("official_id"), "");
        assert_eq!(rows[0].get("no_such_column"), None);
    }

    #[test]
    fn test_timestamp_cells() {
        let response = parse_query_response(sample_response()).unwrap();
        let rows = response.rows().unwrap();
        let expected = parse_time("2024-03-04 10:00:00").unwrap();

        // float seconds and integer microseconds
        assert_eq!(rows[0].time("time").unwrap(), expected);
        assert_eq!(rows[1].time("time").unwrap(), expected);
    }

    #[test]
    fn test_datetime_cells() {
        let json = br#"{
            "schema": {"fields": [{"name": "time", "type": "DATETIME"}]},
            "rows": [{"f": [{"v": "2024-03-04T10:00:00"}]}, {"f": [{"v": null}]}]
        }"#;
        let response = parse_query_response(json).unwrap();
        let rows = response.rows().unwrap();

        assert_eq!(rows[0].time("time").unwrap(), parse_time("2024-03-04 10:00:00").unwrap());
        assert!(rows[1].time("time").is_err());
    }

    #[test]
    fn test_bad_integer_is_error() {
        let json = br#"{
            "schema": {"fields": [{"name": "n", "type": "INTEGER"}]},
            "rows": [{"f": [{"v": "twelve"}]}]
        }"#;
        let response = parse_query_response(json).unwrap();

        assert!(response.rows().unwrap()[0].count("n").is_err());
    }

    #[test]
    fn test_rows_without_schema_is_error() {
        let json = br#"{"rows": [{"f": [{"v": "1"}]}]}"#;
        let response = parse_query_response(json).unwrap();

        assert!(response.rows().is_err());
    }

    // Helper functions for tests
    fn sample_response() -> &'static [u8] {
        br#"{
            "jobComplete": true,
            "schema": {"fields": [
                {"name": "official_id", "type": "STRING"},
                {"name": "time", "type": "TIMESTAMP"},
                {"name": "remaining_parking_spaces", "type": "INTEGER"}
            ]},
            "rows": [
                {"f": [{"v": "TP-001"}, {"v": "1.7095464E9"}, {"v": "12"}]},
                {"f": [{"v": null}, {"v": "1709546400000000"}, {"v": null}]}
            ]
        }"#
    }
}
