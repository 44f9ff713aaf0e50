//! Concrete data sources: the BigQuery warehouse and local CSV snapshots.

pub mod bigquery;
pub mod csv_store;
