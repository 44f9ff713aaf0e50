//! Offline data source reading CSV exports of the two warehouse tables.
//!
//! Both files are loaded fully when the store is opened. The readings file
//! carries the `official_id` and `county` key columns next to the reading
//! columns, as in the warehouse table.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::models::{AvailabilityReading, FacilityRecord, UNKNOWN, count, reading_time};
use crate::services::catalog_api::{AvailabilityApi, CatalogApi};

fn unknown() -> i64 {
    UNKNOWN
}

#[derive(Debug, Deserialize)]
struct StoredReading {
    official_id: String,
    county: String,
    #[serde(with = "reading_time")]
    time: NaiveDateTime,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    remaining_parking_spaces: i64,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    remaining_motorcycle_spaces: i64,
    #[serde(default = "unknown", deserialize_with = "count::deserialize")]
    remaining_charging_stations: i64,
}

impl From<&StoredReading> for AvailabilityReading {
    fn from(row: &StoredReading) -> Self {
        AvailabilityReading {
            time: row.time,
            remaining_parking_spaces: row.remaining_parking_spaces,
            remaining_motorcycle_spaces: row.remaining_motorcycle_spaces,
            remaining_charging_stations: row.remaining_charging_stations,
        }
    }
}

pub struct CsvStore {
    facilities: Vec<FacilityRecord>,
    readings: Vec<StoredReading>,
}

impl CsvStore {
    /// Loads the catalog and readings files.
    pub fn open(catalog_path: &Path, readings_path: &Path) -> Result<Self> {
        let facilities: Vec<FacilityRecord> = read_rows(catalog_path)?;
        let readings: Vec<StoredReading> = read_rows(readings_path)?;

        info!(
            facilities = facilities.len(),
            readings = readings.len(),
            "CSV store opened"
        );
        Ok(Self {
            facilities,
            readings,
        })
    }
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        rows.push(result.with_context(|| format!("bad row in {}", path.display()))?);
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded CSV");
    Ok(rows)
}

#[async_trait]
impl CatalogApi for CsvStore {
    async fn list_facilities(&self) -> Result<Vec<FacilityRecord>> {
        Ok(self.facilities.clone())
    }
}

#[async_trait]
impl AvailabilityApi for CsvStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_availability(
        &self,
        official_id: &str,
        county: &str,
    ) -> Result<Vec<AvailabilityReading>> {
        let mut readings: Vec<AvailabilityReading> = self
            .readings
            .iter()
            .filter(|r| r.official_id == official_id && r.county == county)
            .map(AvailabilityReading::from)
            .collect();

        // newest first, like the warehouse query
        readings.sort_by(|a, b| b.time.cmp(&a.time));
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_time;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[tokio::test]
    async fn test_fetch_filters_and_sorts_descending() {
        let (catalog, readings) = write_fixtures("sorts");
        let store = CsvStore::open(&catalog, &readings).unwrap();

        let rows = store.fetch_availability("TP-001", "Taipei").await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time, parse_time("2024-03-04 11:00:00").unwrap());
        assert_eq!(rows[0].remaining_parking_spaces, UNKNOWN);
        assert_eq!(rows[1].remaining_parking_spaces, 5);

        cleanup(&catalog, &readings);
    }

    #[tokio::test]
    async fn test_fetch_unknown_facility_is_empty() {
        let (catalog, readings) = write_fixtures("unknown");
        let store = CsvStore::open(&catalog, &readings).unwrap();

        // right id, wrong county
        let rows = store.fetch_availability("TP-001", "Taichung").await.unwrap();
        assert!(rows.is_empty());

        cleanup(&catalog, &readings);
    }

    #[tokio::test]
    async fn test_list_facilities() {
        let (catalog, readings) = write_fixtures("list");
        let store = CsvStore::open(&catalog, &readings).unwrap();

        let facilities = store.list_facilities().await.unwrap();

        assert_eq!(facilities.len(), 2);
        assert_eq!(facilities[1].district, "");
        assert_eq!(facilities[1].total_parking_spaces, UNKNOWN);

        cleanup(&catalog, &readings);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let missing = temp_path("parking_dashboard_missing_catalog.csv");
        assert!(CsvStore::open(&missing, &missing).is_err());
    }

    // Helper functions for tests
    fn write_fixtures(tag: &str) -> (PathBuf, PathBuf) {
        let catalog = temp_path(&format!("parking_dashboard_{tag}_catalog.csv"));
        let readings = temp_path(&format!("parking_dashboard_{tag}_readings.csv"));

        fs::write(
            &catalog,
            "official_id,name,description,county,district,address,total_parking_spaces,total_motorcycle_spaces,total_charging_stations\n\
             TP-001,Xinyi Plaza,,Taipei,Xinyi,No. 1,120,40,4\n\
             TC-001,Station Front,Open air,Taichung,,No. 2,,,\n",
        )
        .unwrap();
        fs::write(
            &readings,
            "official_id,county,time,remaining_parking_spaces,remaining_motorcycle_spaces,remaining_charging_stations\n\
             TP-001,Taipei,2024-03-04 10:00:00,5,1,0\n\
             TC-001,Taichung,2024-03-04 10:00:00,9,,\n\
             TP-001,Taipei,2024-03-04 11:00:00,,,\n",
        )
        .unwrap();

        (catalog, readings)
    }

    fn cleanup(catalog: &Path, readings: &Path) {
        let _ = fs::remove_file(catalog);
        let _ = fs::remove_file(readings);
    }
}
