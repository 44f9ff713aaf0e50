//! Traits for the data sources behind the dashboard.

use anyhow::Result;

use crate::models::{AvailabilityReading, FacilityRecord};

/// Provides a complete snapshot of the facility catalog.
#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// Returns every facility row. Called once at startup.
    async fn list_facilities(&self) -> Result<Vec<FacilityRecord>>;
}

/// Provides the availability history of one facility.
#[async_trait::async_trait]
pub trait AvailabilityApi: Send + Sync {
    /// Returns all readings for `official_id` in `county`, newest first.
    /// An unknown facility yields an empty list rather than an error.
    async fn fetch_availability(
        &self,
        official_id: &str,
        county: &str,
    ) -> Result<Vec<AvailabilityReading>>;
}
