//! Request and response types of the dashboard API.

use serde::{Deserialize, Serialize};

use crate::analyzers::types::{GroupingMode, SeriesPoint};
use crate::chart::ChartSpec;
use crate::models::AvailabilityReading;

fn default_session() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiHealth {
    pub healthy: bool,
    pub version: String,
    pub facilities: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiCounties {
    pub counties: Vec<String>,
    /// First known county, the initial selection.
    pub default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DistrictParams {
    pub county: String,
    pub official_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacilityListParams {
    pub county: String,
    pub district: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacilityParams {
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub official_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionParams {
    #[serde(default = "default_session")]
    pub session: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitBody {
    pub county: String,
    pub official_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiSubmitted {
    pub seq: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiStatus {
    pub seq: u64,
    pub latest: u64,
    pub running: bool,
    pub error: Option<String>,
    pub official_id: String,
    pub county: String,
    pub readings: usize,
}

/// Raw query parameters of `/api/series`; validated in the handler.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesParams {
    #[serde(default = "default_session")]
    pub session: String,
    pub grouping: Option<String>,
    pub aggregation: Option<String>,
    pub chart: Option<String>,
    pub sentinel: Option<String>,
}

/// Column descriptor for the table widget.
#[derive(Debug, Clone, Serialize)]
pub struct ApiColumn {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiSeries {
    pub seq: u64,
    pub running: bool,
    pub error: Option<String>,
    pub grouping: GroupingMode,
    pub columns: Vec<ApiColumn>,
    pub records: Vec<AvailabilityReading>,
    pub points: Vec<SeriesPoint>,
    pub chart: ChartSpec,
}
