use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::query::{QueryRequest, availability_query, facilities_query};
use crate::fetch::{HttpClient, fetch_bytes, send_json};
use crate::models::{AvailabilityReading, FacilityRecord};
use crate::parser::{QueryResponse, Row, parse_query_response};
use crate::services::catalog_api::{AvailabilityApi, CatalogApi};

const BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Warehouse source backed by the BigQuery REST API.
///
/// Authentication is left to the wrapped [`HttpClient`], normally an
/// [`crate::fetch::auth::ApiKey`] carrying an OAuth bearer token.
pub struct BigQueryClient<C> {
    http: C,
    base_url: String,
    project: String,
    dataset: String,
}

impl<C: HttpClient> BigQueryClient<C> {
    pub fn new(http: C, project: &str, dataset: &str) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
            project: project.to_string(),
            dataset: dataset.to_string(),
        }
    }

    /// Points the client at another endpoint, e.g. a local emulator.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Runs a query to completion and maps every row, following job polling
    /// and result pages.
    async fn run_query<T>(
        &self,
        request: &QueryRequest,
        map: impl Fn(&Row<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let url = format!("{}/projects/{}/queries", self.base_url, self.project);
        let bytes = send_json(&self.http, &url, request)
            .await
            .context("BigQuery jobs.query failed")?;
        let mut response = parse_query_response(&bytes)?;

        let mut out = Vec::new();
        let mut pages = 0;

        loop {
            if response.is_complete() {
                pages += 1;
                for row in response.rows()? {
                    out.push(map(&row)?);
                }
                if response.page_token.is_none() {
                    break;
                }
            }
            response = self.next_results(&response).await?;
        }

        debug!(rows = out.len(), pages, "BigQuery query finished");
        Ok(out)
    }

    /// Polls an unfinished job or fetches the next page of a finished one.
    async fn next_results(&self, previous: &QueryResponse) -> Result<QueryResponse> {
        let job = previous
            .job_reference
            .as_ref()
            .context("BigQuery response has no job reference to continue from")?;

        let mut url = Url::parse(&format!(
            "{}/projects/{}/queries/{}",
            self.base_url, job.project_id, job.job_id
        ))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeoutMs", "10000");
            query.append_pair("formatOptions.useInt64Timestamp", "true");
            if let Some(location) = &job.location {
                query.append_pair("location", location);
            }
            if let Some(token) = &previous.page_token {
                query.append_pair("pageToken", token);
            }
        }

        let bytes = fetch_bytes(&self.http, url.as_str())
            .await
            .context("BigQuery jobs.getQueryResults failed")?;
        parse_query_response(&bytes)
    }
}

fn facility_from_row(row: &Row<'_>) -> Result<FacilityRecord> {
    Ok(FacilityRecord {
        official_id: row.string("official_id"),
        name: row.string("name"),
        description: row.string("description"),
        county: row.string("county"),
        district: row.string("district"),
        address: row.string("address"),
        total_parking_spaces: row.count("total_parking_spaces")?,
        total_motorcycle_spaces: row.count("total_motorcycle_spaces")?,
        total_charging_stations: row.count("total_charging_stations")?,
    })
}

fn reading_from_row(row: &Row<'_>) -> Result<AvailabilityReading> {
    Ok(AvailabilityReading {
        time: row.time("time")?,
        remaining_parking_spaces: row.count("remaining_parking_spaces")?,
        remaining_motorcycle_spaces: row.count("remaining_motorcycle_spaces")?,
        remaining_charging_stations: row.count("remaining_charging_stations")?,
    })
}

#[async_trait]
impl<C: HttpClient> CatalogApi for BigQueryClient<C> {
    #[tracing::instrument(skip(self), fields(dataset = %self.dataset))]
    async fn list_facilities(&self) -> Result<Vec<FacilityRecord>> {
        self.run_query(&facilities_query(&self.dataset), facility_from_row)
            .await
    }
}

#[async_trait]
impl<C: HttpClient> AvailabilityApi for BigQueryClient<C> {
    #[tracing::instrument(skip(self), fields(dataset = %self.dataset))]
    async fn fetch_availability(
        &self,
        official_id: &str,
        county: &str,
    ) -> Result<Vec<AvailabilityReading>> {
        let request = availability_query(&self.dataset, official_id, county);
        self.run_query(&request, reading_from_row).await
    }
}
