//! Process configuration read from the environment (and `.env`).

use std::path::PathBuf;
use std::time::Duration;

/// Where readings and the catalog come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    BigQuery {
        project: String,
        dataset: String,
        access_token: Option<String>,
    },
    Csv {
        catalog: PathBuf,
        readings: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub bind_addr: String,
    pub port: u16,
    pub fetch_timeout: Duration,
    /// Dashboard sessions idle this long are dropped.
    pub session_idle_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Missing or malformed
    /// values fall back to defaults; nothing here fails.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let source = match (get("CATALOG_CSV"), get("READINGS_CSV")) {
            (Some(catalog), Some(readings)) => SourceConfig::Csv {
                catalog: catalog.into(),
                readings: readings.into(),
            },
            _ => {
                let dataset = get("BIGQUERY_ID").unwrap_or_default();
                let project = get("BIGQUERY_PROJECT")
                    .unwrap_or_else(|| default_project(&dataset).to_string());
                SourceConfig::BigQuery {
                    project,
                    dataset,
                    access_token: get("GOOGLE_OAUTH_ACCESS_TOKEN"),
                }
            }
        };

        Self {
            source,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(8050),
            fetch_timeout: Duration::from_secs(
                get("FETCH_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
            session_idle_ttl: Duration::from_secs(
                get("SESSION_IDLE_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
        }
    }
}

/// `project.dataset` ids carry their project; a bare dataset has none.
fn default_project(dataset: &str) -> &str {
    match dataset.split_once('.') {
        Some((project, _)) => project,
        None => "",
    }
}
