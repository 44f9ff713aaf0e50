//! CLI entry point for the parking availability dashboard.
//!
//! Provides subcommands for serving the dashboard, listing the facility
//! catalog, fetching one facility's readings, and grouping a readings CSV
//! offline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parking_dashboard::analyzers::analyzer::{AnalysisParams, analyze_file};
use parking_dashboard::analyzers::types::{AggregationFunction, GroupingMode, SentinelPolicy};
use parking_dashboard::catalog::Catalog;
use parking_dashboard::config::{AppConfig, SourceConfig};
use parking_dashboard::fetch::BasicClient;
use parking_dashboard::fetch::auth::ApiKey;
use parking_dashboard::infra::bigquery::BigQueryClient;
use parking_dashboard::infra::csv_store::CsvStore;
use parking_dashboard::output::{print_json, print_pretty, write_points_csv, write_table_csv};
use parking_dashboard::server::{AppState, run_server};
use parking_dashboard::services::{AvailabilityApi, CatalogApi};
use parking_dashboard::session::SessionRegistry;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "parking_dashboard")]
#[command(about = "Parking space availability dashboard", long_about = None)]
struct Cli {
    /// Catalog CSV; with --readings-csv replaces the warehouse
    #[arg(long, global = true, value_name = "FILE")]
    catalog_csv: Option<PathBuf>,

    /// Readings CSV; with --catalog-csv replaces the warehouse
    #[arg(long, global = true, value_name = "FILE")]
    readings_csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard page and its JSON API
    Serve {
        /// Address to bind (defaults to BIND_ADDR or 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (defaults to PORT or 8050)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List counties, or the facilities of one county
    ListFacilities {
        /// Only show facilities of this county
        #[arg(short, long)]
        county: Option<String>,

        /// Narrow to one district
        #[arg(short, long)]
        district: Option<String>,
    },
    /// Fetch the reading history of one facility and write it as CSV
    Fetch {
        /// Facility official id
        official_id: String,

        /// County the facility belongs to
        county: String,

        /// CSV file to write the readings to
        #[arg(short, long, default_value = "readings.csv")]
        output: PathBuf,
    },
    /// Group a readings CSV and print the labeled series
    Analyze {
        /// Readings CSV (time, remaining_parking_spaces, ...)
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// none, hour, weekday, weekday_hour or weekday_type_hour
        #[arg(short, long, default_value = "none")]
        grouping: String,

        /// mean, max or min
        #[arg(short, long, default_value = "mean")]
        aggregation: String,

        /// include or exclude readings with unknown (-9) counts
        #[arg(long, default_value = "include")]
        sentinel: String,

        /// Optional CSV file for the labeled points
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the whole series as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/parking_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("parking_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let (Some(catalog), Some(readings)) = (cli.catalog_csv, cli.readings_csv) {
        config.source = SourceConfig::Csv { catalog, readings };
    }

    match cli.command {
        Commands::Serve { bind, port } => {
            let sources = connect(&config.source).await?;
            let state = AppState {
                catalog: Arc::new(sources.catalog),
                sessions: Arc::new(
                    SessionRegistry::new(sources.readings, config.fetch_timeout)
                        .with_idle_ttl(config.session_idle_ttl),
                ),
            };

            let bind = bind.unwrap_or(config.bind_addr);
            let port = port.unwrap_or(config.port);
            run_server(state, &bind, port).await?;
        }
        Commands::ListFacilities { county, district } => {
            let sources = connect(&config.source).await?;
            let catalog = sources.catalog;

            match county {
                None => {
                    let counties = catalog.counties();
                    info!(total = counties.len(), "County list");
                    for county in &counties {
                        let districts = catalog.districts_for(county, None);
                        info!(
                            county = %county,
                            districts = districts.districts.len(),
                            facilities = catalog.facilities_for(county, None).len(),
                            "County"
                        );
                    }
                }
                Some(county) => {
                    let facilities = catalog.facilities_for(&county, district.as_deref());
                    info!(county = %county, total = facilities.len(), "Facility list");
                    for f in &facilities {
                        info!(official_id = %f.official_id, name = %f.name, "Facility");
                    }
                }
            }
        }
        Commands::Fetch {
            official_id,
            county,
            output,
        } => {
            let sources = connect(&config.source).await?;
            let readings = tokio::time::timeout(
                config.fetch_timeout,
                sources.readings.fetch_availability(&official_id, &county),
            )
            .await
            .context("fetch timed out")??;

            if readings.is_empty() {
                warn!(official_id = %official_id, county = %county, "No readings found");
            }
            write_table_csv(&output, &readings)?;
            info!(rows = readings.len(), path = %output.display(), "Readings written");
        }
        Commands::Analyze {
            source,
            grouping,
            aggregation,
            sentinel,
            output,
            json,
        } => {
            let params = AnalysisParams {
                grouping: GroupingMode::parse(&grouping)?,
                aggregation: AggregationFunction::parse(&aggregation)?,
                sentinel: SentinelPolicy::parse(&sentinel)?,
            };
            let series = analyze_file(&source, params)?;

            if json {
                print_json(&series)?;
            } else {
                print_pretty(&series);
                for point in &series.points {
                    info!(label = %point.label, value = point.value, count = point.count, "Point");
                }
            }

            if let Some(path) = output {
                write_points_csv(&path, &series)?;
                info!(points = series.points.len(), path = %path.display(), "Points written");
            }
        }
    }

    Ok(())
}

/// The loaded catalog plus the source that serves readings.
struct Sources {
    catalog: Catalog,
    readings: Arc<dyn AvailabilityApi>,
}

/// Opens the configured data source and takes the catalog snapshot.
#[tracing::instrument(skip(source))]
async fn connect(source: &SourceConfig) -> Result<Sources> {
    match source {
        SourceConfig::Csv { catalog, readings } => {
            info!(catalog = %catalog.display(), readings = %readings.display(), "Using CSV store");
            let store = CsvStore::open(catalog, readings)?;
            Ok(with_catalog(store).await)
        }
        SourceConfig::BigQuery {
            project,
            dataset,
            access_token,
        } => {
            info!(project = %project, dataset = %dataset, "Using BigQuery");
            let http = BasicClient::with_timeout(std::time::Duration::from_secs(60))?;

            match access_token {
                Some(token) => {
                    let http = ApiKey::bearer(http, token)?;
                    Ok(with_catalog(BigQueryClient::new(http, project, dataset)).await)
                }
                None => {
                    warn!("GOOGLE_OAUTH_ACCESS_TOKEN not set, sending unauthenticated requests");
                    Ok(with_catalog(BigQueryClient::new(http, project, dataset)).await)
                }
            }
        }
    }
}

/// A catalog that fails to load leaves the dashboard running with no
/// facilities instead of stopping the process.
async fn with_catalog<S>(source: S) -> Sources
where
    S: CatalogApi + AvailabilityApi + 'static,
{
    let catalog = match Catalog::load(&source).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to load facility catalog");
            Catalog::default()
        }
    };

    Sources {
        catalog,
        readings: Arc::new(source),
    }
}
