//! HTTP handler functions for the dashboard API.

use actix_web::{HttpResponse, web};
use tracing::{info, warn};

use crate::analyzers::grouping::group_readings;
use crate::analyzers::types::{
    AggregationFunction, ChartKind, GroupingMode, SentinelPolicy, TransformError,
};
use crate::catalog::FacilityPanel;
use crate::chart;
use crate::models::AvailabilityReading;
use crate::session::SubmitError;

use super::AppState;
use super::models::{
    ApiColumn, ApiCounties, ApiHealth, ApiSeries, ApiStatus, ApiSubmitted, DistrictParams,
    FacilityListParams, FacilityParams, SeriesParams, SessionParams, SubmitBody,
};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        facilities: state.catalog.len(),
    })
}

/// `GET /api/counties`
pub async fn counties(state: web::Data<AppState>) -> HttpResponse {
    let counties = state.catalog.counties();
    let default = counties.first().cloned();
    HttpResponse::Ok().json(ApiCounties { counties, default })
}

/// `GET /api/districts`
///
/// District options for a county, narrowed to the selected facility.
pub async fn districts(
    state: web::Data<AppState>,
    params: web::Query<DistrictParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(
        state
            .catalog
            .districts_for(&params.county, params.official_id.as_deref()),
    )
}

/// `GET /api/facilities`
pub async fn facilities(
    state: web::Data<AppState>,
    params: web::Query<FacilityListParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(
        state
            .catalog
            .facilities_for(&params.county, params.district.as_deref()),
    )
}

/// `GET /api/facility`
///
/// The detail panel; blank fields when the selection does not resolve.
pub async fn facility(
    state: web::Data<AppState>,
    params: web::Query<FacilityParams>,
) -> HttpResponse {
    let found = state
        .catalog
        .facility_detail(&params.county, &params.district, &params.official_id);
    HttpResponse::Ok().json(FacilityPanel::from_lookup(found))
}

/// `POST /api/submit`
///
/// Starts the background fetch for the session. Answers `409` while a
/// previous fetch is still running.
pub async fn submit(
    state: web::Data<AppState>,
    params: web::Query<SessionParams>,
    body: web::Json<SubmitBody>,
) -> HttpResponse {
    let session = state.sessions.get(&params.session);

    match session.submit(&body.official_id, &body.county) {
        Ok(seq) => {
            info!(session = %params.session, seq, official_id = %body.official_id, "Fetch submitted");
            HttpResponse::Accepted().json(ApiSubmitted { seq })
        }
        Err(e @ SubmitError::InFlight(seq)) => {
            warn!(session = %params.session, seq, "Submit while fetch running");
            HttpResponse::Conflict().json(serde_json::json!({
                "error": e.to_string(),
                "seq": seq,
            }))
        }
    }
}

/// `GET /api/status`
pub async fn status(
    state: web::Data<AppState>,
    params: web::Query<SessionParams>,
) -> HttpResponse {
    let snapshot = state.sessions.snapshot(&params.session);

    HttpResponse::Ok().json(ApiStatus {
        seq: snapshot.seq,
        latest: snapshot.latest,
        running: snapshot.running,
        error: snapshot.error,
        official_id: snapshot.official_id,
        county: snapshot.county,
        readings: snapshot.readings.len(),
    })
}

/// `GET /api/series`
///
/// Groups the session's latest readings and projects them onto a chart.
pub async fn series(
    state: web::Data<AppState>,
    params: web::Query<SeriesParams>,
) -> HttpResponse {
    let (grouping, aggregation, kind, sentinel) = match parse_series_params(&params) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Rejected series parameters");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            }));
        }
    };

    let snapshot = state.sessions.snapshot(&params.session);
    let grouped = group_readings(&snapshot.readings, grouping, aggregation, sentinel);
    let chart = chart::project(&grouped, kind);

    HttpResponse::Ok().json(ApiSeries {
        seq: snapshot.seq,
        running: snapshot.running,
        error: snapshot.error,
        grouping,
        columns: AvailabilityReading::columns()
            .iter()
            .map(|c| ApiColumn {
                id: c.to_string(),
                name: c.to_string(),
            })
            .collect(),
        records: grouped.records,
        points: grouped.points,
        chart,
    })
}

/// Absent parameters take the dashboard defaults; present ones must be valid.
fn parse_series_params(
    params: &SeriesParams,
) -> Result<(GroupingMode, AggregationFunction, ChartKind, SentinelPolicy), TransformError> {
    let grouping = match params.grouping.as_deref() {
        Some(s) => GroupingMode::parse(s)?,
        None => GroupingMode::default(),
    };
    let aggregation = match params.aggregation.as_deref() {
        Some(s) => AggregationFunction::parse(s)?,
        None => AggregationFunction::default(),
    };
    let kind = match params.chart.as_deref() {
        Some(s) => ChartKind::parse(s)?,
        None => ChartKind::default(),
    };
    let sentinel = match params.sentinel.as_deref() {
        Some(s) => SentinelPolicy::parse(s)?,
        None => SentinelPolicy::default(),
    };
    Ok((grouping, aggregation, kind, sentinel))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(grouping: Option<&str>, chart: Option<&str>) -> SeriesParams {
        SeriesParams {
            session: "default".to_string(),
            grouping: grouping.map(str::to_string),
            aggregation: None,
            chart: chart.map(str::to_string),
            sentinel: None,
        }
    }

    #[test]
    fn test_absent_params_take_defaults() {
        let parsed = parse_series_params(&params(None, None)).unwrap();
        assert_eq!(
            parsed,
            (
                GroupingMode::None,
                AggregationFunction::Mean,
                ChartKind::Line,
                SentinelPolicy::Include
            )
        );
    }

    #[test]
    fn test_invalid_param_is_rejected() {
        assert_eq!(
            parse_series_params(&params(Some("hour"), Some("pie"))),
            Err(TransformError::UnknownChartKind("pie".to_string()))
        );
    }
}
