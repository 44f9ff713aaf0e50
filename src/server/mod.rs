//! Actix-Web server for the parking dashboard.
//!
//! Serves the JSON API behind the selection cascade, the detail panel, the
//! submit/status pair of the background fetch, and the grouped series with
//! its chart description. `GET /` serves a single static page that drives
//! the API.

mod handlers;
pub mod models;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;
use crate::session::SessionRegistry;

/// Shared application state.
pub struct AppState {
    /// Facility catalog, loaded once at startup and never mutated.
    pub catalog: Arc<Catalog>,
    /// Per-session fetch state.
    pub sessions: Arc<SessionRegistry>,
}

/// Registers every route. Shared by [`run_server`] and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index)).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/counties", web::get().to(handlers::counties))
            .route("/districts", web::get().to(handlers::districts))
            .route("/facilities", web::get().to(handlers::facilities))
            .route("/facility", web::get().to(handlers::facility))
            .route("/submit", web::post().to(handlers::submit))
            .route("/status", web::get().to(handlers::status))
            .route("/series", web::get().to(handlers::series)),
    );
}

/// Starts the HTTP server and runs until it is stopped.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn run_server(state: AppState, bind_addr: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(state);

    info!(bind_addr, port, "Starting server");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
