//! Small HTTP surface exposing scan results and the current connection
//! as JSON, for dashboards or other processes on the same host.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::backend::PlatformBackend;
use crate::network::{CurrentConnection, Fingerprint, LocationHint, ScanOptions};
use crate::session::WifiSession;

pub struct ServerConfig {
    pub port: u16,
}

type SharedSession = Arc<WifiSession<PlatformBackend>>;

pub async fn run_server(session: SharedSession, config: ServerConfig) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/scan", get(scan_handler))
        .route("/fingerprint", get(fingerprint_handler))
        .route("/ssids", get(ssids_handler))
        .route("/current", get(current_handler))
        .layer(cors)
        .with_state(session);

    let addr = format!("0.0.0.0:{}", config.port);
    info!(port = config.port, "starting status server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ScanParams {
    max_results: Option<usize>,
    timeout_ms: Option<u64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Runs a fresh scan and returns the resulting fingerprint. Degraded
/// scans come back as an empty record set with HTTP 200, matching the
/// library's never-raise contract for reads. A capture location is
/// attached only when both coordinates are supplied.
async fn scan_handler(
    State(session): State<SharedSession>,
    Query(params): Query<ScanParams>,
) -> Json<Fingerprint> {
    let location = match (params.latitude, params.longitude) {
        (Some(latitude), Some(longitude)) => Some(LocationHint {
            latitude,
            longitude,
        }),
        _ => None,
    };
    let options = ScanOptions {
        max_results: params.max_results,
        timeout_ms: params.timeout_ms,
        location,
    };
    Json(session.scan(options).await)
}

/// Snapshot of the cached records without triggering a scan.
async fn fingerprint_handler(State(session): State<SharedSession>) -> Json<Fingerprint> {
    Json(session.get_fingerprint())
}

async fn ssids_handler(State(session): State<SharedSession>) -> Json<Vec<String>> {
    Json(session.list_known_ssids())
}

async fn current_handler(
    State(session): State<SharedSession>,
) -> Json<Option<CurrentConnection>> {
    Json(session.get_current_connection().await)
}
