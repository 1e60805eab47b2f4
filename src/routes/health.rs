//! Liveness, version and root endpoints
//!
//! `/api/health` pings the document store: 200 when it answers within the
//! store deadline, 503 otherwise.

use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::response::{json_response, ok, FullBody};
use crate::server::AppState;
use crate::types::{ApiError, Result};

pub const SERVICE_NAME: &str = "trustml-backend";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub database: &'static str,
    /// Store backend in use (`mongodb` or `memory`)
    pub backend: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
}

/// GET /api/
pub fn root() -> Response<FullBody> {
    ok(&json!({ "message": "TrustML API is running" }))
}

/// GET /api/health
pub async fn health(state: &AppState) -> Result<Response<FullBody>> {
    let stores = &state.stores;
    if let Err(e) = stores.timed("ping", stores.resources.ping()).await {
        warn!(error = %e, "Health check failed: store unreachable");
        return Err(ApiError::ServiceUnavailable(e.to_string()));
    }

    let response = HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        database: "connected",
        backend: stores.resources.backend(),
        uptime: state.started_at.elapsed().as_secs(),
    };
    Ok(json_response(StatusCode::OK, &response))
}

/// Build information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

/// GET /api/version
pub fn version() -> Response<FullBody> {
    ok(&VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: SERVICE_NAME,
    })
}
