//! Handlers for liveness and health check endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, PingResponse};
use crate::state::AppState;

/// Liveness probe.
///
/// # Endpoint
///
/// `GET /v1/ping`
///
/// # Response
///
/// ```json
/// { "status": 200, "message": "pong" }
/// ```
pub async fn ping_handler() -> Json<PingResponse> {
    Json(PingResponse {
        status: StatusCode::OK.as_u16(),
        message: "pong",
    })
}

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Store reachable. A failing cache is reported as `degraded`
///   but does not fail the check, since every request still completes against
///   the store.
/// - **503 Service Unavailable**: Store unreachable
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "store": { "status": "ok", "message": "Store reachable" },
///     "cache": { "status": "ok", "message": "Cache reachable" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let store = if state.link_service.store_healthy().await {
        CheckStatus::ok("Store reachable")
    } else {
        CheckStatus::error("Store unreachable")
    };

    let cache = if state.link_service.cache_healthy().await {
        CheckStatus::ok("Cache reachable")
    } else {
        CheckStatus::error("Cache unreachable, serving from store")
    };

    let store_ok = store.is_ok();
    let status = match (store_ok, cache.is_ok()) {
        (true, true) => "healthy",
        (true, false) => "degraded",
        (false, _) => "unhealthy",
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { store, cache },
    };

    if store_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
