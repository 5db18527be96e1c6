//! Health check endpoints
//!
//! - /health - Basic health check
//! - /health/ready - Readiness probe (database and session store)
//! - /health/live - Liveness probe

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<HealthChecks>,
}

/// Individual dependency checks
#[derive(Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
    pub sessions: CheckStatus,
}

/// Status of an individual check
#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>, detail: Option<&str>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy".to_string(),
                message: detail.map(str::to_string),
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                message: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: version(),
        checks: None,
    })
}

/// Readiness probe; 503 if the database or session store is down
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = CheckStatus::from_result(db::health_check(state.db()).await, None);
    let sessions = CheckStatus::from_result(
        state.sessions().ping().await,
        Some(state.sessions().backend()),
    );

    let is_healthy = database.is_healthy() && sessions.is_healthy();

    let response = HealthResponse {
        status: if is_healthy { "ready" } else { "not_ready" }.to_string(),
        version: version(),
        checks: Some(HealthChecks { database, sessions }),
    };

    if is_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Liveness probe; OK while the process serves requests
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: version(),
        checks: None,
    })
}
