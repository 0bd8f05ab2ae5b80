use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub message: &'static str,
}

pub async fn root() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to the NutriTrack API",
    })
}

/// Never fails: an unreachable database yields 503 with a degraded status.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "healthy",
                database: "connected",
            }),
        ),
        Err(e) => {
            error!(error = %e, "health check database query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "degraded",
                    database: "unreachable",
                }),
            )
        }
    }
}
