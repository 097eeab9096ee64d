use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::db::connector::MongoConnector;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub success: bool,
    pub database: &'static str,
}

/// Report whether the database answers a ping.
pub async fn process_health(connector: &MongoConnector) -> (StatusCode, HealthResponse) {
    match connector.ping().await {
        Ok(()) => (
            StatusCode::OK,
            HealthResponse {
                success: true,
                database: "up",
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    success: false,
                    database: "down",
                },
            )
        }
    }
}

/// Axum handler for `GET /api/health`.
pub async fn health_handler(
    State(state): State<AppState>,
) -> (StatusCode, axum::Json<HealthResponse>) {
    let (status, body) = process_health(&state.connector).await;
    (status, axum::Json(body))
}
