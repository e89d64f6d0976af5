use axum::{Json, extract::State, http::StatusCode};
use tracing::error;

use quotes_types::api::{DbCheckResponse, HealthResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /health — liveness plus a trivial database round trip.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.db_call(|db| db.ping()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "OK".into(),
                database: "connected".into(),
            }),
        ),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".into(),
                    database: "disconnected".into(),
                }),
            )
        }
    }
}

/// GET /db-check — row counts of the main tables.
pub async fn db_check(State(state): State<AppState>) -> Result<Json<DbCheckResponse>, ApiError> {
    let data = state.db_call(|db| db.table_counts()).await?;
    Ok(Json(DbCheckResponse {
        status: "Database accessible".into(),
        data,
    }))
}
