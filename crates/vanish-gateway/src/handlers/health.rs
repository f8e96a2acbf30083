use crate::model::HealthResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

/// Reports whether the storage backend answers a ping within the
/// configured timeout.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let timeout = state.health_timeout();
    match tokio::time::timeout(timeout, state.store().ping()).await {
        Ok(Ok(())) => (StatusCode::OK, Json(HealthResponse { ok: true })),
        Ok(Err(e)) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse { ok: false }),
            )
        }
        Err(_) => {
            warn!(?timeout, "Health check timed out");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse { ok: false }),
            )
        }
    }
}
