//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use relation_store::Persistor;
use serde::Serialize;

use super::friends::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Number of affinity lanes serving store mutations.
    pub lanes: usize,
}

/// GET /health: liveness plus scheduler size.
pub async fn check<P: Persistor + Clone + 'static>(
    State(state): State<Arc<AppState<P>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        lanes: state.coordinator.scheduler().lane_count(),
    })
}
