//! Fleet health handler

use crate::AppState;
use axum::{extract::State, Json};
use bookshelf_types::FleetHealthStatus;
use tracing::warn;

pub async fn status(State(state): State<AppState>) -> Json<FleetHealthStatus> {
    let status = state.fleet.status().await;
    if !status.is_healthy() {
        warn!("Fleet degraded: {:?}", status);
    }
    Json(status)
}
