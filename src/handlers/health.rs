use std::sync::Arc;
use axum::{extract::State, Json};
use crate::models::HealthResponse;
use crate::state::AppState;
use tracing::debug;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        service: state.config.service_name.clone(),
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint
pub async fn ready_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Readiness check requested");
    let sessions = state.coordinator.session_count().await;
    Json(HealthResponse {
        service: state.config.service_name.clone(),
        status: "ok".to_string(),
        message: format!("Service is ready, {} live sessions", sessions),
    })
}
