use crate::handlers::{diagnostics, get_note, health_check, ready_check, save_owned_note, save_shared_note};
use crate::state::AppState;
use axum::{routing::{get, post}, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/notes/save", post(save_owned_note))
        .route("/notes/shared/save", post(save_shared_note))
        .route("/notes/:note_id", get(get_note))
        .route("/v1/diagnostics", get(diagnostics))
}
