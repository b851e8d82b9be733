use std::sync::Arc;
use axum::{extract::{Path, State}, http::StatusCode, Json};
use chrono::Utc;
use tracing::{error, info};

use crate::models::{ErrorResponse, NoteId, NoteRecord, SaveOwnedRequest, SaveResponse, SaveSharedRequest};
use crate::services::PersistenceError;
use crate::state::AppState;

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: String) -> HandlerError {
    (status, Json(ErrorResponse {
        code: status.as_u16(),
        status: status.to_string(),
        error: message,
    }))
}

fn persistence_error(e: PersistenceError) -> HandlerError {
    let status = match &e {
        PersistenceError::NotFound(_) | PersistenceError::NotOwned { .. } => StatusCode::NOT_FOUND,
        PersistenceError::InvalidNoteId(_) | PersistenceError::NoOpenNote => StatusCode::BAD_REQUEST,
        _ => {
            error!("Note persistence failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, e.to_string())
}

/// Overwrite a note owned by the requesting user
pub async fn save_owned_note(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveOwnedRequest>,
) -> Result<(StatusCode, Json<SaveResponse>), HandlerError> {
    state
        .store
        .save_owned(req.user_id, &req.note_id, &req.content)
        .await
        .map_err(persistence_error)?;

    info!("Note {} saved by owner {}", req.note_id, req.user_id);
    Ok((StatusCode::OK, Json(SaveResponse { note_id: req.note_id, saved_at: Utc::now() })))
}

/// Overwrite a note shared with the requesting user
pub async fn save_shared_note(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveSharedRequest>,
) -> Result<(StatusCode, Json<SaveResponse>), HandlerError> {
    state
        .store
        .save_shared(&req.note_id, &req.content)
        .await
        .map_err(persistence_error)?;

    info!("Shared note {} saved", req.note_id);
    Ok((StatusCode::OK, Json(SaveResponse { note_id: req.note_id, saved_at: Utc::now() })))
}

/// Fetch a note by id
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    Path(note_id): Path<String>,
) -> Result<(StatusCode, Json<NoteRecord>), HandlerError> {
    let note_id = NoteId::from(note_id);
    match state.store.fetch_note(&note_id).await.map_err(persistence_error)? {
        Some(note) => Ok((StatusCode::OK, Json(note))),
        None => Err(error_response(StatusCode::NOT_FOUND, format!("note '{}' not found", note_id))),
    }
}
