use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Save a note owned by the caller
#[utoipa::path(
    post,
    path = "/api/notes/save",
    request_body = SaveOwnedRequest,
    responses(
        (status = 200, description = "Note content overwritten", body = SaveResponse),
        (status = 404, description = "Note does not exist or is not owned by the user", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn save_owned_note_doc() {}

/// Save a note shared with the caller
#[utoipa::path(
    post,
    path = "/api/notes/shared/save",
    request_body = SaveSharedRequest,
    responses(
        (status = 200, description = "Note content overwritten", body = SaveResponse),
        (status = 404, description = "Note does not exist", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn save_shared_note_doc() {}

/// Fetch a note
#[utoipa::path(
    get,
    path = "/api/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note identifier")),
    responses(
        (status = 200, description = "The note", body = NoteRecord),
        (status = 404, description = "Note not found", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_note_doc() {}

/// Connection and room diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Diagnostics snapshot", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        save_owned_note_doc,
        save_shared_note_doc,
        get_note_doc,
        diagnostics_doc,
    ),
    components(
        schemas(HealthResponse, SaveOwnedRequest, SaveSharedRequest, SaveResponse, NoteRecord, DiagnosticsResponse, ErrorResponse)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
