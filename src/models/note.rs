use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::NoteId;

/// A note as returned by the persistence collaborator
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct NoteRecord {
    #[schema(value_type = String)]
    pub note_id: NoteId,
    pub user_id: i64,
    pub content: String,
    pub edited_at: DateTime<Utc>,
}

/// Owner-scoped save request
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct SaveOwnedRequest {
    pub user_id: i64,
    #[schema(value_type = String)]
    pub note_id: NoteId,
    pub content: String,
}

/// Save request for a note shared with the caller
#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct SaveSharedRequest {
    #[schema(value_type = String)]
    pub note_id: NoteId,
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, ToSchema)]
pub struct SaveResponse {
    #[schema(value_type = String)]
    pub note_id: NoteId,
    pub saved_at: DateTime<Utc>,
}
