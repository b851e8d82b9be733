use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::models::{NoteId, NoteRecord, SaveOwnedRequest, SaveSharedRequest};
use crate::services::{NotePersistence, PersistFuture, PersistenceError};

/// Client of the notes REST API, the persistence collaborator of a browser tab
#[derive(Debug, Clone)]
pub struct HttpNoteApi {
    client: Client,
    base_url: String,
}

impl HttpNoteApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PersistenceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), PersistenceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        ensure_success(response).await.map(|_| ())
    }
}

async fn ensure_success(response: Response) -> Result<Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(PersistenceError::Api { status: status.as_u16(), message })
}

impl NotePersistence for HttpNoteApi {
    fn save_owned<'a>(&'a self, user_id: i64, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()> {
        Box::pin(async move {
            let body = SaveOwnedRequest {
                user_id,
                note_id: note_id.clone(),
                content: content.to_string(),
            };
            self.post_json("/api/notes/save", &body).await
        })
    }

    fn save_shared<'a>(&'a self, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()> {
        Box::pin(async move {
            let body = SaveSharedRequest {
                note_id: note_id.clone(),
                content: content.to_string(),
            };
            self.post_json("/api/notes/shared/save", &body).await
        })
    }

    fn fetch_note<'a>(&'a self, note_id: &'a NoteId) -> PersistFuture<'a, Option<NoteRecord>> {
        Box::pin(async move {
            let url = format!("{}/api/notes/{}", self.base_url, note_id);
            let response = self.client.get(&url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let note = ensure_success(response).await?.json::<NoteRecord>().await?;
            Ok(Some(note))
        })
    }
}
