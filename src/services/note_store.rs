use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{NoteId, NoteRecord};

/// Future returned by every persistence call
pub type PersistFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PersistenceError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("note '{0}' not found")]
    NotFound(NoteId),
    #[error("note '{note_id}' is not owned by user {user_id}")]
    NotOwned { user_id: i64, note_id: NoteId },
    #[error("invalid note id '{0}'")]
    InvalidNoteId(NoteId),
    #[error("no note is open")]
    NoOpenNote,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notes api answered {status}: {message}")]
    Api { status: u16, message: String },
}

/// Storage of note content.
///
/// Every content write is a full overwrite: the last write to land wins and
/// nothing is merged with the stored value.
pub trait NotePersistence: Send + Sync {
    /// Overwrite a note owned by `user_id`.
    fn save_owned<'a>(&'a self, user_id: i64, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()>;

    /// Overwrite a note shared with the caller. Identity is not checked.
    fn save_shared<'a>(&'a self, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()>;

    fn fetch_note<'a>(&'a self, note_id: &'a NoteId) -> PersistFuture<'a, Option<NoteRecord>>;
}

/// In-process note store, used when no database is configured
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: RwLock<HashMap<NoteId, NoteRecord>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a note
    pub async fn insert(&self, user_id: i64, note_id: NoteId, content: &str) {
        let record = NoteRecord {
            note_id: note_id.clone(),
            user_id,
            content: content.to_string(),
            edited_at: Utc::now(),
        };
        self.notes.write().await.insert(note_id, record);
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }
}

impl NotePersistence for MemoryNoteStore {
    fn save_owned<'a>(&'a self, user_id: i64, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()> {
        Box::pin(async move {
            let mut notes = self.notes.write().await;
            let note = notes
                .get_mut(note_id)
                .ok_or_else(|| PersistenceError::NotFound(note_id.clone()))?;
            if note.user_id != user_id {
                return Err(PersistenceError::NotOwned { user_id, note_id: note_id.clone() });
            }
            note.content = content.to_string();
            note.edited_at = Utc::now();
            debug!("Saved owned note {} for user {} ({} bytes)", note_id, user_id, content.len());
            Ok(())
        })
    }

    fn save_shared<'a>(&'a self, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()> {
        Box::pin(async move {
            let mut notes = self.notes.write().await;
            let note = notes
                .get_mut(note_id)
                .ok_or_else(|| PersistenceError::NotFound(note_id.clone()))?;
            note.content = content.to_string();
            note.edited_at = Utc::now();
            debug!("Saved shared note {} ({} bytes)", note_id, content.len());
            Ok(())
        })
    }

    fn fetch_note<'a>(&'a self, note_id: &'a NoteId) -> PersistFuture<'a, Option<NoteRecord>> {
        Box::pin(async move {
            let note = self.notes.read().await.get(note_id).cloned();
            if note.is_none() {
                info!("Note not found: {}", note_id);
            }
            Ok(note)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn owned_save_checks_the_owner() {
        let store = MemoryNoteStore::new();
        store.insert(1, NoteId::from(42), "draft").await;

        store.save_owned(1, &NoteId::from(42), "hello").await.unwrap();
        let err = store.save_owned(2, &NoteId::from(42), "hijack").await.unwrap_err();
        assert!(matches!(err, PersistenceError::NotOwned { user_id: 2, .. }));

        let note = store.fetch_note(&NoteId::from(42)).await.unwrap().unwrap();
        assert_eq!(note.content, "hello");
    }

    #[tokio::test]
    async fn shared_save_ignores_identity_and_overwrites() {
        let store = MemoryNoteStore::new();
        store.insert(1, NoteId::from("7"), "a long original body").await;

        store.save_shared(&NoteId::from("7"), "short").await.unwrap();
        let note = store.fetch_note(&NoteId::from("7")).await.unwrap().unwrap();
        assert_eq!(note.content, "short");
        assert_eq!(note.user_id, 1);
    }

    #[tokio::test]
    async fn saving_a_missing_note_fails() {
        let store = MemoryNoteStore::new();
        let err = store.save_shared(&NoteId::from(9), "x").await.unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(_)));
        assert!(store.fetch_note(&NoteId::from(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn overlapping_saves_last_to_land_wins() {
        let store = std::sync::Arc::new(MemoryNoteStore::new());
        store.insert(1, NoteId::from(5), "").await;

        // Two sessions with the same note open save independently; the store
        // keeps whichever write completes last.
        let slow = {
            let store = store.clone();
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                store.save_shared(&NoteId::from(5), "from slow tab").await
            })
        };
        store.save_owned(1, &NoteId::from(5), "from fast tab").await.unwrap();
        slow.await.unwrap().unwrap();

        let note = store.fetch_note(&NoteId::from(5)).await.unwrap().unwrap();
        assert_eq!(note.content, "from slow tab");
    }
}
