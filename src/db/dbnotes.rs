use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Error as SqlxError;
use std::time::Duration;
use tracing::{error, info};

use crate::models::{NoteId, NoteRecord};
use crate::services::{NotePersistence, PersistFuture, PersistenceError};

/// Note row from database
#[derive(Debug, Clone, sqlx::FromRow)]
struct NoteRow {
    note_id: i64,
    user_id: i64,
    content: Option<String>,
    edited_at: DateTime<Utc>,
}

impl From<NoteRow> for NoteRecord {
    fn from(row: NoteRow) -> Self {
        NoteRecord {
            note_id: NoteId::from(row.note_id),
            user_id: row.user_id,
            content: row.content.unwrap_or_default(),
            edited_at: row.edited_at,
        }
    }
}

/// PostgreSQL backed note store
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }

    fn numeric_id(note_id: &NoteId) -> Result<i64, PersistenceError> {
        note_id
            .as_i64()
            .ok_or_else(|| PersistenceError::InvalidNoteId(note_id.clone()))
    }

    /// Overwrite the content of a note, optionally restricted to its owner.
    /// Returns the number of rows written.
    async fn overwrite_content(&self, owner: Option<i64>, note_id: i64, content: &str) -> Result<u64, SqlxError> {
        let result = match owner {
            Some(user_id) => {
                sqlx::query("UPDATE notes SET content = $1, edited_at = NOW() WHERE note_id = $2 AND user_id = $3")
                    .bind(content)
                    .bind(note_id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("UPDATE notes SET content = $1, edited_at = NOW() WHERE note_id = $2")
                    .bind(content)
                    .bind(note_id)
                    .execute(&self.pool)
                    .await
            }
        };

        match result {
            Ok(done) => Ok(done.rows_affected()),
            Err(e) => {
                error!(
                    "Failed to write note {}: {}. Pool state: {} idle, {} total",
                    note_id,
                    e,
                    self.pool.num_idle(),
                    self.pool.size()
                );
                Err(e)
            }
        }
    }
}

impl NotePersistence for PgNoteStore {
    fn save_owned<'a>(&'a self, user_id: i64, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()> {
        Box::pin(async move {
            let id = Self::numeric_id(note_id)?;
            match self.overwrite_content(Some(user_id), id, content).await? {
                0 => Err(PersistenceError::NotOwned { user_id, note_id: note_id.clone() }),
                _ => Ok(()),
            }
        })
    }

    fn save_shared<'a>(&'a self, note_id: &'a NoteId, content: &'a str) -> PersistFuture<'a, ()> {
        Box::pin(async move {
            let id = Self::numeric_id(note_id)?;
            match self.overwrite_content(None, id, content).await? {
                0 => Err(PersistenceError::NotFound(note_id.clone())),
                _ => Ok(()),
            }
        })
    }

    fn fetch_note<'a>(&'a self, note_id: &'a NoteId) -> PersistFuture<'a, Option<NoteRecord>> {
        Box::pin(async move {
            let id = Self::numeric_id(note_id)?;
            let row = sqlx::query_as::<_, NoteRow>(
                "SELECT note_id::BIGINT AS note_id, user_id::BIGINT AS user_id, content, edited_at::TIMESTAMPTZ AS edited_at FROM notes WHERE note_id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(NoteRecord::from))
        })
    }
}
