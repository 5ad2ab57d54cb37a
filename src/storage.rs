// SPDX-License-Identifier: MPL-2.0

//! Photo store: an embedded document database
//!
//! Every photo is one JSON document keyed by its id, kept in a single SQLite
//! table. Documents are immutable: there is no update, only `put`, bulk
//! listing and a bulk `clear_all`.
//!
//! SQLite calls block, so every public operation hops onto
//! `tokio::task::spawn_blocking` with a shared connection.

use crate::constants::storage as storage_consts;
use crate::errors::StoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, params};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A captured photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    /// ISO-8601 capture time, unique per store
    pub id: String,
    /// Capture time in milliseconds since the epoch
    #[serde(rename = "capturedAtEpochMs")]
    pub captured_at_ms: i64,
    /// `data:image/png;base64,...`
    pub image_data: String,
}

impl PhotoRecord {
    /// Build a record for a capture taken at `captured_at`
    pub fn new(captured_at: DateTime<Utc>, image_data: String) -> Self {
        Self {
            id: captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            captured_at_ms: captured_at.timestamp_millis(),
            image_data,
        }
    }
}

/// Result of [`PhotoStore::clear_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// This many documents were deleted
    Cleared { removed: usize },
    /// The store was already empty; nothing was written
    EmptyStoreNoop,
}

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreLocation::File(path) => write!(f, "{}", path.display()),
            StoreLocation::Memory => write!(f, ":memory:"),
        }
    }
}

/// Embedded photo document store
#[derive(Clone)]
pub struct PhotoStore {
    conn: Arc<Mutex<Connection>>,
    location: StoreLocation,
}

impl PhotoStore {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Storage(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Photo store opened");
        Self::from_connection(conn, StoreLocation::File(path.to_path_buf()))
    }

    /// Open a private in-memory store (tests, dry runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, StoreLocation::Memory)
    }

    fn from_connection(conn: Connection, location: StoreLocation) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Run blocking database work on the blocking pool
    async fn with_conn<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Storage("Store connection poisoned".to_string()))?;
            work(&mut guard)
        })
        .await?
    }

    /// Insert a new document
    ///
    /// # Returns
    /// * `Ok(())` - Document persisted
    /// * `Err(StoreError::Conflict)` - A document with this id already exists
    /// * `Err(StoreError::Storage)` - Database failure
    pub async fn put(&self, record: PhotoRecord) -> StoreResult<()> {
        let body = serde_json::to_string(&record)?;
        let id = record.id.clone();

        self.with_conn(move |conn| {
            let result = conn.execute(
                "INSERT INTO photos (id, captured_at, body) VALUES (?1, ?2, ?3)",
                params![record.id, record.captured_at_ms, body],
            );

            match result {
                Ok(_) => {
                    debug!(id = %record.id, bytes = body.len(), "Document stored");
                    Ok(())
                }
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    warn!(id = %id, "Refusing to overwrite existing document");
                    Err(StoreError::Conflict(id))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Every live document, in no particular order
    pub async fn list_all(&self) -> StoreResult<Vec<PhotoRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT body FROM photos")?;
            let bodies = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut records = Vec::with_capacity(bodies.len());
            for body in bodies {
                records.push(serde_json::from_str::<PhotoRecord>(&body)?);
            }
            Ok(records)
        })
        .await
    }

    /// Number of live documents
    pub async fn count(&self) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    /// Delete every document in one transaction
    ///
    /// An empty store is reported as [`ClearOutcome::EmptyStoreNoop`] and
    /// the transaction is rolled back without writing.
    pub async fn clear_all(&self) -> StoreResult<ClearOutcome> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let ids = {
                let mut stmt = tx.prepare("SELECT id FROM photos")?;
                stmt.query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?
            };

            if ids.is_empty() {
                tx.rollback()?;
                debug!("Clear requested on empty store");
                return Ok(ClearOutcome::EmptyStoreNoop);
            }

            {
                let mut delete = tx.prepare("DELETE FROM photos WHERE id = ?1")?;
                for id in &ids {
                    delete.execute(params![id])?;
                }
            }
            tx.commit()?;

            info!(removed = ids.len(), "Photo store cleared");
            Ok(ClearOutcome::Cleared { removed: ids.len() })
        })
        .await
    }
}

impl std::fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStore")
            .field("location", &self.location)
            .finish()
    }
}

/// Create tables and stamp the schema version
fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS photos (
            id          TEXT PRIMARY KEY NOT NULL,
            captured_at INTEGER NOT NULL,
            body        TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_photos_captured_at ON photos(captured_at DESC)",
        [],
    )?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version == 0 {
        conn.pragma_update(None, "user_version", storage_consts::SCHEMA_VERSION)?;
    } else if version > storage_consts::SCHEMA_VERSION {
        return Err(StoreError::Storage(format!(
            "Store schema {} is newer than supported {}",
            version,
            storage_consts::SCHEMA_VERSION
        )));
    }

    Ok(())
}
