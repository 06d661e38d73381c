//! Snapshot persistence contract and implementations.
//!
//! # Responsibility
//! - Load and save the whole-state snapshot document.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - At most one snapshot row exists; each save replaces it and bumps
//!   `revision`.
//! - Loaded documents are decoded but not semantically validated here.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::snapshot::{Snapshot, SnapshotError};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SnapshotRepoResult<T> = Result<T, SnapshotRepoError>;

/// Errors from snapshot storage.
#[derive(Debug)]
pub enum SnapshotRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Stored or outgoing document could not be encoded/decoded.
    Snapshot(SnapshotError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Storage backend refused the write.
    Unavailable(String),
}

impl Display for SnapshotRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "snapshot repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Unavailable(message) => write!(f, "snapshot storage unavailable: {message}"),
        }
    }
}

impl Error for SnapshotRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for SnapshotRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SnapshotRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SnapshotError> for SnapshotRepoError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

/// Storage contract for the whole-state snapshot.
pub trait SnapshotRepository {
    /// Loads the last saved snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> SnapshotRepoResult<Option<Snapshot>>;
    /// Replaces the stored snapshot.
    fn save(&mut self, snapshot: &Snapshot) -> SnapshotRepoResult<()>;
}

/// SQLite-backed snapshot repository.
///
/// Owns its connection so it can live inside a process-wide facade.
pub struct SqliteSnapshotRepository {
    conn: Connection,
}

impl SqliteSnapshotRepository {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> SnapshotRepoResult<Self> {
        ensure_snapshot_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Borrow of the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of saves applied to the stored row; `0` when none.
    pub fn revision(&self) -> SnapshotRepoResult<i64> {
        let revision: Option<i64> = self
            .conn
            .query_row("SELECT revision FROM snapshots WHERE id = 1;", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(revision.unwrap_or(0))
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn load(&self) -> SnapshotRepoResult<Option<Snapshot>> {
        let document: Option<String> = self
            .conn
            .query_row("SELECT document FROM snapshots WHERE id = 1;", [], |row| {
                row.get(0)
            })
            .optional()?;
        document
            .as_deref()
            .map(Snapshot::from_json)
            .transpose()
            .map_err(Into::into)
    }

    fn save(&mut self, snapshot: &Snapshot) -> SnapshotRepoResult<()> {
        let document = snapshot.to_json()?;
        self.conn.execute(
            "INSERT INTO snapshots (id, document, revision, saved_at)
             VALUES (1, ?1, 1, (strftime('%s', 'now') * 1000))
             ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                revision = snapshots.revision + 1,
                saved_at = excluded.saved_at;",
            params![document],
        )?;
        Ok(())
    }
}

/// In-memory snapshot repository for previews and tests.
///
/// Stores the encoded document so saves exercise the same JSON path as the
/// SQLite repository.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotRepository {
    document: Option<String>,
    writes: usize,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing encoded document.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
            writes: 0,
        }
    }

    /// Last saved document, if any.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn load(&self) -> SnapshotRepoResult<Option<Snapshot>> {
        self.document
            .as_deref()
            .map(Snapshot::from_json)
            .transpose()
            .map_err(Into::into)
    }

    fn save(&mut self, snapshot: &Snapshot) -> SnapshotRepoResult<()> {
        self.document = Some(snapshot.to_json()?);
        self.writes += 1;
        Ok(())
    }
}

fn ensure_snapshot_connection_ready(conn: &Connection) -> SnapshotRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(SnapshotRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MemorySnapshotRepository, SnapshotRepository};
    use crate::model::snapshot::Snapshot;

    #[test]
    fn memory_repository_counts_writes_and_reloads() {
        let mut repo = MemorySnapshotRepository::new();
        assert!(repo.load().unwrap().is_none());

        repo.save(&Snapshot::default()).unwrap();
        repo.save(&Snapshot::default()).unwrap();

        assert_eq!(repo.writes(), 2);
        assert_eq!(repo.load().unwrap(), Some(Snapshot::default()));
    }

    #[test]
    fn memory_repository_surfaces_corrupt_documents() {
        let repo = MemorySnapshotRepository::with_document("not json");
        assert!(repo.load().is_err());
    }
}
