//! Store capability seam: a factory of request-scoped sessions, each able to list, look up,
//! insert, version-checked replace, delete and probe rows of any entity type.
//!
//! A session owns whatever connection resource backs it and releases it when dropped, so every
//! request gives its connection back on every exit path.

mod memory;
mod postgres;

pub use memory::{MemorySession, MemoryStore};
pub use postgres::{ensure_database_exists, PgSession, PgStore};

use crate::entity::{Entity, RowVersion, Snapshot};
use async_trait::async_trait;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// What kind of store-enforced constraint a write broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityKind {
    DuplicateKey,
    ForeignKey,
    Constraint,
}

impl IntegrityKind {
    /// Short reason safe to show to callers.
    pub fn reason(self) -> &'static str {
        match self {
            IntegrityKind::DuplicateKey => "duplicate key",
            IntegrityKind::ForeignKey => "invalid or dependent reference",
            IntegrityKind::Constraint => "constraint violation",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// A write broke a uniqueness, reference or other constraint; nothing was applied.
    #[error("integrity violation ({}): {detail}", .kind.reason())]
    Integrity { kind: IntegrityKind, detail: String },
    /// A version-checked write matched no row: the version moved on or the row is gone.
    #[error("write matched no row at the expected version")]
    Concurrency,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("database: {0}")]
    Db(sqlx::Error),
}

impl StoreError {
    pub fn integrity(kind: IntegrityKind, detail: impl Into<String>) -> Self {
        StoreError::Integrity {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let kind = match db.kind() {
                ErrorKind::UniqueViolation => Some(IntegrityKind::DuplicateKey),
                ErrorKind::ForeignKeyViolation => Some(IntegrityKind::ForeignKey),
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => Some(IntegrityKind::Constraint),
                // SQLSTATE class 22: data exceptions such as a value too long for its column.
                _ if db.code().is_some_and(|c| c.starts_with("22")) => Some(IntegrityKind::Constraint),
                _ => None,
            };
            if let Some(kind) = kind {
                return StoreError::integrity(kind, db.message());
            }
        }
        StoreError::Db(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// One request's view of the store. Dropping it releases the underlying connection.
#[async_trait]
pub trait Session: Send {
    /// Every row of the entity's table, ordered by key.
    async fn list<E: Entity>(&mut self) -> Result<Vec<Snapshot<E>>, StoreError>;

    /// Row by key; `None` when absent.
    async fn find<E: Entity>(&mut self, key: &E::Key) -> Result<Option<Snapshot<E>>, StoreError>;

    /// Insert one row. Store-assigned keys replace whatever key the entity carried.
    async fn insert<E: Entity>(&mut self, entity: E) -> Result<Snapshot<E>, StoreError>;

    /// Overwrite every field of the row with the entity's key, if it still sits at `expected`.
    /// Returns the new version, or [`StoreError::Concurrency`] when no row matched.
    async fn replace<E: Entity>(
        &mut self,
        entity: E,
        expected: RowVersion,
    ) -> Result<RowVersion, StoreError>;

    /// Delete by key. `Ok(false)` when there was no such row.
    async fn remove<E: Entity>(&mut self, key: &E::Key) -> Result<bool, StoreError>;

    /// Whether a row with this key exists right now.
    async fn exists<E: Entity>(&mut self, key: &E::Key) -> Result<bool, StoreError>;
}

/// Thread-safe source of sessions, shared by all requests.
#[async_trait]
pub trait StoreFactory: Clone + Send + Sync + 'static {
    type Session: Session;

    async fn open(&self) -> Result<Self::Session, StoreError>;

    /// Cheap liveness probe for readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
