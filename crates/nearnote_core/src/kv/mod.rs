//! Persisted key-value collaborator and per-key serialization.
//!
//! # Responsibility
//! - Define the `get`/`set`/`remove` contract the engine persists through.
//! - Provide SQLite-backed and process-memory implementations.
//! - Provide per-key critical sections for whole-blob read-modify-write.
//!
//! # Invariants
//! - Values are opaque bytes; callers own their serialization.
//! - Any read-modify-write of one logical key holds that key's lock for the
//!   whole cycle.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod locks;
mod memory;
mod sqlite;

pub use locks::KeyLocks;
pub use memory::InMemoryKvStore;
pub use sqlite::SqliteKvStore;

/// Logical key holding the ordered memory collection.
pub const MEMORIES_KEY: &str = "memories";
/// Logical key holding identifiers that already fired a background notification.
pub const NOTIFIED_MEMORY_IDS_KEY: &str = "notified-memory-ids";

pub type KvResult<T> = Result<T, KvError>;

/// Byte-oriented persisted store.
///
/// Implementations must be safe to share between the foreground path and the
/// background wake path.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored bytes, or `None` when the key was never written.
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;
    /// Replaces the value under `key`.
    fn set(&self, key: &str, value: &[u8]) -> KvResult<()>;
    /// Deletes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> KvResult<()>;
}

/// Transport failures of the key-value collaborator.
#[derive(Debug)]
pub enum KvError {
    Db(DbError),
    Unavailable(String),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "key-value store unavailable: {message}"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
