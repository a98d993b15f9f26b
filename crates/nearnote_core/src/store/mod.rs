//! Whole-blob persisted collections.
//!
//! # Responsibility
//! - `MemoryStore`: ordered memory collection under `memories`.
//! - `NotifiedLedger`: background-notified identifiers under
//!   `notified-memory-ids`.
//!
//! # Invariants
//! - Every mutation reads the full blob, applies one change and writes the full
//!   blob back inside the key's critical section.
//! - Missing or unparsable blobs read as empty collections.

use crate::kv::KvError;
use crate::model::memory::{MemoryId, MemoryValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory_store;
pub mod notified_ledger;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence errors surfaced by store mutations.
#[derive(Debug)]
pub enum StoreError {
    Kv(KvError),
    Encode(serde_json::Error),
    Validation(MemoryValidationError),
    NotFound(MemoryId),
    DuplicateId(MemoryId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kv(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode collection: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "memory not found: {id}"),
            Self::DuplicateId(id) => write!(f, "memory id already stored: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kv(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<KvError> for StoreError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

impl From<MemoryValidationError> for StoreError {
    fn from(value: MemoryValidationError) -> Self {
        Self::Validation(value)
    }
}
