//! Memory collection persisted as one JSON document.
//!
//! # Invariants
//! - `list_all` preserves insertion order.
//! - Ids are unique within the collection.
//! - Position and text are never rewritten; the only in-place mutation is the
//!   importance flag.

use crate::kv::{KeyLocks, KeyValueStore, MEMORIES_KEY};
use crate::model::memory::{Memory, MemoryId};
use crate::store::{StoreError, StoreResult};
use log::{error, warn};
use std::sync::Arc;

/// The only in-place changes a stored memory accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMutation {
    SetImportant(bool),
    ToggleImportant,
}

impl MemoryMutation {
    fn apply(self, memory: &mut Memory) {
        match self {
            Self::SetImportant(value) => memory.is_important = value,
            Self::ToggleImportant => memory.is_important = !memory.is_important,
        }
    }
}

/// Handle to the persisted memory collection.
///
/// Cheap to clone; clones share the same backing store and key locks.
#[derive(Clone)]
pub struct MemoryStore {
    kv: Arc<dyn KeyValueStore>,
    locks: Arc<KeyLocks>,
}

impl MemoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, locks: Arc<KeyLocks>) -> Self {
        Self { kv, locks }
    }

    /// Returns every memory in insertion order.
    ///
    /// Never fails: transport errors are logged and read as empty.
    pub fn list_all(&self) -> Vec<Memory> {
        match self.try_list_all() {
            Ok(memories) => memories,
            Err(err) => {
                error!(
                    "event=memories_list module=store status=error error_code=kv_read_failed error={err}"
                );
                Vec::new()
            }
        }
    }

    /// Like [`MemoryStore::list_all`], but reports transport failures so
    /// callers can tell "nothing stored" from "could not read".
    ///
    /// Missing or corrupt data is still `Ok(vec![])`.
    pub fn try_list_all(&self) -> StoreResult<Vec<Memory>> {
        self.load()
    }

    /// Looks up one memory by id.
    pub fn get(&self, id: MemoryId) -> StoreResult<Option<Memory>> {
        Ok(self.load()?.into_iter().find(|memory| memory.id == id))
    }

    /// Validates and appends a memory at the end of the collection.
    pub fn append(&self, memory: Memory) -> StoreResult<()> {
        memory.validate()?;
        self.locks.with_lock(MEMORIES_KEY, || {
            let mut memories = self.load()?;
            if memories.iter().any(|existing| existing.id == memory.id) {
                return Err(StoreError::DuplicateId(memory.id));
            }
            memories.push(memory);
            self.save(&memories)
        })
    }

    /// Applies `mutation` to the memory with `id` and returns the updated record.
    pub fn update_field(&self, id: MemoryId, mutation: MemoryMutation) -> StoreResult<Memory> {
        self.locks.with_lock(MEMORIES_KEY, || {
            let mut memories = self.load()?;
            let memory = memories
                .iter_mut()
                .find(|memory| memory.id == id)
                .ok_or(StoreError::NotFound(id))?;
            mutation.apply(memory);
            let updated = memory.clone();
            self.save(&memories)?;
            Ok(updated)
        })
    }

    /// Removes the memory with `id`. Returns whether anything was removed.
    pub fn remove(&self, id: MemoryId) -> StoreResult<bool> {
        self.locks.with_lock(MEMORIES_KEY, || {
            let mut memories = self.load()?;
            let before = memories.len();
            memories.retain(|memory| memory.id != id);
            if memories.len() == before {
                return Ok(false);
            }
            self.save(&memories)?;
            Ok(true)
        })
    }

    fn load(&self) -> StoreResult<Vec<Memory>> {
        let Some(bytes) = self.kv.get(MEMORIES_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice::<Vec<Memory>>(&bytes) {
            Ok(memories) => Ok(memories),
            Err(err) => {
                warn!(
                    "event=memories_load module=store status=degraded error_code=corrupt_blob bytes={} error={err}",
                    bytes.len()
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, memories: &[Memory]) -> StoreResult<()> {
        let bytes = serde_json::to_vec(memories).map_err(StoreError::Encode)?;
        self.kv.set(MEMORIES_KEY, &bytes)?;
        Ok(())
    }
}
