//! Persisted set of identifiers that already fired a background notification.
//!
//! # Invariants
//! - Entries are only added by [`NotifiedLedger::record_once`], i.e. from an
//!   Enter event that reached dispatch.
//! - Entries are never removed individually; only [`NotifiedLedger::clear`]
//!   empties the set.
//! - Check, dispatch and write happen in one critical section, so two
//!   concurrent Enter events for one id dispatch at most once.

use crate::kv::{KeyLocks, KeyValueStore, KvError, NOTIFIED_MEMORY_IDS_KEY};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result of a guarded ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded<T> {
    /// The identifier was already present; the action did not run.
    AlreadyPresent,
    /// The action ran but declined to record (returned `None`).
    Skipped,
    /// The action ran and the identifier is now persisted.
    Recorded(T),
}

/// Handle to the persisted notified-identifier set.
#[derive(Clone)]
pub struct NotifiedLedger {
    kv: Arc<dyn KeyValueStore>,
    locks: Arc<KeyLocks>,
}

impl NotifiedLedger {
    pub fn new(kv: Arc<dyn KeyValueStore>, locks: Arc<KeyLocks>) -> Self {
        Self { kv, locks }
    }

    /// Returns every recorded identifier in recording order.
    pub fn list(&self) -> LedgerResult<Vec<String>> {
        self.load()
    }

    pub fn contains(&self, identifier: &str) -> LedgerResult<bool> {
        Ok(self.load()?.iter().any(|entry| entry == identifier))
    }

    /// Runs `action` only if `identifier` is absent, then persists
    /// `identifier` when `action` returns `Some`.
    ///
    /// The write happens once `action` has returned, whatever its value says
    /// about delivery; there is no rollback.
    pub fn record_once<T>(
        &self,
        identifier: &str,
        action: impl FnOnce() -> Option<T>,
    ) -> LedgerResult<Recorded<T>> {
        self.locks.with_lock(NOTIFIED_MEMORY_IDS_KEY, || {
            let mut entries = self.load()?;
            if entries.iter().any(|entry| entry == identifier) {
                return Ok(Recorded::AlreadyPresent);
            }
            let Some(value) = action() else {
                return Ok(Recorded::Skipped);
            };
            entries.push(identifier.to_string());
            self.save(&entries)?;
            Ok(Recorded::Recorded(value))
        })
    }

    /// Maintenance: forgets every recorded identifier.
    pub fn clear(&self) -> LedgerResult<()> {
        self.locks.with_lock(NOTIFIED_MEMORY_IDS_KEY, || {
            self.kv.remove(NOTIFIED_MEMORY_IDS_KEY)?;
            info!("event=ledger_clear module=ledger status=ok");
            Ok(())
        })
    }

    fn load(&self) -> LedgerResult<Vec<String>> {
        let Some(bytes) = self.kv.get(NOTIFIED_MEMORY_IDS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(
                    "event=ledger_load module=ledger status=degraded error_code=corrupt_blob bytes={} error={err}",
                    bytes.len()
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, entries: &[String]) -> LedgerResult<()> {
        let bytes = serde_json::to_vec(entries).map_err(LedgerError::Encode)?;
        self.kv.set(NOTIFIED_MEMORY_IDS_KEY, &bytes)?;
        Ok(())
    }
}

/// Ledger persistence errors.
#[derive(Debug)]
pub enum LedgerError {
    Kv(KvError),
    Encode(serde_json::Error),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kv(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode ledger: {err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kv(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<KvError> for LedgerError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{NotifiedLedger, Recorded};
    use crate::kv::{InMemoryKvStore, KeyLocks, KeyValueStore, NOTIFIED_MEMORY_IDS_KEY};
    use std::sync::Arc;

    fn ledger() -> (NotifiedLedger, Arc<InMemoryKvStore>) {
        let kv = Arc::new(InMemoryKvStore::new());
        let ledger = NotifiedLedger::new(kv.clone(), Arc::new(KeyLocks::new()));
        (ledger, kv)
    }

    #[test]
    fn record_once_runs_action_only_for_new_identifiers() {
        let (ledger, _) = ledger();
        let mut runs = 0;
        let first = ledger
            .record_once("m1", || {
                runs += 1;
                Some(())
            })
            .unwrap();
        assert_eq!(first, Recorded::Recorded(()));

        let second = ledger
            .record_once("m1", || {
                runs += 1;
                Some(())
            })
            .unwrap();
        assert_eq!(second, Recorded::AlreadyPresent);
        assert_eq!(runs, 1);
    }

    #[test]
    fn skipped_action_leaves_ledger_unchanged() {
        let (ledger, _) = ledger();
        let outcome = ledger.record_once("m1", || None::<()>).unwrap();
        assert_eq!(outcome, Recorded::Skipped);
        assert!(ledger.list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_blob_reads_as_empty() {
        let (ledger, kv) = ledger();
        kv.set(NOTIFIED_MEMORY_IDS_KEY, b"{not json").unwrap();
        assert!(!ledger.contains("m1").unwrap());
    }

    #[test]
    fn clear_forgets_everything() {
        let (ledger, _) = ledger();
        ledger.record_once("m1", || Some(())).unwrap();
        ledger.record_once("m2", || Some(())).unwrap();
        assert_eq!(ledger.list().unwrap(), vec!["m1", "m2"]);

        ledger.clear().unwrap();
        assert!(ledger.list().unwrap().is_empty());
    }
}
