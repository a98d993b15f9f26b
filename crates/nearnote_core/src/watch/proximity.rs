//! Foreground watcher run on every fresh location fix.
//!
//! # Responsibility
//! - Alert in-app for each memory closer than the foreground radius.
//! - Alert at most once per memory per watcher lifetime.
//!
//! # Invariants
//! - The session-alerted set lives in process memory only and is independent
//!   of the background notified ledger.
//! - `reset_session` re-arms every memory.

use crate::geo::distance::distance_m;
use crate::model::memory::{Memory, MemoryId};
use crate::model::region::LocationFix;
use crate::store::memory_store::MemoryStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Immediate in-app alert for a nearby memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForegroundAlert {
    pub memory_id: MemoryId,
    pub text: String,
    pub created_at: String,
    pub is_important: bool,
    pub distance_m: f64,
}

impl ForegroundAlert {
    fn new(memory: &Memory, distance_m: f64) -> Self {
        Self {
            memory_id: memory.id,
            text: memory.text.clone(),
            created_at: memory.created_at.clone(),
            is_important: memory.is_important,
            distance_m,
        }
    }
}

/// Alert-presentation collaborator.
pub trait AlertPresenter: Send + Sync {
    fn present(&self, alert: &ForegroundAlert);
}

/// Alert outbox the UI layer drains.
#[derive(Debug, Default)]
pub struct QueuedAlertPresenter {
    queue: Mutex<VecDeque<ForegroundAlert>>,
}

impl QueuedAlertPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<ForegroundAlert> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }
}

impl AlertPresenter for QueuedAlertPresenter {
    fn present(&self, alert: &ForegroundAlert) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.push_back(alert.clone());
    }
}

/// Foreground evaluator with a session-scoped dedup set.
pub struct ProximityWatcher {
    store: MemoryStore,
    presenter: Arc<dyn AlertPresenter>,
    threshold_m: f64,
    session_alerted: BTreeSet<MemoryId>,
}

impl ProximityWatcher {
    pub fn new(store: MemoryStore, presenter: Arc<dyn AlertPresenter>, threshold_m: f64) -> Self {
        Self {
            store,
            presenter,
            threshold_m,
            session_alerted: BTreeSet::new(),
        }
    }

    /// Evaluates one fix against every stored memory. Returns the ids alerted
    /// by this fix, in store order. Invalid fixes are dropped.
    pub fn on_fix(&mut self, fix: LocationFix) -> Vec<MemoryId> {
        if !fix.is_valid() {
            warn!(
                "event=proximity_tick module=watch status=skip reason=invalid_fix latitude={} longitude={}",
                fix.latitude, fix.longitude
            );
            return Vec::new();
        }
        let mut alerted = Vec::new();
        for memory in self.store.list_all() {
            let distance = distance_m(
                fix.latitude,
                fix.longitude,
                memory.latitude,
                memory.longitude,
            );
            if distance >= self.threshold_m || self.session_alerted.contains(&memory.id) {
                continue;
            }
            self.presenter
                .present(&ForegroundAlert::new(&memory, distance));
            self.session_alerted.insert(memory.id);
            info!(
                "event=proximity_alert module=watch status=ok memory_id={} distance_m={distance:.1}",
                memory.id
            );
            alerted.push(memory.id);
        }
        debug!(
            "event=proximity_tick module=watch status=ok alerted={} session_size={}",
            alerted.len(),
            self.session_alerted.len()
        );
        alerted
    }

    /// Forgets every session alert so the next approach alerts again.
    pub fn reset_session(&mut self) {
        let cleared = self.session_alerted.len();
        self.session_alerted.clear();
        info!("event=proximity_reset module=watch status=ok cleared={cleared}");
    }

    pub fn was_alerted(&self, id: MemoryId) -> bool {
        self.session_alerted.contains(&id)
    }
}
