//! Engine facade wiring storage, background geofencing and the foreground
//! watcher behind one process-wide handle.
//!
//! # Responsibility
//! - Enforce the startup order: define the background task, then build the
//!   registry, then allow registry mutations.
//! - Pair each memory mutation with its registry update.
//!
//! # Invariants
//! - `create_memory` appends before registering, `delete_memory` removes before
//!   unregistering, so the registry always derives from the updated store.
//! - Every store-mutation-plus-registry pair (and bootstrap) runs under one
//!   engine lock, so a create and a delete of the same memory never interleave.
//! - Background dedup (ledger) and foreground dedup (session set) stay
//!   independent.

use crate::config::{ConfigError, EngineConfig};
use crate::geofence::handler::{GeofenceEventHandler, HandleOutcome};
use crate::geofence::monitor::RegionMonitor;
use crate::geofence::registry::GeofenceRegistry;
use crate::geofence::task::{define_geofence_task, TaskHost, TaskHostError};
use crate::kv::{KeyLocks, KeyValueStore};
use crate::model::memory::{Memory, MemoryId};
use crate::model::region::{GeofenceEvent, GeofenceRegion, LocationFix};
use crate::notify::dispatcher::{NotificationChannel, NotificationDispatcher};
use crate::permissions::{PermissionGate, PermissionSnapshot};
use crate::store::memory_store::{MemoryMutation, MemoryStore};
use crate::store::notified_ledger::{LedgerError, NotifiedLedger};
use crate::store::StoreError;
use crate::watch::proximity::{AlertPresenter, ProximityWatcher};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// External collaborators the engine is built on.
pub struct EngineCollaborators {
    pub kv: Arc<dyn KeyValueStore>,
    pub monitor: Arc<dyn RegionMonitor>,
    pub notifications: Arc<dyn NotificationChannel>,
    pub alerts: Arc<dyn AlertPresenter>,
    pub task_host: Arc<dyn TaskHost>,
    pub permissions: Arc<PermissionGate>,
}

/// Diagnostic view of background geofencing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofencingStatus {
    pub task_name: String,
    pub task_defined: bool,
    pub is_running: bool,
    pub background_permission: bool,
    pub monitored_region_count: usize,
}

/// Proximity notification engine.
pub struct ProximityEngine {
    store: MemoryStore,
    ledger: NotifiedLedger,
    handler: Arc<GeofenceEventHandler>,
    registry: GeofenceRegistry,
    watcher: Mutex<ProximityWatcher>,
    region_mutations: Mutex<()>,
    task_host: Arc<dyn TaskHost>,
    permissions: Arc<PermissionGate>,
}

impl ProximityEngine {
    /// Builds the engine in startup order. Does not register any region;
    /// call [`ProximityEngine::bootstrap_geofences`] once afterwards.
    ///
    /// # Errors
    /// - Invalid config.
    /// - The task host refuses the background task definition.
    pub fn start(config: EngineConfig, deps: EngineCollaborators) -> Result<Self, EngineError> {
        config.validate()?;

        let locks = Arc::new(KeyLocks::new());
        let store = MemoryStore::new(Arc::clone(&deps.kv), Arc::clone(&locks));
        let ledger = NotifiedLedger::new(Arc::clone(&deps.kv), locks);
        let dispatcher =
            NotificationDispatcher::new(deps.notifications, Arc::clone(&deps.permissions));

        let handler = Arc::new(GeofenceEventHandler::new(
            store.clone(),
            ledger.clone(),
            dispatcher,
            config.notification_body_max_chars,
        ));
        let registration = define_geofence_task(
            deps.task_host.as_ref(),
            &config.task_name,
            handler.clone(),
        )?;

        let registry = GeofenceRegistry::new(
            registration,
            store.clone(),
            deps.monitor,
            Arc::clone(&deps.permissions),
            config.geofence_radius_m,
        );
        let watcher = ProximityWatcher::new(
            store.clone(),
            deps.alerts,
            config.foreground_alert_radius_m,
        );

        info!(
            "event=engine_start module=engine status=ok task={} foreground_radius_m={} geofence_radius_m={}",
            config.task_name, config.foreground_alert_radius_m, config.geofence_radius_m
        );
        Ok(Self {
            store,
            ledger,
            handler,
            registry,
            watcher: Mutex::new(watcher),
            region_mutations: Mutex::new(()),
            task_host: deps.task_host,
            permissions: deps.permissions,
        })
    }

    /// Name the background task was defined under (trimmed).
    pub fn task_name(&self) -> &str {
        self.registry.task_name()
    }

    /// Registers regions for every stored memory when background location is
    /// granted; otherwise stays in foreground-only mode.
    pub fn bootstrap_geofences(&self) -> bool {
        let _guard = self.lock_region_mutations();
        let memories = self.store.list_all();
        self.registry.register_all(&memories)
    }

    /// Persists a new memory and registers its region.
    ///
    /// A failed registration does not undo the append; the memory still
    /// alerts in the foreground and is picked up by the next bootstrap.
    pub fn create_memory(&self, memory: Memory) -> Result<Memory, EngineError> {
        let _guard = self.lock_region_mutations();
        self.store.append(memory.clone())?;
        self.registry.register_one(&memory);
        Ok(memory)
    }

    /// Deletes a memory and its region. Returns whether it existed.
    pub fn delete_memory(&self, id: MemoryId) -> Result<bool, EngineError> {
        let _guard = self.lock_region_mutations();
        let removed = self.store.remove(id)?;
        if removed {
            self.registry.unregister_one(id);
        }
        Ok(removed)
    }

    /// Flips the importance flag. Region geometry is unaffected.
    pub fn toggle_important(&self, id: MemoryId) -> Result<Memory, EngineError> {
        Ok(self
            .store
            .update_field(id, MemoryMutation::ToggleImportant)?)
    }

    pub fn memories(&self) -> Vec<Memory> {
        self.store.list_all()
    }

    /// Foreground tick for one fresh location fix.
    pub fn on_location_fix(&self, fix: LocationFix) -> Vec<MemoryId> {
        self.lock_watcher().on_fix(fix)
    }

    /// Explicit "reset location" action: re-arms foreground alerts.
    pub fn reset_session(&self) {
        self.lock_watcher().reset_session();
    }

    /// Direct entry point for a boundary event, equivalent to the host
    /// scheduler invoking the defined task.
    pub fn handle_geofence_event(&self, event: &GeofenceEvent) -> HandleOutcome {
        self.handler.handle(event)
    }

    /// Maintenance: returns every notified memory to the registered state.
    pub fn clear_notified(&self) -> Result<(), EngineError> {
        Ok(self.ledger.clear()?)
    }

    pub fn notified_ids(&self) -> Vec<String> {
        self.ledger.list().unwrap_or_else(|err| {
            error!("event=ledger_list module=engine status=error error={err}");
            Vec::new()
        })
    }

    /// Applies a host permission update. Gaining background location
    /// re-runs bootstrap so the engine leaves foreground-only mode.
    pub fn update_permissions(&self, next: PermissionSnapshot) {
        let previous = self.permissions.snapshot();
        self.permissions.update(next);
        if !previous.allows_background_monitoring() && next.allows_background_monitoring() {
            self.bootstrap_geofences();
        }
    }

    /// Stops background monitoring.
    pub fn stop_geofencing(&self) -> bool {
        self.registry.stop()
    }

    pub fn monitored_regions(&self) -> Vec<GeofenceRegion> {
        self.registry.monitored_regions()
    }

    pub fn status(&self) -> GeofencingStatus {
        GeofencingStatus {
            task_name: self.registry.task_name().to_string(),
            task_defined: self.task_host.is_task_defined(self.registry.task_name()),
            is_running: self.registry.is_running(),
            background_permission: self.permissions.snapshot().background_location,
            monitored_region_count: self.registry.monitored_regions().len(),
        }
    }

    fn lock_region_mutations(&self) -> MutexGuard<'_, ()> {
        self.region_mutations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_watcher(&self) -> MutexGuard<'_, ProximityWatcher> {
        self.watcher.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Engine-level failures surfaced to the host.
#[derive(Debug)]
pub enum EngineError {
    Config(ConfigError),
    TaskHost(TaskHostError),
    Store(StoreError),
    Ledger(LedgerError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::TaskHost(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Ledger(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::TaskHost(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Ledger(err) => Some(err),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TaskHostError> for EngineError {
    fn from(value: TaskHostError) -> Self {
        Self::TaskHost(value)
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<LedgerError> for EngineError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}
