//! Keeps the OS-monitored region set equal to the memory store.
//!
//! # Responsibility
//! - Derive one region per stored memory and submit the whole set on every
//!   change.
//! - Stop monitoring instead of submitting an empty set.
//!
//! # Invariants
//! - After a successful call, the submitted set equals
//!   `{region(m) : m in MemoryStore}` with exactly one region per identifier.
//! - A failed submission leaves the previously submitted set in place.
//! - No method returns an error or panics; failures are logged.

use crate::geofence::monitor::RegionMonitor;
use crate::geofence::task::TaskRegistration;
use crate::model::memory::{Memory, MemoryId};
use crate::model::region::GeofenceRegion;
use crate::permissions::PermissionGate;
use crate::store::memory_store::MemoryStore;
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Last state the OS monitor accepted.
#[derive(Debug, Clone, PartialEq)]
enum Submitted {
    Stopped,
    Monitoring(Vec<GeofenceRegion>),
}

/// Region registry in front of a replace-all OS monitor.
pub struct GeofenceRegistry {
    store: MemoryStore,
    monitor: Arc<dyn RegionMonitor>,
    permissions: Arc<PermissionGate>,
    registration: TaskRegistration,
    radius_m: f64,
    // Held across compute-and-submit so two mutations never interleave.
    submitted: Mutex<Submitted>,
}

impl GeofenceRegistry {
    /// Creates a registry. Requires the task registration produced by
    /// `define_geofence_task`, which enforces the startup order.
    pub fn new(
        registration: TaskRegistration,
        store: MemoryStore,
        monitor: Arc<dyn RegionMonitor>,
        permissions: Arc<PermissionGate>,
        radius_m: f64,
    ) -> Self {
        Self {
            store,
            monitor,
            permissions,
            registration,
            radius_m,
            submitted: Mutex::new(Submitted::Stopped),
        }
    }

    pub fn task_name(&self) -> &str {
        self.registration.task_name()
    }

    /// Registers (or re-registers) the region for `memory` and resubmits the
    /// full set. Returns whether the monitor accepted the new set.
    ///
    /// Skipped without background permission, and when `memory` is no longer
    /// in the store (a concurrent delete won), so no orphan region is ever
    /// submitted.
    pub fn register_one(&self, memory: &Memory) -> bool {
        if !self.permissions.snapshot().allows_background_monitoring() {
            debug!(
                "event=geofence_register module=geofence status=skip op=register_one memory_id={} reason=background_permission_missing",
                memory.id
            );
            return false;
        }

        let mut submitted = self.lock_submitted();
        let Some(stored) = self.stored_memories("register_one") else {
            return false;
        };
        if !stored.iter().any(|existing| existing.id == memory.id) {
            info!(
                "event=geofence_register module=geofence status=skip op=register_one memory_id={} reason=memory_missing",
                memory.id
            );
            return false;
        }
        let mut regions = self.regions_except(&stored, memory.id);
        regions.push(GeofenceRegion::for_memory(memory, self.radius_m));
        let accepted = self.submit(&mut submitted, regions, "register_one");
        if accepted {
            info!(
                "event=geofence_register module=geofence status=ok op=register_one memory_id={}",
                memory.id
            );
        }
        accepted
    }

    /// Bootstrap: submits regions for every memory in `memories`, but only when
    /// background location is granted. Otherwise a silent no-op that leaves the
    /// engine in foreground-only mode.
    pub fn register_all(&self, memories: &[Memory]) -> bool {
        let permissions = self.permissions.snapshot();
        if !permissions.allows_background_monitoring() {
            info!(
                "event=geofence_register module=geofence status=skip op=register_all reason=background_permission_missing"
            );
            return false;
        }

        let mut submitted = self.lock_submitted();
        let mut regions: Vec<GeofenceRegion> = Vec::with_capacity(memories.len());
        for memory in memories {
            let region = GeofenceRegion::for_memory(memory, self.radius_m);
            match regions
                .iter_mut()
                .find(|existing| existing.identifier == region.identifier)
            {
                Some(existing) => *existing = region,
                None => regions.push(region),
            }
        }
        if regions.is_empty() {
            debug!("event=geofence_register module=geofence status=skip op=register_all reason=no_memories");
            return self.stop_locked(&mut submitted, "register_all");
        }
        let count = regions.len();
        let accepted = self.submit(&mut submitted, regions, "register_all");
        if accepted {
            info!(
                "event=geofence_register module=geofence status=ok op=register_all region_count={count}"
            );
        }
        accepted
    }

    /// Drops the region for `id` and resubmits; stops monitoring when nothing
    /// is left. A no-op when monitoring is not running.
    pub fn unregister_one(&self, id: MemoryId) -> bool {
        let mut submitted = self.lock_submitted();
        if !self.is_running_locked(&submitted) {
            debug!(
                "event=geofence_unregister module=geofence status=skip memory_id={id} reason=not_running"
            );
            return true;
        }
        let Some(stored) = self.stored_memories("unregister_one") else {
            return false;
        };
        let regions = self.regions_except(&stored, id);
        let accepted = if regions.is_empty() {
            self.stop_locked(&mut submitted, "unregister_one")
        } else {
            self.submit(&mut submitted, regions, "unregister_one")
        };
        if accepted {
            info!("event=geofence_unregister module=geofence status=ok memory_id={id}");
        }
        accepted
    }

    /// Halts monitoring unconditionally.
    pub fn stop(&self) -> bool {
        let mut submitted = self.lock_submitted();
        self.stop_locked(&mut submitted, "stop")
    }

    /// Whether the OS reports monitoring as running. Falls back to the last
    /// accepted state when the monitor cannot answer.
    pub fn is_running(&self) -> bool {
        let submitted = self.lock_submitted();
        self.is_running_locked(&submitted)
    }

    /// Regions last accepted by the monitor; empty when stopped.
    pub fn monitored_regions(&self) -> Vec<GeofenceRegion> {
        match &*self.lock_submitted() {
            Submitted::Stopped => Vec::new(),
            Submitted::Monitoring(regions) => regions.clone(),
        }
    }

    fn lock_submitted(&self) -> MutexGuard<'_, Submitted> {
        self.submitted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_running_locked(&self, submitted: &Submitted) -> bool {
        match self.monitor.has_started() {
            Ok(running) => running,
            Err(err) => {
                warn!(
                    "event=geofence_status module=geofence status=degraded error_code=has_started_failed error={err}"
                );
                matches!(submitted, Submitted::Monitoring(_))
            }
        }
    }

    /// Current store contents. `None` when the store could not be read;
    /// submitting a partial set would drop live regions.
    fn stored_memories(&self, op: &str) -> Option<Vec<Memory>> {
        match self.store.try_list_all() {
            Ok(memories) => Some(memories),
            Err(err) => {
                error!(
                    "event=geofence_sync module=geofence status=error op={op} error_code=store_read_failed error={err}"
                );
                None
            }
        }
    }

    fn regions_except(&self, memories: &[Memory], excluded: MemoryId) -> Vec<GeofenceRegion> {
        memories
            .iter()
            .filter(|memory| memory.id != excluded)
            .map(|memory| GeofenceRegion::for_memory(memory, self.radius_m))
            .collect()
    }

    fn submit(&self, submitted: &mut Submitted, regions: Vec<GeofenceRegion>, op: &str) -> bool {
        match self.monitor.start_monitoring(&regions) {
            Ok(()) => {
                debug!(
                    "event=geofence_submit module=geofence status=ok op={op} region_count={}",
                    regions.len()
                );
                *submitted = Submitted::Monitoring(regions);
                true
            }
            Err(err) => {
                error!(
                    "event=geofence_submit module=geofence status=error op={op} region_count={} error={err}",
                    regions.len()
                );
                false
            }
        }
    }

    fn stop_locked(&self, submitted: &mut Submitted, op: &str) -> bool {
        match self.monitor.stop_monitoring() {
            Ok(()) => {
                info!("event=geofence_stop module=geofence status=ok op={op}");
                *submitted = Submitted::Stopped;
                true
            }
            Err(err) => {
                error!("event=geofence_stop module=geofence status=error op={op} error={err}");
                false
            }
        }
    }
}
