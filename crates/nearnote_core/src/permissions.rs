//! Host-reported permission state.
//!
//! The engine never requests permissions; the host pushes the latest grant
//! state here and the registry and dispatcher read it.

use log::info;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Grant state for the three permissions the engine depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSnapshot {
    pub foreground_location: bool,
    pub background_location: bool,
    pub notifications: bool,
}

impl PermissionSnapshot {
    pub fn all_granted() -> Self {
        Self {
            foreground_location: true,
            background_location: true,
            notifications: true,
        }
    }

    /// Background geofencing needs both location grants.
    pub fn allows_background_monitoring(&self) -> bool {
        self.foreground_location && self.background_location
    }
}

/// Shared, host-updated permission state. Everything starts denied.
#[derive(Debug, Default)]
pub struct PermissionGate {
    current: RwLock<PermissionSnapshot>,
}

impl PermissionGate {
    pub fn new(initial: PermissionSnapshot) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn snapshot(&self) -> PermissionSnapshot {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update(&self, next: PermissionSnapshot) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if *current != next {
            info!(
                "event=permissions_update module=permissions status=ok foreground={} background={} notifications={}",
                next.foreground_location, next.background_location, next.notifications
            );
        }
        *current = next;
    }
}
