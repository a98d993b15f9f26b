//! Geofence region and boundary-event shapes exchanged with the OS monitor.
//!
//! # Invariants
//! - `GeofenceRegion::identifier` equals the owning memory id (string form).
//! - Regions notify on enter only.

use crate::model::memory::Memory;
use serde::{Deserialize, Serialize};

/// One circular region submitted to the OS region monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceRegion {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub notify_on_enter: bool,
    pub notify_on_exit: bool,
}

impl GeofenceRegion {
    /// Derives the region for `memory`, copying its position at call time.
    pub fn for_memory(memory: &Memory, radius_m: f64) -> Self {
        Self {
            identifier: memory.id.to_string(),
            latitude: memory.latitude,
            longitude: memory.longitude,
            radius: radius_m,
            notify_on_enter: true,
            notify_on_exit: false,
        }
    }
}

/// Boundary crossing direction reported by the OS monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeofenceEventType {
    Enter,
    Exit,
}

/// Region fields echoed back in a boundary event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRegion {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

/// Inbound callback payload from the OS region monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceEvent {
    pub event_type: GeofenceEventType,
    pub region: EventRegion,
}

impl GeofenceEvent {
    pub fn enter(region: EventRegion) -> Self {
        Self {
            event_type: GeofenceEventType::Enter,
            region,
        }
    }

    pub fn exit(region: EventRegion) -> Self {
        Self {
            event_type: GeofenceEventType::Exit,
            region,
        }
    }
}

impl From<&GeofenceRegion> for EventRegion {
    fn from(value: &GeofenceRegion) -> Self {
        Self {
            identifier: value.identifier.clone(),
            latitude: value.latitude,
            longitude: value.longitude,
            radius: value.radius,
        }
    }
}

/// One foreground location sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite WGS84 coordinates within range. Anything else cannot be compared
    /// against a memory position.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
