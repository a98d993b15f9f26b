//! Core of NearNote: decides when a user has arrived close enough to a
//! geo-anchored memory to reveal it, in the foreground (location fixes) and
//! in the background (OS region-monitor callbacks).
//! This crate is the single source of truth for dedup and region invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod geo;
pub mod geofence;
pub mod kv;
pub mod logging;
pub mod model;
pub mod notify;
pub mod permissions;
pub mod store;
pub mod text;
pub mod watch;

pub use config::{ConfigError, EngineConfig};
pub use engine::{EngineCollaborators, EngineError, GeofencingStatus, ProximityEngine};
pub use geo::distance::distance_m;
pub use geofence::handler::{GeofenceEventHandler, HandleOutcome};
pub use geofence::monitor::{MonitorError, RegionMonitor};
pub use geofence::registry::GeofenceRegistry;
pub use geofence::task::{
    define_geofence_task, GeofenceTask, InProcessTaskHost, TaskHost, TaskHostError,
    TaskRegistration,
};
pub use kv::{InMemoryKvStore, KeyLocks, KeyValueStore, KvError, KvResult, SqliteKvStore};
pub use logging::{default_log_level, init_logging, LogLevel, LogSettings, LoggingError};
pub use model::memory::{Memory, MemoryId, MemoryValidationError};
pub use model::region::{EventRegion, GeofenceEvent, GeofenceEventType, GeofenceRegion, LocationFix};
pub use notify::content::{NotificationContent, NotificationPayload};
pub use notify::dispatcher::{
    ChannelError, NotificationChannel, NotificationDispatcher, QueuedNotificationChannel,
};
pub use permissions::{PermissionGate, PermissionSnapshot};
pub use store::memory_store::{MemoryMutation, MemoryStore};
pub use store::notified_ledger::{LedgerError, NotifiedLedger, Recorded};
pub use store::{StoreError, StoreResult};
pub use watch::proximity::{AlertPresenter, ForegroundAlert, ProximityWatcher, QueuedAlertPresenter};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
