//! OS region-monitor contract.

use crate::model::region::GeofenceRegion;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Replace-all region monitor.
///
/// The OS primitive only knows "monitor exactly this set" and "stop"; there is
/// no incremental add or remove.
pub trait RegionMonitor: Send + Sync {
    /// Replaces the monitored set with `regions`.
    fn start_monitoring(&self, regions: &[GeofenceRegion]) -> Result<(), MonitorError>;
    /// Stops monitoring entirely.
    fn stop_monitoring(&self) -> Result<(), MonitorError>;
    /// Reports whether the OS currently has monitoring running.
    fn has_started(&self) -> Result<bool, MonitorError>;
}

/// Region monitor failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    PermissionDenied,
    Rejected(String),
    Unavailable(String),
}

impl Display for MonitorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "region monitoring permission denied"),
            Self::Rejected(message) => write!(f, "region monitor rejected request: {message}"),
            Self::Unavailable(message) => write!(f, "region monitor unavailable: {message}"),
        }
    }
}

impl Error for MonitorError {}
