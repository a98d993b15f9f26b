//! Region-monitor bridge for the OS monitor living on the Dart side.
//!
//! # Invariants
//! - Only the latest monitor command is kept; every command is a full
//!   replacement, so older pending commands are obsolete.

use nearnote_core::{GeofenceRegion, MonitorError, RegionMonitor};
use std::sync::{Mutex, PoisonError};

/// Command the host must forward to the OS region monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorCommand {
    Start(Vec<GeofenceRegion>),
    Stop,
}

#[derive(Debug, Default)]
struct MonitorState {
    pending: Option<MonitorCommand>,
    running: bool,
}

/// Region monitor whose commands are pulled by the host.
#[derive(Debug, Default)]
pub struct HostRegionMonitor {
    state: Mutex<MonitorState>,
}

impl HostRegionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the pending command, if any.
    pub fn take_pending(&self) -> Option<MonitorCommand> {
        self.lock().pending.take()
    }

    /// Host report of the OS monitor state (e.g. after the OS dropped
    /// monitoring or rejected a command).
    pub fn report_running(&self, running: bool) {
        self.lock().running = running;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegionMonitor for HostRegionMonitor {
    fn start_monitoring(&self, regions: &[GeofenceRegion]) -> Result<(), MonitorError> {
        let mut state = self.lock();
        state.pending = Some(MonitorCommand::Start(regions.to_vec()));
        state.running = true;
        Ok(())
    }

    fn stop_monitoring(&self) -> Result<(), MonitorError> {
        let mut state = self.lock();
        state.pending = Some(MonitorCommand::Stop);
        state.running = false;
        Ok(())
    }

    fn has_started(&self) -> Result<bool, MonitorError> {
        Ok(self.lock().running)
    }
}
