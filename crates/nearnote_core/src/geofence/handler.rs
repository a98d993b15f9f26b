//! Background boundary-event handler.
//!
//! # Responsibility
//! - Turn an Enter event into one notification per memory, ever.
//! - Log Exit events and nothing else.
//!
//! # Invariants
//! - Ledger check, memory lookup, dispatch and ledger write run inside the
//!   ledger's critical section.
//! - The identifier is recorded once dispatch returns, whether or not delivery
//!   succeeded (at-most-once).
//! - `handle` never panics and never returns an error; a failure here must not
//!   tear down monitoring for other regions.

use crate::geofence::task::GeofenceTask;
use crate::model::memory::MemoryId;
use crate::model::region::{GeofenceEvent, GeofenceEventType};
use crate::notify::content::NotificationContent;
use crate::notify::dispatcher::NotificationDispatcher;
use crate::store::memory_store::MemoryStore;
use crate::store::notified_ledger::{NotifiedLedger, Recorded};
use log::{debug, error, info, warn};

/// What handling one event amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Notification delivered and identifier recorded.
    Notified(MemoryId),
    /// Dispatch returned `false`; identifier recorded anyway.
    DeliveryFailed(MemoryId),
    /// Identifier was already in the ledger; nothing dispatched.
    AlreadyNotified,
    /// No stored memory matches the identifier; ledger untouched.
    MemoryMissing,
    /// Exit event, logged only.
    ExitIgnored,
    /// A ledger or store failure; logged, ledger untouched.
    Failed,
}

#[derive(Clone, Copy)]
enum Skip {
    MemoryMissing,
    StoreFailed,
}

/// Handler the OS monitor wakes on boundary crossings.
#[derive(Clone)]
pub struct GeofenceEventHandler {
    store: MemoryStore,
    ledger: NotifiedLedger,
    dispatcher: NotificationDispatcher,
    body_max_chars: usize,
}

impl GeofenceEventHandler {
    pub fn new(
        store: MemoryStore,
        ledger: NotifiedLedger,
        dispatcher: NotificationDispatcher,
        body_max_chars: usize,
    ) -> Self {
        Self {
            store,
            ledger,
            dispatcher,
            body_max_chars,
        }
    }

    /// Handles one boundary event.
    pub fn handle(&self, event: &GeofenceEvent) -> HandleOutcome {
        let identifier = event.region.identifier.as_str();
        match event.event_type {
            GeofenceEventType::Enter => self.handle_enter(identifier),
            GeofenceEventType::Exit => {
                info!("event=geofence_exit module=geofence status=ok identifier={identifier}");
                HandleOutcome::ExitIgnored
            }
        }
    }

    fn handle_enter(&self, identifier: &str) -> HandleOutcome {
        debug!("event=geofence_enter module=geofence status=start identifier={identifier}");
        let mut skip = Skip::MemoryMissing;

        let recorded = self.ledger.record_once(identifier, || {
            let id = MemoryId::parse_str(identifier).ok()?;
            let memory = match self.store.get(id) {
                Ok(Some(memory)) => memory,
                Ok(None) => return None,
                Err(err) => {
                    error!(
                        "event=geofence_enter module=geofence status=error identifier={identifier} error_code=store_read_failed error={err}"
                    );
                    skip = Skip::StoreFailed;
                    return None;
                }
            };
            let content = NotificationContent::for_memory(&memory, self.body_max_chars);
            let delivered = self.dispatcher.dispatch(&content);
            Some((memory.id, delivered))
        });

        match recorded {
            Ok(Recorded::Recorded((id, true))) => {
                info!("event=geofence_enter module=geofence status=ok memory_id={id} delivered=true");
                HandleOutcome::Notified(id)
            }
            Ok(Recorded::Recorded((id, false))) => {
                warn!(
                    "event=geofence_enter module=geofence status=degraded memory_id={id} delivered=false"
                );
                HandleOutcome::DeliveryFailed(id)
            }
            Ok(Recorded::AlreadyPresent) => {
                debug!(
                    "event=geofence_enter module=geofence status=skip identifier={identifier} reason=already_notified"
                );
                HandleOutcome::AlreadyNotified
            }
            Ok(Recorded::Skipped) => match skip {
                Skip::MemoryMissing => {
                    info!(
                        "event=geofence_enter module=geofence status=skip identifier={identifier} reason=memory_missing"
                    );
                    HandleOutcome::MemoryMissing
                }
                Skip::StoreFailed => HandleOutcome::Failed,
            },
            Err(err) => {
                error!(
                    "event=geofence_enter module=geofence status=error identifier={identifier} error_code=ledger_failed error={err}"
                );
                HandleOutcome::Failed
            }
        }
    }
}

impl GeofenceTask for GeofenceEventHandler {
    fn on_event(&self, event: &GeofenceEvent) {
        let _ = self.handle(event);
    }
}
