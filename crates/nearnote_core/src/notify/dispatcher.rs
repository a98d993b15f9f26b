//! Notification dispatch over the OS channel.
//!
//! # Invariants
//! - `dispatch` never panics and never returns an error; `false` means the
//!   notification could not be delivered this time.

use crate::notify::content::NotificationContent;
use crate::permissions::PermissionGate;
use log::{info, warn};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// OS local-notification channel.
pub trait NotificationChannel: Send + Sync {
    /// Schedules `content` for immediate display.
    fn send(&self, content: &NotificationContent) -> Result<(), ChannelError>;
}

/// Delivery channel failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    Unavailable(String),
    Rejected(String),
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "notification channel unavailable: {message}"),
            Self::Rejected(message) => write!(f, "notification rejected: {message}"),
        }
    }
}

impl Error for ChannelError {}

/// Thin sender in front of the OS channel.
#[derive(Clone)]
pub struct NotificationDispatcher {
    channel: Arc<dyn NotificationChannel>,
    permissions: Arc<PermissionGate>,
}

impl NotificationDispatcher {
    pub fn new(channel: Arc<dyn NotificationChannel>, permissions: Arc<PermissionGate>) -> Self {
        Self {
            channel,
            permissions,
        }
    }

    /// Sends `content` now. Returns `false` when permission is missing or the
    /// channel refuses.
    pub fn dispatch(&self, content: &NotificationContent) -> bool {
        let memory_id = content.payload.memory_id.as_str();
        if !self.permissions.snapshot().notifications {
            warn!(
                "event=notification_dispatch module=notify status=skip memory_id={memory_id} reason=permission_denied"
            );
            return false;
        }
        match self.channel.send(content) {
            Ok(()) => {
                info!("event=notification_dispatch module=notify status=ok memory_id={memory_id}");
                true
            }
            Err(err) => {
                warn!(
                    "event=notification_dispatch module=notify status=error memory_id={memory_id} error={err}"
                );
                false
            }
        }
    }
}

/// In-process outbox the host drains and forwards to the OS.
#[derive(Debug, Default)]
pub struct QueuedNotificationChannel {
    queue: Mutex<VecDeque<NotificationContent>>,
}

impl QueuedNotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes every queued notification, oldest first.
    pub fn drain(&self) -> Vec<NotificationContent> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.drain(..).collect()
    }
}

impl NotificationChannel for QueuedNotificationChannel {
    fn send(&self, content: &NotificationContent) -> Result<(), ChannelError> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.push_back(content.clone());
        Ok(())
    }
}
