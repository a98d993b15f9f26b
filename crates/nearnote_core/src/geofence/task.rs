//! Background task definition and the two-phase startup token.
//!
//! Startup order is: build the event handler, define it with the task host
//! under a name, and only then construct the registry from the returned
//! [`TaskRegistration`]. The token cannot be built any other way.

use crate::model::region::GeofenceEvent;
use log::{error, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback the host scheduler invokes on a region boundary crossing.
pub trait GeofenceTask: Send + Sync {
    fn on_event(&self, event: &GeofenceEvent);
}

/// Host scheduler that owns background task definitions.
pub trait TaskHost: Send + Sync {
    fn define_task(&self, name: &str, task: Arc<dyn GeofenceTask>) -> Result<(), TaskHostError>;
    fn is_task_defined(&self, name: &str) -> bool;
}

/// Proof that the geofence task was defined with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRegistration {
    task_name: String,
}

impl TaskRegistration {
    pub fn task_name(&self) -> &str {
        &self.task_name
    }
}

/// Defines `task` with `host` under `task_name`.
///
/// This is the first phase of startup and must run before any region is
/// registered.
pub fn define_geofence_task(
    host: &dyn TaskHost,
    task_name: &str,
    task: Arc<dyn GeofenceTask>,
) -> Result<TaskRegistration, TaskHostError> {
    let task_name = task_name.trim();
    if task_name.is_empty() {
        return Err(TaskHostError::InvalidName(task_name.to_string()));
    }
    if let Err(err) = host.define_task(task_name, task) {
        error!("event=task_define module=geofence status=error task={task_name} error={err}");
        return Err(err);
    }
    info!("event=task_define module=geofence status=ok task={task_name}");
    Ok(TaskRegistration {
        task_name: task_name.to_string(),
    })
}

/// Task host failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskHostError {
    InvalidName(String),
    AlreadyDefined(String),
    Unavailable(String),
}

impl Display for TaskHostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "task name is invalid: `{name}`"),
            Self::AlreadyDefined(name) => write!(f, "task already defined: {name}"),
            Self::Unavailable(message) => write!(f, "task host unavailable: {message}"),
        }
    }
}

impl Error for TaskHostError {}

/// Task host living in this process; the host's OS wake callback forwards
/// events through [`InProcessTaskHost::deliver`].
#[derive(Default)]
pub struct InProcessTaskHost {
    tasks: RwLock<HashMap<String, Arc<dyn GeofenceTask>>>,
}

impl InProcessTaskHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invokes the task defined under `name`. Returns `false` when no task is
    /// defined, in which case the event is dropped.
    pub fn deliver(&self, name: &str, event: &GeofenceEvent) -> bool {
        let task = {
            let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
            tasks.get(name).cloned()
        };
        match task {
            Some(task) => {
                task.on_event(event);
                true
            }
            None => {
                warn!("event=task_deliver module=geofence status=skip task={name} reason=undefined");
                false
            }
        }
    }
}

impl TaskHost for InProcessTaskHost {
    fn define_task(&self, name: &str, task: Arc<dyn GeofenceTask>) -> Result<(), TaskHostError> {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        if tasks.contains_key(name) {
            return Err(TaskHostError::AlreadyDefined(name.to_string()));
        }
        tasks.insert(name.to_string(), task);
        Ok(())
    }

    fn is_task_defined(&self, name: &str) -> bool {
        let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
        tasks.contains_key(name)
    }
}
