//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Own the process-wide engine and expose it through stable sync calls.
//! - Bridge OS collaborators: the host applies monitor commands, drains
//!   notifications and alerts, forwards boundary events and permission state.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - `engine_init` defines the background task before any registry call, and
//!   must be called from the host's process-start path, not from a screen.
//! - Calls made before `engine_init` fail with a message instead of panicking.

use crate::host::{HostRegionMonitor, MonitorCommand};
use log::warn;
use nearnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EngineCollaborators, EngineConfig, EventRegion, ForegroundAlert, GeofenceEvent,
    GeofenceEventType, InProcessTaskHost, LocationFix, Memory, MemoryId, PermissionGate,
    PermissionSnapshot, ProximityEngine, QueuedAlertPresenter, QueuedNotificationChannel,
    SqliteKvStore,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

const ENGINE_DB_FILE_NAME: &str = "nearnote.sqlite3";
const ENGINE_DB_PATH_ENV: &str = "NEARNOTE_DB_PATH";
static RUNTIME: OnceLock<EngineRuntime> = OnceLock::new();

struct EngineRuntime {
    engine: ProximityEngine,
    monitor: Arc<HostRegionMonitor>,
    notifications: Arc<QueuedNotificationChannel>,
    alerts: Arc<QueuedAlertPresenter>,
    task_host: Arc<InProcessTaskHost>,
    db_path: PathBuf,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive); blank
///   uses the build default.
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Memory id the action applied to, when any.
    pub memory_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, memory_id: Option<String>) -> Self {
        Self {
            ok: true,
            memory_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            memory_id: None,
            message: message.into(),
        }
    }
}

/// Memory projection for list/map rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryItem {
    pub id: String,
    pub text: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: String,
    pub is_important: bool,
    pub color: Option<String>,
    pub rotation: Option<f64>,
}

/// Foreground alert the UI should present immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertItem {
    pub memory_id: String,
    pub text: String,
    pub created_at: String,
    pub is_important: bool,
    pub distance_m: f64,
}

/// Local notification the host should schedule immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationItem {
    pub title: String,
    pub body: String,
    pub memory_id: String,
}

/// Region the host should hand to the OS monitor.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionItem {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    pub notify_on_enter: bool,
    pub notify_on_exit: bool,
}

/// Pending monitor command. `start == false` means stop monitoring.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorCommandItem {
    pub start: bool,
    pub regions: Vec<RegionItem>,
}

/// Geofencing diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeofencingStatusItem {
    pub task_name: String,
    pub task_defined: bool,
    pub is_running: bool,
    pub background_permission: bool,
    pub monitored_region_count: u32,
    pub db_path: String,
}

/// Builds the process-wide engine and runs bootstrap registration.
///
/// Input semantics:
/// - `db_path`: SQLite file; blank falls back to `NEARNOTE_DB_PATH`, then to
///   the temp dir.
/// - `config_json`: engine config JSON; blank uses defaults.
/// - Permission flags: current grant state reported by the host.
///
/// # FFI contract
/// - Idempotent: later calls report the existing engine and change nothing.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn engine_init(
    db_path: String,
    config_json: String,
    foreground_location: bool,
    background_location: bool,
    notifications: bool,
) -> ActionResponse {
    if let Some(runtime) = RUNTIME.get() {
        return ActionResponse::success(
            format!("Engine already initialized at {}.", runtime.db_path.display()),
            None,
        );
    }

    let permissions = PermissionSnapshot {
        foreground_location,
        background_location,
        notifications,
    };
    let runtime = match build_runtime(resolve_db_path(&db_path), &config_json, permissions) {
        Ok(runtime) => runtime,
        Err(message) => return ActionResponse::failure(format!("engine_init failed: {message}")),
    };

    // A concurrent init may have won the race; its engine stays authoritative.
    let runtime = RUNTIME.get_or_init(|| runtime);
    let registered = runtime.engine.bootstrap_geofences();
    ActionResponse::success(
        if registered {
            "Engine initialized; background geofencing active."
        } else {
            "Engine initialized; foreground-only mode."
        },
        None,
    )
}

/// Pushes the host's current permission state.
#[flutter_rust_bridge::frb(sync)]
pub fn permissions_update(
    foreground_location: bool,
    background_location: bool,
    notifications: bool,
) -> ActionResponse {
    with_runtime("permissions_update", |runtime| {
        runtime.engine.update_permissions(PermissionSnapshot {
            foreground_location,
            background_location,
            notifications,
        });
        Ok(ActionResponse::success("Permissions updated.", None))
    })
}

/// Creates a memory at the given position and registers its geofence.
#[flutter_rust_bridge::frb(sync)]
pub fn memory_create(
    text: String,
    latitude: f64,
    longitude: f64,
    created_at: String,
    is_important: bool,
    color: Option<String>,
    rotation: Option<f64>,
) -> ActionResponse {
    with_runtime("memory_create", |runtime| {
        let mut memory =
            Memory::new(text.trim(), latitude, longitude, created_at).important(is_important);
        memory.color = color;
        memory.rotation = rotation;
        let created = runtime
            .engine
            .create_memory(memory)
            .map_err(|err| err.to_string())?;
        Ok(ActionResponse::success(
            "Memory created.",
            Some(created.id.to_string()),
        ))
    })
}

/// Deletes a memory and its geofence.
#[flutter_rust_bridge::frb(sync)]
pub fn memory_delete(memory_id: String) -> ActionResponse {
    with_runtime("memory_delete", |runtime| {
        let id = parse_memory_id(&memory_id)?;
        let removed = runtime
            .engine
            .delete_memory(id)
            .map_err(|err| err.to_string())?;
        let message = if removed {
            "Memory deleted."
        } else {
            "Memory was already gone."
        };
        Ok(ActionResponse::success(message, Some(memory_id.clone())))
    })
}

/// Flips a memory's importance flag.
#[flutter_rust_bridge::frb(sync)]
pub fn memory_toggle_important(memory_id: String) -> ActionResponse {
    with_runtime("memory_toggle_important", |runtime| {
        let id = parse_memory_id(&memory_id)?;
        let memory = runtime
            .engine
            .toggle_important(id)
            .map_err(|err| err.to_string())?;
        let message = if memory.is_important {
            "Marked important."
        } else {
            "Marked general."
        };
        Ok(ActionResponse::success(message, Some(memory_id.clone())))
    })
}

/// Lists memories in creation order. Empty before `engine_init`.
#[flutter_rust_bridge::frb(sync)]
pub fn memory_list() -> Vec<MemoryItem> {
    RUNTIME
        .get()
        .map(|runtime| {
            runtime
                .engine
                .memories()
                .into_iter()
                .map(to_memory_item)
                .collect()
        })
        .unwrap_or_default()
}

/// Foreground tick: evaluates one location fix and returns the alerts to show.
#[flutter_rust_bridge::frb(sync)]
pub fn location_fix(latitude: f64, longitude: f64) -> Vec<AlertItem> {
    let Some(runtime) = RUNTIME.get() else {
        warn!("event=ffi_call module=ffi status=skip call=location_fix reason=engine_not_initialized");
        return Vec::new();
    };
    runtime
        .engine
        .on_location_fix(LocationFix::new(latitude, longitude));
    runtime.alerts.drain().into_iter().map(to_alert_item).collect()
}

/// "Reset location": re-arms every memory for foreground alerting.
#[flutter_rust_bridge::frb(sync)]
pub fn location_reset() -> ActionResponse {
    with_runtime("location_reset", |runtime| {
        runtime.engine.reset_session();
        Ok(ActionResponse::success("Foreground alerts re-armed.", None))
    })
}

/// Forwards an OS boundary crossing to the defined background task.
///
/// `event_type` is `enter` or `exit` (case-insensitive).
#[flutter_rust_bridge::frb(sync)]
pub fn geofence_event(
    event_type: String,
    identifier: String,
    latitude: f64,
    longitude: f64,
    radius: f64,
) -> ActionResponse {
    with_runtime("geofence_event", |runtime| {
        let event_type = match event_type.trim().to_ascii_lowercase().as_str() {
            "enter" => GeofenceEventType::Enter,
            "exit" => GeofenceEventType::Exit,
            other => return Err(format!("unknown event type `{other}`")),
        };
        let event = GeofenceEvent {
            event_type,
            region: EventRegion {
                identifier: identifier.clone(),
                latitude,
                longitude,
                radius,
            },
        };
        if !runtime
            .task_host
            .deliver(runtime.engine.task_name(), &event)
        {
            return Err("geofence task is not defined".to_string());
        }
        Ok(ActionResponse::success("Event handled.", Some(identifier.clone())))
    })
}

/// Takes notifications queued by the background handler.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_drain() -> Vec<NotificationItem> {
    RUNTIME
        .get()
        .map(|runtime| {
            runtime
                .notifications
                .drain()
                .into_iter()
                .map(|content| NotificationItem {
                    title: content.title,
                    body: content.body,
                    memory_id: content.payload.memory_id,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Takes the latest region-monitor command, if the region set changed.
#[flutter_rust_bridge::frb(sync)]
pub fn geofence_take_command() -> Option<MonitorCommandItem> {
    let command = RUNTIME.get()?.monitor.take_pending()?;
    Some(match command {
        MonitorCommand::Start(regions) => MonitorCommandItem {
            start: true,
            regions: regions
                .into_iter()
                .map(|region| RegionItem {
                    identifier: region.identifier,
                    latitude: region.latitude,
                    longitude: region.longitude,
                    radius: region.radius,
                    notify_on_enter: region.notify_on_enter,
                    notify_on_exit: region.notify_on_exit,
                })
                .collect(),
        },
        MonitorCommand::Stop => MonitorCommandItem {
            start: false,
            regions: Vec::new(),
        },
    })
}

/// Host report of whether the OS monitor is actually running.
#[flutter_rust_bridge::frb(sync)]
pub fn geofence_report_running(running: bool) -> ActionResponse {
    with_runtime("geofence_report_running", |runtime| {
        runtime.monitor.report_running(running);
        Ok(ActionResponse::success("Monitor state recorded.", None))
    })
}

/// Maintenance: forgets which memories already notified in the background.
#[flutter_rust_bridge::frb(sync)]
pub fn notified_clear() -> ActionResponse {
    with_runtime("notified_clear", |runtime| {
        runtime
            .engine
            .clear_notified()
            .map_err(|err| err.to_string())?;
        Ok(ActionResponse::success("Notified memories cleared.", None))
    })
}

/// Background geofencing diagnostics. `None` before `engine_init`.
#[flutter_rust_bridge::frb(sync)]
pub fn geofencing_status() -> Option<GeofencingStatusItem> {
    let runtime = RUNTIME.get()?;
    let status = runtime.engine.status();
    Some(GeofencingStatusItem {
        task_name: status.task_name,
        task_defined: status.task_defined,
        is_running: status.is_running,
        background_permission: status.background_permission,
        monitored_region_count: u32::try_from(status.monitored_region_count)
            .unwrap_or(u32::MAX),
        db_path: runtime.db_path.display().to_string(),
    })
}

fn build_runtime(
    db_path: PathBuf,
    config_json: &str,
    permissions: PermissionSnapshot,
) -> Result<EngineRuntime, String> {
    let config = EngineConfig::from_json_str(config_json).map_err(|err| err.to_string())?;
    let kv = SqliteKvStore::open(&db_path).map_err(|err| format!("DB open failed: {err}"))?;

    let monitor = Arc::new(HostRegionMonitor::new());
    let notifications = Arc::new(QueuedNotificationChannel::new());
    let alerts = Arc::new(QueuedAlertPresenter::new());
    let task_host = Arc::new(InProcessTaskHost::new());

    let engine = ProximityEngine::start(
        config,
        EngineCollaborators {
            kv: Arc::new(kv),
            monitor: monitor.clone(),
            notifications: notifications.clone(),
            alerts: alerts.clone(),
            task_host: task_host.clone(),
            permissions: Arc::new(PermissionGate::new(permissions)),
        },
    )
    .map_err(|err| err.to_string())?;

    Ok(EngineRuntime {
        engine,
        monitor,
        notifications,
        alerts,
        task_host,
        db_path,
    })
}

fn resolve_db_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        return PathBuf::from(trimmed);
    }
    if let Ok(raw) = std::env::var(ENGINE_DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(ENGINE_DB_FILE_NAME)
}

fn with_runtime(
    call: &str,
    f: impl FnOnce(&EngineRuntime) -> Result<ActionResponse, String>,
) -> ActionResponse {
    let Some(runtime) = RUNTIME.get() else {
        return ActionResponse::failure(format!("{call} failed: engine not initialized"));
    };
    f(runtime).unwrap_or_else(|message| ActionResponse::failure(format!("{call} failed: {message}")))
}

fn parse_memory_id(raw: &str) -> Result<MemoryId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid memory id `{raw}`"))
}

fn to_memory_item(memory: Memory) -> MemoryItem {
    MemoryItem {
        id: memory.id.to_string(),
        text: memory.text,
        latitude: memory.latitude,
        longitude: memory.longitude,
        created_at: memory.created_at,
        is_important: memory.is_important,
        color: memory.color,
        rotation: memory.rotation,
    }
}

fn to_alert_item(alert: ForegroundAlert) -> AlertItem {
    AlertItem {
        memory_id: alert.memory_id.to_string(),
        text: alert.text,
        created_at: alert.created_at,
        is_important: alert.is_important,
        distance_m: alert.distance_m,
    }
}
