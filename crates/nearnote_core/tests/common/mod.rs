#![allow(dead_code)]

use nearnote_core::{
    AlertPresenter, ChannelError, EngineCollaborators, EngineConfig, ForegroundAlert,
    GeofenceRegion, InMemoryKvStore, InProcessTaskHost, KeyValueStore, KvError, KvResult,
    MonitorError,
    NotificationChannel, NotificationContent, PermissionGate, PermissionSnapshot,
    ProximityEngine, RegionMonitor,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum MonitorCall {
    Start(Vec<GeofenceRegion>),
    Stop,
}

/// Region monitor double that records every call and mirrors the OS state.
#[derive(Default)]
pub struct RecordingMonitor {
    calls: Mutex<Vec<MonitorCall>>,
    running: Mutex<Option<Vec<GeofenceRegion>>>,
    fail_next: AtomicBool,
}

impl RecordingMonitor {
    pub fn calls(&self) -> Vec<MonitorCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn running_regions(&self) -> Option<Vec<GeofenceRegion>> {
        self.running.lock().unwrap().clone()
    }

    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }
}

impl RegionMonitor for RecordingMonitor {
    fn start_monitoring(&self, regions: &[GeofenceRegion]) -> Result<(), MonitorError> {
        if self.take_failure() {
            return Err(MonitorError::PermissionDenied);
        }
        self.calls
            .lock()
            .unwrap()
            .push(MonitorCall::Start(regions.to_vec()));
        *self.running.lock().unwrap() = Some(regions.to_vec());
        Ok(())
    }

    fn stop_monitoring(&self) -> Result<(), MonitorError> {
        if self.take_failure() {
            return Err(MonitorError::Unavailable("os refused".to_string()));
        }
        self.calls.lock().unwrap().push(MonitorCall::Stop);
        *self.running.lock().unwrap() = None;
        Ok(())
    }

    fn has_started(&self) -> Result<bool, MonitorError> {
        Ok(self.running.lock().unwrap().is_some())
    }
}

/// Notification channel double that records sends.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<NotificationContent>>,
    broken: AtomicBool,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<NotificationContent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn break_channel(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }
}

impl NotificationChannel for RecordingChannel {
    fn send(&self, content: &NotificationContent) -> Result<(), ChannelError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ChannelError::Unavailable("channel closed".to_string()));
        }
        self.sent.lock().unwrap().push(content.clone());
        Ok(())
    }
}

/// Alert presenter double.
#[derive(Default)]
pub struct RecordingPresenter {
    alerts: Mutex<Vec<ForegroundAlert>>,
}

impl RecordingPresenter {
    pub fn alerts(&self) -> Vec<ForegroundAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertPresenter for RecordingPresenter {
    fn present(&self, alert: &ForegroundAlert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

/// Key-value double whose reads of one chosen key can be made to fail.
#[derive(Default)]
pub struct FlakyKvStore {
    inner: InMemoryKvStore,
    failing_key: Mutex<Option<String>>,
}

impl FlakyKvStore {
    pub fn fail_reads_of(&self, key: &str) {
        *self.failing_key.lock().unwrap() = Some(key.to_string());
    }

    fn reads_fail(&self, key: &str) -> bool {
        self.failing_key.lock().unwrap().as_deref() == Some(key)
    }
}

impl KeyValueStore for FlakyKvStore {
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        if self.reads_fail(key) {
            return Err(KvError::Unavailable(format!("read of `{key}` refused")));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.inner.remove(key)
    }
}

pub struct Harness {
    pub engine: ProximityEngine,
    pub kv: Arc<FlakyKvStore>,
    pub monitor: Arc<RecordingMonitor>,
    pub channel: Arc<RecordingChannel>,
    pub presenter: Arc<RecordingPresenter>,
    pub task_host: Arc<InProcessTaskHost>,
    pub permissions: Arc<PermissionGate>,
}

pub fn harness() -> Harness {
    harness_with(PermissionSnapshot::all_granted())
}

pub fn harness_with(permissions: PermissionSnapshot) -> Harness {
    let kv = Arc::new(FlakyKvStore::default());
    let monitor = Arc::new(RecordingMonitor::default());
    let channel = Arc::new(RecordingChannel::default());
    let presenter = Arc::new(RecordingPresenter::default());
    let task_host = Arc::new(InProcessTaskHost::new());
    let permissions = Arc::new(PermissionGate::new(permissions));

    let kv_dyn: Arc<dyn KeyValueStore> = kv.clone();
    let engine = ProximityEngine::start(
        EngineConfig::default(),
        EngineCollaborators {
            kv: kv_dyn,
            monitor: monitor.clone(),
            notifications: channel.clone(),
            alerts: presenter.clone(),
            task_host: task_host.clone(),
            permissions: permissions.clone(),
        },
    )
    .expect("engine should start");

    Harness {
        engine,
        kv,
        monitor,
        channel,
        presenter,
        task_host,
        permissions,
    }
}

pub fn region_ids(regions: &[GeofenceRegion]) -> Vec<String> {
    let mut ids = regions
        .iter()
        .map(|region| region.identifier.clone())
        .collect::<Vec<_>>();
    ids.sort();
    ids
}
