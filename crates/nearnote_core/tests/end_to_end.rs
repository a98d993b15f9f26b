mod common;

use common::{harness, harness_with, region_ids, MonitorCall};
use nearnote_core::{
    distance_m, GeofenceEvent, HandleOutcome, KeyValueStore, Memory, PermissionSnapshot,
};

#[test]
fn haversine_fixture_is_about_111_meters() {
    let d = distance_m(37.5665, 126.9780, 37.5675, 126.9780);
    assert!((d - 111.0).abs() <= 2.0, "got {d}");
    assert_eq!(distance_m(37.5665, 126.9780, 37.5665, 126.9780), 0.0);
    assert_eq!(
        distance_m(37.5665, 126.9780, 37.5675, 126.9790),
        distance_m(37.5675, 126.9790, 37.5665, 126.9780)
    );
}

#[test]
fn create_register_enter_twice_dispatches_once() {
    let h = harness();
    let memory = h
        .engine
        .create_memory(Memory::new("first date spot", 37.50, 127.00, "2024-03-01"))
        .unwrap();

    let regions = h.engine.monitored_regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].identifier, memory.id.to_string());

    let event = GeofenceEvent::enter((&regions[0]).into());
    assert_eq!(
        h.engine.handle_geofence_event(&event),
        HandleOutcome::Notified(memory.id)
    );
    assert_eq!(h.engine.notified_ids(), vec![memory.id.to_string()]);

    h.engine.handle_geofence_event(&event);
    assert_eq!(h.channel.send_count(), 1);
}

#[test]
fn deleting_every_memory_stops_monitoring() {
    let h = harness();
    let first = h
        .engine
        .create_memory(Memory::new("a", 37.50, 127.00, ""))
        .unwrap();
    let second = h
        .engine
        .create_memory(Memory::new("b", 37.51, 127.00, ""))
        .unwrap();
    assert_eq!(h.engine.monitored_regions().len(), 2);

    assert!(h.engine.delete_memory(first.id).unwrap());
    assert_eq!(h.engine.monitored_regions().len(), 1);
    assert!(h.engine.delete_memory(second.id).unwrap());

    assert_eq!(h.monitor.calls().last(), Some(&MonitorCall::Stop));
    assert!(!h.engine.status().is_running);
    assert!(!h.engine.delete_memory(second.id).unwrap());
}

#[test]
fn toggling_importance_changes_copy_but_not_regions() {
    let h = harness();
    let memory = h
        .engine
        .create_memory(Memory::new("museum", 37.50, 127.00, ""))
        .unwrap();
    let calls_before = h.monitor.calls().len();

    let toggled = h.engine.toggle_important(memory.id).unwrap();
    assert!(toggled.is_important);
    assert_eq!(h.monitor.calls().len(), calls_before);

    let region = h.engine.monitored_regions().remove(0);
    h.engine
        .handle_geofence_event(&GeofenceEvent::enter((&region).into()));
    assert_eq!(h.channel.sent()[0].title, "⭐ An important memory is nearby!");
}

#[test]
fn bootstrap_without_background_permission_stays_foreground_only() {
    let foreground_only = PermissionSnapshot {
        foreground_location: true,
        background_location: false,
        notifications: true,
    };
    let h = harness_with(foreground_only);
    let memory = Memory::new("seeded", 37.5, 127.0, "");
    let blob = serde_json::to_vec(&vec![memory.clone()]).unwrap();
    h.kv.set("memories", &blob).unwrap();

    assert!(!h.engine.bootstrap_geofences());
    assert!(h.monitor.calls().is_empty());
    assert_eq!(h.engine.memories(), vec![memory.clone()]);

    h.engine.update_permissions(PermissionSnapshot::all_granted());
    let regions = h.monitor.running_regions().expect("granting should bootstrap");
    assert_eq!(regions[0].identifier, memory.id.to_string());
}

#[test]
fn status_reports_task_and_monitoring_state() {
    let h = harness();
    let status = h.engine.status();
    assert_eq!(status.task_name, "MEMORY_GEOFENCING_TASK");
    assert!(status.task_defined);
    assert!(!status.is_running);
    assert!(status.background_permission);
    assert_eq!(status.monitored_region_count, 0);

    h.engine
        .create_memory(Memory::new("gallery", 37.5, 127.0, ""))
        .unwrap();
    let status = h.engine.status();
    assert!(status.is_running);
    assert_eq!(status.monitored_region_count, 1);
    assert!(h.permissions.snapshot().notifications);
}

#[test]
fn stop_geofencing_halts_the_monitor() {
    let h = harness();
    h.engine
        .create_memory(Memory::new("pier", 37.5, 127.0, ""))
        .unwrap();
    assert!(h.engine.stop_geofencing());
    assert!(h.monitor.running_regions().is_none());
    assert!(h.engine.monitored_regions().is_empty());
}

#[test]
fn create_in_foreground_only_mode_never_reports_monitoring() {
    let h = harness_with(PermissionSnapshot {
        foreground_location: true,
        background_location: false,
        notifications: true,
    });
    h.engine
        .create_memory(Memory::new("museum", 37.5, 127.0, ""))
        .unwrap();

    assert!(h.monitor.calls().is_empty());
    let status = h.engine.status();
    assert!(!status.is_running);
    assert_eq!(status.monitored_region_count, 0);
}

#[test]
fn delete_before_create_and_create_before_delete_leave_no_orphans() {
    let h = harness();
    let anchor = h
        .engine
        .create_memory(Memory::new("anchor", 37.40, 127.0, ""))
        .unwrap();

    let early = Memory::new("early delete", 37.50, 127.0, "");
    assert!(!h.engine.delete_memory(early.id).unwrap());
    h.engine.create_memory(early.clone()).unwrap();
    let mut expected = vec![anchor.id.to_string(), early.id.to_string()];
    expected.sort();
    assert_eq!(region_ids(&h.engine.monitored_regions()), expected);

    let late = Memory::new("late delete", 37.60, 127.0, "");
    h.engine.create_memory(late.clone()).unwrap();
    assert!(h.engine.delete_memory(late.id).unwrap());
    assert_eq!(region_ids(&h.engine.monitored_regions()), expected);
}

#[test]
fn racing_create_and_delete_never_leave_an_orphan_region() {
    let h = harness();
    let memories: Vec<Memory> = (0..40)
        .map(|i| Memory::new(format!("race {i}"), 37.0 + f64::from(i) * 0.01, 127.0, ""))
        .collect();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for memory in &memories {
                h.engine.create_memory(memory.clone()).unwrap();
            }
        });
        scope.spawn(|| {
            for memory in &memories {
                while !h.engine.delete_memory(memory.id).unwrap() {
                    std::thread::yield_now();
                }
            }
        });
    });

    assert!(h.engine.memories().is_empty());
    assert!(h.engine.monitored_regions().is_empty());
    assert!(h.monitor.running_regions().is_none());
}
