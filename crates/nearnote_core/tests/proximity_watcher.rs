mod common;

use common::harness;
use nearnote_core::{
    GeofenceEvent, InMemoryKvStore, KeyLocks, LocationFix, Memory, MemoryStore, ProximityWatcher,
    QueuedAlertPresenter,
};
use std::sync::Arc;

const INSIDE: LocationFix = LocationFix {
    latitude: 37.5003,
    longitude: 127.0,
};
const OUTSIDE: LocationFix = LocationFix {
    latitude: 37.5010,
    longitude: 127.0,
};

fn watcher_with(memories: &[Memory]) -> (ProximityWatcher, Arc<QueuedAlertPresenter>) {
    let store = MemoryStore::new(Arc::new(InMemoryKvStore::new()), Arc::new(KeyLocks::new()));
    for memory in memories {
        store.append(memory.clone()).unwrap();
    }
    let presenter = Arc::new(QueuedAlertPresenter::new());
    let watcher = ProximityWatcher::new(store, presenter.clone(), 50.0);
    (watcher, presenter)
}

#[test]
fn in_out_in_within_one_session_alerts_once() {
    let memory = Memory::new("the old tree", 37.50, 127.00, "2024. 3. 1.");
    let (mut watcher, presenter) = watcher_with(&[memory.clone()]);

    assert_eq!(watcher.on_fix(INSIDE), vec![memory.id]);
    assert!(watcher.on_fix(OUTSIDE).is_empty());
    assert!(watcher.on_fix(INSIDE).is_empty());

    let alerts = presenter.drain();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].text, "the old tree");
    assert_eq!(alerts[0].created_at, "2024. 3. 1.");
    assert!(alerts[0].distance_m < 50.0);
}

#[test]
fn reset_rearms_every_memory() {
    let memory = Memory::new("fountain", 37.50, 127.00, "");
    let (mut watcher, presenter) = watcher_with(&[memory.clone()]);

    watcher.on_fix(INSIDE);
    watcher.reset_session();
    assert!(!watcher.was_alerted(memory.id));
    assert_eq!(watcher.on_fix(INSIDE), vec![memory.id]);
    assert_eq!(presenter.drain().len(), 2);
}

#[test]
fn fixes_outside_the_threshold_never_alert() {
    let memory = Memory::new("far away", 37.50, 127.00, "");
    let (mut watcher, presenter) = watcher_with(&[memory]);

    assert!(watcher.on_fix(OUTSIDE).is_empty());
    assert!(presenter.drain().is_empty());
}

#[test]
fn every_nearby_memory_alerts_in_store_order() {
    let first = Memory::new("first", 37.50, 127.00, "");
    let second = Memory::new("second", 37.5001, 127.00, "");
    let far = Memory::new("far", 37.60, 127.00, "");
    let (mut watcher, _presenter) = watcher_with(&[first.clone(), second.clone(), far]);

    assert_eq!(watcher.on_fix(INSIDE), vec![first.id, second.id]);
}

#[test]
fn invalid_fixes_alert_nothing_and_keep_memories_armed() {
    let near = Memory::new("near", 37.50, 127.00, "");
    let far = Memory::new("far", -33.80, 151.20, "");
    let (mut watcher, presenter) = watcher_with(&[near.clone(), far.clone()]);

    for fix in [
        LocationFix::new(f64::NAN, 127.0),
        LocationFix::new(37.5, f64::NAN),
        LocationFix::new(f64::INFINITY, 127.0),
        LocationFix::new(137.5, 127.0),
    ] {
        assert!(watcher.on_fix(fix).is_empty());
    }
    assert!(presenter.drain().is_empty());
    assert!(!watcher.was_alerted(near.id));
    assert!(!watcher.was_alerted(far.id));

    assert_eq!(watcher.on_fix(INSIDE), vec![near.id]);
}

#[test]
fn empty_store_is_quiet() {
    let (mut watcher, presenter) = watcher_with(&[]);
    assert!(watcher.on_fix(INSIDE).is_empty());
    assert!(presenter.drain().is_empty());
}

#[test]
fn foreground_and_background_dedup_are_independent() {
    let h = harness();
    let memory = h
        .engine
        .create_memory(Memory::new("riverside", 37.50, 127.00, ""))
        .unwrap();
    let region = h.engine.monitored_regions().remove(0);
    h.engine
        .handle_geofence_event(&GeofenceEvent::enter((&region).into()));
    assert_eq!(h.engine.notified_ids(), vec![memory.id.to_string()]);

    assert_eq!(h.engine.on_location_fix(INSIDE), vec![memory.id]);
    assert_eq!(h.presenter.alerts().len(), 1);

    h.engine.reset_session();
    assert_eq!(h.engine.on_location_fix(INSIDE), vec![memory.id]);
    assert_eq!(h.engine.notified_ids(), vec![memory.id.to_string()]);
    assert_eq!(h.channel.send_count(), 1);
}
