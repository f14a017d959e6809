//! End-to-end reconciliation tests over the deterministic demo backend:
//! poll → cache ingest → filter pipeline → virtual window, and the
//! backend-window + local-cache trail merge, without a terminal.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};

use fleetpulse_console::{ConsoleApp, DemoBackend, FavoritesStore, FleetBackend, Poller};
use fleetpulse_core::{
    build_trail, compute_visible, visible_rows, FilterState, FilterTab, PositionCache,
    VehicleSnapshot, WaypointRole, ROW_BUFFER,
};

fn wait_until(app: &mut ConsoleApp, deadline: Duration, mut done: impl FnMut(&ConsoleApp) -> bool) {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        app.drain_events();
        if done(app) {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not reached within {deadline:?}");
}

#[test]
fn demo_poll_cycle_populates_the_console() {
    let dir = tempfile::tempdir().expect("tempdir");
    let favorites = FavoritesStore::load(dir.path().join("fav.json"));
    let poller = Poller::spawn(Box::new(DemoBackend::sample(42)), Duration::from_millis(50));
    let mut app = ConsoleApp::new(poller, favorites);

    wait_until(&mut app, Duration::from_secs(5), |app| {
        !app.visible().vehicles.is_empty()
    });

    let counts = app.visible().top_counts;
    assert_eq!(counts.total, 36);
    // Vehicle 0 reports a day-old timestamp, vehicle 1 reports none; the
    // remaining 34 are live.
    assert_eq!(counts.active, 34);
    assert_eq!(counts.inactive, 2);
}

#[test]
fn ingested_fleet_merges_with_backend_history_into_a_trail() {
    let backend = DemoBackend::sample(7);
    let mut cache = PositionCache::new();

    // Three poll ticks accumulate a local window.
    for _ in 0..3 {
        let fleet = backend.fetch_fleet().expect("demo fleet");
        let now_secs = Utc::now().timestamp();
        for v in &fleet {
            if let (Some(lat), Some(lng)) = (v.latitude, v.longitude) {
                cache.ingest(
                    v.door_code(),
                    lat,
                    lng,
                    v.last_location_time.as_deref().unwrap_or(""),
                    now_secs,
                );
            }
        }
    }

    let door = "B-005";
    let local = cache.history(door);
    assert!(!local.is_empty(), "demo vehicles move every tick");

    let backend_window = backend.fetch_history(door, 5);
    assert_eq!(backend_window.len(), 5);

    let trail = build_trail(&backend_window, local);
    let waypoints = trail.waypoints();
    // Whole merged set survives (no cross-source dedup) and is time-ordered.
    assert_eq!(waypoints.len(), backend_window.len() + local.len());
    assert!(
        waypoints
            .windows(2)
            .all(|w| w[0].sample.timestamp <= w[1].sample.timestamp)
    );
    assert_eq!(waypoints.first().map(|w| w.role), Some(WaypointRole::Start));
    assert_eq!(waypoints.last().map(|w| w.role), Some(WaypointRole::End));
}

#[test]
fn empty_windows_fall_back_to_last_known_point() {
    let cache = PositionCache::new();
    let trail = build_trail(&[], cache.history("B-404"));
    assert!(trail.is_empty());
}

#[test]
fn filter_search_and_window_stay_bounded_on_a_huge_fleet() {
    let now = Local::now().naive_local();
    let vehicles: Vec<VehicleSnapshot> = (0..50_000)
        .map(|i| VehicleSnapshot {
            vehicle_door_code: Some(format!("B-{i:05}")),
            operator_type: Some(if i % 2 == 0 { "iett" } else { "ozulas" }.to_owned()),
            last_location_date: Some(now.format("%d-%m-%Y").to_string()),
            last_location_time: Some(now.format("%H:%M:%S").to_string()),
            ..VehicleSnapshot::default()
        })
        .collect();

    let state = FilterState {
        tab: FilterTab::Active,
        search: "b0".to_owned(),
        ..FilterState::default()
    };
    let visible = compute_visible(&vehicles, &state, &HashSet::new(), now);
    assert!(!visible.vehicles.is_empty());
    assert_eq!(visible.top_counts.total, 50_000);

    // Scrolled to the middle of the filtered list, the materialized window
    // stays a small constant regardless of list length.
    let len = visible.vehicles.len();
    let row_height = 2;
    let viewport = 40;
    let scroll_top = (len as u64 * row_height) / 2;
    let window = visible_rows(len, row_height, viewport, scroll_top, ROW_BUFFER);
    assert!(window.len() <= (viewport / row_height) as usize + 2 * ROW_BUFFER + 1);
    assert_eq!(window.content_height, len as u64 * row_height);
}

#[test]
fn favorites_survive_a_reload_and_float_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fav.json");

    {
        let mut store = FavoritesStore::load(&path);
        store.toggle("B-010");
    }

    let store = FavoritesStore::load(&path);
    assert!(store.contains("B-010"));

    let backend = DemoBackend::sample(42);
    let fleet = backend.fetch_fleet().expect("demo fleet");
    let now = Local::now().naive_local();
    let visible = compute_visible(&fleet, &FilterState::default(), &store.as_set(), now);
    assert_eq!(visible.vehicles[0].door_code(), "B-010");
    // The rest keep feed order.
    assert_eq!(visible.vehicles[1].door_code(), "B-001");
}
