//! Console application: owns all shared state and drives the screens.
//!
//! [`ConsoleApp`] is the single writer for every piece of process-wide
//! mutable state: the latest fleet snapshot, the position cache, the filter
//! state, the favorites store, and the viewing context. Screens
//! get copies pushed after every change and request mutations through
//! [`ScreenAction`]s — they never reach into the app's state directly.
//!
//! The viewing state machine has two states: idle (fleet list) and viewing
//! one vehicle. Entering a viewing session fetches that vehicle's backend
//! history window and duty list exactly once; after that, every poll tick
//! only re-runs the merge with the growing local cache. Each viewing session
//! carries a generation number, and async results are committed only when
//! their generation still matches — a history fetch that completes after the
//! operator switched vehicles is discarded, not applied.

use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use fleetpulse_core::{
    build_trail, company_options, compute_visible, FilterState, PositionCache, PositionSample,
    Trail, VehicleSnapshot, VisibleResult,
};

use crate::api::{HISTORY_WINDOW_MINUTES, VehicleTask};
use crate::favorites::FavoritesStore;
use crate::overlays::{render_overlay, Overlay, OverlayKind};
use crate::poller::{PollCommand, PollEvent, Poller};
use crate::screens::{
    AdminRequest, AdminScreen, DetailScreen, FilterChange, FleetScreen, InputEvent, ScreenAction,
    ScreenContext,
};

/// How long the activity spinner stays visible after a tick completes, so
/// fast responses still register as activity.
const SPINNER_LINGER: Duration = Duration::from_secs(1);

/// Connection pulse shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pulse {
    /// Last tick succeeded.
    Live,
    /// Last tick failed; polling continues.
    Outage(String),
}

impl Pulse {
    /// Status-bar badge.
    #[must_use]
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Outage(_) => "OUTAGE",
        }
    }
}

/// Which screen owns input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveScreen {
    Fleet,
    Detail,
    Admin,
}

/// Per-viewing-session state; exists only while a vehicle detail is open.
struct ViewingContext {
    door_code: String,
    generation: u64,
    /// Backend history window, fetched once per session (plus manual
    /// refresh). Merged with the local cache on every tick.
    backend_window: Vec<PositionSample>,
    history_loaded: bool,
}

/// The console application.
pub struct ConsoleApp {
    poller: Poller,

    vehicles: Vec<VehicleSnapshot>,
    cache: PositionCache,
    filter: FilterState,
    favorites: FavoritesStore,
    visible: VisibleResult,
    companies: Vec<(String, usize)>,

    viewing: Option<ViewingContext>,
    next_generation: u64,

    pulse: Pulse,
    fetch_in_flight: bool,
    spinner_until: Instant,
    has_data: bool,

    fleet_screen: FleetScreen,
    detail_screen: DetailScreen,
    admin_screen: AdminScreen,
    active: ActiveScreen,
    overlays: Vec<Overlay>,
    should_quit: bool,
}

impl ConsoleApp {
    /// Create the app around a running poller and a loaded favorites store.
    #[must_use]
    pub fn new(poller: Poller, favorites: FavoritesStore) -> Self {
        Self {
            poller,
            vehicles: Vec::new(),
            cache: PositionCache::new(),
            filter: FilterState::default(),
            favorites,
            visible: VisibleResult::default(),
            companies: Vec::new(),
            viewing: None,
            next_generation: 0,
            pulse: Pulse::Live,
            fetch_in_flight: true,
            spinner_until: Instant::now(),
            has_data: false,
            fleet_screen: FleetScreen::new(),
            detail_screen: DetailScreen::new(),
            admin_screen: AdminScreen::new(),
            active: ActiveScreen::Fleet,
            overlays: Vec::new(),
            should_quit: false,
        }
    }

    /// Whether the main loop should exit.
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Classification clock: the backend reports local calendar timestamps.
    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    // ─── Event application ──────────────────────────────────────────────────

    /// Drain and apply everything the poller produced since last frame.
    pub fn drain_events(&mut self) {
        while let Some(event) = self.poller.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: PollEvent) {
        match event {
            PollEvent::Fleet(vehicles) => self.apply_fleet(vehicles),
            PollEvent::FleetFailed(message) => {
                self.pulse = Pulse::Outage(message);
                self.fetch_in_flight = false;
                self.spinner_until = Instant::now() + SPINNER_LINGER;
            }
            PollEvent::History { door_code, generation, points } => {
                self.apply_history(&door_code, generation, points);
            }
            PollEvent::Tasks { door_code, generation, tasks, failed } => {
                self.apply_tasks(&door_code, generation, tasks, failed);
            }
            PollEvent::Users(result) => {
                self.admin_screen.set_users(result);
            }
            PollEvent::AdminDone { action, error } => match error {
                Some(message) => {
                    self.overlays.push(Overlay::alert("Admin Action Failed", message));
                }
                None => {
                    // Keep the list authoritative after any mutation.
                    self.poller.send(PollCommand::ListUsers);
                    self.overlays.push(Overlay::alert(
                        "Admin",
                        format!("Action '{action}' completed."),
                    ));
                }
            },
        }
    }

    fn apply_fleet(&mut self, vehicles: Vec<VehicleSnapshot>) {
        self.pulse = Pulse::Live;
        self.fetch_in_flight = false;
        self.spinner_until = Instant::now() + SPINNER_LINGER;
        self.has_data = true;

        // Feed every vehicle's last-known coordinate into the local cache.
        let now_secs = Utc::now().timestamp();
        for v in &vehicles {
            if let (Some(lat), Some(lng)) = (v.latitude, v.longitude) {
                self.cache.ingest(
                    v.door_code(),
                    lat,
                    lng,
                    v.last_location_time.as_deref().unwrap_or("--:--:--"),
                    now_secs,
                );
            }
        }

        self.vehicles = vehicles;
        self.companies = company_options(&self.vehicles);
        self.recompute_visible();

        // Live update for the open detail view: merge again with the larger
        // cache and refresh the snapshot-derived panels. No backend history
        // re-fetch here — that happened once on viewing entry.
        let viewing_door = self.viewing.as_ref().map(|v| v.door_code.clone());
        if let Some(door) = viewing_door {
            let current = self.vehicles.iter().find(|v| v.door_code() == door).cloned();
            if let Some(current) = current {
                self.detail_screen.update_snapshot(current);
            }
            self.rebuild_trail();
        }
    }

    fn apply_history(&mut self, door_code: &str, generation: u64, points: Vec<PositionSample>) {
        let matches = self
            .viewing
            .as_ref()
            .is_some_and(|v| v.generation == generation && v.door_code == door_code);
        if !matches {
            tracing::debug!(
                target: "fleetpulse.app",
                door_code,
                generation,
                "discarded stale history result"
            );
            return;
        }
        if let Some(viewing) = &mut self.viewing {
            viewing.backend_window = points;
            viewing.history_loaded = true;
        }
        self.rebuild_trail();
    }

    fn apply_tasks(
        &mut self,
        door_code: &str,
        generation: u64,
        tasks: Vec<VehicleTask>,
        failed: bool,
    ) {
        let matches = self
            .viewing
            .as_ref()
            .is_some_and(|v| v.generation == generation && v.door_code == door_code);
        if !matches {
            tracing::debug!(
                target: "fleetpulse.app",
                door_code,
                generation,
                "discarded stale task result"
            );
            return;
        }
        self.detail_screen.set_tasks(tasks, failed);
    }

    fn rebuild_trail(&mut self) {
        let Some(viewing) = &self.viewing else {
            return;
        };
        let local = self.cache.history(&viewing.door_code);
        let trail: Trail = build_trail(&viewing.backend_window, local);
        self.detail_screen.set_trail(trail, viewing.history_loaded);
    }

    fn recompute_visible(&mut self) {
        let now = Self::now();
        self.visible = compute_visible(&self.vehicles, &self.filter, &self.favorites.as_set(), now);
        self.fleet_screen
            .update_state(&self.visible, &self.filter, self.favorites.as_set(), now);
    }

    // ─── Input handling ─────────────────────────────────────────────────────

    /// Process one input event.
    pub fn handle_input(&mut self, event: &InputEvent, ctx: &ScreenContext) {
        use crossterm::event::{KeyCode, KeyModifiers};

        // Overlays are modal.
        if let Some(top) = self.overlays.last() {
            if let InputEvent::Key(code, _) = event {
                match (top.kind, code) {
                    (OverlayKind::Confirm, KeyCode::Char('y' | 'Y')) => {
                        self.overlays.pop();
                    }
                    (_, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | '?')) => {
                        self.overlays.pop();
                    }
                    _ => {}
                }
            }
            return;
        }

        if let InputEvent::Key(KeyCode::Char('c'), mods) = event {
            if mods.contains(KeyModifiers::CONTROL) {
                self.should_quit = true;
                return;
            }
        }

        let action = match self.active {
            ActiveScreen::Fleet => self.fleet_screen.handle_input(event, ctx),
            ActiveScreen::Detail => self.detail_screen.handle_input(event, ctx),
            ActiveScreen::Admin => self.admin_screen.handle_input(event, ctx),
        };

        match action {
            ScreenAction::Ignored => self.handle_global(event),
            other => self.apply_action(other),
        }
    }

    /// Global bindings, applied only when the active screen ignored the key.
    fn handle_global(&mut self, event: &InputEvent) {
        use crossterm::event::KeyCode;

        let InputEvent::Key(code, _mods) = event else {
            return;
        };
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') | KeyCode::F(1) => self.overlays.push(Overlay::help()),
            KeyCode::Tab => self.cycle_screen(),
            KeyCode::Char('r') => {
                // Manual refresh outside the detail view re-polls the fleet.
                self.fetch_in_flight = true;
                self.poller.send(PollCommand::FetchNow);
            }
            _ => {}
        }
    }

    fn cycle_screen(&mut self) {
        self.active = match self.active {
            ActiveScreen::Fleet | ActiveScreen::Detail => {
                self.admin_screen.set_loading();
                self.poller.send(PollCommand::ListUsers);
                ActiveScreen::Admin
            }
            ActiveScreen::Admin => ActiveScreen::Fleet,
        };
        // Leaving the detail view tears the viewing session down.
        if self.active != ActiveScreen::Detail {
            self.close_detail_if_open();
        }
    }

    fn close_detail_if_open(&mut self) {
        if self.viewing.take().is_some() {
            self.detail_screen.set_trail(Trail::Empty, false);
        }
    }

    fn apply_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::Consumed | ScreenAction::Ignored => {}
            ScreenAction::Quit => self.should_quit = true,
            ScreenAction::Filter(change) => self.apply_filter_change(change),
            ScreenAction::OpenDetail(door_code) => self.open_detail(door_code),
            ScreenAction::CloseDetail => {
                self.close_detail_if_open();
                self.active = ActiveScreen::Fleet;
            }
            ScreenAction::ToggleFavorite(door_code) => {
                self.favorites.toggle(&door_code);
                self.recompute_visible();
            }
            ScreenAction::Export => self.export_report(),
            ScreenAction::RefreshHistory => {
                if let Some(viewing) = &self.viewing {
                    self.poller.send(PollCommand::FetchHistory {
                        door_code: viewing.door_code.clone(),
                        generation: viewing.generation,
                        minutes: HISTORY_WINDOW_MINUTES,
                    });
                }
            }
            ScreenAction::Admin(request) => self.apply_admin_request(request),
        }
    }

    fn apply_filter_change(&mut self, change: FilterChange) {
        match change {
            FilterChange::CycleTab => self.filter.tab = self.filter.tab.cycle_next(),
            FilterChange::CycleCompany => self.cycle_company(),
            FilterChange::ToggleStale => self.filter.stale_only = !self.filter.stale_only,
            FilterChange::SearchPush(c) => self.filter.search.push(c),
            FilterChange::SearchPop => {
                self.filter.search.pop();
            }
            FilterChange::SearchClear => self.filter.search.clear(),
        }
        self.recompute_visible();
    }

    /// Cycle: all companies → each known company in label order → all.
    fn cycle_company(&mut self) {
        let labels: Vec<&String> = self.companies.iter().map(|(label, _)| label).collect();
        self.filter.company = match &self.filter.company {
            None => labels.first().map(|s| (*s).clone()),
            Some(current) => labels
                .iter()
                .position(|label| *label == current)
                .and_then(|i| labels.get(i + 1))
                .map(|s| (*s).clone()),
        };
    }

    /// Enter the Viewing state for a vehicle.
    ///
    /// Allocates a fresh generation, fetches the backend history window and
    /// duty list once, and forces a snapshot poll so the list timestamps are
    /// in sync with the detail badges.
    fn open_detail(&mut self, door_code: String) {
        self.next_generation += 1;
        let generation = self.next_generation;

        let snapshot = self
            .vehicles
            .iter()
            .find(|v| v.door_code() == door_code)
            .cloned()
            .unwrap_or_default();

        // Until the backend window arrives the trail is local-cache only.
        let initial_trail = build_trail(&[], self.cache.history(&door_code));
        self.detail_screen.open(snapshot, initial_trail);

        self.viewing = Some(ViewingContext {
            door_code: door_code.clone(),
            generation,
            backend_window: Vec::new(),
            history_loaded: false,
        });
        self.active = ActiveScreen::Detail;

        self.poller.send(PollCommand::FetchHistory {
            door_code: door_code.clone(),
            generation,
            minutes: HISTORY_WINDOW_MINUTES,
        });
        self.poller.send(PollCommand::FetchTasks { door_code, generation });
        self.fetch_in_flight = true;
        self.poller.send(PollCommand::FetchNow);
    }

    fn apply_admin_request(&mut self, request: AdminRequest) {
        let command = match request {
            AdminRequest::Reload => PollCommand::ListUsers,
            AdminRequest::Add { username, password } => PollCommand::AddUser { username, password },
            AdminRequest::Rename { id, username } => PollCommand::Rename { id, username },
            AdminRequest::SetPassword { id, password } => PollCommand::SetPassword { id, password },
            AdminRequest::Delete { id } => PollCommand::DeleteUser { id },
        };
        self.poller.send(command);
    }

    fn export_report(&mut self) {
        // Export what the operator sees; fall back to the full fleet when
        // the filters leave nothing.
        let data = if self.visible.vehicles.is_empty() {
            &self.vehicles
        } else {
            &self.visible.vehicles
        };
        if data.is_empty() {
            self.overlays.push(Overlay::alert("Export", "Nothing to export yet."));
            return;
        }

        let path = crate::export::default_export_path();
        match crate::export::write_report(&path, data, Self::now()) {
            Ok(()) => self.overlays.push(Overlay::alert(
                "Export Complete",
                format!("Wrote {} ({} vehicles max)", path.display(), data.len()),
            )),
            Err(e) => self.overlays.push(Overlay::alert("Export Failed", e.to_string())),
        }
    }

    // ─── Rendering ──────────────────────────────────────────────────────────

    fn status_line(&self) -> Line<'static> {
        let connection = if self.has_data {
            format!(
                "{} vehicles, {} active",
                self.visible.top_counts.total, self.visible.top_counts.active
            )
        } else {
            "Connecting...".to_owned()
        };

        let (badge_text, badge_color) = match &self.pulse {
            Pulse::Live => (self.pulse.badge(), Color::Green),
            Pulse::Outage(_) => (self.pulse.badge(), Color::Red),
        };

        let spinner = if self.fetch_in_flight || Instant::now() < self.spinner_until {
            "⟳ "
        } else {
            "  "
        };

        Line::from(vec![
            Span::styled(
                " FLEETPULSE ",
                Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED),
            ),
            Span::raw(" "),
            Span::raw(connection),
            Span::raw("  "),
            Span::raw(spinner),
            Span::styled(
                format!(" {badge_text} "),
                Style::default().fg(Color::Black).bg(badge_color),
            ),
            Span::raw("  "),
            Span::styled(
                Local::now().format("%H:%M:%S").to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ])
    }

    /// Render the status bar, the active screen, and any overlay on top.
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(5)])
            .split(area);

        frame.render_widget(Paragraph::new(self.status_line()), chunks[0]);

        match self.active {
            ActiveScreen::Fleet => self.fleet_screen.render(frame, chunks[1]),
            ActiveScreen::Detail => self.detail_screen.render(frame, chunks[1]),
            ActiveScreen::Admin => self.admin_screen.render(frame, chunks[1]),
        }

        if let Some(top) = self.overlays.last() {
            render_overlay(frame, area, top);
        }
    }

    // ─── Test / integration accessors ───────────────────────────────────────

    /// Latest pipeline output.
    #[must_use]
    pub const fn visible(&self) -> &VisibleResult {
        &self.visible
    }

    /// Current connection pulse.
    #[must_use]
    pub const fn pulse(&self) -> &Pulse {
        &self.pulse
    }

    /// Door code of the vehicle currently being viewed, if any.
    #[must_use]
    pub fn viewing_door(&self) -> Option<&str> {
        self.viewing.as_ref().map(|v| v.door_code.as_str())
    }

    /// Generation of the current viewing session, if any.
    #[must_use]
    pub fn viewing_generation(&self) -> Option<u64> {
        self.viewing.as_ref().map(|v| v.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::DemoBackend;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn ctx() -> ScreenContext {
        ScreenContext { terminal_width: 100, terminal_height: 30 }
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(code, KeyModifiers::NONE)
    }

    fn test_app() -> ConsoleApp {
        let dir = tempfile::tempdir().unwrap();
        let favorites = FavoritesStore::load(dir.path().join("fav.json"));
        // Long period: the poller only acts on explicit commands in tests.
        let poller = Poller::spawn(
            Box::new(DemoBackend::sample(42)),
            Duration::from_secs(3600),
        );
        ConsoleApp::new(poller, favorites)
    }

    fn snapshot(door: &str, lat: f64, lng: f64) -> VehicleSnapshot {
        let now = ConsoleApp::now();
        VehicleSnapshot {
            vehicle_door_code: Some(door.to_owned()),
            operator_type: Some("iett".to_owned()),
            latitude: Some(lat),
            longitude: Some(lng),
            last_location_date: Some(now.format("%d-%m-%Y").to_string()),
            last_location_time: Some(now.format("%H:%M:%S").to_string()),
            ..VehicleSnapshot::default()
        }
    }

    #[test]
    fn fleet_event_populates_cache_and_visible_list() {
        let mut app = test_app();
        app.apply_event(PollEvent::Fleet(vec![
            snapshot("B-001", 41.01, 28.98),
            snapshot("B-002", 41.05, 29.01),
        ]));
        assert_eq!(app.visible().vehicles.len(), 2);
        assert_eq!(app.cache.history("B-001").len(), 1);
        assert_eq!(app.pulse(), &Pulse::Live);
    }

    #[test]
    fn failed_tick_flips_pulse_but_keeps_data() {
        let mut app = test_app();
        app.apply_event(PollEvent::Fleet(vec![snapshot("B-001", 41.01, 28.98)]));
        app.apply_event(PollEvent::FleetFailed("connection refused".to_owned()));
        assert!(matches!(app.pulse(), Pulse::Outage(_)));
        // Previous data is still shown.
        assert_eq!(app.visible().vehicles.len(), 1);
    }

    #[test]
    fn stale_history_is_discarded_by_generation_guard() {
        let mut app = test_app();
        app.apply_event(PollEvent::Fleet(vec![
            snapshot("B-001", 41.01, 28.98),
            snapshot("B-002", 41.05, 29.01),
        ]));

        app.apply_action(ScreenAction::OpenDetail("B-001".to_owned()));
        let first_generation = app.viewing_generation().unwrap();

        // Operator switches vehicles before the first history arrives.
        app.apply_action(ScreenAction::OpenDetail("B-002".to_owned()));
        let second_generation = app.viewing_generation().unwrap();
        assert!(second_generation > first_generation);

        // The late result for B-001 must not touch the B-002 session.
        let stale_point = PositionSample {
            lat: 10.0,
            lng: 10.0,
            timestamp: 1,
            display_time: "old".to_owned(),
        };
        app.apply_event(PollEvent::History {
            door_code: "B-001".to_owned(),
            generation: first_generation,
            points: vec![stale_point],
        });
        let viewing = app.viewing.as_ref().unwrap();
        assert!(viewing.backend_window.is_empty());
        assert!(!viewing.history_loaded);

        // The matching result commits.
        app.apply_event(PollEvent::History {
            door_code: "B-002".to_owned(),
            generation: second_generation,
            points: vec![PositionSample {
                lat: 41.0,
                lng: 29.0,
                timestamp: 100,
                display_time: "t".to_owned(),
            }],
        });
        let viewing = app.viewing.as_ref().unwrap();
        assert_eq!(viewing.backend_window.len(), 1);
        assert!(viewing.history_loaded);
    }

    #[test]
    fn closing_detail_clears_viewing_context() {
        let mut app = test_app();
        app.apply_event(PollEvent::Fleet(vec![snapshot("B-001", 41.01, 28.98)]));
        app.apply_action(ScreenAction::OpenDetail("B-001".to_owned()));
        assert_eq!(app.viewing_door(), Some("B-001"));

        app.apply_action(ScreenAction::CloseDetail);
        assert!(app.viewing_door().is_none());
        assert_eq!(app.active, ActiveScreen::Fleet);
    }

    #[test]
    fn filter_changes_recompute_the_visible_list() {
        let mut app = test_app();
        let mut stale = snapshot("B-OLD", 41.0, 28.9);
        stale.last_location_date = Some("01-01-2020".to_owned());
        app.apply_event(PollEvent::Fleet(vec![snapshot("B-001", 41.01, 28.98), stale]));
        assert_eq!(app.visible().vehicles.len(), 2);

        app.apply_action(ScreenAction::Filter(FilterChange::CycleTab));
        assert_eq!(app.filter.tab, fleetpulse_core::FilterTab::Active);
        assert_eq!(app.visible().vehicles.len(), 1);
        assert_eq!(app.visible().vehicles[0].door_code(), "B-001");
    }

    #[test]
    fn company_cycle_walks_labels_and_wraps() {
        let mut app = test_app();
        app.apply_event(PollEvent::Fleet(vec![
            snapshot("B-001", 41.0, 28.9),
            VehicleSnapshot {
                operator_type: Some("ozulas".to_owned()),
                vehicle_door_code: Some("C-001".to_owned()),
                ..snapshot("C-001", 41.0, 28.9)
            },
        ]));
        assert!(app.filter.company.is_none());

        app.apply_action(ScreenAction::Filter(FilterChange::CycleCompany));
        assert_eq!(app.filter.company.as_deref(), Some("IETT"));
        app.apply_action(ScreenAction::Filter(FilterChange::CycleCompany));
        assert_eq!(app.filter.company.as_deref(), Some("OZULAS A.S"));
        app.apply_action(ScreenAction::Filter(FilterChange::CycleCompany));
        assert!(app.filter.company.is_none());
    }

    #[test]
    fn admin_failure_pushes_blocking_overlay() {
        let mut app = test_app();
        app.apply_event(PollEvent::AdminDone {
            action: "add user",
            error: Some("User already exists".to_owned()),
        });
        assert_eq!(app.overlays.len(), 1);
        assert!(app.overlays[0].body.contains("already exists"));

        // Overlay is modal: navigation keys do nothing until dismissed.
        app.handle_input(&key(KeyCode::Char('j')), &ctx());
        assert_eq!(app.overlays.len(), 1);
        app.handle_input(&key(KeyCode::Esc), &ctx());
        assert!(app.overlays.is_empty());
    }

    #[test]
    fn favorite_toggle_floats_vehicle_to_top() {
        let mut app = test_app();
        app.apply_event(PollEvent::Fleet(vec![
            snapshot("B-001", 41.0, 28.9),
            snapshot("B-002", 41.1, 29.0),
        ]));
        app.apply_action(ScreenAction::ToggleFavorite("B-002".to_owned()));
        assert_eq!(app.visible().vehicles[0].door_code(), "B-002");
    }
}
