//! Vehicle detail screen: live trail, attributes, duty list.
//!
//! Opens for exactly one vehicle at a time. The trail pane draws the merged
//! history (backend window + local cache) as a canvas sketch plus a waypoint
//! list with the endpoint-label suppression applied; when the merge comes
//! back empty it falls back to a single last-known-position banner, with no
//! polyline.

use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Points};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use fleetpulse_core::{map_company_name, Trail, VehicleSnapshot, Waypoint, WaypointRole};

use crate::api::VehicleTask;

use super::{InputEvent, ScreenAction, ScreenContext};

/// Load state of the duty list, so "no duties" and "fetch failed" render
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLoadState {
    /// Request in flight.
    Loading,
    /// Response arrived (possibly empty).
    Loaded,
    /// Request failed; scoped to this vehicle only.
    Failed,
}

/// Vehicle detail screen state.
pub struct DetailScreen {
    vehicle: VehicleSnapshot,
    trail: Trail,
    tasks: Vec<VehicleTask>,
    tasks_state: TaskLoadState,
    driver: Option<String>,
    waypoint_offset: usize,
    history_loaded: bool,
}

impl DetailScreen {
    /// Create an empty screen.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vehicle: VehicleSnapshot::default(),
            trail: Trail::Empty,
            tasks: Vec::new(),
            tasks_state: TaskLoadState::Loading,
            driver: None,
            waypoint_offset: 0,
            history_loaded: false,
        }
    }

    /// Begin viewing a vehicle: reset everything from the previous one.
    pub fn open(&mut self, vehicle: VehicleSnapshot, initial_trail: Trail) {
        self.vehicle = vehicle;
        self.trail = initial_trail;
        self.tasks = Vec::new();
        self.tasks_state = TaskLoadState::Loading;
        self.driver = None;
        self.waypoint_offset = 0;
        self.history_loaded = false;
    }

    /// Replace the snapshot with the latest poll-tick data (badges, speed).
    pub fn update_snapshot(&mut self, vehicle: VehicleSnapshot) {
        self.vehicle = vehicle;
    }

    /// Replace the rendered trail after a merge recompute.
    pub fn set_trail(&mut self, trail: Trail, history_loaded: bool) {
        self.trail = trail;
        self.history_loaded = history_loaded;
        let count = self.trail.waypoints().len();
        if self.waypoint_offset >= count {
            self.waypoint_offset = count.saturating_sub(1);
        }
    }

    /// Apply the duty-list result.
    pub fn set_tasks(&mut self, tasks: Vec<VehicleTask>, failed: bool) {
        self.driver = tasks
            .first()
            .and_then(|t| t.driver_register_no.clone())
            .filter(|d| !d.is_empty());
        self.tasks = tasks;
        self.tasks_state = if failed { TaskLoadState::Failed } else { TaskLoadState::Loaded };
    }

    /// Vehicle currently shown.
    #[must_use]
    pub fn door_code(&self) -> &str {
        self.vehicle.door_code()
    }

    /// Process an input event.
    pub fn handle_input(&mut self, event: &InputEvent, _ctx: &ScreenContext) -> ScreenAction {
        let InputEvent::Key(code, _mods) = event else {
            return ScreenAction::Ignored;
        };
        match code {
            KeyCode::Esc | KeyCode::Backspace => ScreenAction::CloseDetail,
            KeyCode::Char('r') => ScreenAction::RefreshHistory,
            KeyCode::Char('f') => {
                let door = self.door_code();
                if door.is_empty() {
                    ScreenAction::Consumed
                } else {
                    ScreenAction::ToggleFavorite(door.to_owned())
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.waypoint_offset = self.waypoint_offset.saturating_sub(1);
                ScreenAction::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = self.trail.waypoints().len();
                if self.waypoint_offset + 1 < count {
                    self.waypoint_offset += 1;
                }
                ScreenAction::Consumed
            }
            _ => ScreenAction::Ignored,
        }
    }

    fn info_lines(&self) -> Vec<Line<'static>> {
        let v = &self.vehicle;
        let dash = || "--".to_owned();
        let mut lines = vec![
            info_line("Company", map_company_name(v.operator_type.as_deref().unwrap_or(""))),
            info_line("Plate", v.number_plate.clone().unwrap_or_else(dash)),
            info_line("Brand", v.brand_name.clone().unwrap_or_else(dash)),
            info_line(
                "Model",
                format!(
                    "{} {}",
                    v.model_year.map_or_else(dash, |y| y.to_string()),
                    v.vehicle_type.clone().unwrap_or_default()
                )
                .trim()
                .to_owned(),
            ),
            info_line(
                "Capacity",
                format!(
                    "{} seated / {} total",
                    v.seating_capacity.map_or_else(dash, |c| c.to_string()),
                    v.full_capacity.map_or_else(dash, |c| c.to_string())
                ),
            ),
            info_line(
                "Speed",
                format!("{:.0} km/h", v.speed.unwrap_or(0.0)),
            ),
            info_line("Driver", self.driver.clone().unwrap_or_else(dash)),
        ];

        let badge = |on: bool, label: &str| {
            Span::styled(
                format!(" {label} "),
                if on {
                    Style::default().fg(Color::Black).bg(Color::Green)
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            )
        };
        lines.push(Line::from(vec![
            badge(v.has_usb_charger, "USB"),
            Span::raw(" "),
            badge(v.has_wifi, "WIFI"),
            Span::raw(" "),
            badge(v.is_air_conditioned, "A/C"),
            Span::raw(" "),
            badge(v.accessibility, "ACCESS"),
        ]));
        lines
    }

    fn render_tasks(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Duties ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let message = match self.tasks_state {
            TaskLoadState::Loading => Some(("Loading...", Color::DarkGray)),
            TaskLoadState::Failed => Some(("Could not load duties for this vehicle", Color::Red)),
            TaskLoadState::Loaded if self.tasks.is_empty() => {
                Some(("No duties for today", Color::Red))
            }
            TaskLoadState::Loaded => None,
        };
        if let Some((text, color)) = message {
            let p = Paragraph::new(text)
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true });
            frame.render_widget(p, inner);
            return;
        }

        let rows: Vec<Row<'static>> = self
            .tasks
            .iter()
            .map(|t| {
                Row::new(vec![
                    Cell::from(Span::styled(
                        t.code.clone(),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )),
                    Cell::from(t.dest.clone()),
                    Cell::from(t.time.clone()),
                ])
            })
            .collect();
        let table = Table::new(
            rows,
            [Constraint::Length(8), Constraint::Min(12), Constraint::Length(8)],
        )
        .header(
            Row::new(vec!["Code", "Destination", "Time"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(table, inner);
    }

    fn render_trail_canvas(&self, frame: &mut Frame<'_>, area: Rect) {
        let title = if self.history_loaded {
            " Trail (5 min) "
        } else {
            " Trail (local cache only) "
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        let points = self.trail.waypoints();
        if points.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let (lat, lng) = (self.vehicle.latitude, self.vehicle.longitude);
            let text = match (lat, lng) {
                (Some(lat), Some(lng)) => format!(
                    "LAST KNOWN POSITION\n{lat:.5}, {lng:.5}\n{}",
                    self.vehicle.last_location_time.clone().unwrap_or_else(|| "--:--:--".to_owned())
                ),
                _ => "No position data for this vehicle".to_owned(),
            };
            let banner = Paragraph::new(text)
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .wrap(Wrap { trim: true });
            frame.render_widget(banner, inner);
            return;
        }

        let (mut min_lat, mut max_lat) = (f64::MAX, f64::MIN);
        let (mut min_lng, mut max_lng) = (f64::MAX, f64::MIN);
        for w in points {
            min_lat = min_lat.min(w.sample.lat);
            max_lat = max_lat.max(w.sample.lat);
            min_lng = min_lng.min(w.sample.lng);
            max_lng = max_lng.max(w.sample.lng);
        }
        // Pad degenerate bounds so a stationary vehicle still draws.
        let pad_lat = ((max_lat - min_lat) * 0.15).max(0.0005);
        let pad_lng = ((max_lng - min_lng) * 0.15).max(0.0005);

        let segments: Vec<(f64, f64, f64, f64)> = points
            .windows(2)
            .map(|w| (w[0].sample.lng, w[0].sample.lat, w[1].sample.lng, w[1].sample.lat))
            .collect();
        let intermediates: Vec<(f64, f64)> = points
            .iter()
            .filter(|w| w.role == WaypointRole::Intermediate)
            .map(|w| (w.sample.lng, w.sample.lat))
            .collect();
        let start: Vec<(f64, f64)> = points
            .iter()
            .filter(|w| w.role == WaypointRole::Start)
            .map(|w| (w.sample.lng, w.sample.lat))
            .collect();
        let end: Vec<(f64, f64)> = points
            .iter()
            .filter(|w| w.role == WaypointRole::End)
            .map(|w| (w.sample.lng, w.sample.lat))
            .collect();

        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([min_lng - pad_lng, max_lng + pad_lng])
            .y_bounds([min_lat - pad_lat, max_lat + pad_lat])
            .paint(move |ctx| {
                for (x1, y1, x2, y2) in &segments {
                    ctx.draw(&CanvasLine {
                        x1: *x1,
                        y1: *y1,
                        x2: *x2,
                        y2: *y2,
                        color: Color::Red,
                    });
                }
                ctx.draw(&Points { coords: &intermediates, color: Color::White });
                ctx.draw(&Points { coords: &start, color: Color::Green });
                ctx.draw(&Points { coords: &end, color: Color::Yellow });
            });
        frame.render_widget(canvas, area);
    }

    fn waypoint_item(w: &Waypoint) -> ListItem<'static> {
        let (symbol, color) = match w.role {
            WaypointRole::Start => ("▲ START", Color::Green),
            WaypointRole::End => ("● LAST", Color::Yellow),
            WaypointRole::Intermediate => ("·", Color::DarkGray),
        };
        let mut spans = vec![Span::styled(
            format!("{symbol:<8}"),
            Style::default().fg(color),
        )];
        if w.show_time_label {
            spans.push(Span::styled(
                format!("{:<10}", w.sample.display_time),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(format!("{:<10}", "")));
        }
        spans.push(Span::styled(
            format!("{:.5}, {:.5}", w.sample.lat, w.sample.lng),
            Style::default().fg(Color::DarkGray),
        ));
        ListItem::new(Line::from(spans))
    }

    fn render_waypoints(&self, frame: &mut Frame<'_>, area: Rect) {
        let points = self.trail.waypoints();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Waypoints ({}) ", points.len()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let visible = usize::from(inner.height);
        let items: Vec<ListItem<'static>> = points
            .iter()
            .skip(self.waypoint_offset)
            .take(visible)
            .map(Self::waypoint_item)
            .collect();
        frame.render_widget(List::new(items), inner);
    }

    /// Render the screen into `area`.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(11), Constraint::Min(5)])
            .split(columns[0]);

        let title = format!(
            " {} — {} {} ",
            self.vehicle.door_code(),
            self.vehicle.last_location_date.clone().unwrap_or_else(|| "--.--.----".to_owned()),
            self.vehicle.last_location_time.clone().unwrap_or_else(|| "--:--:--".to_owned()),
        );
        let info = Paragraph::new(self.info_lines())
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(info, left[0]);

        self.render_tasks(frame, left[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[1]);

        self.render_trail_canvas(frame, right[0]);
        self.render_waypoints(frame, right[1]);
    }
}

impl Default for DetailScreen {
    fn default() -> Self {
        Self::new()
    }
}

fn info_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<10}"), Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use fleetpulse_core::{build_trail, PositionSample};

    fn ctx() -> ScreenContext {
        ScreenContext { terminal_width: 100, terminal_height: 30 }
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(code, KeyModifiers::NONE)
    }

    fn sample(ts: i64) -> PositionSample {
        PositionSample { lat: 41.0, lng: 28.9, timestamp: ts, display_time: "t".to_owned() }
    }

    #[test]
    fn open_resets_previous_vehicle_state() {
        let mut screen = DetailScreen::new();
        screen.set_tasks(
            vec![VehicleTask {
                code: "34A".to_owned(),
                dest: "Kadıköy".to_owned(),
                time: "08:00".to_owned(),
                driver_register_no: Some("123".to_owned()),
            }],
            false,
        );
        assert_eq!(screen.driver.as_deref(), Some("123"));

        let vehicle = VehicleSnapshot {
            vehicle_door_code: Some("B-001".to_owned()),
            ..VehicleSnapshot::default()
        };
        screen.open(vehicle, Trail::Empty);
        assert_eq!(screen.door_code(), "B-001");
        assert!(screen.driver.is_none());
        assert_eq!(screen.tasks_state, TaskLoadState::Loading);
    }

    #[test]
    fn esc_closes_and_r_refreshes() {
        let mut screen = DetailScreen::new();
        assert_eq!(screen.handle_input(&key(KeyCode::Esc), &ctx()), ScreenAction::CloseDetail);
        assert_eq!(
            screen.handle_input(&key(KeyCode::Char('r')), &ctx()),
            ScreenAction::RefreshHistory
        );
    }

    #[test]
    fn waypoint_scroll_clamps_to_trail_length() {
        let mut screen = DetailScreen::new();
        screen.set_trail(build_trail(&[sample(1), sample(2), sample(3)], &[]), true);
        screen.handle_input(&key(KeyCode::Down), &ctx());
        screen.handle_input(&key(KeyCode::Down), &ctx());
        screen.handle_input(&key(KeyCode::Down), &ctx());
        assert_eq!(screen.waypoint_offset, 2);

        // A shorter trail pulls the offset back in range.
        screen.set_trail(build_trail(&[sample(1)], &[]), true);
        assert_eq!(screen.waypoint_offset, 0);
    }

    #[test]
    fn task_failure_and_empty_render_differently() {
        let mut screen = DetailScreen::new();
        screen.set_tasks(Vec::new(), true);
        assert_eq!(screen.tasks_state, TaskLoadState::Failed);
        screen.set_tasks(Vec::new(), false);
        assert_eq!(screen.tasks_state, TaskLoadState::Loaded);
    }

    #[test]
    fn driver_comes_from_first_task_only() {
        let mut screen = DetailScreen::new();
        screen.set_tasks(
            vec![
                VehicleTask {
                    code: "A".to_owned(),
                    dest: "X".to_owned(),
                    time: "08:00".to_owned(),
                    driver_register_no: None,
                },
                VehicleTask {
                    code: "B".to_owned(),
                    dest: "Y".to_owned(),
                    time: "09:00".to_owned(),
                    driver_register_no: Some("999".to_owned()),
                },
            ],
            false,
        );
        assert!(screen.driver.is_none());
    }
}
