//! Fleet list screen — the primary dashboard.
//!
//! Shows the filtered, favorites-first vehicle list with the tab-bar counts
//! (company filter only) and summary counts (all filters). Only the rows
//! inside the virtual window are materialized per frame; a huge fleet costs
//! the same to paint as a small one.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use crossterm::event::{KeyCode, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState, Table,
};
use ratatui::Frame;

use fleetpulse_core::{
    map_company_name, max_scroll_top, visible_rows, Counts, FilterState, FilterTab,
    VehicleSnapshot, VisibleResult, ROW_BUFFER,
};

use super::{FilterChange, InputEvent, ScreenAction, ScreenContext};

/// Height of one vehicle row in terminal rows.
pub const ROW_HEIGHT: u64 = 2;

/// Chrome rows around the list: app status bar, tab header, filter bar, and
/// the list block's own borders.
const CHROME_ROWS: u16 = 1 + 3 + 3 + 2;

/// Fleet list screen state.
pub struct FleetScreen {
    vehicles: Vec<VehicleSnapshot>,
    top_counts: Counts,
    summary_counts: Counts,
    filter: FilterState,
    favorites: HashSet<String>,
    now: NaiveDateTime,
    selected: usize,
    scroll_top: u64,
    search_focused: bool,
}

impl FleetScreen {
    /// Create an empty screen; real data arrives with the first poll tick.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vehicles: Vec::new(),
            top_counts: Counts::default(),
            summary_counts: Counts::default(),
            filter: FilterState::default(),
            favorites: HashSet::new(),
            now: NaiveDateTime::MIN,
            selected: 0,
            scroll_top: 0,
            search_focused: false,
        }
    }

    /// Push the latest pipeline output into the screen.
    ///
    /// Clamps selection and scroll so a shrinking list (filter change,
    /// vehicles dropping off the feed) never leaves stale out-of-range rows
    /// materialized.
    pub fn update_state(
        &mut self,
        visible: &VisibleResult,
        filter: &FilterState,
        favorites: HashSet<String>,
        now: NaiveDateTime,
    ) {
        self.vehicles = visible.vehicles.clone();
        self.top_counts = visible.top_counts;
        self.summary_counts = visible.summary_counts;
        self.filter = filter.clone();
        self.favorites = favorites;
        self.now = now;

        if self.vehicles.is_empty() {
            self.selected = 0;
            self.scroll_top = 0;
        } else if self.selected >= self.vehicles.len() {
            self.selected = self.vehicles.len() - 1;
        }
    }

    /// Door code of the currently selected vehicle.
    #[must_use]
    pub fn selected_door(&self) -> Option<&str> {
        self.vehicles.get(self.selected).map(VehicleSnapshot::door_code)
    }

    /// Whether the search box currently captures plain characters.
    #[must_use]
    pub const fn search_focused(&self) -> bool {
        self.search_focused
    }

    /// List viewport extent in cells for the given terminal size.
    fn viewport_cells(ctx: &ScreenContext) -> u64 {
        u64::from(ctx.terminal_height.saturating_sub(CHROME_ROWS))
    }

    fn clamp_scroll(&mut self, ctx: &ScreenContext) {
        let max = max_scroll_top(self.vehicles.len(), ROW_HEIGHT, Self::viewport_cells(ctx));
        self.scroll_top = self.scroll_top.min(max);
    }

    /// Keep the selected row inside the viewport.
    fn ensure_selected_visible(&mut self, ctx: &ScreenContext) {
        let viewport = Self::viewport_cells(ctx);
        let top = self.selected as u64 * ROW_HEIGHT;
        if top < self.scroll_top {
            self.scroll_top = top;
        } else if top + ROW_HEIGHT > self.scroll_top + viewport {
            self.scroll_top = (top + ROW_HEIGHT).saturating_sub(viewport);
        }
        self.clamp_scroll(ctx);
    }

    fn move_selection(&mut self, delta: isize, ctx: &ScreenContext) {
        if self.vehicles.is_empty() {
            return;
        }
        let last = self.vehicles.len() - 1;
        self.selected = self
            .selected
            .saturating_add_signed(delta)
            .min(last);
        self.ensure_selected_visible(ctx);
    }

    fn handle_search_key(&mut self, code: KeyCode) -> ScreenAction {
        match code {
            KeyCode::Esc => {
                self.search_focused = false;
                ScreenAction::Filter(FilterChange::SearchClear)
            }
            KeyCode::Enter => {
                self.search_focused = false;
                ScreenAction::Consumed
            }
            KeyCode::Backspace => ScreenAction::Filter(FilterChange::SearchPop),
            KeyCode::Char(c) => ScreenAction::Filter(FilterChange::SearchPush(c)),
            _ => ScreenAction::Consumed,
        }
    }

    /// Process an input event.
    pub fn handle_input(&mut self, event: &InputEvent, ctx: &ScreenContext) -> ScreenAction {
        match event {
            InputEvent::Key(code, _mods) => {
                if self.search_focused {
                    return self.handle_search_key(*code);
                }
                match code {
                    KeyCode::Up | KeyCode::Char('k') => {
                        self.move_selection(-1, ctx);
                        ScreenAction::Consumed
                    }
                    KeyCode::Down | KeyCode::Char('j') => {
                        self.move_selection(1, ctx);
                        ScreenAction::Consumed
                    }
                    KeyCode::PageUp => {
                        let page = (Self::viewport_cells(ctx) / ROW_HEIGHT).max(1) as isize;
                        self.move_selection(-page, ctx);
                        ScreenAction::Consumed
                    }
                    KeyCode::PageDown => {
                        let page = (Self::viewport_cells(ctx) / ROW_HEIGHT).max(1) as isize;
                        self.move_selection(page, ctx);
                        ScreenAction::Consumed
                    }
                    KeyCode::Home | KeyCode::Char('g') => {
                        self.selected = 0;
                        self.ensure_selected_visible(ctx);
                        ScreenAction::Consumed
                    }
                    KeyCode::End | KeyCode::Char('G') => {
                        self.selected = self.vehicles.len().saturating_sub(1);
                        self.ensure_selected_visible(ctx);
                        ScreenAction::Consumed
                    }
                    KeyCode::Enter => match self.selected_door() {
                        Some(door) if !door.is_empty() => {
                            ScreenAction::OpenDetail(door.to_owned())
                        }
                        _ => ScreenAction::Consumed,
                    },
                    KeyCode::Char('f') => match self.selected_door() {
                        Some(door) if !door.is_empty() => {
                            ScreenAction::ToggleFavorite(door.to_owned())
                        }
                        _ => ScreenAction::Consumed,
                    },
                    KeyCode::Char('/') => {
                        self.search_focused = true;
                        ScreenAction::Consumed
                    }
                    KeyCode::Char('t') => ScreenAction::Filter(FilterChange::CycleTab),
                    KeyCode::Char('c') => ScreenAction::Filter(FilterChange::CycleCompany),
                    KeyCode::Char('s') => ScreenAction::Filter(FilterChange::ToggleStale),
                    KeyCode::Char('e') => ScreenAction::Export,
                    _ => ScreenAction::Ignored,
                }
            }
            InputEvent::Mouse(MouseEventKind::ScrollDown, _, _) => {
                self.scroll_top = self.scroll_top.saturating_add(ROW_HEIGHT);
                self.clamp_scroll(ctx);
                ScreenAction::Consumed
            }
            InputEvent::Mouse(MouseEventKind::ScrollUp, _, _) => {
                self.scroll_top = self.scroll_top.saturating_sub(ROW_HEIGHT);
                ScreenAction::Consumed
            }
            InputEvent::Mouse(..) | InputEvent::Resize(..) => ScreenAction::Ignored,
        }
    }

    fn tab_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for tab in FilterTab::ALL {
            let count = match tab {
                FilterTab::All => self.top_counts.total,
                FilterTab::Active => self.top_counts.active,
                FilterTab::Inactive => self.top_counts.inactive,
            };
            let style = if *tab == self.filter.tab {
                Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!(" {} ({count}) ", tab.label()), style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }

    fn filter_line(&self) -> Line<'static> {
        let company = self.filter.company.clone().unwrap_or_else(|| "All Companies".to_owned());
        let mut spans = vec![
            Span::styled("Company: ", Style::default().fg(Color::DarkGray)),
            Span::raw(company),
            Span::raw("   "),
        ];
        if self.filter.stale_only {
            spans.push(Span::styled(
                "STALE ONLY",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw("   "));
        }
        let search_style = if self.search_focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled("Search: ", Style::default().fg(Color::DarkGray)));
        let cursor = if self.search_focused { "_" } else { "" };
        spans.push(Span::styled(format!("{}{cursor}", self.filter.search), search_style));
        Line::from(spans)
    }

    fn build_row(&self, index: usize, vehicle: &VehicleSnapshot) -> Row<'static> {
        let door = vehicle.door_code().to_owned();
        let starred = self.favorites.contains(&door);
        let active = vehicle.is_active(self.now);
        let company = map_company_name(vehicle.operator_type.as_deref().unwrap_or(""));
        let date = vehicle.last_location_date.clone().unwrap_or_else(|| "--/--/----".to_owned());
        let time = vehicle.last_location_time.clone().unwrap_or_else(|| "--:--:--".to_owned());
        let plate = vehicle.number_plate.clone().unwrap_or_default();

        let star = if starred { "★ " } else { "  " };
        let door_cell = Cell::from(Text::from(vec![
            Line::from(vec![
                Span::styled(star, Style::default().fg(Color::Yellow)),
                Span::styled(door, Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(Span::styled(
                format!("  {plate}"),
                Style::default().fg(Color::DarkGray),
            )),
        ]));

        let company_cell = Cell::from(Text::from(vec![
            Line::from(company),
            Line::from(Span::styled(
                vehicle.brand_name.clone().unwrap_or_default(),
                Style::default().fg(Color::DarkGray),
            )),
        ]));

        let (status_text, status_color) = if active {
            ("● ACTIVE", Color::Green)
        } else {
            ("○ INACTIVE", Color::Red)
        };
        let status_cell = Cell::from(Text::from(vec![Line::from(Span::styled(
            status_text,
            Style::default().fg(status_color),
        ))]));

        let updated_cell = Cell::from(Text::from(vec![
            Line::from(date),
            Line::from(Span::styled(time, Style::default().fg(Color::DarkGray))),
        ]));

        let style = if index == self.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };

        Row::new(vec![door_cell, company_cell, status_cell, updated_cell])
            .style(style)
            .height(ROW_HEIGHT as u16)
    }

    /// Render the screen into `area` (everything below the app status bar).
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(4),
            ])
            .split(area);

        let tabs = Paragraph::new(self.tab_line())
            .block(Block::default().borders(Borders::ALL).title(" Fleet "));
        frame.render_widget(tabs, chunks[0]);

        let filters = Paragraph::new(self.filter_line())
            .block(Block::default().borders(Borders::ALL).title(" Filters "));
        frame.render_widget(filters, chunks[1]);

        let list_title = format!(
            " Vehicles — {} shown ({} active / {} inactive) ",
            self.summary_counts.total, self.summary_counts.active, self.summary_counts.inactive,
        );
        let list_block = Block::default().borders(Borders::ALL).title(list_title);
        let list_area = list_block.inner(chunks[2]);
        frame.render_widget(list_block, chunks[2]);

        if self.vehicles.is_empty() {
            let empty = Paragraph::new("No vehicles match the current filters")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, list_area);
            return;
        }

        // Materialize only the virtual window; rows above the viewport are
        // buffer rows and are skipped for display.
        let viewport = u64::from(list_area.height);
        let window = visible_rows(
            self.vehicles.len(),
            ROW_HEIGHT,
            viewport,
            self.scroll_top,
            ROW_BUFFER,
        );
        let first_visible = ((self.scroll_top / ROW_HEIGHT) as usize).min(window.end);

        let rows: Vec<Row<'static>> = (window.start..window.end)
            .map(|i| self.build_row(i, &self.vehicles[i]))
            .skip(first_visible.saturating_sub(window.start))
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(16),
                Constraint::Min(24),
                Constraint::Length(12),
                Constraint::Length(12),
            ],
        );
        frame.render_widget(table, list_area);

        let mut scrollbar_state = ScrollbarState::new(window.content_height as usize)
            .viewport_content_length(viewport as usize)
            .position(self.scroll_top as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            chunks[2],
            &mut scrollbar_state,
        );
    }
}

impl Default for FleetScreen {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use fleetpulse_core::{compute_visible, parse_datetime};

    fn ctx() -> ScreenContext {
        ScreenContext {
            terminal_width: 100,
            terminal_height: 30,
        }
    }

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(code, KeyModifiers::NONE)
    }

    fn vehicle(door: &str) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_door_code: Some(door.to_owned()),
            operator_type: Some("iett".to_owned()),
            last_location_date: Some("01-06-2025".to_owned()),
            last_location_time: Some("11:59:00".to_owned()),
            ..VehicleSnapshot::default()
        }
    }

    fn screen_with(count: usize) -> FleetScreen {
        let vehicles: Vec<VehicleSnapshot> =
            (0..count).map(|i| vehicle(&format!("B-{i:03}"))).collect();
        let now = parse_datetime("01-06-2025", "12:00:00").unwrap();
        let visible = compute_visible(&vehicles, &FilterState::default(), &HashSet::new(), now);
        let mut screen = FleetScreen::new();
        screen.update_state(&visible, &FilterState::default(), HashSet::new(), now);
        screen
    }

    #[test]
    fn selection_moves_and_clamps() {
        let mut screen = screen_with(3);
        assert_eq!(screen.selected_door(), Some("B-000"));

        assert_eq!(screen.handle_input(&key(KeyCode::Down), &ctx()), ScreenAction::Consumed);
        assert_eq!(screen.selected_door(), Some("B-001"));

        screen.handle_input(&key(KeyCode::Down), &ctx());
        screen.handle_input(&key(KeyCode::Down), &ctx());
        // Clamped at the end.
        assert_eq!(screen.selected_door(), Some("B-002"));

        screen.handle_input(&key(KeyCode::Up), &ctx());
        assert_eq!(screen.selected_door(), Some("B-001"));
    }

    #[test]
    fn enter_opens_detail_for_selection() {
        let mut screen = screen_with(2);
        screen.handle_input(&key(KeyCode::Down), &ctx());
        assert_eq!(
            screen.handle_input(&key(KeyCode::Enter), &ctx()),
            ScreenAction::OpenDetail("B-001".to_owned())
        );
    }

    #[test]
    fn search_mode_captures_characters() {
        let mut screen = screen_with(2);
        assert_eq!(screen.handle_input(&key(KeyCode::Char('/')), &ctx()), ScreenAction::Consumed);
        assert!(screen.search_focused());

        // Characters that are otherwise hotkeys go to the search box.
        assert_eq!(
            screen.handle_input(&key(KeyCode::Char('t')), &ctx()),
            ScreenAction::Filter(FilterChange::SearchPush('t'))
        );
        assert_eq!(
            screen.handle_input(&key(KeyCode::Backspace), &ctx()),
            ScreenAction::Filter(FilterChange::SearchPop)
        );
        assert_eq!(
            screen.handle_input(&key(KeyCode::Esc), &ctx()),
            ScreenAction::Filter(FilterChange::SearchClear)
        );
        assert!(!screen.search_focused());
    }

    #[test]
    fn filter_hotkeys_emit_filter_actions() {
        let mut screen = screen_with(1);
        assert_eq!(
            screen.handle_input(&key(KeyCode::Char('t')), &ctx()),
            ScreenAction::Filter(FilterChange::CycleTab)
        );
        assert_eq!(
            screen.handle_input(&key(KeyCode::Char('s')), &ctx()),
            ScreenAction::Filter(FilterChange::ToggleStale)
        );
        assert_eq!(screen.handle_input(&key(KeyCode::Char('e')), &ctx()), ScreenAction::Export);
    }

    #[test]
    fn shrinking_list_clamps_selection_and_scroll() {
        let mut screen = screen_with(500);
        screen.handle_input(&key(KeyCode::End), &ctx());
        assert_eq!(screen.selected, 499);
        assert!(screen.scroll_top > 0);

        // The filter suddenly cuts the list to 4 rows.
        let now = parse_datetime("01-06-2025", "12:00:00").unwrap();
        let vehicles: Vec<VehicleSnapshot> =
            (0..4).map(|i| vehicle(&format!("B-{i:03}"))).collect();
        let visible = compute_visible(&vehicles, &FilterState::default(), &HashSet::new(), now);
        screen.update_state(&visible, &FilterState::default(), HashSet::new(), now);

        assert_eq!(screen.selected, 3);
        // Scroll is re-clamped on the next navigation.
        screen.handle_input(&key(KeyCode::Up), &ctx());
        let viewport = FleetScreen::viewport_cells(&ctx());
        assert!(screen.scroll_top <= max_scroll_top(4, ROW_HEIGHT, viewport));
    }

    #[test]
    fn unknown_keys_fall_through_to_global_bindings() {
        let mut screen = screen_with(1);
        assert_eq!(screen.handle_input(&key(KeyCode::Char('q')), &ctx()), ScreenAction::Ignored);
        assert_eq!(screen.handle_input(&key(KeyCode::Char('r')), &ctx()), ScreenAction::Ignored);
    }
}
