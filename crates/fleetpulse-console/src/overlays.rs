//! Overlay rendering: help, alerts, confirmations.
//!
//! Overlays paint on top of the active screen. The app owns a small overlay
//! stack; this module provides the visuals and the shared centering helper.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

// ─── Overlay Model ──────────────────────────────────────────────────────────

/// What kind of popup is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Keyboard shortcut reference.
    Help,
    /// Blocking notification (admin failures, export results).
    Alert,
    /// Yes/no confirmation; `y` confirms, anything else cancels.
    Confirm,
}

/// One overlay on the stack.
#[derive(Debug, Clone)]
pub struct Overlay {
    /// Popup kind.
    pub kind: OverlayKind,
    /// Title line.
    pub title: String,
    /// Body text (ignored for [`OverlayKind::Help`]).
    pub body: String,
}

impl Overlay {
    /// Blocking alert with a title and body.
    #[must_use]
    pub fn alert(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: OverlayKind::Alert,
            title: title.into(),
            body: body.into(),
        }
    }

    /// Confirmation prompt.
    #[must_use]
    pub fn confirm(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind: OverlayKind::Confirm,
            title: title.into(),
            body: body.into(),
        }
    }

    /// The help overlay.
    #[must_use]
    pub fn help() -> Self {
        Self {
            kind: OverlayKind::Help,
            title: "Keyboard Shortcuts".to_owned(),
            body: String::new(),
        }
    }
}

// ─── Centered Popup Area ────────────────────────────────────────────────────

/// Compute a centered popup rectangle within the given area.
#[must_use]
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Keyboard shortcut entry for the help overlay.
struct HelpEntry {
    key: &'static str,
    description: &'static str,
}

const HELP_ENTRIES: &[HelpEntry] = &[
    HelpEntry { key: "q / Ctrl+C", description: "Quit" },
    HelpEntry { key: "?", description: "Toggle help" },
    HelpEntry { key: "Tab", description: "Fleet / admin screen" },
    HelpEntry { key: "j / k, PgUp / PgDn", description: "Move selection" },
    HelpEntry { key: "Enter", description: "Open vehicle detail" },
    HelpEntry { key: "Esc", description: "Close detail / dismiss" },
    HelpEntry { key: "t", description: "Cycle all/active/inactive tab" },
    HelpEntry { key: "c", description: "Cycle company filter" },
    HelpEntry { key: "s", description: "Toggle stale-only filter" },
    HelpEntry { key: "/", description: "Search (Esc clears)" },
    HelpEntry { key: "f", description: "Star / unstar vehicle" },
    HelpEntry { key: "e", description: "Export spreadsheet" },
    HelpEntry { key: "r", description: "Refresh (history in detail)" },
];

/// Render the top overlay of the stack.
pub fn render_overlay(frame: &mut Frame<'_>, area: Rect, overlay: &Overlay) {
    match overlay.kind {
        OverlayKind::Help => render_help(frame, area),
        OverlayKind::Alert => render_message(frame, area, overlay, "Enter/Esc to dismiss"),
        OverlayKind::Confirm => render_message(frame, area, overlay, "y to confirm, Esc to cancel"),
    }
}

fn render_help(frame: &mut Frame<'_>, area: Rect) {
    let popup = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem<'_>> = HELP_ENTRIES
        .iter()
        .map(|e| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<22}", e.key),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(e.description),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Keyboard Shortcuts ")
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(list, popup);
}

fn render_message(frame: &mut Frame<'_>, area: Rect, overlay: &Overlay, hint: &str) {
    let popup = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(popup);

    let body = Paragraph::new(overlay.body.as_str())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", overlay.title))
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        );
    frame.render_widget(body, chunks[0]);

    let footer = Paragraph::new(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(footer, chunks[1]);
}
