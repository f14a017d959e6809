//! Admin users screen: list, add, rename, change password, delete.
//!
//! Mutations are explicit operator actions, so unlike the polling loop this
//! screen surfaces every backend rejection as a blocking overlay (pushed by
//! the app when the corresponding [`crate::poller::PollEvent::AdminDone`]
//! arrives with an error). The screen itself only collects input through a
//! small prompt state machine and emits [`AdminRequest`]s.

use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::api::AdminUser;

use super::{AdminRequest, InputEvent, ScreenAction, ScreenContext};

/// Load state of the user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserListState {
    /// Request in flight.
    Loading,
    /// List loaded.
    Loaded,
    /// List fetch failed (authorization, transport); inline message.
    Failed(String),
}

/// What the active prompt is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptPurpose {
    AddUsername,
    AddPassword { username: String },
    Rename { id: String },
    SetPassword { id: String },
    ConfirmDelete { id: String },
}

#[derive(Debug, Clone)]
struct Prompt {
    purpose: PromptPurpose,
    label: String,
    buffer: String,
    /// Mask input with `*` (passwords).
    masked: bool,
}

/// Admin users screen state.
pub struct AdminScreen {
    users: Vec<AdminUser>,
    state: UserListState,
    selected: usize,
    prompt: Option<Prompt>,
}

impl AdminScreen {
    /// Create an empty screen; the app requests the list on first focus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Vec::new(),
            state: UserListState::Loading,
            selected: 0,
            prompt: None,
        }
    }

    /// Apply a user-list result.
    pub fn set_users(&mut self, result: Result<Vec<AdminUser>, String>) {
        match result {
            Ok(users) => {
                self.users = users;
                self.state = UserListState::Loaded;
                if self.selected >= self.users.len() {
                    self.selected = self.users.len().saturating_sub(1);
                }
            }
            Err(message) => {
                self.users.clear();
                self.selected = 0;
                self.state = UserListState::Failed(message);
            }
        }
    }

    /// Mark the list as loading (request sent).
    pub fn set_loading(&mut self) {
        self.state = UserListState::Loading;
    }

    /// Whether a prompt currently captures plain characters.
    #[must_use]
    pub fn prompt_active(&self) -> bool {
        self.prompt.is_some()
    }

    fn selected_user(&self) -> Option<&AdminUser> {
        self.users.get(self.selected)
    }

    fn open_prompt(&mut self, purpose: PromptPurpose, label: String, masked: bool) {
        self.prompt = Some(Prompt {
            purpose,
            label,
            buffer: String::new(),
            masked,
        });
    }

    /// Prompt submission: either advances the two-step add flow or emits the
    /// final request.
    fn submit_prompt(&mut self) -> ScreenAction {
        let Some(prompt) = self.prompt.take() else {
            return ScreenAction::Consumed;
        };
        let value = prompt.buffer.trim().to_owned();
        match prompt.purpose {
            PromptPurpose::AddUsername => {
                if value.is_empty() {
                    return ScreenAction::Consumed;
                }
                self.open_prompt(
                    PromptPurpose::AddPassword { username: value.clone() },
                    format!("Password for '{value}'"),
                    true,
                );
                ScreenAction::Consumed
            }
            PromptPurpose::AddPassword { username } => {
                if value.is_empty() {
                    return ScreenAction::Consumed;
                }
                ScreenAction::Admin(AdminRequest::Add { username, password: value })
            }
            PromptPurpose::Rename { id } => {
                if value.is_empty() {
                    return ScreenAction::Consumed;
                }
                ScreenAction::Admin(AdminRequest::Rename { id, username: value })
            }
            PromptPurpose::SetPassword { id } => {
                if value.is_empty() {
                    return ScreenAction::Consumed;
                }
                ScreenAction::Admin(AdminRequest::SetPassword { id, password: value })
            }
            // Confirmation is keyed, not typed; handled in `handle_input`.
            PromptPurpose::ConfirmDelete { .. } => ScreenAction::Consumed,
        }
    }

    fn handle_prompt_key(&mut self, code: KeyCode) -> ScreenAction {
        // Delete confirmation: single keystroke, no text buffer.
        if let Some(Prompt { purpose: PromptPurpose::ConfirmDelete { id }, .. }) = &self.prompt {
            let id = id.clone();
            return match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.prompt = None;
                    ScreenAction::Admin(AdminRequest::Delete { id })
                }
                _ => {
                    self.prompt = None;
                    ScreenAction::Consumed
                }
            };
        }

        match code {
            KeyCode::Esc => {
                self.prompt = None;
                ScreenAction::Consumed
            }
            KeyCode::Enter => self.submit_prompt(),
            KeyCode::Backspace => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.buffer.pop();
                }
                ScreenAction::Consumed
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = &mut self.prompt {
                    prompt.buffer.push(c);
                }
                ScreenAction::Consumed
            }
            _ => ScreenAction::Consumed,
        }
    }

    /// Process an input event.
    pub fn handle_input(&mut self, event: &InputEvent, _ctx: &ScreenContext) -> ScreenAction {
        let InputEvent::Key(code, _mods) = event else {
            return ScreenAction::Ignored;
        };

        if self.prompt.is_some() {
            return self.handle_prompt_key(*code);
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                ScreenAction::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.users.is_empty() && self.selected + 1 < self.users.len() {
                    self.selected += 1;
                }
                ScreenAction::Consumed
            }
            KeyCode::Char('a') => {
                self.open_prompt(PromptPurpose::AddUsername, "New username".to_owned(), false);
                ScreenAction::Consumed
            }
            KeyCode::Char('n') => match self.selected_user() {
                Some(user) => {
                    let label = format!("New username for '{}'", user.username);
                    self.open_prompt(PromptPurpose::Rename { id: user.id.clone() }, label, false);
                    ScreenAction::Consumed
                }
                None => ScreenAction::Consumed,
            },
            KeyCode::Char('p') => match self.selected_user() {
                Some(user) => {
                    let label = format!("New password for '{}'", user.username);
                    self.open_prompt(
                        PromptPurpose::SetPassword { id: user.id.clone() },
                        label,
                        true,
                    );
                    ScreenAction::Consumed
                }
                None => ScreenAction::Consumed,
            },
            KeyCode::Char('d') => match self.selected_user() {
                Some(user) => {
                    let label = format!("Delete user '{}'? (y/N)", user.username);
                    self.open_prompt(
                        PromptPurpose::ConfirmDelete { id: user.id.clone() },
                        label,
                        false,
                    );
                    ScreenAction::Consumed
                }
                None => ScreenAction::Consumed,
            },
            KeyCode::Char('r') => {
                self.set_loading();
                ScreenAction::Admin(AdminRequest::Reload)
            }
            _ => ScreenAction::Ignored,
        }
    }

    /// Render the screen into `area`.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(3)])
            .split(area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Console Users ({}) ", self.users.len()));
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);

        match &self.state {
            UserListState::Loading => {
                frame.render_widget(
                    Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray)),
                    inner,
                );
            }
            UserListState::Failed(message) => {
                frame.render_widget(
                    Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
                    inner,
                );
            }
            UserListState::Loaded if self.users.is_empty() => {
                frame.render_widget(
                    Paragraph::new("No users").style(Style::default().fg(Color::DarkGray)),
                    inner,
                );
            }
            UserListState::Loaded => {
                let rows: Vec<Row<'static>> = self
                    .users
                    .iter()
                    .enumerate()
                    .map(|(i, user)| {
                        let style = if i == self.selected {
                            Style::default().add_modifier(Modifier::REVERSED)
                        } else {
                            Style::default()
                        };
                        Row::new(vec![
                            Cell::from(Span::styled(
                                format!("#{}", user.id),
                                Style::default().fg(Color::DarkGray),
                            )),
                            Cell::from(user.username.clone()),
                        ])
                        .style(style)
                    })
                    .collect();
                let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(16)])
                    .header(
                        Row::new(vec!["Id", "Username"])
                            .style(Style::default().add_modifier(Modifier::BOLD)),
                    );
                frame.render_widget(table, inner);
            }
        }

        let footer: Line<'static> = match &self.prompt {
            Some(prompt) => {
                let shown = if prompt.masked {
                    "*".repeat(prompt.buffer.chars().count())
                } else {
                    prompt.buffer.clone()
                };
                Line::from(vec![
                    Span::styled(
                        format!("{}: ", prompt.label),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("{shown}_"), Style::default().add_modifier(Modifier::REVERSED)),
                ])
            }
            None => Line::from(Span::styled(
                "a add · n rename · p password · d delete · r reload",
                Style::default().fg(Color::DarkGray),
            )),
        };
        let footer = Paragraph::new(footer)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[1]);
    }
}

impl Default for AdminScreen {
    fn default() -> Self {
        Self::new()
    }
}
