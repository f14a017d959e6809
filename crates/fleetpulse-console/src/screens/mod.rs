//! Console screens: fleet list, vehicle detail, admin users.
//!
//! Screens own their view state and input handling; they never mutate the
//! application's domain state directly. Instead `handle_input` returns a
//! [`ScreenAction`] describing the requested mutation, and the app applies
//! it through its single entry points. This keeps the filter state, cache,
//! and viewing context single-owner.

pub mod admin;
pub mod detail;
pub mod fleet;

pub use admin::AdminScreen;
pub use detail::DetailScreen;
pub use fleet::FleetScreen;

/// High-level input event consumed by screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press with modifiers.
    Key(crossterm::event::KeyCode, crossterm::event::KeyModifiers),
    /// A mouse event at a position.
    Mouse(crossterm::event::MouseEventKind, u16, u16),
    /// Terminal resize.
    Resize(u16, u16),
}

/// Context passed to screens for rendering and input handling.
#[derive(Debug, Clone, Copy)]
pub struct ScreenContext {
    /// Terminal width in columns.
    pub terminal_width: u16,
    /// Terminal height in rows (includes the app status bar).
    pub terminal_height: u16,
}

/// A requested change to the shared filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// Cycle the all/active/inactive tab.
    CycleTab,
    /// Cycle the company filter through the known companies and back to all.
    CycleCompany,
    /// Toggle the stale-only filter.
    ToggleStale,
    /// Append a character to the search text.
    SearchPush(char),
    /// Delete the last search character.
    SearchPop,
    /// Clear the search text.
    SearchClear,
}

/// A requested admin mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminRequest {
    /// Re-fetch the user list.
    Reload,
    /// Create a user.
    Add {
        /// Login name.
        username: String,
        /// Initial password.
        password: String,
    },
    /// Rename a user.
    Rename {
        /// Backend user id.
        id: String,
        /// New login name.
        username: String,
    },
    /// Change a user's password.
    SetPassword {
        /// Backend user id.
        id: String,
        /// New password.
        password: String,
    },
    /// Delete a user (already confirmed by the screen).
    Delete {
        /// Backend user id.
        id: String,
    },
}

/// Result of a screen's input handling, interpreted by the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenAction {
    /// Input was consumed; nothing further to do.
    Consumed,
    /// Input was not handled; the app applies global bindings.
    Ignored,
    /// Mutate the filter state and recompute the visible list.
    Filter(FilterChange),
    /// Open the detail view for a vehicle.
    OpenDetail(String),
    /// Close the detail view and return to the fleet list.
    CloseDetail,
    /// Star / unstar a vehicle.
    ToggleFavorite(String),
    /// Export the current list to a spreadsheet.
    Export,
    /// Re-fetch the viewed vehicle's backend history window.
    RefreshHistory,
    /// Perform an admin mutation.
    Admin(AdminRequest),
    /// Quit the application.
    Quit,
}
