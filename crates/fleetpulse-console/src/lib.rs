//! Operator TUI for live fleet monitoring.
//!
//! This crate wires the pure reconciliation engine (`fleetpulse-core`) to a
//! terminal front end:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  fleetpulse-console (this crate)                 │
//! │  ├─ app: ConsoleApp state machine + rendering    │
//! │  ├─ api: FleetBackend trait + HTTP client        │
//! │  ├─ demo: deterministic offline backend          │
//! │  ├─ poller: background fetch thread + channels   │
//! │  ├─ screens: fleet list, vehicle detail, admin   │
//! │  ├─ favorites: persisted watch list              │
//! │  ├─ overlays: help / alert / confirm popups      │
//! │  └─ export: xlsx report writer                   │
//! ├──────────────────────────────────────────────────┤
//! │  fleetpulse-core (pure transforms)               │
//! ├──────────────────────────────────────────────────┤
//! │  ratatui + crossterm                             │
//! └──────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]

pub mod api;
pub mod app;
pub mod demo;
pub mod export;
pub mod favorites;
pub mod overlays;
pub mod poller;
pub mod screens;

pub use api::{AdminUser, FleetBackend, HistoryPoint, HttpBackend, VehicleTask};
pub use app::{ConsoleApp, Pulse};
pub use demo::DemoBackend;
pub use export::{default_export_path, write_report};
pub use favorites::FavoritesStore;
pub use overlays::{Overlay, OverlayKind};
pub use poller::{PollCommand, PollEvent, Poller, DEFAULT_POLL_PERIOD};
pub use screens::{
    AdminRequest, AdminScreen, DetailScreen, FilterChange, FleetScreen, InputEvent, ScreenAction,
    ScreenContext,
};
