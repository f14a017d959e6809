//! Pure reconciliation engine for the fleetpulse console.
//!
//! This crate holds every data transform the console needs and nothing it
//! renders with: operator-name canonicalization, the sliding-window position
//! cache, the history merge engine, the filter/search/sort pipeline, virtual
//! row-window math, and export row derivation. No I/O and no rendering
//! surface live here, so everything is unit-testable in isolation.
//!
//! The console crate (`fleetpulse-console`) owns the HTTP client, the poll
//! loop, and the terminal UI, and calls into this crate on every tick.

#![forbid(unsafe_code)]

pub mod cache;
pub mod company;
pub mod error;
pub mod export;
pub mod filter;
pub mod trail;
pub mod vehicle;
pub mod viewport;

pub use cache::{PositionCache, PositionSample, SPATIAL_EPSILON, WINDOW_SECS};
pub use company::{
    company_options, map_company_name, normalize_text, CompanyRule, COMPANY_PRESETS, HALK_LABEL,
    UNKNOWN_LABEL,
};
pub use error::{FleetError, FleetResult};
pub use export::{
    column_widths, export_rows, ExportRow, COLUMN_PADDING, EXPORT_HEADERS, EXPORT_ROW_CAP,
};
pub use filter::{
    compute_counts, compute_visible, search_key, Counts, FilterState, FilterTab, VisibleResult,
};
pub use trail::{build_trail, Trail, Waypoint, WaypointRole, LABEL_SUPPRESS_SECS};
pub use vehicle::{
    parse_datetime, VehicleSnapshot, ACTIVE_WINDOW_SECS, STALE_THRESHOLD_SECS,
};
pub use viewport::{max_scroll_top, visible_rows, RowWindow, ROW_BUFFER};
