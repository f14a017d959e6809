//! Unified error type for the fleetpulse crates.
//!
//! The console degrades gracefully for everything the polling loop can hit:
//! `BackendUnavailable` flips the connection pulse and is retried on the next
//! tick, history and task failures shrink to empty panels for the affected
//! vehicle only. `AdminRejected` is the one variant that must interrupt the
//! operator, since it reports an explicit mutation the backend refused.

use std::path::PathBuf;

/// Convenience alias used across the fleetpulse crates.
pub type FleetResult<T> = Result<T, FleetError>;

/// Every failure mode the fleet console distinguishes.
///
/// Each variant carries an actionable message; none of them is fatal to the
/// process — the poll loop never stops retrying.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// The backend could not be reached or answered with a non-success status.
    ///
    /// Recovered silently by the next poll tick; surfaced only through the
    /// passive connection pulse.
    #[error("Backend unavailable at {endpoint}: {source}. Retried on the next poll tick.")]
    BackendUnavailable {
        /// Endpoint path that failed (e.g. `/api/veriler`).
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend answered, but the body could not be interpreted.
    ///
    /// Callers coerce this to an empty result set rather than failing the
    /// tick; the variant exists so the condition can be logged with detail.
    #[error("Malformed response from {endpoint}: {detail}")]
    MalformedResponse {
        /// Endpoint path that produced the body.
        endpoint: String,
        /// What was wrong with it.
        detail: String,
    },

    /// An admin mutation was refused by the backend.
    ///
    /// Must be surfaced to the operator as a blocking notification; silent
    /// success would be misleading.
    #[error("Admin action '{action}' rejected: {message}")]
    AdminRejected {
        /// Which mutation was attempted (e.g. `add user`).
        action: String,
        /// The backend's error message, verbatim.
        message: String,
    },

    /// The admin user list endpoint returned a non-success status.
    #[error("Admin access denied (HTTP {status}). Check the session used by the console.")]
    AdminUnauthorized {
        /// HTTP status code returned by the backend.
        status: u16,
    },

    /// Writing the export spreadsheet failed.
    #[error("Export to {path} failed: {source}")]
    ExportFailed {
        /// Destination the workbook was being written to.
        path: PathBuf,
        /// The underlying writer error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A configuration value (flag or environment variable) was unusable.
    #[error("Invalid configuration: {field} = {value:?} — {reason}")]
    InvalidConfig {
        /// Which knob was set.
        field: String,
        /// The offending value.
        value: String,
        /// Why it was refused.
        reason: String,
    },
}
