//! History merge engine: backend window + local cache → renderable trail.
//!
//! The detail view shows a vehicle's recent movement as a polyline with a
//! start marker, an end marker, and labeled intermediate fixes. The input is
//! two sample sequences: the 5-minute window fetched from the backend once
//! per viewing session, and the continuously growing local
//! [`crate::cache::PositionCache`] window. The merge is a full recompute on
//! every update — the boundaries (and therefore the start/end roles and
//! label suppression) shift as new samples arrive.
//!
//! Known imprecision, kept deliberately: the two sources are concatenated
//! without cross-source dedup, so fixes near the cache/backend boundary can
//! be drawn twice. Harmless for visualization; do not "fix" without product
//! sign-off.

use crate::cache::PositionSample;

/// An intermediate waypoint's time label is suppressed when it sits within
/// this many seconds of either trail endpoint, to keep endpoint labels
/// readable.
pub const LABEL_SUPPRESS_SECS: i64 = 5;

/// Role of a waypoint within a trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRole {
    /// Oldest fix; drawn as the departure marker.
    Start,
    /// Newest fix; drawn as the current-position marker.
    End,
    /// Everything in between; drawn as small dots.
    Intermediate,
}

/// One renderable trail point.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// The underlying sample.
    pub sample: PositionSample,
    /// Start / end / intermediate.
    pub role: WaypointRole,
    /// Whether the time label should be drawn next to the point.
    /// Always `true` for start/end; governed by [`LABEL_SUPPRESS_SECS`]
    /// for intermediates.
    pub show_time_label: bool,
}

/// Result of merging the two history windows.
#[derive(Debug, Clone, PartialEq)]
pub enum Trail {
    /// No samples in either window. The caller renders a single marker at
    /// the vehicle's last reported coordinate, with no polyline.
    Empty,
    /// Time-ordered waypoints, oldest first. At least one element; a
    /// single-element path has that waypoint in the [`WaypointRole::End`]
    /// role.
    Path(Vec<Waypoint>),
}

impl Trail {
    /// Waypoints, or an empty slice for [`Trail::Empty`].
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        match self {
            Self::Empty => &[],
            Self::Path(points) => points,
        }
    }

    /// Whether the merge produced no drawable trail.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Merge the backend history window with the local cache window into a
/// renderable trail.
///
/// Concatenates backend samples then local samples (see the module docs on
/// the deliberate lack of cross-source dedup) and stable-sorts ascending by
/// timestamp, so equal-timestamp samples keep backend-before-local order.
#[must_use]
pub fn build_trail(backend: &[PositionSample], local: &[PositionSample]) -> Trail {
    let mut merged: Vec<PositionSample> = Vec::with_capacity(backend.len() + local.len());
    merged.extend_from_slice(backend);
    merged.extend_from_slice(local);
    merged.sort_by_key(|p| p.timestamp);

    if merged.is_empty() {
        return Trail::Empty;
    }

    let start_ts = merged[0].timestamp;
    let end_ts = merged[merged.len() - 1].timestamp;
    let last = merged.len() - 1;

    let waypoints = merged
        .into_iter()
        .enumerate()
        .map(|(i, sample)| {
            let role = if i == last {
                WaypointRole::End
            } else if i == 0 {
                WaypointRole::Start
            } else {
                WaypointRole::Intermediate
            };
            let show_time_label = match role {
                WaypointRole::Start | WaypointRole::End => true,
                WaypointRole::Intermediate => {
                    (sample.timestamp - start_ts).abs() > LABEL_SUPPRESS_SECS
                        && (end_ts - sample.timestamp).abs() > LABEL_SUPPRESS_SECS
                }
            };
            Waypoint {
                sample,
                role,
                show_time_label,
            }
        })
        .collect();

    Trail::Path(waypoints)
}
