//! Client-side position cache with change-detection dedup.
//!
//! Every poll tick feeds the last-known coordinate of each vehicle into this
//! cache; over a few minutes that accumulates into a short local movement
//! trail without any extra backend traffic. Two rules keep it bounded:
//!
//! 1. A sample is appended only when it moved more than
//!    [`SPATIAL_EPSILON`] from the latest retained sample in either axis.
//!    Parked vehicles therefore occupy one slot, not one per tick.
//! 2. Samples older than [`WINDOW_SECS`] are pruned on every ingest for the
//!    affected vehicle, not lazily on read.
//!
//! Malformed input (empty identifier, non-finite coordinates) is skipped
//! silently; a bad record in the feed must never corrupt the cache.

use std::collections::HashMap;

/// Minimum per-axis movement (degrees) before a new sample is retained.
pub const SPATIAL_EPSILON: f64 = 1e-5;

/// Sliding retention window in seconds.
pub const WINDOW_SECS: i64 = 300;

/// One cached position fix.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSample {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Ingest time, seconds since the epoch.
    pub timestamp: i64,
    /// Human-readable clock string carried through to trail labels.
    pub display_time: String,
}

/// Per-vehicle sliding-window store of [`PositionSample`]s, keyed by door
/// code. Single-writer: the poll loop ingests, screens read.
#[derive(Debug, Default)]
pub struct PositionCache {
    histories: HashMap<String, Vec<PositionSample>>,
}

impl PositionCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one vehicle's last-known coordinate from a poll tick.
    ///
    /// Appends only when the position moved beyond [`SPATIAL_EPSILON`], then
    /// prunes everything older than [`WINDOW_SECS`] for this vehicle.
    /// Returns `true` when a sample was appended.
    pub fn ingest(
        &mut self,
        door_code: &str,
        lat: f64,
        lng: f64,
        display_time: &str,
        now_secs: i64,
    ) -> bool {
        if door_code.is_empty() || !lat.is_finite() || !lng.is_finite() {
            tracing::debug!(
                target: "fleetpulse.cache",
                door_code,
                lat,
                lng,
                "skipped malformed position sample"
            );
            return false;
        }

        let history = self.histories.entry(door_code.to_owned()).or_default();

        let moved = match history.last() {
            None => true,
            Some(last) => {
                (last.lat - lat).abs() > SPATIAL_EPSILON || (last.lng - lng).abs() > SPATIAL_EPSILON
            }
        };

        if moved {
            history.push(PositionSample {
                lat,
                lng,
                timestamp: now_secs,
                display_time: display_time.to_owned(),
            });
        }

        history.retain(|p| now_secs - p.timestamp < WINDOW_SECS);
        moved
    }

    /// Cached samples for a vehicle, oldest first. Empty for unknown doors.
    #[must_use]
    pub fn history(&self, door_code: &str) -> &[PositionSample] {
        self.histories.get(door_code).map_or(&[], Vec::as_slice)
    }

    /// Number of vehicles with at least one retained sample.
    #[must_use]
    pub fn vehicle_count(&self) -> usize {
        self.histories.values().filter(|h| !h.is_empty()).count()
    }

    /// Drop every cached sample (used when the console reconnects to a
    /// different backend).
    pub fn clear(&mut self) {
        self.histories.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_always_retained() {
        let mut cache = PositionCache::new();
        assert!(cache.ingest("B-058", 41.01, 28.98, "15:00:00", 1_000));
        assert_eq!(cache.history("B-058").len(), 1);
    }

    #[test]
    fn sub_epsilon_movement_is_deduplicated() {
        let mut cache = PositionCache::new();
        cache.ingest("B-058", 41.01, 28.98, "15:00:00", 1_000);
        // Both axes within epsilon: dropped.
        assert!(!cache.ingest("B-058", 41.010_005, 28.980_005, "15:00:02", 1_002));
        assert_eq!(cache.history("B-058").len(), 1);
        // One axis beyond epsilon: retained.
        assert!(cache.ingest("B-058", 41.010_02, 28.98, "15:00:04", 1_004));
        assert_eq!(cache.history("B-058").len(), 2);
    }

    #[test]
    fn window_pruning_happens_on_ingest() {
        let mut cache = PositionCache::new();
        cache.ingest("B-058", 41.01, 28.98, "15:00:00", 1_000);
        cache.ingest("B-058", 41.02, 28.98, "15:02:00", 1_120);
        // 301 s after the first sample: it falls out of the window.
        cache.ingest("B-058", 41.03, 28.98, "15:05:01", 1_301);
        let hist = cache.history("B-058");
        assert_eq!(hist.len(), 2);
        assert!(hist.iter().all(|p| 1_301 - p.timestamp < WINDOW_SECS));
    }

    #[test]
    fn retained_samples_are_time_ordered() {
        let mut cache = PositionCache::new();
        for (i, lat) in [41.01, 41.02, 41.03, 41.04].iter().enumerate() {
            cache.ingest("B-058", *lat, 28.98, "t", 1_000 + i as i64 * 10);
        }
        let hist = cache.history("B-058");
        assert!(hist.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn malformed_input_is_skipped_silently() {
        let mut cache = PositionCache::new();
        assert!(!cache.ingest("", 41.0, 28.9, "t", 1_000));
        assert!(!cache.ingest("B-1", f64::NAN, 28.9, "t", 1_000));
        assert!(!cache.ingest("B-1", 41.0, f64::INFINITY, "t", 1_000));
        assert_eq!(cache.vehicle_count(), 0);
        // The cache still works for the same door afterwards.
        assert!(cache.ingest("B-1", 41.0, 28.9, "t", 1_000));
        assert_eq!(cache.history("B-1").len(), 1);
    }

    #[test]
    fn vehicles_are_tracked_independently() {
        let mut cache = PositionCache::new();
        cache.ingest("B-1", 41.0, 28.9, "t", 1_000);
        cache.ingest("B-2", 40.0, 29.9, "t", 1_000);
        cache.ingest("B-2", 40.1, 29.9, "t", 1_010);
        assert_eq!(cache.history("B-1").len(), 1);
        assert_eq!(cache.history("B-2").len(), 2);
        assert_eq!(cache.vehicle_count(), 2);
        assert!(cache.history("B-3").is_empty());
    }
}
