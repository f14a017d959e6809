//! Filter/search/sort pipeline deriving the visible vehicle list.
//!
//! The pipeline applies its predicates in a fixed order because two counter
//! sets are snapshotted mid-pipeline and shown in different places:
//!
//! 1. company filter
//! 2. **top counts** snapshot (tab bar badges — company filter only)
//! 3. active/inactive tab
//! 4. staleness filter
//! 5. free-text search
//! 6. **summary counts** snapshot (summary cards — all filters applied)
//! 7. favorites-first stable partition
//!
//! Reordering the steps changes what the operator sees on the tab badges
//! versus the summary cards; both snapshots are intentional.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::company::map_company_name;
use crate::vehicle::VehicleSnapshot;

// ─── Filter State ───────────────────────────────────────────────────────────

/// Active tab of the fleet list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTab {
    /// Every vehicle.
    #[default]
    All,
    /// Vehicles that reported within the activity window.
    Active,
    /// Vehicles that did not.
    Inactive,
}

impl FilterTab {
    /// All tabs in display order.
    pub const ALL: &'static [Self] = &[Self::All, Self::Active, Self::Inactive];

    /// Tab label for the list header.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    /// Cycle to the next tab.
    #[must_use]
    pub const fn cycle_next(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Inactive,
            Self::Inactive => Self::All,
        }
    }
}

/// Complete filter state, mutated only by explicit operator actions and read
/// by [`compute_visible`] on every recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Active tab.
    pub tab: FilterTab,
    /// Canonical company label to restrict to; `None` means all companies.
    pub company: Option<String>,
    /// Free-text search; empty means no search filter.
    pub search: String,
    /// Restrict to vehicles whose last update is at least a day old.
    pub stale_only: bool,
}

impl FilterState {
    /// Whether any restriction beyond the default view is active.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.tab != FilterTab::All
            || self.company.is_some()
            || !self.search.is_empty()
            || self.stale_only
    }
}

// ─── Counts ─────────────────────────────────────────────────────────────────

/// Total/active/inactive tallies over some stage of the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Vehicles considered.
    pub total: usize,
    /// Of those, active.
    pub active: usize,
    /// Of those, inactive.
    pub inactive: usize,
}

/// Tally a vehicle list at one pipeline stage.
#[must_use]
pub fn compute_counts(list: &[VehicleSnapshot], now: NaiveDateTime) -> Counts {
    let active = list.iter().filter(|v| v.is_active(now)).count();
    Counts {
        total: list.len(),
        active,
        inactive: list.len() - active,
    }
}

// ─── Search matching ────────────────────────────────────────────────────────

/// Strip everything but ASCII alphanumerics, lowercasing the rest, so a
/// hyphenated door code matches a query typed without hyphens and vice
/// versa (`b-058` ⇔ `b058`).
#[must_use]
pub fn search_key(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn matches_search(v: &VehicleSnapshot, query: &str, query_key: &str) -> bool {
    let door_raw = v.door_code().to_lowercase();
    if door_raw.contains(query) {
        return true;
    }
    if !query_key.is_empty() && search_key(&door_raw).contains(query_key) {
        return true;
    }
    map_company_name(v.operator_type.as_deref().unwrap_or(""))
        .to_lowercase()
        .contains(query)
}

// ─── Visible Result ─────────────────────────────────────────────────────────

/// Output of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct VisibleResult {
    /// Filtered, favorites-first vehicle list in render order.
    pub vehicles: Vec<VehicleSnapshot>,
    /// Counts after the company filter only (tab bar badges).
    pub top_counts: Counts,
    /// Counts after every filter through search (summary cards).
    pub summary_counts: Counts,
}

/// Run the full pipeline. Pure and idempotent: identical inputs produce
/// identical output lists and counts.
#[must_use]
pub fn compute_visible(
    vehicles: &[VehicleSnapshot],
    state: &FilterState,
    favorites: &HashSet<String>,
    now: NaiveDateTime,
) -> VisibleResult {
    // 1. Company filter.
    let mut filtered: Vec<VehicleSnapshot> = match state.company.as_deref() {
        None => vehicles.to_vec(),
        Some(company) => vehicles
            .iter()
            .filter(|v| map_company_name(v.operator_type.as_deref().unwrap_or("")) == company)
            .cloned()
            .collect(),
    };

    // 2. Top counts reflect the company filter only.
    let top_counts = compute_counts(&filtered, now);

    // 3. Tab filter.
    match state.tab {
        FilterTab::All => {}
        FilterTab::Active => filtered.retain(|v| v.is_active(now)),
        FilterTab::Inactive => filtered.retain(|v| !v.is_active(now)),
    }

    // 4. Staleness filter.
    if state.stale_only {
        filtered.retain(|v| v.is_stale(now));
    }

    // 5. Search.
    let query = state.search.trim().to_lowercase();
    if !query.is_empty() {
        let query_key = search_key(&query);
        filtered.retain(|v| matches_search(v, &query, &query_key));
    }

    // 6. Summary counts reflect all filters.
    let summary_counts = compute_counts(&filtered, now);

    // 7. Favorites first, both partitions in original order.
    let (favored, rest): (Vec<_>, Vec<_>) = filtered
        .into_iter()
        .partition(|v| favorites.contains(v.door_code()));
    let mut vehicles = favored;
    vehicles.extend(rest);

    VisibleResult {
        vehicles,
        top_counts,
        summary_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::parse_datetime;

    fn now() -> NaiveDateTime {
        parse_datetime("01-06-2025", "12:00:00").unwrap()
    }

    fn vehicle(door: &str, operator: &str, date: &str, time: &str) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_door_code: Some(door.to_owned()),
            operator_type: Some(operator.to_owned()),
            last_location_date: Some(date.to_owned()),
            last_location_time: Some(time.to_owned()),
            ..VehicleSnapshot::default()
        }
    }

    /// Two IETT vehicles (one active, one day-old) and one active OZULAS.
    fn fleet() -> Vec<VehicleSnapshot> {
        vec![
            vehicle("B-058", "iett", "01-06-2025", "11:58:00"),
            vehicle("B-100", "iett isletmeleri", "31-05-2025", "09:00:00"),
            vehicle("C-200", "ozulas", "01-06-2025", "11:59:30"),
        ]
    }

    #[test]
    fn no_filters_passes_everything_through() {
        let result = compute_visible(&fleet(), &FilterState::default(), &HashSet::new(), now());
        assert_eq!(result.vehicles.len(), 3);
        assert_eq!(result.top_counts, Counts { total: 3, active: 2, inactive: 1 });
        assert_eq!(result.summary_counts, result.top_counts);
    }

    #[test]
    fn top_counts_ignore_tab_but_respect_company() {
        let state = FilterState {
            tab: FilterTab::Active,
            company: Some("IETT".to_owned()),
            ..FilterState::default()
        };
        let result = compute_visible(&fleet(), &state, &HashSet::new(), now());
        // Top counts: both IETT vehicles, regardless of the Active tab.
        assert_eq!(result.top_counts, Counts { total: 2, active: 1, inactive: 1 });
        // Summary counts: only the active IETT vehicle survives.
        assert_eq!(result.summary_counts, Counts { total: 1, active: 1, inactive: 0 });
        assert_eq!(result.vehicles.len(), 1);
        assert_eq!(result.vehicles[0].door_code(), "B-058");
    }

    #[test]
    fn inactive_tab_selects_the_complement() {
        let state = FilterState { tab: FilterTab::Inactive, ..FilterState::default() };
        let result = compute_visible(&fleet(), &state, &HashSet::new(), now());
        assert_eq!(result.vehicles.len(), 1);
        assert_eq!(result.vehicles[0].door_code(), "B-100");
    }

    #[test]
    fn stale_filter_requires_day_old_updates() {
        let mut vehicles = fleet();
        vehicles.push(vehicle("D-300", "iett", "30-05-2025", "10:00:00"));
        let state = FilterState { stale_only: true, ..FilterState::default() };
        let result = compute_visible(&vehicles, &state, &HashSet::new(), now());
        // B-100 is ~27 h old, D-300 is two days old; both stale.
        let doors: Vec<&str> = result.vehicles.iter().map(VehicleSnapshot::door_code).collect();
        assert_eq!(doors, vec!["B-100", "D-300"]);
    }

    #[test]
    fn search_is_hyphen_insensitive_both_ways() {
        let mut state = FilterState { search: "b058".to_owned(), ..FilterState::default() };
        let result = compute_visible(&fleet(), &state, &HashSet::new(), now());
        assert_eq!(result.vehicles.len(), 1);
        assert_eq!(result.vehicles[0].door_code(), "B-058");

        // And the other direction: hyphenated query, bare candidate.
        let bare = vec![vehicle("B058", "iett", "01-06-2025", "11:58:00")];
        state.search = "b-058".to_owned();
        let result = compute_visible(&bare, &state, &HashSet::new(), now());
        assert_eq!(result.vehicles.len(), 1);
    }

    #[test]
    fn search_matches_canonical_company_label() {
        let state = FilterState { search: "ozulas".to_owned(), ..FilterState::default() };
        let result = compute_visible(&fleet(), &state, &HashSet::new(), now());
        assert_eq!(result.vehicles.len(), 1);
        assert_eq!(result.vehicles[0].door_code(), "C-200");
    }

    #[test]
    fn favorites_float_to_the_top_stably() {
        let favorites: HashSet<String> = ["C-200".to_owned()].into();
        let result = compute_visible(&fleet(), &FilterState::default(), &favorites, now());
        let doors: Vec<&str> = result.vehicles.iter().map(VehicleSnapshot::door_code).collect();
        // Favorite first; the two non-favorites keep their relative order.
        assert_eq!(doors, vec!["C-200", "B-058", "B-100"]);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let favorites: HashSet<String> = ["B-100".to_owned()].into();
        let state = FilterState { search: "b".to_owned(), ..FilterState::default() };
        let first = compute_visible(&fleet(), &state, &favorites, now());
        let second = compute_visible(&fleet(), &state, &favorites, now());
        let doors = |r: &VisibleResult| -> Vec<String> {
            r.vehicles.iter().map(|v| v.door_code().to_owned()).collect()
        };
        assert_eq!(doors(&first), doors(&second));
        assert_eq!(first.top_counts, second.top_counts);
        assert_eq!(first.summary_counts, second.summary_counts);
    }

    #[test]
    fn tab_cycle_covers_all_tabs() {
        let mut tab = FilterTab::All;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(tab);
            tab = tab.cycle_next();
        }
        assert_eq!(seen, FilterTab::ALL);
        assert_eq!(tab, FilterTab::All);
    }

    #[test]
    fn search_key_strips_punctuation() {
        assert_eq!(search_key("B-058"), "b058");
        assert_eq!(search_key("  c_74.2 "), "c742");
        assert_eq!(search_key("---"), "");
    }
}
