//! Vehicle snapshot wire model and activity classification.
//!
//! [`VehicleSnapshot`] mirrors one element of the backend fleet array. The
//! feed is replaced wholesale on every poll tick; nothing in here is patched
//! per field. Numeric and boolean fields arrive in whatever shape the
//! upstream tracker emitted that day (numbers, numeric strings, `"true"`,
//! `null`), so the lenient deserializers below coerce instead of failing the
//! whole tick.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A vehicle is active when its last update is within this many seconds of
/// now, in either direction. The symmetric window tolerates slightly-future
/// timestamps from tracker clock skew.
pub const ACTIVE_WINDOW_SECS: i64 = 300;

/// A vehicle is stale when its last update is at least this far in the past.
pub const STALE_THRESHOLD_SECS: i64 = 86_400;

// ─── Lenient field coercion ─────────────────────────────────────────────────

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        _ => false,
    })
}

// ─── Vehicle Snapshot ───────────────────────────────────────────────────────

/// One vehicle's last-known state as reported by the fleet feed.
///
/// The identifier appears under two spellings depending on which upstream
/// system produced the record; [`VehicleSnapshot::door_code`] coalesces them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleSnapshot {
    /// Primary door-code identifier (e.g. `B-058`).
    pub vehicle_door_code: Option<String>,
    /// Legacy identifier spelling used by part of the fleet.
    pub bus_door_number: Option<String>,
    /// Raw operator name; canonicalized via [`crate::company::map_company_name`].
    pub operator_type: Option<String>,
    /// Last-known latitude.
    #[serde(deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    /// Last-known longitude.
    #[serde(deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    /// Last update date, local calendar, `DD-MM-YYYY`.
    pub last_location_date: Option<String>,
    /// Last update time, local calendar, `HH:MM:SS`.
    pub last_location_time: Option<String>,
    /// License plate.
    pub number_plate: Option<String>,
    /// Manufacturer.
    pub brand_name: Option<String>,
    /// Model year.
    #[serde(deserialize_with = "lenient_u32")]
    pub model_year: Option<u32>,
    /// Body type description.
    pub vehicle_type: Option<String>,
    /// Seated passenger capacity.
    #[serde(deserialize_with = "lenient_u32")]
    pub seating_capacity: Option<u32>,
    /// Total passenger capacity.
    #[serde(deserialize_with = "lenient_u32")]
    pub full_capacity: Option<u32>,
    /// Last reported speed in km/h.
    #[serde(deserialize_with = "lenient_f64")]
    pub speed: Option<f64>,
    /// USB charger feature flag.
    #[serde(deserialize_with = "lenient_bool")]
    pub has_usb_charger: bool,
    /// Wi-Fi feature flag.
    #[serde(deserialize_with = "lenient_bool")]
    pub has_wifi: bool,
    /// Air conditioning flag; the feed sometimes sends `null` or `"true"`.
    #[serde(deserialize_with = "lenient_bool")]
    pub is_air_conditioned: bool,
    /// Wheelchair accessibility flag.
    #[serde(deserialize_with = "lenient_bool")]
    pub accessibility: bool,
}

impl VehicleSnapshot {
    /// The vehicle identifier, whichever spelling the feed used.
    ///
    /// Returns an empty string when neither field is present; callers treat
    /// that as "skip this record" for caching and favorites.
    #[must_use]
    pub fn door_code(&self) -> &str {
        self.vehicle_door_code
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.bus_door_number.as_deref())
            .unwrap_or("")
    }

    /// Parsed last-update instant, if both date and time fields are present
    /// and well-formed.
    #[must_use]
    pub fn last_update(&self) -> Option<NaiveDateTime> {
        parse_datetime(
            self.last_location_date.as_deref()?,
            self.last_location_time.as_deref()?,
        )
    }

    /// Whether the vehicle reported within [`ACTIVE_WINDOW_SECS`] of `now`.
    ///
    /// Missing or unparseable date/time fields mean never-active.
    #[must_use]
    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        let Some(ts) = self.last_update() else {
            return false;
        };
        let diff = now.signed_duration_since(ts).num_seconds();
        diff < ACTIVE_WINDOW_SECS && diff > -ACTIVE_WINDOW_SECS
    }

    /// Whether the last update is at least [`STALE_THRESHOLD_SECS`] old.
    ///
    /// Vehicles without a parseable timestamp are excluded from staleness.
    #[must_use]
    pub fn is_stale(&self, now: NaiveDateTime) -> bool {
        let Some(ts) = self.last_update() else {
            return false;
        };
        now.signed_duration_since(ts).num_seconds() >= STALE_THRESHOLD_SECS
    }
}

/// Parse the backend's `DD-MM-YYYY` + `HH:MM:SS` pair into a local-calendar
/// datetime. No timezone is attached; comparisons use the same local clock.
#[must_use]
pub fn parse_datetime(date: &str, time: &str) -> Option<NaiveDateTime> {
    let mut date_parts = date.splitn(3, '-');
    let day: u32 = date_parts.next()?.trim().parse().ok()?;
    let month: u32 = date_parts.next()?.trim().parse().ok()?;
    let year: i32 = date_parts.next()?.trim().parse().ok()?;

    let mut time_parts = time.splitn(3, ':');
    let hour: u32 = time_parts.next()?.trim().parse().ok()?;
    let min: u32 = time_parts.next()?.trim().parse().ok()?;
    let sec: u32 = time_parts.next()?.trim().parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, min, sec)?;
    Some(NaiveDateTime::new(date, time))
}
