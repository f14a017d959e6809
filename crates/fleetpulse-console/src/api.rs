//! Backend access: the [`FleetBackend`] trait and its HTTP implementation.
//!
//! The trait decouples the poller and screens from the concrete transport so
//! the console can run against the live backend ([`HttpBackend`]) or a
//! deterministic in-process fleet ([`crate::demo::DemoBackend`]) for
//! development and tests.
//!
//! Degradation rules follow the endpoint contracts: the snapshot feed
//! tolerates empty bodies and non-array JSON (both become an empty fleet),
//! history failures shrink to an empty window, and admin mutations surface
//! the backend's `error` field instead of silently succeeding.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use fleetpulse_core::{FleetError, FleetResult, PositionSample, VehicleSnapshot};

/// Request timeout for every backend call. Poll ticks may overlap when the
/// backend is slower than the poll period; state application is
/// last-write-wins, so that is tolerated rather than prevented.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// History window requested when a vehicle detail view opens, in minutes.
pub const HISTORY_WINDOW_MINUTES: u32 = 5;

// ─── Wire Types ─────────────────────────────────────────────────────────────

/// One point of the backend-served history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Fix time, seconds since the epoch.
    pub timestamp: i64,
    /// Pre-formatted clock string for labels.
    #[serde(default)]
    pub time: String,
}

impl HistoryPoint {
    /// Convert into the cache/trail sample representation.
    #[must_use]
    pub fn into_sample(self) -> PositionSample {
        PositionSample {
            lat: self.lat,
            lng: self.lng,
            timestamp: self.timestamp,
            display_time: self.time,
        }
    }
}

/// One scheduled duty for a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTask {
    /// Route / duty code.
    pub code: String,
    /// Destination description.
    pub dest: String,
    /// Departure time string.
    pub time: String,
    /// Assigned driver's register number, when known.
    #[serde(default)]
    pub driver_register_no: Option<String>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    // The user store emits numeric ids; older deployments used strings.
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// One console user as listed by the admin endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    /// Backend identifier, normalized to a string.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Login name.
    pub username: String,
}

/// Acknowledgement body returned by every admin mutation.
#[derive(Debug, Clone, Default, Deserialize)]
struct AdminAck {
    #[serde(default)]
    error: Option<String>,
}

impl AdminAck {
    /// Convert into a result, surfacing a non-empty `error` field.
    fn into_result(self, action: &str) -> FleetResult<()> {
        match self.error {
            Some(message) if !message.is_empty() => Err(FleetError::AdminRejected {
                action: action.to_owned(),
                message,
            }),
            _ => Ok(()),
        }
    }
}

// ─── Backend Trait ──────────────────────────────────────────────────────────

/// Everything the console needs from a backend.
///
/// Implementations are owned by the poller thread and called sequentially;
/// they need `Send` but not `Sync`.
pub trait FleetBackend: Send {
    /// Fetch the full fleet snapshot. Empty/whitespace bodies and non-array
    /// JSON coerce to an empty fleet; transport failures are errors so the
    /// connection pulse can flip.
    fn fetch_fleet(&self) -> FleetResult<Vec<VehicleSnapshot>>;

    /// Fetch a vehicle's recent history window. Failures degrade to an
    /// empty window; they are never fatal and never affect other vehicles.
    fn fetch_history(&self, door_code: &str, minutes: u32) -> Vec<PositionSample>;

    /// Fetch a vehicle's duty list.
    fn fetch_tasks(&self, door_code: &str) -> FleetResult<Vec<VehicleTask>>;

    /// List console users. Non-success statuses become
    /// [`FleetError::AdminUnauthorized`].
    fn list_users(&self) -> FleetResult<Vec<AdminUser>>;

    /// Create a user.
    fn add_user(&self, username: &str, password: &str) -> FleetResult<()>;

    /// Change a user's password.
    fn update_password(&self, id: &str, password: &str) -> FleetResult<()>;

    /// Change a user's login name.
    fn update_username(&self, id: &str, username: &str) -> FleetResult<()>;

    /// Delete a user.
    fn delete_user(&self, id: &str) -> FleetResult<()>;
}

// ─── HTTP Backend ───────────────────────────────────────────────────────────

/// Blocking HTTP implementation of [`FleetBackend`].
///
/// Confined to the poller thread; the render loop never blocks on it.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the given base URL (scheme + host + port, no
    /// trailing slash required).
    pub fn new(base_url: impl Into<String>) -> FleetResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FleetError::BackendUnavailable {
                endpoint: "<client init>".to_owned(),
                source: Box::new(e),
            })?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn transport_err(endpoint: &str, e: reqwest::Error) -> FleetError {
        FleetError::BackendUnavailable {
            endpoint: endpoint.to_owned(),
            source: Box::new(e),
        }
    }
}

impl FleetBackend for HttpBackend {
    fn fetch_fleet(&self) -> FleetResult<Vec<VehicleSnapshot>> {
        const ENDPOINT: &str = "/api/veriler";
        // Cache-busting query param; the backend sits behind a CDN that has
        // been caught caching despite no-store headers.
        let stamp = chrono::Utc::now().timestamp_millis();
        let body = self
            .client
            .get(self.url(ENDPOINT))
            .query(&[("t", stamp)])
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| Self::transport_err(ENDPOINT, e))?
            .text()
            .map_err(|e| Self::transport_err(ENDPOINT, e))?;

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| FleetError::MalformedResponse {
                endpoint: ENDPOINT.to_owned(),
                detail: e.to_string(),
            })?;

        let Value::Array(items) = value else {
            tracing::warn!(target: "fleetpulse.api", "fleet body was not an array; coerced to empty");
            return Ok(Vec::new());
        };

        // Tolerate individual malformed elements instead of dropping the tick.
        Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }

    fn fetch_history(&self, door_code: &str, minutes: u32) -> Vec<PositionSample> {
        let endpoint = format!("/api/history/{door_code}");
        let result = self
            .client
            .get(self.url(&endpoint))
            .query(&[("minutes", minutes)])
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(|resp| resp.json::<Vec<HistoryPoint>>());

        match result {
            Ok(points) => points.into_iter().map(HistoryPoint::into_sample).collect(),
            Err(e) => {
                tracing::warn!(target: "fleetpulse.api", door_code, error = %e, "history fetch failed; using empty window");
                Vec::new()
            }
        }
    }

    fn fetch_tasks(&self, door_code: &str) -> FleetResult<Vec<VehicleTask>> {
        let endpoint = format!("/api/tasks/{door_code}");
        self.client
            .get(self.url(&endpoint))
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(|resp| resp.json())
            .map_err(|e| Self::transport_err(&endpoint, e))
    }

    fn list_users(&self) -> FleetResult<Vec<AdminUser>> {
        const ENDPOINT: &str = "/api/admin/users";
        let resp = self
            .client
            .get(self.url(ENDPOINT))
            .send()
            .map_err(|e| Self::transport_err(ENDPOINT, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FleetError::AdminUnauthorized {
                status: status.as_u16(),
            });
        }
        resp.json().map_err(|e| Self::transport_err(ENDPOINT, e))
    }

    fn add_user(&self, username: &str, password: &str) -> FleetResult<()> {
        const ENDPOINT: &str = "/api/admin/users";
        self.client
            .post(self.url(ENDPOINT))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .and_then(|resp| resp.json::<AdminAck>())
            .map_err(|e| Self::transport_err(ENDPOINT, e))?
            .into_result("add user")
    }

    fn update_password(&self, id: &str, password: &str) -> FleetResult<()> {
        let endpoint = format!("/api/admin/users/{id}/password");
        self.client
            .put(self.url(&endpoint))
            .json(&serde_json::json!({ "password": password }))
            .send()
            .and_then(|resp| resp.json::<AdminAck>())
            .map_err(|e| Self::transport_err(&endpoint, e))?
            .into_result("change password")
    }

    fn update_username(&self, id: &str, username: &str) -> FleetResult<()> {
        let endpoint = format!("/api/admin/users/{id}/username");
        self.client
            .put(self.url(&endpoint))
            .json(&serde_json::json!({ "username": username }))
            .send()
            .and_then(|resp| resp.json::<AdminAck>())
            .map_err(|e| Self::transport_err(&endpoint, e))?
            .into_result("change username")
    }

    fn delete_user(&self, id: &str) -> FleetResult<()> {
        let endpoint = format!("/api/admin/users/{id}");
        self.client
            .delete(self.url(&endpoint))
            .send()
            .and_then(|resp| resp.json::<AdminAck>())
            .map_err(|e| Self::transport_err(&endpoint, e))?
            .into_result("delete user")
    }
}
