//! Deterministic in-process backend for `--demo` and tests.
//!
//! Generates a small synthetic fleet moving around the Istanbul basin with a
//! reproducible pseudo-random walk: the same seed and tick sequence always
//! produce the same fleet, histories, and task lists, so integration tests
//! can assert on exact values and `--demo` exercises every screen offline.
//!
//! The admin surface is a real in-memory user store with the same rejection
//! rules as the backend (duplicate usernames, unknown ids), which lets the
//! admin screen and its error overlays be driven end to end.

use std::sync::Mutex;

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};

use fleetpulse_core::{FleetError, FleetResult, PositionSample, VehicleSnapshot};

use crate::api::{AdminUser, FleetBackend, VehicleTask};

/// Default number of moving vehicles in the demo fleet.
pub const DEMO_FLEET_SIZE: usize = 36;

const OPERATORS: &[&str] = &[
    "IETT ISLETMELERI",
    "ÖZULAŞ TOPLU TAŞIM A.Ş.",
    "İSTANBUL HALK ULAŞIM TİC.A.Ş",
    "MAVİ MARMARA TURİZM",
    "ÖZTAŞ ULAŞIM",
    "GÜNAYDIN TURİZM",
];

const DESTINATIONS: &[&str] = &[
    "Kadıköy", "Avcılar", "Zincirlikuyu", "Taksim", "Üsküdar", "Bakırköy",
];

// Deterministic splitmix64 step; good enough spread for a demo walk.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

fn unit(seed: u64) -> f64 {
    // Map to [0, 1).
    (mix(seed) >> 11) as f64 / (1u64 << 53) as f64
}

/// Deterministic synthetic [`FleetBackend`].
pub struct DemoBackend {
    seed: u64,
    fleet_size: usize,
    /// Monotonic tick counter advanced by every `fetch_fleet` call.
    tick: Mutex<u64>,
    users: Mutex<Vec<AdminUser>>,
    next_user_id: Mutex<u64>,
}

impl DemoBackend {
    /// Demo fleet with the default size and a couple of seeded users.
    #[must_use]
    pub fn sample(seed: u64) -> Self {
        Self::with_size(seed, DEMO_FLEET_SIZE)
    }

    /// Demo fleet with an explicit vehicle count.
    #[must_use]
    pub fn with_size(seed: u64, fleet_size: usize) -> Self {
        Self {
            seed,
            fleet_size,
            tick: Mutex::new(0),
            users: Mutex::new(vec![
                AdminUser { id: "1".to_owned(), username: "admin".to_owned() },
                AdminUser { id: "2".to_owned(), username: "dispatcher".to_owned() },
            ]),
            next_user_id: Mutex::new(3),
        }
    }

    fn door_code(&self, index: usize) -> String {
        format!("B-{:03}", index + 1)
    }

    /// Position of vehicle `index` at tick `tick`: a slow drift plus a
    /// per-vehicle jitter, anchored in the Istanbul basin.
    fn position(&self, index: usize, tick: u64) -> (f64, f64) {
        let key = self.seed ^ (index as u64).wrapping_mul(0x5151);
        let base_lat = 40.90 + unit(key) * 0.25;
        let base_lng = 28.70 + unit(key ^ 0xabcd) * 0.55;
        let step = 0.0008;
        let drift_lat = (unit(key.wrapping_add(tick)) - 0.5) * step + step * 0.4;
        let drift_lng = (unit(key.wrapping_add(tick) ^ 0x77) - 0.5) * step + step * 0.6;
        (
            base_lat + drift_lat * tick as f64,
            base_lng + drift_lng * tick as f64,
        )
    }

    fn snapshot(&self, index: usize, tick: u64, now: NaiveDateTime) -> VehicleSnapshot {
        let (lat, lng) = self.position(index, tick);

        // A few fixed personalities so every filter path has data: index 0
        // reports a day-old timestamp, index 1 reports none at all, the rest
        // are live.
        let (date, time) = match index {
            0 => {
                let old = now - ChronoDuration::hours(26);
                (
                    Some(old.format("%d-%m-%Y").to_string()),
                    Some(old.format("%H:%M:%S").to_string()),
                )
            }
            1 => (None, None),
            _ => (
                Some(now.format("%d-%m-%Y").to_string()),
                Some(now.format("%H:%M:%S").to_string()),
            ),
        };

        let key = self.seed ^ (index as u64).wrapping_mul(0x9191);
        VehicleSnapshot {
            vehicle_door_code: Some(self.door_code(index)),
            operator_type: Some(OPERATORS[index % OPERATORS.len()].to_owned()),
            latitude: Some(lat),
            longitude: Some(lng),
            last_location_date: date,
            last_location_time: time,
            number_plate: Some(format!("34 ABC {:03}", index + 100)),
            brand_name: Some(if index % 2 == 0 { "Mercedes" } else { "Otokar" }.to_owned()),
            model_year: Some(2015 + (index % 9) as u32),
            vehicle_type: Some("Solo".to_owned()),
            seating_capacity: Some(25 + (index % 10) as u32),
            full_capacity: Some(70 + (index % 30) as u32),
            speed: Some((unit(key) * 60.0).round()),
            has_usb_charger: index % 2 == 0,
            has_wifi: index % 3 == 0,
            is_air_conditioned: index % 4 != 0,
            accessibility: index % 2 == 1,
            bus_door_number: None,
        }
    }
}

impl FleetBackend for DemoBackend {
    fn fetch_fleet(&self) -> FleetResult<Vec<VehicleSnapshot>> {
        let tick = {
            let mut tick = self.tick.lock().expect("demo tick lock poisoned");
            *tick += 1;
            *tick
        };
        let now = Local::now().naive_local();
        Ok((0..self.fleet_size)
            .map(|i| self.snapshot(i, tick, now))
            .collect())
    }

    fn fetch_history(&self, door_code: &str, minutes: u32) -> Vec<PositionSample> {
        // Reconstruct the index from the door code; unknown doors get an
        // empty window, same as the real backend.
        let Some(index) = door_code
            .strip_prefix("B-")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
        else {
            return Vec::new();
        };
        if index >= self.fleet_size {
            return Vec::new();
        }

        let tick = *self.tick.lock().expect("demo tick lock poisoned");
        let now = Local::now().naive_local();
        let now_secs = now.and_utc().timestamp();
        let points = u64::from(minutes.min(240));

        (0..points)
            .map(|i| {
                let age = points - i;
                let (lat, lng) = self.position(index, tick.saturating_sub(age));
                let at = now - ChronoDuration::seconds(age as i64 * 60);
                PositionSample {
                    lat,
                    lng,
                    timestamp: now_secs - age as i64 * 60,
                    display_time: at.format("%H:%M:%S").to_string(),
                }
            })
            .collect()
    }

    fn fetch_tasks(&self, door_code: &str) -> FleetResult<Vec<VehicleTask>> {
        let Some(index) = door_code
            .strip_prefix("B-")
            .and_then(|n| n.parse::<usize>().ok())
        else {
            return Ok(Vec::new());
        };
        // Every third vehicle has no duties today.
        if index % 3 == 0 {
            return Ok(Vec::new());
        }
        Ok((0..3usize)
            .map(|slot| VehicleTask {
                code: format!("{}{}", 30 + index % 20, ['A', 'K', 'T'][slot % 3]),
                dest: DESTINATIONS[(index + slot) % DESTINATIONS.len()].to_owned(),
                time: format!("{:02}:{:02}", 6 + slot * 4, (index * 7) % 60),
                driver_register_no: (slot == 0).then(|| format!("{}", 10_000 + index * 17)),
            })
            .collect())
    }

    fn list_users(&self) -> FleetResult<Vec<AdminUser>> {
        Ok(self.users.lock().expect("demo user lock poisoned").clone())
    }

    fn add_user(&self, username: &str, password: &str) -> FleetResult<()> {
        if username.is_empty() || password.is_empty() {
            return Err(FleetError::AdminRejected {
                action: "add user".to_owned(),
                message: "Missing fields".to_owned(),
            });
        }
        let mut users = self.users.lock().expect("demo user lock poisoned");
        if users.iter().any(|u| u.username == username) {
            return Err(FleetError::AdminRejected {
                action: "add user".to_owned(),
                message: "User already exists".to_owned(),
            });
        }
        let mut next_id = self.next_user_id.lock().expect("demo user id lock poisoned");
        users.push(AdminUser {
            id: next_id.to_string(),
            username: username.to_owned(),
        });
        *next_id += 1;
        Ok(())
    }

    fn update_password(&self, id: &str, password: &str) -> FleetResult<()> {
        if password.is_empty() {
            return Err(FleetError::AdminRejected {
                action: "change password".to_owned(),
                message: "Password required".to_owned(),
            });
        }
        let users = self.users.lock().expect("demo user lock poisoned");
        if users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(FleetError::AdminRejected {
                action: "change password".to_owned(),
                message: format!("No such user: {id}"),
            })
        }
    }

    fn update_username(&self, id: &str, username: &str) -> FleetResult<()> {
        if username.is_empty() {
            return Err(FleetError::AdminRejected {
                action: "change username".to_owned(),
                message: "Username required".to_owned(),
            });
        }
        let mut users = self.users.lock().expect("demo user lock poisoned");
        if users.iter().any(|u| u.username == username && u.id != id) {
            return Err(FleetError::AdminRejected {
                action: "change username".to_owned(),
                message: "Username already taken".to_owned(),
            });
        }
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.username = username.to_owned();
                Ok(())
            }
            None => Err(FleetError::AdminRejected {
                action: "change username".to_owned(),
                message: format!("No such user: {id}"),
            }),
        }
    }

    fn delete_user(&self, id: &str) -> FleetResult<()> {
        let mut users = self.users.lock().expect("demo user lock poisoned");
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(FleetError::AdminRejected {
                action: "delete user".to_owned(),
                message: format!("No such user: {id}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_fleet() {
        let a = DemoBackend::sample(42);
        let b = DemoBackend::sample(42);
        let fleet_a = a.fetch_fleet().unwrap();
        let fleet_b = b.fetch_fleet().unwrap();
        assert_eq!(fleet_a.len(), fleet_b.len());
        for (va, vb) in fleet_a.iter().zip(&fleet_b) {
            assert_eq!(va.latitude, vb.latitude);
            assert_eq!(va.longitude, vb.longitude);
        }
    }

    #[test]
    fn fleet_advances_between_ticks() {
        let backend = DemoBackend::sample(42);
        let first = backend.fetch_fleet().unwrap();
        let second = backend.fetch_fleet().unwrap();
        // At least one live vehicle moved beyond the dedup epsilon.
        let moved = first
            .iter()
            .zip(&second)
            .skip(2)
            .any(|(a, b)| (a.latitude.unwrap() - b.latitude.unwrap()).abs() > 1e-5);
        assert!(moved);
    }

    #[test]
    fn fleet_includes_filter_personalities() {
        let backend = DemoBackend::sample(7);
        let fleet = backend.fetch_fleet().unwrap();
        let now = Local::now().naive_local();
        assert!(fleet[0].is_stale(now));
        assert!(fleet[1].last_update().is_none());
        assert!(fleet[5].is_active(now));
    }

    #[test]
    fn history_matches_window_length() {
        let backend = DemoBackend::sample(42);
        backend.fetch_fleet().unwrap();
        let history = backend.fetch_history("B-003", 5);
        assert_eq!(history.len(), 5);
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(backend.fetch_history("UNKNOWN", 5).is_empty());
    }

    #[test]
    fn admin_store_enforces_backend_rules() {
        let backend = DemoBackend::sample(42);
        assert_eq!(backend.list_users().unwrap().len(), 2);

        backend.add_user("viewer", "pw").unwrap();
        assert_eq!(backend.list_users().unwrap().len(), 3);

        let dup = backend.add_user("viewer", "pw").unwrap_err();
        assert!(matches!(dup, FleetError::AdminRejected { .. }));

        backend.update_username("3", "observer").unwrap();
        let taken = backend.update_username("3", "admin").unwrap_err();
        assert!(matches!(taken, FleetError::AdminRejected { .. }));

        backend.delete_user("3").unwrap();
        assert!(backend.delete_user("3").is_err());
    }
}
