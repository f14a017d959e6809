//! Persisted favorites ("watch list") store.
//!
//! A plain JSON array of door codes, kept under the user config directory
//! and loaded once at startup. Corrupt or missing data degrades to an empty
//! list — a broken favorites file must never keep the console from starting.
//! Order is preserved as toggled, matching the order favorites float to the
//! top of the fleet list.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name under the config directory.
const FILE_NAME: &str = "favorites.json";

/// Environment override for the favorites file location.
pub const PATH_ENV: &str = "FLEETPULSE_FAVORITES_PATH";

/// Door codes the operator has starred, persisted across runs.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    doors: Vec<String>,
}

impl FavoritesStore {
    /// Resolve the favorites path: env override, then
    /// `<config_dir>/fleetpulse/favorites.json`, then the working directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(PATH_ENV) {
            let path = path.trim();
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::config_dir()
            .map_or_else(|| PathBuf::from(FILE_NAME), |dir| dir.join("fleetpulse").join(FILE_NAME))
    }

    /// Load from the given path. Missing or corrupt files yield an empty
    /// store; this never errors.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let doors = match fs::read_to_string(&path) {
            Ok(body) => serde_json::from_str::<Vec<String>>(&body).unwrap_or_else(|e| {
                tracing::warn!(
                    target: "fleetpulse.favorites",
                    path = %path.display(),
                    error = %e,
                    "corrupt favorites file; starting with an empty watch list"
                );
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        Self { path, doors }
    }

    /// Whether a door code is starred.
    #[must_use]
    pub fn contains(&self, door_code: &str) -> bool {
        self.doors.iter().any(|d| d == door_code)
    }

    /// Star / unstar a door code and persist. Returns the new state.
    pub fn toggle(&mut self, door_code: &str) -> bool {
        let starred = if self.contains(door_code) {
            self.doors.retain(|d| d != door_code);
            false
        } else {
            self.doors.push(door_code.to_owned());
            true
        };
        self.save();
        starred
    }

    /// Set view for the filter pipeline.
    #[must_use]
    pub fn as_set(&self) -> HashSet<String> {
        self.doors.iter().cloned().collect()
    }

    /// Number of starred vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.doors.len()
    }

    /// Whether the watch list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }

    /// Where this store persists.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }
        let body = match serde_json::to_string(&self.doors) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(target: "fleetpulse.favorites", error = %e, "favorites serialize failed");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, body) {
            tracing::warn!(
                target: "fleetpulse.favorites",
                path = %self.path.display(),
                error = %e,
                "favorites save failed; the toggle applies to this session only"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FavoritesStore::load(dir.path().join("nope.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "{not json").unwrap();
        let store = FavoritesStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn toggle_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);

        let mut store = FavoritesStore::load(&path);
        assert!(store.toggle("B-058"));
        assert!(store.toggle("C-200"));
        assert!(!store.toggle("B-058"));

        let reloaded = FavoritesStore::load(&path);
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.contains("C-200"));
        assert!(!reloaded.contains("B-058"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("nested").join(FILE_NAME);
        let mut store = FavoritesStore::load(&path);
        store.toggle("B-001");
        assert!(path.exists());
    }

    #[test]
    fn as_set_matches_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FavoritesStore::load(dir.path().join(FILE_NAME));
        store.toggle("A");
        store.toggle("B");
        let set = store.as_set();
        assert!(set.contains("A") && set.contains("B"));
        assert_eq!(set.len(), 2);
    }
}
