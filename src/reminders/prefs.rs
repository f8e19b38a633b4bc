//! The single persisted bit of reminder state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefData {
    enabled: bool,
}

/// Stores the "reminders enabled" preference as a tiny JSON file.
///
/// Everything else about a schedule is recomputed on demand, never persisted;
/// a missing or unreadable file simply means disabled.
pub struct PrefStore {
    path: PathBuf,
}

impl PrefStore {
    pub fn open(dir: &Path) -> Self {
        Self {
            path: dir.join("reminder_prefs.json"),
        }
    }

    pub fn enabled(&self) -> bool {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str::<PrefData>(&content).ok())
            .map(|p| p.enabled)
            .unwrap_or(false)
    }

    pub fn set_enabled(&self, enabled: bool) {
        let content = serde_json::to_string_pretty(&PrefData { enabled })
            .expect("preference serializes");
        if let Err(e) = fs::write(&self.path, content) {
            tracing::warn!("Failed to persist reminder preference: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_means_disabled() {
        let dir = TempDir::new().unwrap();
        let prefs = PrefStore::open(dir.path());
        assert!(!prefs.enabled());
    }

    #[test]
    fn preference_survives_reopen() {
        let dir = TempDir::new().unwrap();
        PrefStore::open(dir.path()).set_enabled(true);

        let reopened = PrefStore::open(dir.path());
        assert!(reopened.enabled());

        reopened.set_enabled(false);
        assert!(!PrefStore::open(dir.path()).enabled());
    }

    #[test]
    fn garbage_file_means_disabled() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("reminder_prefs.json"), "not json").unwrap();
        assert!(!PrefStore::open(dir.path()).enabled());
    }
}
