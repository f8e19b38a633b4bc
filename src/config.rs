//! Runtime configuration loaded from environment variables.

use std::time::Duration;

/// Default post time-to-live: 24 hours.
pub const DEFAULT_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Radius applied when a nearby query omits `radius` or sends something
/// non-numeric.
pub const DEFAULT_RADIUS_M: f64 = 1000.0;

/// Cadence of the background purge task.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Post TTL in milliseconds (from DRIFTNOTE_TTL_SECONDS).
    pub ttl_ms: i64,
    /// Fallback query radius in meters (from DRIFTNOTE_DEFAULT_RADIUS_M).
    pub default_radius_m: f64,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let ttl_ms = std::env::var("DRIFTNOTE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .map(|secs| secs * 1000)
            .unwrap_or(DEFAULT_TTL_MS);

        let default_radius_m = std::env::var("DRIFTNOTE_DEFAULT_RADIUS_M")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(DEFAULT_RADIUS_M);

        Self {
            ttl_ms,
            default_radius_m,
        }
    }

    /// Fixed configuration for tests.
    pub fn with_ttl_ms(ttl_ms: i64) -> Self {
        Self {
            ttl_ms,
            default_radius_m: DEFAULT_RADIUS_M,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_ttl_ms_keeps_default_radius() {
        let config = AppConfig::with_ttl_ms(60_000);
        assert_eq!(config.ttl_ms, 60_000);
        assert_eq!(config.default_radius_m, DEFAULT_RADIUS_M);
    }
}
