//! driftnote: ephemeral geolocated micro-posts.
//!
//! The server half stores posts behind one [`store::PostStore`] contract with
//! three interchangeable backends (in-memory, JSON file, sqlite), filters them
//! by great-circle distance ([`geo`]) and evicts them lazily after a fixed TTL
//! ([`purge`]). The client half ([`reminders`]) plans randomized posting
//! nudges inside recurring daily windows and delivers them through whichever
//! notification mechanism the runtime offers.

pub mod api;
pub mod config;
pub mod geo;
pub mod models;
pub mod purge;
pub mod reminders;
pub mod store;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
