//! Domain models for driftnote.
//!
//! # Core Concepts
//!
//! ## Server side
//!
//! - [`Post`]: an ephemeral geolocated micro-post. Lives for a fixed TTL from
//!   its creation timestamp; expiry is observed lazily at purge time.
//! - [`PostWithAge`]: a post annotated with its age at response time.
//! - [`LikeCount`]: the post-increment like counter returned by the like
//!   operation.
//!
//! ## Client side
//!
//! - [`Reminder`]: one planned notification, identified by a deterministic tag
//!   so a whole batch can be replaced idempotently.
//! - [`NotificationWindow`]: a daily recurring interval inside which reminder
//!   times are drawn.

mod post;
mod reminder;

pub use post::*;
pub use reminder::*;
