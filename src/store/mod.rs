//! Post storage behind one contract with three interchangeable backends.
//!
//! Every backend enforces the same sanitation rules (see [`sanitize`]) and the
//! same invariants: creation fails fast before anything is written, likes
//! never go negative, and purging is idempotent. Callers pick a backend once
//! via [`open`] and only ever see the [`PostStore`] trait.

mod file;
mod memory;
mod sanitize;
mod schema;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sanitize::{MOOD_MAX_CHARS, TEXT_MAX_CHARS};
pub use sqlite::SqliteStore;

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::models::{LikeCount, Post, PostCandidate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Malformed or missing required fields. Surfaced to the caller as a
    /// 4xx-equivalent with the reason; never retried.
    #[error("{0}")]
    Validation(String),

    /// The operation targets a post that does not exist (or has expired).
    #[error("post not found")]
    NotFound,

    /// Storage I/O or connectivity failure.
    #[error("storage backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Backend(e.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Backend(e.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Backend(e.into())
    }
}

/// The repository contract shared by all backends.
pub trait PostStore: Send + Sync {
    /// All posts younger than the TTL: `now_ms - timestamp < TTL`. Order is
    /// unspecified; the caller re-sorts.
    fn list_active(&self, now_ms: i64) -> Result<Vec<Post>, StoreError>;

    /// Sanitize, store, and return the canonical stored form. Assigns an id
    /// when the candidate carries none. Callers must not assume round-trip
    /// equality with what they sent.
    fn create(&self, candidate: PostCandidate) -> Result<Post, StoreError>;

    /// Atomic per-backend increment; returns the post-increment count.
    fn increment_likes(&self, id: Uuid) -> Result<LikeCount, StoreError>;

    /// Delete all posts aged to or past the TTL; returns how many were
    /// removed. Idempotent: an immediate second call removes nothing.
    fn purge_expired(&self, now_ms: i64) -> Result<usize, StoreError>;
}

/// Which backend holds the posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    Memory,
    File,
    Sqlite,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Sqlite => "sqlite",
        };
        f.write_str(s)
    }
}

/// Open the configured backend. File and sqlite state lives under `data_dir`
/// (the platform data directory when not given).
pub fn open(
    kind: BackendKind,
    data_dir: Option<PathBuf>,
    ttl_ms: i64,
) -> anyhow::Result<Arc<dyn PostStore>> {
    let store: Arc<dyn PostStore> = match kind {
        BackendKind::Memory => Arc::new(MemoryStore::new(ttl_ms)),
        BackendKind::File => {
            let path = resolve_data_dir(data_dir)?.join("posts.json");
            Arc::new(FileStore::open(path, ttl_ms)?)
        }
        BackendKind::Sqlite => {
            let path = resolve_data_dir(data_dir)?.join("driftnote.db");
            let db = SqliteStore::open(path, ttl_ms)?;
            db.migrate()?;
            Arc::new(db)
        }
    };
    Ok(store)
}

/// The directory holding persisted state: the given override, or the platform
/// data directory.
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = data_dir {
        return Ok(dir);
    }
    let dirs = directories::ProjectDirs::from("", "", "driftnote")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}
