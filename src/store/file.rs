use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use uuid::Uuid;

use super::{sanitize, PostStore, StoreError};
use crate::models::{LikeCount, Post, PostCandidate};

/// File-persisted backend: one JSON array of posts at a fixed path.
///
/// The file is read fully into memory at open and rewritten whole after every
/// mutation, under the same lock, so the snapshot on disk is durable (or has
/// failed loudly) before the handler returns.
pub struct FileStore {
    path: PathBuf,
    posts: Mutex<Vec<Post>>,
    ttl_ms: i64,
}

impl FileStore {
    /// Open the store at `path`. A missing, malformed, or non-array file is
    /// treated as an empty store; it is never a crash.
    pub fn open(path: PathBuf, ttl_ms: i64) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let posts = match fs::read_to_string(&path) {
            Ok(content) => load_records(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            posts: Mutex::new(posts),
            ttl_ms,
        })
    }

    fn persist(&self, posts: &[Post]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(posts)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

fn load_records(content: &str) -> Vec<Post> {
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Malformed post snapshot, starting empty: {}", e);
            return Vec::new();
        }
    };
    let Some(items) = value.as_array() else {
        tracing::warn!("Post snapshot is not an array, starting empty");
        return Vec::new();
    };
    items.iter().filter_map(sanitize::normalize_record).collect()
}

impl PostStore for FileStore {
    fn list_active(&self, now_ms: i64) -> Result<Vec<Post>, StoreError> {
        let cutoff = now_ms - self.ttl_ms;
        let posts = self.posts.lock().expect("post store lock poisoned");
        Ok(posts
            .iter()
            .filter(|p| p.timestamp > cutoff)
            .cloned()
            .collect())
    }

    fn create(&self, candidate: PostCandidate) -> Result<Post, StoreError> {
        let clean = sanitize::clean_candidate(candidate)?;
        let post = Post {
            id: clean.id,
            lat: clean.lat,
            lng: clean.lng,
            text: clean.text,
            mood: clean.mood,
            timestamp: clean.timestamp,
            likes: 0,
        };
        let mut posts = self.posts.lock().expect("post store lock poisoned");
        posts.push(post.clone());
        if let Err(e) = self.persist(&posts) {
            // Keep memory and disk consistent: an unpersisted create is a failed create.
            posts.pop();
            return Err(e);
        }
        Ok(post)
    }

    fn increment_likes(&self, id: Uuid) -> Result<LikeCount, StoreError> {
        let mut posts = self.posts.lock().expect("post store lock poisoned");
        let idx = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;
        posts[idx].likes += 1;
        if let Err(e) = self.persist(&posts) {
            posts[idx].likes -= 1;
            return Err(e);
        }
        Ok(LikeCount {
            id,
            likes: posts[idx].likes,
        })
    }

    fn purge_expired(&self, now_ms: i64) -> Result<usize, StoreError> {
        let cutoff = now_ms - self.ttl_ms;
        let mut posts = self.posts.lock().expect("post store lock poisoned");
        let before = posts.len();
        posts.retain(|p| p.timestamp > cutoff);
        let removed = before - posts.len();
        if removed > 0 {
            self.persist(&posts)?;
        }
        Ok(removed)
    }
}
