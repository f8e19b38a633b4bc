use std::sync::Mutex;

use uuid::Uuid;

use super::{sanitize, PostStore, StoreError};
use crate::models::{LikeCount, Post, PostCandidate};

/// In-memory backend.
///
/// The store owns its vector outright; there is no process-wide static. The
/// mutex is real locking, not ceremony: axum serves requests from multiple
/// threads.
pub struct MemoryStore {
    posts: Mutex<Vec<Post>>,
    ttl_ms: i64,
}

impl MemoryStore {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            ttl_ms,
        }
    }
}

impl PostStore for MemoryStore {
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
        Ok(post)
    }

    fn increment_likes(&self, id: Uuid) -> Result<LikeCount, StoreError> {
        let mut posts = self.posts.lock().expect("post store lock poisoned");
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;
        post.likes += 1;
        Ok(LikeCount {
            id,
            likes: post.likes,
        })
    }

    fn purge_expired(&self, now_ms: i64) -> Result<usize, StoreError> {
        let cutoff = now_ms - self.ttl_ms;
        let mut posts = self.posts.lock().expect("post store lock poisoned");
        let before = posts.len();
        posts.retain(|p| p.timestamp > cutoff);
        Ok(before - posts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(ts: i64) -> PostCandidate {
        PostCandidate {
            id: None,
            lat: Some(35.0),
            lng: Some(139.0),
            text: Some("hello".to_string()),
            mood: None,
            timestamp: ts,
        }
    }

    #[test]
    fn created_post_starts_with_zero_likes() {
        let store = MemoryStore::new(60_000);
        let post = store.create(candidate(1_000)).unwrap();
        assert_eq!(post.likes, 0);
        assert!(post.mood.is_none());
    }

    #[test]
    fn list_active_never_returns_expired_posts() {
        let store = MemoryStore::new(60_000);
        store.create(candidate(0)).unwrap();
        store.create(candidate(100_000)).unwrap();

        let active = store.list_active(100_000).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].timestamp, 100_000);
    }
}
