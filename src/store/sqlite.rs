use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use uuid::Uuid;

use super::{sanitize, schema, PostStore, StoreError};
use crate::models::{LikeCount, Post, PostCandidate};

/// SQL-persisted backend: one `posts` table.
///
/// Increment and purge are single statements, so atomicity is the engine's;
/// no multi-statement transactions are needed.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    ttl_ms: i64,
}

impl SqliteStore {
    pub fn open(path: PathBuf, ttl_ms: i64) -> Result<Self, StoreError> {
        let parent = path.parent().ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("Database path has no parent directory"))
        })?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl_ms,
        })
    }

    pub fn open_memory(ttl_ms: i64) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            ttl_ms,
        })
    }

    /// Create the schema idempotently. Call once at startup.
    pub fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn).map_err(StoreError::Backend)
    }
}

impl PostStore for SqliteStore {
    fn list_active(&self, now_ms: i64) -> Result<Vec<Post>, StoreError> {
        let cutoff = now_ms - self.ttl_ms;
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, lat, lng, text, mood, timestamp, likes
             FROM posts WHERE timestamp > ?",
        )?;

        let posts = stmt
            .query_map([cutoff], |row| {
                Ok(Post {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    lat: row.get(1)?,
                    lng: row.get(2)?,
                    text: row.get(3)?,
                    mood: row.get(4)?,
                    timestamp: row.get(5)?,
                    likes: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // NaN coordinates come back as NULL-adjacent junk from hand-edited
        // databases; exclude them like the other backends do at load time.
        Ok(posts
            .into_iter()
            .filter(|p| p.lat.is_finite() && p.lng.is_finite())
            .collect())
    }

    fn create(&self, candidate: PostCandidate) -> Result<Post, StoreError> {
        let clean = sanitize::clean_candidate(candidate)?;
        let conn = self.conn.lock().expect("database lock poisoned");

        conn.execute(
            "INSERT INTO posts (id, lat, lng, text, mood, timestamp, likes)
             VALUES (?, ?, ?, ?, ?, ?, 0)",
            (
                clean.id.to_string(),
                clean.lat,
                clean.lng,
                &clean.text,
                &clean.mood,
                clean.timestamp,
            ),
        )?;

        Ok(Post {
            id: clean.id,
            lat: clean.lat,
            lng: clean.lng,
            text: clean.text,
            mood: clean.mood,
            timestamp: clean.timestamp,
            likes: 0,
        })
    }

    fn increment_likes(&self, id: Uuid) -> Result<LikeCount, StoreError> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE posts SET likes = likes + 1 WHERE id = ?",
            [id.to_string()],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound);
        }

        let likes: i64 = conn.query_row(
            "SELECT likes FROM posts WHERE id = ?",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(LikeCount { id, likes })
    }

    fn purge_expired(&self, now_ms: i64) -> Result<usize, StoreError> {
        let cutoff = now_ms - self.ttl_ms;
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM posts WHERE timestamp <= ?", [cutoff])?;
        Ok(rows)
    }
}

impl Clone for SqliteStore {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            ttl_ms: self.ttl_ms,
        }
    }
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}
