//! Field sanitation shared by every store backend.
//!
//! Behavioral parity is the point: the three backends must accept, reject,
//! and canonicalize candidates identically, so all of that logic lives here
//! and nowhere else.

use serde_json::Value;
use uuid::Uuid;

use super::StoreError;
use crate::models::{Post, PostCandidate};

/// Maximum post body length, in Unicode code points (not bytes).
pub const TEXT_MAX_CHARS: usize = 500;

/// Maximum mood token length, in Unicode code points.
pub const MOOD_MAX_CHARS: usize = 8;

/// A candidate that passed validation, with every field in its canonical
/// stored form.
#[derive(Debug, Clone)]
pub struct CleanCandidate {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub text: Option<String>,
    pub mood: Option<String>,
    pub timestamp: i64,
}

/// Trim and cap at `max` code points. Code-point-aware; grapheme clusters may
/// be split at the boundary.
fn clamp_chars(raw: &str, max: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max).collect())
}

pub fn sanitize_text(raw: Option<&str>) -> Option<String> {
    raw.and_then(|s| clamp_chars(s, TEXT_MAX_CHARS))
}

pub fn sanitize_mood(raw: Option<&str>) -> Option<String> {
    raw.and_then(|s| clamp_chars(s, MOOD_MAX_CHARS))
}

/// Validate and canonicalize a creation candidate.
///
/// Fails fast: bad coordinates or an all-empty post never reach a backend, so
/// there are no partial writes to clean up.
pub fn clean_candidate(candidate: PostCandidate) -> Result<CleanCandidate, StoreError> {
    let lat = candidate
        .lat
        .filter(|v| v.is_finite())
        .ok_or_else(|| StoreError::Validation("lat must be a finite number".to_string()))?;
    let lng = candidate
        .lng
        .filter(|v| v.is_finite())
        .ok_or_else(|| StoreError::Validation("lng must be a finite number".to_string()))?;

    let text = sanitize_text(candidate.text.as_deref());
    let mood = sanitize_mood(candidate.mood.as_deref());
    if text.is_none() && mood.is_none() {
        return Err(StoreError::Validation(
            "post needs text or a mood".to_string(),
        ));
    }

    Ok(CleanCandidate {
        id: candidate.id.unwrap_or_else(Uuid::new_v4),
        lat,
        lng,
        text,
        mood,
        timestamp: candidate.timestamp,
    })
}

/// Locale-independent numeric coercion for persisted data: accepts JSON
/// numbers and numeric strings, rejects everything else.
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Normalize one persisted record.
///
/// Returns `None` for rows that cannot be salvaged (non-finite coordinates or
/// timestamp, unusable id); load-time normalization excludes those silently
/// instead of crashing. Non-string text/mood values are dropped, string values
/// re-sanitized, likes clamped to zero.
pub fn normalize_record(value: &Value) -> Option<Post> {
    let obj = value.as_object()?;
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let lat = obj.get("lat").and_then(coerce_f64).filter(|v| v.is_finite())?;
    let lng = obj.get("lng").and_then(coerce_f64).filter(|v| v.is_finite())?;
    let timestamp = obj.get("timestamp").and_then(coerce_i64)?;
    let text = sanitize_text(obj.get("text").and_then(Value::as_str));
    let mood = sanitize_mood(obj.get("mood").and_then(Value::as_str));
    let likes = obj.get("likes").and_then(coerce_i64).unwrap_or(0).max(0);

    Some(Post {
        id,
        lat,
        lng,
        text,
        mood,
        timestamp,
        likes,
    })
}
