use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An ephemeral geolocated micro-post dropped on the map.
///
/// Posts are anchored to a point and live for a fixed TTL measured from
/// `timestamp`. Nothing fires per post when it expires; expired rows are swept
/// lazily by purge passes. After creation the only mutation is the like
/// counter.
///
/// At least one of `text`/`mood` is non-empty at creation time. That invariant
/// is enforced once, before storage; a likes-only mutation cannot violate it
/// and it is never re-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub text: Option<String>,
    pub mood: Option<String>,
    /// Creation time in milliseconds since the Unix epoch. TTL anchor and
    /// sort key.
    pub timestamp: i64,
    pub likes: i64,
}

/// A post annotated with its age at response time.
///
/// The age is computed per request and never stored; the post fields are
/// flattened into the JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostWithAge {
    #[serde(flatten)]
    pub post: Post,
    #[serde(rename = "ageMs")]
    pub age_ms: i64,
}

/// Result of a like operation: the counter value after the increment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeCount {
    pub id: Uuid,
    pub likes: i64,
}

/// Raw body of a post-submission request.
///
/// Coordinates are optional here so missing values surface as a proper
/// validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub text: Option<String>,
    pub mood: Option<String>,
}

impl CreatePostInput {
    /// Attach the creation instant decided by the caller.
    pub fn into_candidate(self, timestamp: i64) -> PostCandidate {
        PostCandidate {
            id: None,
            lat: self.lat,
            lng: self.lng,
            text: self.text,
            mood: self.mood,
            timestamp,
        }
    }
}

/// A creation candidate as handed to a store backend.
///
/// `id` is assigned by the backend when absent. All sanitation happens in the
/// backend before storage; the returned [`Post`] reflects stored values, not
/// this raw input.
#[derive(Debug, Clone)]
pub struct PostCandidate {
    pub id: Option<Uuid>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub text: Option<String>,
    pub mood: Option<String>,
    pub timestamp: i64,
}
