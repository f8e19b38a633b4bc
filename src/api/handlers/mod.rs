use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::geo;
use crate::models::{CreatePostInput, LikeCount, Post, PostWithAge};
use crate::now_ms;
use crate::store::StoreError;

// ============================================================
// Error Handling
// ============================================================

/// Map a store error onto an HTTP response. Validation reasons are safe to
/// expose; backend failures are logged server-side and clients only see a
/// generic message.
fn store_error(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::Validation(msg) => {
            tracing::warn!("Validation error: {}", msg);
            (StatusCode::BAD_REQUEST, msg)
        }
        StoreError::NotFound => (StatusCode::NOT_FOUND, "Post not found".to_string()),
        StoreError::Backend(e) => {
            tracing::error!("Storage error: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

/// Evict expired posts before serving a request. A failed pass is logged and
/// skipped; the next request or the interval task retries.
fn purge_pass(state: &AppState, now: i64) {
    if let Err(e) = state.store.purge_expired(now) {
        tracing::warn!("Pre-request purge failed: {:#}", e);
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Posts
// ============================================================

/// Query parameters for the nearby listing.
///
/// `radius` stays a raw string so a non-numeric value can fall back to the
/// default instead of erroring; missing or non-finite coordinates are a 400.
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<String>,
}

pub async fn list_nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<PostWithAge>>, (StatusCode, String)> {
    let now = now_ms();
    purge_pass(&state, now);

    let lat = query.lat.filter(|v| v.is_finite()).ok_or((
        StatusCode::BAD_REQUEST,
        "lat must be a finite number".to_string(),
    ))?;
    let lng = query.lng.filter(|v| v.is_finite()).ok_or((
        StatusCode::BAD_REQUEST,
        "lng must be a finite number".to_string(),
    ))?;

    let radius = query
        .radius
        .as_deref()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(state.config.default_radius_m);
    if !radius.is_finite() || radius <= 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "radius must be a positive number".to_string(),
        ));
    }

    let posts = state.store.list_active(now).map_err(store_error)?;
    Ok(Json(geo::nearby(posts, lat, lng, radius, now)))
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<Post>), (StatusCode, String)> {
    let now = now_ms();
    purge_pass(&state, now);

    state
        .store
        .create(input.into_candidate(now))
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(store_error)
}

pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeCount>, (StatusCode, String)> {
    purge_pass(&state, now_ms());

    state
        .store
        .increment_likes(id)
        .map(Json)
        .map_err(store_error)
}
