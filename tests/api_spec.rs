use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use driftnote::api::create_router;
use driftnote::config::{AppConfig, DEFAULT_TTL_MS};
use driftnote::models::{LikeCount, Post, PostCandidate, PostWithAge};
use driftnote::now_ms;
use driftnote::store::{MemoryStore, PostStore};

fn setup() -> (TestServer, Arc<MemoryStore>) {
    setup_with_ttl(DEFAULT_TTL_MS)
}

fn setup_with_ttl(ttl_ms: i64) -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(ttl_ms));
    let app = create_router(store.clone(), AppConfig::with_ttl_ms(ttl_ms));
    let server = TestServer::new(app).expect("Failed to create test server");
    (server, store)
}

fn seed_post(store: &MemoryStore, lat: f64, lng: f64, text: &str, timestamp: i64) -> Post {
    store
        .create(PostCandidate {
            id: None,
            lat: Some(lat),
            lng: Some(lng),
            text: Some(text.to_string()),
            mood: None,
            timestamp,
        })
        .expect("Failed to seed post")
}

mod create_posts {
    use super::*;

    #[tokio::test]
    async fn creates_a_post_with_generated_id_and_zero_likes() {
        let (server, _) = setup();

        let response = server
            .post("/api/posts")
            .json(&json!({ "lat": 35.0, "lng": 139.0, "text": "hello" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let post: Post = response.json();
        assert!(!post.id.is_nil());
        assert_eq!(post.lat, 35.0);
        assert_eq!(post.lng, 139.0);
        assert_eq!(post.text.as_deref(), Some("hello"));
        assert_eq!(post.mood, None);
        assert_eq!(post.likes, 0);
    }

    #[tokio::test]
    async fn rejects_whitespace_text_with_no_mood() {
        let (server, _) = setup();

        let response = server
            .post("/api/posts")
            .json(&json!({ "lat": 35.0, "lng": 139.0, "text": "  " }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_missing_latitude() {
        let (server, _) = setup();

        let response = server
            .post("/api/posts")
            .json(&json!({ "lng": 139.0, "text": "hello" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn accepts_emoji_mood_with_empty_text() {
        let (server, _) = setup();

        let response = server
            .post("/api/posts")
            .json(&json!({ "lat": 35.0, "lng": 139.0, "text": "", "mood": "😀" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let post: Post = response.json();
        assert_eq!(post.text, None);
        assert_eq!(post.mood.as_deref(), Some("😀"));
    }

    #[tokio::test]
    async fn truncates_long_text_to_five_hundred_code_points() {
        let (server, _) = setup();
        // Multibyte characters, so a byte-based cut would differ.
        let long_text = "é".repeat(600);

        let response = server
            .post("/api/posts")
            .json(&json!({ "lat": 35.0, "lng": 139.0, "text": long_text }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let post: Post = response.json();
        let stored = post.text.expect("text survives truncation");
        assert_eq!(stored.chars().count(), 500);
        assert_eq!(stored, "é".repeat(500));
    }
}

mod nearby_posts {
    use super::*;

    #[tokio::test]
    async fn returns_only_posts_within_radius_sorted_newest_first() {
        let (server, store) = setup();
        let now = now_ms();
        // Roughly 111 m apart per 0.001 degrees of latitude; the far post is
        // about 111 km away.
        seed_post(&store, 35.000, 139.0, "older near", now - 3000);
        seed_post(&store, 35.001, 139.0, "newest near", now - 1000);
        seed_post(&store, 36.000, 139.0, "far away", now - 2000);

        let response = server
            .get("/api/posts")
            .add_query_param("lat", 35.0)
            .add_query_param("lng", 139.0)
            .add_query_param("radius", 1000)
            .await;

        response.assert_status_ok();
        let posts: Vec<PostWithAge> = response.json();
        let texts: Vec<_> = posts.iter().map(|p| p.post.text.as_deref()).collect();
        assert_eq!(texts, vec![Some("newest near"), Some("older near")]);
        for p in &posts {
            assert!(p.age_ms >= 0);
        }
    }

    #[tokio::test]
    async fn excludes_expired_posts() {
        let (server, store) = setup_with_ttl(1000);
        let now = now_ms();
        seed_post(&store, 35.0, 139.0, "fresh", now - 100);
        seed_post(&store, 35.0, 139.0, "stale", now - 5000);

        let response = server
            .get("/api/posts")
            .add_query_param("lat", 35.0)
            .add_query_param("lng", 139.0)
            .await;

        response.assert_status_ok();
        let posts: Vec<PostWithAge> = response.json();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].post.text.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn non_numeric_radius_falls_back_to_the_default() {
        let (server, store) = setup();
        seed_post(&store, 35.0, 139.0, "near", now_ms());

        let response = server
            .get("/api/posts")
            .add_query_param("lat", 35.0)
            .add_query_param("lng", 139.0)
            .add_query_param("radius", "abc")
            .await;

        response.assert_status_ok();
        let posts: Vec<PostWithAge> = response.json();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_positive_radius() {
        let (server, _) = setup();

        for radius in ["0", "-5"] {
            let response = server
                .get("/api/posts")
                .add_query_param("lat", 35.0)
                .add_query_param("lng", 139.0)
                .add_query_param("radius", radius)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn rejects_missing_or_non_finite_coordinates() {
        let (server, _) = setup();

        let response = server.get("/api/posts").add_query_param("lng", 139.0).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .get("/api/posts")
            .add_query_param("lat", "NaN")
            .add_query_param("lng", 139.0)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

mod likes {
    use super::*;

    #[tokio::test]
    async fn increments_the_like_counter() {
        let (server, store) = setup();
        let post = seed_post(&store, 35.0, 139.0, "likeable", now_ms());

        let first: LikeCount = server
            .post(&format!("/api/posts/{}/like", post.id))
            .await
            .json();
        let second: LikeCount = server
            .post(&format!("/api/posts/{}/like", post.id))
            .await
            .json();

        assert_eq!(first.id, post.id);
        assert_eq!(first.likes, 1);
        assert_eq!(second.likes, 2);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (server, _) = setup();

        let response = server
            .post(&format!("/api/posts/{}/like", uuid::Uuid::new_v4()))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let (server, _) = setup();

        let response = server.get("/api/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}
