//! Great-circle distance and the nearby-query composition.

use crate::models::{Post, PostWithAge};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance in meters.
///
/// Uses the `atan2` haversine formulation. Clients compare results against
/// reference values, so this must not be swapped for the small-angle or
/// vector variants.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Whether `post` lies within `radius_m` of the center. Radius positivity is
/// the caller's validation concern, not this engine's.
pub fn within_radius(post: &Post, lat: f64, lng: f64, radius_m: f64) -> bool {
    distance_meters(post.lat, post.lng, lat, lng) <= radius_m
}

/// Filter to the radius, sort newest first (ties arbitrary), and annotate each
/// post with its age at `now_ms`. Ages are computed at response time, never
/// stored.
pub fn nearby(posts: Vec<Post>, lat: f64, lng: f64, radius_m: f64, now_ms: i64) -> Vec<PostWithAge> {
    let mut hits: Vec<Post> = posts
        .into_iter()
        .filter(|p| within_radius(p, lat, lng, radius_m))
        .collect();
    hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    hits.into_iter()
        .map(|post| PostWithAge {
            age_ms: now_ms - post.timestamp,
            post,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn post(lat: f64, lng: f64, timestamp: i64) -> Post {
        Post {
            id: Uuid::new_v4(),
            lat,
            lng,
            text: Some("x".to_string()),
            mood: None,
            timestamp,
            likes: 0,
        }
    }

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance_meters(35.0, 139.0, 35.0, 139.0), 0.0);
        assert_eq!(distance_meters(-80.5, 12.25, -80.5, 12.25), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_meters(35.0, 139.0, 48.85, 2.35);
        let ba = distance_meters(48.85, 2.35, 35.0, 139.0);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        // R * 1 degree in radians = 111_194.93 m
        assert!((d - 111_194.93).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn nearby_filters_sorts_and_annotates() {
        let here = post(35.0, 139.0, 100);
        let newer = post(35.001, 139.0, 200); // ~111 m away
        let far = post(36.0, 139.0, 300); // ~111 km away

        let result = nearby(vec![here, newer, far], 35.0, 139.0, 1_000.0, 500);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].post.timestamp, 200);
        assert_eq!(result[1].post.timestamp, 100);
        assert_eq!(result[0].age_ms, 300);
        assert_eq!(result[1].age_ms, 400);
    }
}
