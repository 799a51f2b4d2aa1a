//! Unit tests for token expiry and persistence

use chrono::{Duration, Utc};
use snapshot_harvester::auth::{ApiToken, EXPIRY_MARGIN_SECS};

fn token(expires_in_secs: i64) -> ApiToken {
    ApiToken {
        access_token: "abc123".to_string(),
        token_type: "Bearer".to_string(),
        expires_at: Utc::now() + Duration::seconds(expires_in_secs),
    }
}

#[test]
fn test_fresh_token_is_valid() {
    assert!(!token(3600).is_expired());
}

#[test]
fn test_past_expiry_is_expired() {
    assert!(token(-10).is_expired());
}

#[test]
fn test_token_expires_within_safety_margin() {
    // Still valid by the clock, but inside the renewal margin
    assert!(token(EXPIRY_MARGIN_SECS - 1).is_expired());
    assert!(!token(EXPIRY_MARGIN_SECS + 5).is_expired());
}

#[test]
fn test_authorization_header_format() {
    assert_eq!(token(3600).authorization_header(), "Bearer abc123");
}

#[test]
fn test_token_round_trips_through_json() {
    let original = token(120);
    let text = serde_json::to_string(&original).unwrap();
    let restored: ApiToken = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, original);
}
