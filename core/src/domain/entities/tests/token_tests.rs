//! Unit tests for token entities

use uuid::Uuid;

use crate::domain::entities::token::{Claims, TokenPair, TokenType, JWT_ISSUER};
use crate::domain::value_objects::AuthenticatedUser;

#[test]
fn test_claims_lifetime() {
    let user_id = Uuid::new_v4();
    let claims = Claims::new(user_id, TokenType::Access, JWT_ISSUER, "jti-1", 1_000, 900);

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.exp, 1_900);
    assert!(!claims.is_expired_at(1_899));
    assert!(claims.is_expired_at(1_900));
    assert_eq!(claims.remaining_seconds(1_500), 400);
    assert_eq!(claims.remaining_seconds(5_000), 0);
    assert_eq!(claims.user_id().unwrap(), user_id);
}

#[test]
fn test_refresh_payload_carries_only_subject() {
    let claims = Claims::new(Uuid::new_v4(), TokenType::Refresh, JWT_ISSUER, "jti-2", 0, 60);
    let json = serde_json::to_value(&claims).unwrap();

    assert_eq!(json["token_type"], "refresh");
    assert!(json.get("email").is_none());
    assert!(json.get("phone").is_none());
}

#[test]
fn test_access_payload_carries_contact() {
    let claims = Claims::new(Uuid::new_v4(), TokenType::Access, JWT_ISSUER, "jti-3", 0, 60)
        .with_contact(Some("a@example.com".to_string()), Some("+15551234567".to_string()));
    let json = serde_json::to_value(&claims).unwrap();

    assert_eq!(json["token_type"], "access");
    assert_eq!(json["email"], "a@example.com");
    assert_eq!(json["phone"], "+15551234567");

    let empty_email = Claims::new(Uuid::new_v4(), TokenType::Access, JWT_ISSUER, "jti-4", 0, 60)
        .with_contact(Some(String::new()), None);
    assert!(empty_email.email.is_none());
}

#[test]
fn test_invalid_subject() {
    let mut claims = Claims::new(Uuid::new_v4(), TokenType::Access, JWT_ISSUER, "jti-5", 0, 60);
    claims.sub = "not-a-uuid".to_string();
    assert!(claims.user_id().is_err());
    assert!(AuthenticatedUser::try_from(claims).is_err());
}

#[test]
fn test_token_pair_is_bearer() {
    let pair = TokenPair::new("a".to_string(), "r".to_string(), 900);
    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, 900);
}
