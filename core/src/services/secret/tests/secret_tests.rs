//! Unit tests for secret primitives

use std::collections::HashSet;
use uuid::Uuid;

use crate::services::secret::{
    constant_time_equal, generate_jti, hash_otp, hash_token, random_numeric_code,
};

#[test]
fn test_hash_otp_is_deterministic() {
    let id = Uuid::new_v4();
    let first = hash_otp("pepper", &id, "482193");
    let second = hash_otp("pepper", &id, "482193");

    assert_eq!(first, second);
    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_hash_otp_known_vector() {
    let id = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
    // sha256("p:00000000-0000-0000-0000-000000000001:123456")
    let expected = hash_token("p:00000000-0000-0000-0000-000000000001:123456");
    assert_eq!(hash_otp("p", &id, "123456"), expected);
}

#[test]
fn test_hash_otp_binds_every_input() {
    let id = Uuid::new_v4();
    let base = hash_otp("pepper", &id, "482193");

    assert_ne!(base, hash_otp("pepper", &id, "482194"));
    assert_ne!(base, hash_otp("other-pepper", &id, "482193"));
    assert_ne!(base, hash_otp("pepper", &Uuid::new_v4(), "482193"));
}

#[test]
fn test_constant_time_equal() {
    assert!(constant_time_equal("abcdef", "abcdef"));
    assert!(!constant_time_equal("abcdef", "abcdeg"));
    assert!(!constant_time_equal("abc", "abcdef"));
    assert!(constant_time_equal("", ""));
}

#[test]
fn test_random_numeric_code_format() {
    for _ in 0..200 {
        let code = random_numeric_code(6).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}

#[test]
fn test_random_numeric_code_covers_all_digits() {
    let mut seen = HashSet::new();
    for _ in 0..200 {
        seen.extend(random_numeric_code(10).unwrap().chars());
    }
    assert_eq!(seen.len(), 10);
}

#[test]
fn test_random_numeric_code_rejects_zero_length() {
    assert!(random_numeric_code(0).is_err());
}

#[test]
fn test_generate_jti_is_unique() {
    let ids: HashSet<String> = (0..1000).map(|_| generate_jti()).collect();
    assert_eq!(ids.len(), 1000);

    let jti = generate_jti();
    assert_eq!(jti.len(), 22);
    assert!(!jti.contains('='));
    assert!(!jti.contains('+') && !jti.contains('/'));
}
