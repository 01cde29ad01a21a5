//! Secret comparison and hashing primitives
//!
//! Every secret comparison in the gateway (OTP digests, token fingerprints)
//! goes through [`constant_time_equal`]. Digests are hex-encoded SHA-256.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use constant_time_eq::constant_time_eq;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult, ValidationError};

#[cfg(test)]
mod tests;

/// Digest of a submitted code, bound to the record it was issued for.
///
/// The input is `pepper:record_id:code`. Binding the record id means a code
/// issued for one record never validates against another record.
pub fn hash_otp(pepper: &str, record_id: &Uuid, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pepper.as_bytes());
    hasher.update(b":");
    hasher.update(record_id.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of a raw token, safe to log or store
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Compare two secrets without leaking the position of the first difference.
///
/// Length is not secret (digests have a fixed width), so a mismatch returns early.
pub fn constant_time_equal(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// Cryptographically random numeric code of `length` digits.
///
/// Each digit is drawn uniformly from 0-9 by the OS random source.
pub fn random_numeric_code(length: usize) -> DomainResult<String> {
    if length == 0 {
        return Err(DomainError::ValidationErr(ValidationError::InvalidLength {
            field: "code_length".to_string(),
            expected: 1,
            actual: 0,
        }));
    }

    let mut rng = OsRng;
    Ok((0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect())
}

/// Unique token identifier: 16 random bytes, base64url without padding
pub fn generate_jti() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
