//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// E.164: leading '+', non-zero country digit, 8 to 15 digits in total
static E164_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]\d{7,14}$").unwrap());

/// Normalize a submitted phone number.
///
/// Only surrounding whitespace is removed. Inner formatting characters are
/// left in place so that `"+1 555 123 4567"` is rejected rather than silently
/// rewritten into a different destination.
pub fn normalize_phone_number(phone: &str) -> String {
    phone.trim().to_string()
}

/// Check if a phone number is in strict E.164 format
pub fn is_valid_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Mask a phone number for logs (e.g., +15****4567)
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() >= 7 {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    } else {
        "****".to_string()
    }
}
