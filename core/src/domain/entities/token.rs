//! Token entities for JWT-based authentication.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::TokenError;

/// Default JWT issuer
pub const JWT_ISSUER: &str = "duskspendr";

/// Token class discriminator carried inside every envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims structure for JWT payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Contact email, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Contact phone, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Token class
    pub token_type: TokenType,

    /// Issuer
    pub iss: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// JWT ID, the revocation key
    pub jti: String,
}

impl Claims {
    /// Creates claims carrying only the subject
    pub fn new(
        user_id: Uuid,
        token_type: TokenType,
        issuer: impl Into<String>,
        jti: impl Into<String>,
        issued_at: i64,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: None,
            phone: None,
            token_type,
            iss: issuer.into(),
            iat: issued_at,
            exp: issued_at + ttl_seconds,
            jti: jti.into(),
        }
    }

    /// Attach contact details (used for access tokens)
    pub fn with_contact(mut self, email: Option<String>, phone: Option<String>) -> Self {
        self.email = email.filter(|e| !e.is_empty());
        self.phone = phone.filter(|p| !p.is_empty());
        self
    }

    /// Expired once `now` reaches `exp`
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Seconds of validity left, zero once expired
    pub fn remaining_seconds(&self, now: i64) -> i64 {
        (self.exp - now).max(0)
    }

    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::MissingClaim {
            claim: "sub".to_string(),
        })
    }
}

/// Token pair returned after authentication or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Always "Bearer"
    pub token_type: String,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}
