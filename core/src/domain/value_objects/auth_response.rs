//! Authentication response value objects handed to the presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::token::{Claims, TokenPair};
use crate::errors::TokenError;

/// Result of a code send request
///
/// `dev_code` is only ever populated outside production and only when the
/// echo flag is configured. It is skipped entirely when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendCodeResponse {
    /// Identifier of the issued OTP record
    pub otp_id: Uuid,

    /// When the code stops being accepted
    pub expires_at: DateTime<Utc>,

    /// Raw code, development aid only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_code: Option<String>,
}

/// Authentication response returned after a successful code verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthResponse {
    /// JWT access token for API authentication
    pub access_token: String,

    /// JWT refresh token for obtaining new access tokens
    pub refresh_token: String,

    /// Access token expiration time in seconds
    pub expires_in: i64,

    /// Always "Bearer"
    pub token_type: String,

    /// Authenticated user
    pub user_id: Uuid,
}

impl AuthResponse {
    /// Creates an authentication response from a token pair
    pub fn from_token_pair(token_pair: TokenPair, user_id: Uuid) -> Self {
        Self {
            access_token: token_pair.access_token,
            refresh_token: token_pair.refresh_token,
            expires_in: token_pair.expires_in,
            token_type: token_pair.token_type,
            user_id,
        }
    }
}

/// Verified identity attached to a request after bearer authentication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Identifier of the presented access token
    pub jti: String,
    /// Expiry of the presented access token (unix seconds)
    pub expires_at: i64,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email,
            phone: claims.phone,
            jti: claims.jti,
            expires_at: claims.exp,
        })
    }
}
