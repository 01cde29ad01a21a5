//! Main token service implementation

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use uuid::Uuid;

use ds_shared::config::JwtConfig;

use crate::domain::entities::token::{Claims, TokenPair, TokenType};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::TtlStore;
use crate::services::secret::{generate_jti, hash_token};

/// Key prefix for blacklist entries in the TTL store
pub const BLACKLIST_KEY_PREFIX: &str = "blacklist:";

/// Claims recovered without checking the signature
///
/// Every field is optional so that malformed envelopes still decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnverifiedClaims {
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Service for minting, validating and revoking JWTs
///
/// Access and refresh tokens are signed under different secrets, so a token
/// of one class never verifies as the other.
pub struct TokenService<T: TtlStore> {
    store: T,
    config: JwtConfig,
    access_keys: SigningKeys,
    refresh_keys: SigningKeys,
    validation: Validation,
}

impl<T: TtlStore> TokenService<T> {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `store` - TTL store holding blacklisted `jti`s
    /// * `config` - Signing secrets, lifetimes and issuer
    ///
    /// # Returns
    ///
    /// The service, or `Unconfigured` when a secret is missing, a known
    /// placeholder, or both secrets are equal
    pub fn new(store: T, config: JwtConfig) -> DomainResult<Self> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        // Expiry is checked against a single `now` in `validate`
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            access_keys: SigningKeys::from_secret(config.access_secret.expose()),
            refresh_keys: SigningKeys::from_secret(config.refresh_secret.expose()),
            store,
            config,
            validation,
        })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    /// Generates a new token pair for a user
    ///
    /// # Arguments
    ///
    /// * `user_id` - Subject of both tokens
    /// * `email` - Embedded in the access token only
    /// * `phone` - Embedded in the access token only
    pub fn issue_pair(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> DomainResult<TokenPair> {
        self.issue_pair_at(user_id, email, phone, Utc::now().timestamp())
    }

    /// Same as [`issue_pair`](Self::issue_pair) with an explicit issue time
    pub fn issue_pair_at(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        phone: Option<&str>,
        issued_at: i64,
    ) -> DomainResult<TokenPair> {
        let access_claims = Claims::new(
            user_id,
            TokenType::Access,
            &self.config.issuer,
            generate_jti(),
            issued_at,
            self.config.access_token_expiry,
        )
        .with_contact(email.map(str::to_string), phone.map(str::to_string));

        let refresh_claims = Claims::new(
            user_id,
            TokenType::Refresh,
            &self.config.issuer,
            generate_jti(),
            issued_at,
            self.config.refresh_token_expiry,
        );

        let access_token = self.encode_jwt(&access_claims)?;
        let refresh_token = self.encode_jwt(&refresh_claims)?;

        tracing::debug!(
            user_id = %user_id,
            access_jti = %access_claims.jti,
            refresh_jti = %refresh_claims.jti,
            event = "token_pair_issued",
            "Issued token pair"
        );

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_token_expiry,
        ))
    }

    fn keys(&self, token_type: TokenType) -> &SigningKeys {
        match token_type {
            TokenType::Access => &self.access_keys,
            TokenType::Refresh => &self.refresh_keys,
        }
    }

    pub(crate) fn encode_jwt(&self, claims: &Claims) -> DomainResult<String> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.keys(claims.token_type).encoding)
            .map_err(|_| DomainError::Token(TokenError::TokenGenerationFailed))
    }

    /// Verifies a token of the expected class and returns its claims
    ///
    /// Checks run in order: signature under the class secret, expiry
    /// (`now >= exp`), class discriminator, then the blacklist. A blacklist
    /// store error rejects the token.
    pub async fn validate(&self, token: &str, expected: TokenType) -> DomainResult<Claims> {
        let now = Utc::now().timestamp();

        let claims = decode::<Claims>(token, &self.keys(expected).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::TokenExpired.into());
        }

        if claims.token_type != expected {
            return Err(TokenError::WrongTokenType {
                expected: expected.to_string(),
            }
            .into());
        }

        if self.is_jti_blacklisted(&claims.jti).await? {
            tracing::info!(
                jti = %claims.jti,
                token_type = %expected,
                event = "revoked_token_presented",
                "Rejected blacklisted token"
            );
            return Err(TokenError::TokenRevoked.into());
        }

        Ok(claims)
    }

    /// Validates a refresh token and issues a new pair for its subject
    ///
    /// The presented refresh token stays valid; pair this with
    /// [`invalidate`](Self::invalidate) for strict rotation.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        let claims = self.validate(refresh_token, TokenType::Refresh).await?;
        let user_id = claims.user_id()?;
        self.issue_pair(user_id, None, None)
    }

    /// Blacklists a token's `jti` for the rest of its lifetime
    ///
    /// The signature is not checked, so expired or otherwise unverifiable
    /// tokens can still be revoked. Already-expired tokens are a no-op.
    pub async fn invalidate(&self, token: &str) -> DomainResult<()> {
        let claims = self.decode_unverified(token)?;
        let jti = claims
            .jti
            .filter(|j| !j.is_empty())
            .ok_or_else(|| TokenError::MissingClaim {
                claim: "jti".to_string(),
            })?;
        let exp = claims.exp.ok_or_else(|| TokenError::MissingClaim {
            claim: "exp".to_string(),
        })?;

        let remaining = exp - Utc::now().timestamp();
        if remaining <= 0 {
            return Ok(());
        }

        self.store
            .set(&blacklist_key(&jti), "1", remaining as u64)
            .await?;

        let fingerprint = hash_token(token);
        tracing::info!(
            jti = %jti,
            token_fingerprint = %&fingerprint[..16],
            ttl_seconds = remaining,
            event = "token_blacklisted",
            "Token invalidated"
        );
        Ok(())
    }

    /// Whether the token's `jti` is on the blacklist
    ///
    /// Tokens whose `jti` cannot be recovered are never reported as blacklisted.
    pub async fn is_blacklisted(&self, token: &str) -> DomainResult<bool> {
        let jti = match self.decode_unverified(token) {
            Ok(UnverifiedClaims { jti: Some(jti), .. }) if !jti.is_empty() => jti,
            _ => return Ok(false),
        };
        self.is_jti_blacklisted(&jti).await
    }

    async fn is_jti_blacklisted(&self, jti: &str) -> DomainResult<bool> {
        self.store.exists(&blacklist_key(jti)).await
    }

    /// Decode the payload without verifying signature, issuer or expiry
    pub fn decode_unverified(&self, token: &str) -> DomainResult<UnverifiedClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<UnverifiedClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidTokenFormat.into())
    }
}

fn blacklist_key(jti: &str) -> String {
    format!("{}{}", BLACKLIST_KEY_PREFIX, jti)
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> DomainError {
    let token_error = match error.kind() {
        JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
        JwtErrorKind::ExpiredSignature => TokenError::TokenExpired,
        JwtErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim {
            claim: claim.clone(),
        },
        _ => TokenError::InvalidTokenFormat,
    };
    DomainError::Token(token_error)
}
