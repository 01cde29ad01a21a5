//! Main authentication service implementation

use std::sync::Arc;

use ds_shared::utils::phone::{is_valid_e164, mask_phone_number, normalize_phone_number};

use crate::domain::entities::token::TokenType;
use crate::domain::value_objects::{AuthResponse, AuthenticatedUser, SendCodeResponse};
use crate::errors::{AuthError, DomainError, DomainResult, ErrorKind};
use crate::repositories::{OtpRepository, TtlStore, UserRepository};
use crate::services::otp::OtpService;
use crate::services::rate_limit::DualKeyGate;
use crate::services::token::TokenService;

use super::config::AuthServiceConfig;
use super::sms::{verification_message, SmsSender};

/// Authentication service for the complete phone-login flow
pub struct AuthService<O, U, T>
where
    O: OtpRepository,
    U: UserRepository,
    T: TtlStore,
{
    /// User repository for contact details
    user_repository: Arc<U>,
    /// OTP state machine
    otp_service: Arc<OtpService<O, U>>,
    /// Token service for JWT management
    token_service: Arc<TokenService<T>>,
    /// Per-phone / per-IP token buckets in front of code sends
    send_gate: Arc<DualKeyGate>,
    /// Outbound SMS
    sms_sender: Arc<dyn SmsSender>,
    /// Service configuration
    config: AuthServiceConfig,
}

impl<O, U, T> AuthService<O, U, T>
where
    O: OtpRepository,
    U: UserRepository,
    T: TtlStore,
{
    /// Create a new authentication service
    ///
    /// # Arguments
    ///
    /// * `user_repository` - Repository for user lookups
    /// * `otp_service` - OTP issuance and verification
    /// * `token_service` - Service for JWT token management
    /// * `send_gate` - Rate limiter for code sends
    /// * `sms_sender` - Delivery channel for codes
    /// * `config` - Service configuration
    pub fn new(
        user_repository: Arc<U>,
        otp_service: Arc<OtpService<O, U>>,
        token_service: Arc<TokenService<T>>,
        send_gate: Arc<DualKeyGate>,
        sms_sender: Arc<dyn SmsSender>,
        config: AuthServiceConfig,
    ) -> Self {
        Self {
            user_repository,
            otp_service,
            token_service,
            send_gate,
            sms_sender,
            config,
        }
    }

    pub fn token_service(&self) -> &Arc<TokenService<T>> {
        &self.token_service
    }

    /// Send a verification code to a phone number
    ///
    /// This method:
    /// 1. Validates the phone number format
    /// 2. Spends a token from the per-phone and per-IP send buckets
    /// 3. Issues a code through the OTP state machine
    /// 4. Delivers the code by SMS
    ///
    /// # Arguments
    ///
    /// * `phone` - The phone number to send the code to (E.164 format)
    /// * `client_ip` - Optional client IP address for IP-based rate limiting
    ///
    /// # Returns
    ///
    /// * `Ok(SendCodeResponse)` - Record id and expiry; the raw code only in development
    /// * `Err(DomainError)` - Invalid phone, rate limited, or a store/SMS failure
    pub async fn send_code(
        &self,
        phone: &str,
        client_ip: Option<&str>,
    ) -> DomainResult<SendCodeResponse> {
        let phone = normalize_phone_number(phone);
        if !is_valid_e164(&phone) {
            return Err(AuthError::InvalidPhoneFormat.into());
        }

        self.send_gate.check(&phone, client_ip).await?;

        let issued = self.otp_service.start(&phone, client_ip).await?;

        let message = verification_message(&issued.code, self.config.code_ttl_minutes);
        if let Err(error) = self.sms_sender.send(&phone, &message).await {
            tracing::error!(
                phone = %mask_phone_number(&phone),
                otp_id = %issued.otp_id,
                error = %error,
                event = "sms_send_failed",
                "Failed to deliver verification code"
            );
            return Err(if error.is_dependency() {
                error
            } else {
                DomainError::dependency("sms", error)
            });
        }

        let dev_code = if self.config.echo_codes() {
            Some(issued.code)
        } else {
            None
        };

        Ok(SendCodeResponse {
            otp_id: issued.otp_id,
            expires_at: issued.expires_at,
            dev_code,
        })
    }

    /// Verify a code and issue a token pair
    ///
    /// # Returns
    ///
    /// * `Ok(AuthResponse)` - Access and refresh tokens for the phone's user
    /// * `Err(DomainError)` - Wrong/expired/exhausted code, or a store failure
    pub async fn verify_code(
        &self,
        phone: &str,
        code: &str,
        client_ip: Option<&str>,
    ) -> DomainResult<AuthResponse> {
        let verified = self.otp_service.verify(phone, code, client_ip).await?;

        let email = self
            .user_repository
            .find_by_id(verified.user_id)
            .await?
            .and_then(|user| user.email);

        let pair = self.token_service.issue_pair(
            verified.user_id,
            email.as_deref(),
            Some(verified.phone.as_str()),
        )?;

        tracing::info!(
            user_id = %verified.user_id,
            phone = %mask_phone_number(&verified.phone),
            event = "login_succeeded",
            "User authenticated by phone"
        );

        Ok(AuthResponse::from_token_pair(pair, verified.user_id))
    }

    /// Exchange a refresh token for a new pair
    ///
    /// The presented refresh token stays valid; see [`rotate`](Self::rotate).
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<AuthResponse> {
        let claims = self
            .token_service
            .validate(refresh_token, TokenType::Refresh)
            .await?;
        let user_id = claims.user_id()?;

        // Refresh tokens carry no contact details; the access token does
        let (email, phone) = match self.user_repository.find_by_id(user_id).await? {
            Some(user) => (user.email, Some(user.phone)),
            None => (None, None),
        };

        let pair = self
            .token_service
            .issue_pair(user_id, email.as_deref(), phone.as_deref())?;
        Ok(AuthResponse::from_token_pair(pair, user_id))
    }

    /// Refresh and revoke the presented refresh token
    pub async fn rotate(&self, refresh_token: &str) -> DomainResult<AuthResponse> {
        let response = self.refresh(refresh_token).await?;
        self.token_service.invalidate(refresh_token).await?;

        tracing::info!(
            user_id = %response.user_id,
            event = "refresh_token_rotated",
            "Refresh token rotated"
        );
        Ok(response)
    }

    /// Revoke the session's tokens
    ///
    /// Malformed or already-expired tokens are skipped. Store failures are
    /// still reported.
    pub async fn logout(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> DomainResult<()> {
        for token in std::iter::once(access_token).chain(refresh_token) {
            match self.token_service.invalidate(token).await {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::InvalidCredential => {
                    tracing::debug!(error = %error, "Skipping unusable token on logout");
                }
                Err(error) => return Err(error),
            }
        }

        tracing::info!(event = "logout", "Session tokens revoked");
        Ok(())
    }

    /// Resolve the identity behind an `Authorization` header value
    pub async fn authenticate(&self, authorization: &str) -> DomainResult<AuthenticatedUser> {
        let token = parse_bearer_token(authorization)?;
        let claims = self.token_service.validate(token, TokenType::Access).await?;
        Ok(AuthenticatedUser::try_from(claims)?)
    }
}

/// Extract the token from `Bearer <token>`; the scheme is case-insensitive
pub fn parse_bearer_token(authorization: &str) -> DomainResult<&str> {
    let (scheme, token) = authorization
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingBearerToken)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingBearerToken.into());
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingBearerToken.into());
    }
    Ok(token)
}
