//! Main OTP service implementation

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use ds_shared::config::OtpConfig;
use ds_shared::utils::phone::{is_valid_e164, mask_phone_number, normalize_phone_number};

use crate::domain::entities::otp::OtpRecord;
use crate::errors::{AuthError, DomainError, DomainResult, ValidationError};
use crate::repositories::{OtpRepository, UserRepository};
use crate::services::secret::{constant_time_equal, hash_otp, random_numeric_code};

use super::send_guard::SendGuard;
use super::types::{OtpIssued, OtpVerified};

/// OTP state machine over durable stores
///
/// Each record moves Active -> {Consumed, Expired, AttemptsExhausted} and
/// never back. Every operation reads the clock once.
pub struct OtpService<O: OtpRepository, U: UserRepository> {
    otp_repository: Arc<O>,
    user_repository: Arc<U>,
    config: OtpConfig,
    send_guard: SendGuard,
}

impl<O: OtpRepository, U: UserRepository> OtpService<O, U> {
    /// Create a new OTP service
    ///
    /// Fails with `Unconfigured` when the pepper is missing or a placeholder.
    pub fn new(
        otp_repository: Arc<O>,
        user_repository: Arc<U>,
        config: OtpConfig,
    ) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self {
            otp_repository,
            user_repository,
            config,
            send_guard: SendGuard::new(),
        })
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    /// Issue a fresh code for `phone`
    ///
    /// This method:
    /// 1. Validates the phone number format
    /// 2. Enforces hourly per-phone, hourly per-IP and resend-interval limits
    /// 3. Resolves (or creates) the user owning the phone
    /// 4. Stores the digest of a new code, consuming any previous active code
    ///
    /// # Arguments
    ///
    /// * `phone` - Destination in E.164 format
    /// * `send_ip` - Requesting address, if known
    ///
    /// # Returns
    ///
    /// * `Ok(OtpIssued)` - Record id, expiry and the raw code for delivery
    /// * `Err(DomainError)` - Invalid input, rate limited, or store failure
    pub async fn start(&self, phone: &str, send_ip: Option<&str>) -> DomainResult<OtpIssued> {
        self.start_at(phone, send_ip, Utc::now()).await
    }

    /// [`start`](Self::start) at an explicit instant
    pub async fn start_at(
        &self,
        phone: &str,
        send_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<OtpIssued> {
        let phone = validated_phone(phone)?;
        let send_ip = send_ip.map(str::trim).filter(|ip| !ip.is_empty());

        // Counts and the insert must not interleave with another send
        let _permit = self.send_guard.acquire(&phone, send_ip).await;
        self.enforce_send_limits(&phone, send_ip, now).await?;

        let user = self.user_repository.upsert_by_phone(&phone, now).await?;

        let code = random_numeric_code(self.config.code_length)?;
        let otp_id = Uuid::new_v4();
        let code_hash = hash_otp(self.config.pepper.expose(), &otp_id, &code);
        let record = OtpRecord::new(
            otp_id,
            user.id,
            phone.as_str(),
            code_hash,
            now,
            Duration::seconds(self.config.code_ttl_seconds),
            self.config.max_attempts,
            send_ip.map(str::to_string),
        );

        let invalidated = self.otp_repository.replace_active(&record).await?;

        tracing::info!(
            phone = %mask_phone_number(&phone),
            otp_id = %otp_id,
            invalidated_previous = invalidated,
            expires_at = %record.expires_at,
            event = "otp_generated",
            "Verification code issued"
        );

        Ok(OtpIssued {
            otp_id,
            user_id: user.id,
            phone,
            expires_at: record.expires_at,
            code,
        })
    }

    async fn enforce_send_limits(
        &self,
        phone: &str,
        send_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let window_start = now - Duration::hours(1);

        if self.config.max_per_hour > 0 {
            let sent = self
                .otp_repository
                .count_sent_to_phone_since(phone, window_start)
                .await?;
            if sent >= self.config.max_per_hour {
                tracing::warn!(
                    phone = %mask_phone_number(phone),
                    sent_last_hour = sent,
                    event = "otp_rate_limited",
                    "Hourly per-phone send limit reached"
                );
                return Err(rate_limited("otp:phone-hourly", None));
            }
        }

        if let Some(ip) = send_ip.filter(|_| self.config.max_per_ip_per_hour > 0) {
            let sent = self
                .otp_repository
                .count_sent_from_ip_since(ip, window_start)
                .await?;
            if sent >= self.config.max_per_ip_per_hour {
                tracing::warn!(
                    ip = ip,
                    sent_last_hour = sent,
                    event = "otp_rate_limited",
                    "Hourly per-IP send limit reached"
                );
                return Err(rate_limited("otp:ip-hourly", None));
            }
        }

        if self.config.min_seconds_between > 0 {
            if let Some(last) = self.otp_repository.latest_created_at(phone).await? {
                let elapsed = (now - last).num_seconds();
                if elapsed < self.config.min_seconds_between {
                    let retry_after = self.config.min_seconds_between - elapsed;
                    tracing::warn!(
                        phone = %mask_phone_number(phone),
                        retry_after_seconds = retry_after,
                        event = "otp_rate_limited",
                        "Resend requested too soon"
                    );
                    return Err(rate_limited("otp:resend-interval", Some(retry_after)));
                }
            }
        }

        Ok(())
    }

    /// Check a submitted code against the active record for `phone`
    ///
    /// # Arguments
    ///
    /// * `phone` - Phone the code was sent to
    /// * `code` - Code as typed by the user
    /// * `verify_ip` - Submitting address, recorded on success
    ///
    /// # Returns
    ///
    /// * `Ok(OtpVerified)` - The record was consumed by this call
    /// * `Err(DomainError)` - `InvalidVerificationCode` for no active record,
    ///   a wrong code or a lost race; `VerificationCodeExpired`;
    ///   `MaxAttemptsExceeded`; or a dependency failure
    pub async fn verify(
        &self,
        phone: &str,
        code: &str,
        verify_ip: Option<&str>,
    ) -> DomainResult<OtpVerified> {
        self.verify_at(phone, code, verify_ip, Utc::now()).await
    }

    /// [`verify`](Self::verify) at an explicit instant
    pub async fn verify_at(
        &self,
        phone: &str,
        code: &str,
        verify_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<OtpVerified> {
        let phone = validated_phone(phone)?;
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::RequiredField {
                field: "code".to_string(),
            }
            .into());
        }
        let verify_ip = verify_ip.map(str::trim).filter(|ip| !ip.is_empty());

        let record = match self.otp_repository.find_active_by_phone(&phone).await? {
            Some(record) => record,
            None => {
                tracing::info!(
                    phone = %mask_phone_number(&phone),
                    event = "otp_verify_failed",
                    reason = "no_active_code",
                    "Verification failed"
                );
                return Err(AuthError::InvalidVerificationCode.into());
            }
        };

        if record.is_expired_at(now) {
            return Err(AuthError::VerificationCodeExpired.into());
        }

        let remaining = match self.otp_repository.try_consume_attempt(record.id).await? {
            Some(remaining) => remaining,
            None => {
                tracing::info!(
                    phone = %mask_phone_number(&phone),
                    otp_id = %record.id,
                    event = "otp_verify_failed",
                    reason = "attempts_exhausted",
                    "Verification failed"
                );
                return Err(AuthError::MaxAttemptsExceeded.into());
            }
        };

        let expected = hash_otp(self.config.pepper.expose(), &record.id, code);
        if !constant_time_equal(&expected, &record.code_hash) {
            tracing::info!(
                phone = %mask_phone_number(&phone),
                otp_id = %record.id,
                attempts_remaining = remaining,
                event = "otp_verify_failed",
                reason = "code_mismatch",
                "Verification failed"
            );
            return Err(AuthError::InvalidVerificationCode.into());
        }

        let consumed = self
            .otp_repository
            .mark_consumed(record.id, now, verify_ip)
            .await?;
        if !consumed {
            tracing::info!(
                otp_id = %record.id,
                event = "otp_verify_failed",
                reason = "already_consumed",
                "Verification lost a concurrent race"
            );
            return Err(AuthError::InvalidVerificationCode.into());
        }

        tracing::info!(
            phone = %mask_phone_number(&phone),
            otp_id = %record.id,
            user_id = %record.user_id,
            event = "otp_verified",
            "Verification code accepted"
        );

        Ok(OtpVerified {
            otp_id: record.id,
            user_id: record.user_id,
            phone,
            verified_at: now,
        })
    }
}

fn validated_phone(phone: &str) -> DomainResult<String> {
    let phone = normalize_phone_number(phone);
    if !is_valid_e164(&phone) {
        return Err(AuthError::InvalidPhoneFormat.into());
    }
    Ok(phone)
}

fn rate_limited(scope: &str, retry_after_seconds: Option<i64>) -> DomainError {
    DomainError::Auth(AuthError::RateLimitExceeded {
        scope: scope.to_string(),
        retry_after_seconds,
    })
}
