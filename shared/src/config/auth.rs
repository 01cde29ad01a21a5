//! Authentication configuration: signing secrets, token lifetimes and OTP policy

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::{env_or, env_string, ConfigError};

/// Values that ship as examples in sample env files and must never sign anything
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "your-super-secret-key-change-in-production",
    "your-refresh-secret-key-change-in-production",
    "your-secret-key-change-in-production",
    "development-secret-please-change-in-production",
    "changeme",
    "secret",
];

/// Check whether a value is one of the well-known placeholder secrets
pub fn is_placeholder_secret(value: &str) -> bool {
    let value = value.trim();
    PLACEHOLDER_SECRETS
        .iter()
        .any(|placeholder| placeholder.eq_ignore_ascii_case(value))
}

/// Secret string that never shows up in `Debug` output or serialized config
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw secret value
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Fail unless the secret is present and not a placeholder
    pub fn require(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::MissingSecret { name });
        }
        if is_placeholder_secret(&self.0) {
            return Err(ConfigError::PlaceholderSecret { name });
        }
        Ok(())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret(****)")
        }
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("****")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// JWT signing configuration
///
/// | Variable                    | Default      |
/// |-----------------------------|--------------|
/// | `JWT_SECRET`                | (required)   |
/// | `JWT_REFRESH_SECRET`        | (required)   |
/// | `JWT_ISSUER`                | `duskspendr` |
/// | `JWT_ACCESS_TOKEN_EXPIRY`   | `900`        |
/// | `JWT_REFRESH_TOKEN_EXPIRY`  | `604800`     |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_secret: Secret,

    /// Secret for signing refresh tokens, must differ from the access secret
    pub refresh_secret: Secret,

    /// Access token expiry time in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiry time in seconds
    pub refresh_token_expiry: i64,

    /// JWT issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: Secret::default(),
            refresh_secret: Secret::default(),
            access_token_expiry: 900,     // 15 minutes
            refresh_token_expiry: 604800, // 7 days
            issuer: String::from("duskspendr"),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with both signing secrets
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: Secret::new(access_secret),
            refresh_secret: Secret::new(refresh_secret),
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Check if either secret is a known placeholder (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        is_placeholder_secret(self.access_secret.expose())
            || is_placeholder_secret(self.refresh_secret.expose())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.access_secret.require("JWT_SECRET")?;
        self.refresh_secret.require("JWT_REFRESH_SECRET")?;
        if self.access_secret.expose().trim() == self.refresh_secret.expose().trim() {
            return Err(ConfigError::SharedSigningSecret);
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "JWT_ACCESS_TOKEN_EXPIRY".to_string(),
                value: self.access_token_expiry.to_string(),
            });
        }
        if self.refresh_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "JWT_REFRESH_TOKEN_EXPIRY".to_string(),
                value: self.refresh_token_expiry.to_string(),
            });
        }
        Ok(())
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            access_secret: Secret::new(env_string("JWT_SECRET").unwrap_or_default()),
            refresh_secret: Secret::new(env_string("JWT_REFRESH_SECRET").unwrap_or_default()),
            access_token_expiry: env_or("JWT_ACCESS_TOKEN_EXPIRY", defaults.access_token_expiry),
            refresh_token_expiry: env_or("JWT_REFRESH_TOKEN_EXPIRY", defaults.refresh_token_expiry),
            issuer: env_string("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }
}

/// One-time passcode policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OtpConfig {
    /// Server-side pepper mixed into every code digest (`AUTH_PEPPER`)
    pub pepper: Secret,

    /// Number of digits in a generated code
    pub code_length: usize,

    /// Lifetime of an issued code in seconds
    pub code_ttl_seconds: i64,

    /// Verification attempts allowed per code (`OTP_MAX_ATTEMPTS`)
    pub max_attempts: i32,

    /// Codes allowed per phone in the trailing hour (`OTP_MAX_PER_HOUR`)
    pub max_per_hour: i64,

    /// Codes allowed per source address in the trailing hour (`OTP_MAX_PER_IP_PER_HOUR`)
    pub max_per_ip_per_hour: i64,

    /// Minimum gap between two codes to the same phone (`OTP_MIN_SECONDS_BETWEEN`)
    pub min_seconds_between: i64,

    /// Return the raw code to the caller. Ignored in production.
    #[serde(default)]
    pub echo_code_in_response: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            pepper: Secret::default(),
            code_length: 6,
            code_ttl_seconds: 300,
            max_attempts: 5,
            max_per_hour: 5,
            max_per_ip_per_hour: 30,
            min_seconds_between: 60,
            echo_code_in_response: false,
        }
    }
}

impl OtpConfig {
    pub fn with_pepper(mut self, pepper: impl Into<String>) -> Self {
        self.pepper = Secret::new(pepper);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pepper.require("AUTH_PEPPER")?;
        if self.code_length == 0 {
            return Err(ConfigError::InvalidValue {
                name: "OTP_CODE_LENGTH".to_string(),
                value: "0".to_string(),
            });
        }
        if self.max_attempts < 1 {
            return Err(ConfigError::InvalidValue {
                name: "OTP_MAX_ATTEMPTS".to_string(),
                value: self.max_attempts.to_string(),
            });
        }
        if self.code_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidValue {
                name: "OTP_TTL_SECONDS".to_string(),
                value: self.code_ttl_seconds.to_string(),
            });
        }
        Ok(())
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pepper: Secret::new(env_string("AUTH_PEPPER").unwrap_or_default()),
            code_length: env_or("OTP_CODE_LENGTH", defaults.code_length),
            code_ttl_seconds: env_or("OTP_TTL_SECONDS", defaults.code_ttl_seconds),
            max_attempts: env_or("OTP_MAX_ATTEMPTS", defaults.max_attempts),
            max_per_hour: env_or("OTP_MAX_PER_HOUR", defaults.max_per_hour),
            max_per_ip_per_hour: env_or("OTP_MAX_PER_IP_PER_HOUR", defaults.max_per_ip_per_hour),
            min_seconds_between: env_or("OTP_MIN_SECONDS_BETWEEN", defaults.min_seconds_between),
            echo_code_in_response: env_or("OTP_DEV_ECHO", defaults.echo_code_in_response),
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// OTP configuration
    #[serde(default)]
    pub otp: OtpConfig,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            otp: OtpConfig::from_env(),
        }
    }

    /// Refuse configurations that would sign or hash with missing or known secrets
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.otp.validate()
    }
}
