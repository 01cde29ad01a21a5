//! End-to-end phone login flow over the in-memory stores

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use ds_core::domain::entities::token::TokenType;
use ds_core::errors::{DomainResult, ErrorKind};
use ds_core::repositories::{
    InMemoryOtpRepository, InMemoryUserRepository, MemoryTtlStore, OtpRepository,
};
use ds_core::services::auth::{AuthService, AuthServiceConfig, SmsSender};
use ds_core::services::otp::OtpService;
use ds_core::services::rate_limit::{DualKeyGate, OTP_SEND_SCOPE};
use ds_core::services::token::TokenService;
use ds_shared::config::{AppConfig, Environment};

const PHONE: &str = "+15551234567";

#[derive(Default)]
struct CapturingSms {
    bodies: Mutex<Vec<String>>,
}

impl CapturingSms {
    fn last_code(&self) -> String {
        let bodies = self.bodies.lock().unwrap();
        let body = bodies.last().expect("no sms sent");
        body.split_whitespace()
            .map(|w| w.trim_end_matches('.'))
            .find(|w| w.len() == 6 && w.chars().all(|c| c.is_ascii_digit()))
            .expect("no code in sms")
            .to_string()
    }
}

#[async_trait]
impl SmsSender for CapturingSms {
    async fn send(&self, _destination: &str, message: &str) -> DomainResult<()> {
        self.bodies.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn app_config(environment: Environment) -> AppConfig {
    let mut config = match environment {
        Environment::Production => AppConfig::production(),
        _ => AppConfig::development(),
    };
    config.auth.jwt.access_secret = "integration-access-secret-aaaa1111".into();
    config.auth.jwt.refresh_secret = "integration-refresh-secret-bbbb2222".into();
    config.auth.otp.pepper = "integration-pepper-cccc3333".into();
    config.auth.otp.echo_code_in_response = true;
    config
}

struct Stack {
    auth: AuthService<InMemoryOtpRepository, InMemoryUserRepository, MemoryTtlStore>,
    otp: Arc<OtpService<InMemoryOtpRepository, InMemoryUserRepository>>,
    otps: Arc<InMemoryOtpRepository>,
    sms: Arc<CapturingSms>,
}

fn build(config: &AppConfig) -> Stack {
    config.validate().unwrap();

    let otps = Arc::new(InMemoryOtpRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let sms = Arc::new(CapturingSms::default());
    let otp = Arc::new(OtpService::new(otps.clone(), users.clone(), config.auth.otp.clone()).unwrap());
    let tokens =
        Arc::new(TokenService::new(MemoryTtlStore::new(), config.auth.jwt.clone()).unwrap());
    let gate = Arc::new(DualKeyGate::in_memory(
        OTP_SEND_SCOPE,
        &config.rate_limit.otp_send,
    ));

    let auth = AuthService::new(
        users,
        otp.clone(),
        tokens,
        gate,
        sms.clone(),
        AuthServiceConfig::from_app_config(config),
    );

    Stack {
        auth,
        otp,
        otps,
        sms,
    }
}

#[tokio::test]
async fn test_login_scenario() {
    let stack = build(&app_config(Environment::Development));

    let sent = stack.auth.send_code(PHONE, Some("203.0.113.7")).await.unwrap();
    let record = stack.otps.find_by_id(sent.otp_id).await.unwrap().unwrap();
    assert_eq!(record.expires_at - record.created_at, Duration::minutes(5));

    let code = stack.sms.last_code();
    assert_eq!(sent.dev_code.as_deref(), Some(code.as_str()));

    let auth = stack.auth.verify_code(PHONE, &code, None).await.unwrap();
    let user = stack
        .auth
        .authenticate(&format!("Bearer {}", auth.access_token))
        .await
        .unwrap();
    assert_eq!(user.user_id, auth.user_id);

    let err = stack.auth.verify_code(PHONE, &code, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCredential);

    let rotated = stack.auth.rotate(&auth.refresh_token).await.unwrap();
    stack
        .auth
        .logout(&rotated.access_token, Some(&rotated.refresh_token))
        .await
        .unwrap();

    let err = stack
        .auth
        .authenticate(&format!("Bearer {}", rotated.access_token))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Revoked);

    // The first access token was never revoked and is still valid
    let still_valid = stack
        .auth
        .token_service()
        .validate(&auth.access_token, TokenType::Access)
        .await;
    assert!(still_valid.is_ok());
}

#[tokio::test]
async fn test_production_response_never_carries_code() {
    let stack = build(&app_config(Environment::Production));

    let sent = stack.auth.send_code(PHONE, None).await.unwrap();
    assert!(sent.dev_code.is_none());

    let body = serde_json::to_string(&sent).unwrap();
    assert!(!body.contains("dev_code"));
    assert!(!body.contains(&stack.sms.last_code()));
}

#[tokio::test]
async fn test_resend_within_interval_is_rate_limited() {
    let stack = build(&app_config(Environment::Development));

    stack.auth.send_code(PHONE, None).await.unwrap();
    let err = stack.auth.send_code(PHONE, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.kind().status_code(), 429);

    let active: Vec<_> = stack
        .otps
        .records_for(PHONE)
        .await
        .into_iter()
        .filter(|r| !r.is_consumed())
        .collect();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn test_outage_is_not_reported_as_bad_code() {
    let stack = build(&app_config(Environment::Development));
    let issued = stack.otp.start(PHONE, None).await.unwrap();

    stack.otps.set_failing(true);
    let err = stack.otp.verify(PHONE, &issued.code, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert_eq!(err.kind().status_code(), 503);
}

#[test]
fn test_missing_secrets_refuse_startup() {
    let config = AppConfig::development();
    assert!(config.validate().is_err());

    let mut shared = app_config(Environment::Development);
    shared.auth.jwt.refresh_secret = shared.auth.jwt.access_secret.clone();
    assert!(shared.validate().is_err());
}
