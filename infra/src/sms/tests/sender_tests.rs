use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use ds_core::errors::ErrorKind;
use ds_core::services::SmsSender;
use ds_shared::config::{Secret, SmsConfig, SmsProvider};

use crate::sms::{create_sms_sender, LogSmsSender, TwilioSmsSender};

fn twilio_config() -> SmsConfig {
    SmsConfig {
        provider: SmsProvider::Twilio,
        twilio_account_sid: "AC123".to_string(),
        twilio_auth_token: Secret::new("token"),
        twilio_from_number: "+15550000000".to_string(),
        timeout_seconds: 5,
    }
}

/// Answer one HTTP request with a canned response, returning the raw request
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buffer = [0u8; 4096];
        loop {
            let read = socket.read(&mut buffer).await.unwrap();
            request.extend_from_slice(&buffer[..read]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
            if read == 0 {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&request).into_owned()
    });

    (format!("http://{}", address), handle)
}

#[tokio::test]
async fn test_log_sender_always_succeeds() {
    let sender = LogSmsSender::new();
    assert!(sender.send("+15551234567", "hello").await.is_ok());
}

#[tokio::test]
async fn test_twilio_posts_form_with_basic_auth() {
    let (base_url, server) = serve_once("201 Created", r#"{"sid":"SM1"}"#).await;
    let sender = TwilioSmsSender::new(&twilio_config())
        .unwrap()
        .with_base_url(base_url);

    sender
        .send("+15551234567", "Your code is 123456")
        .await
        .unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /2010-04-01/Accounts/AC123/Messages.json"));
    // base64("AC123:token")
    assert!(request.contains("QUMxMjM6dG9rZW4="));
    assert!(request.contains("To=%2B15551234567"));
    assert!(request.contains("From=%2B15550000000"));
    assert!(request.contains("Body=Your+code+is+123456"));
}

#[tokio::test]
async fn test_twilio_rejection_is_dependency_error() {
    let (base_url, server) = serve_once(
        "400 Bad Request",
        r#"{"code":21211,"message":"The 'To' number is not a valid phone number."}"#,
    )
    .await;
    let sender = TwilioSmsSender::new(&twilio_config())
        .unwrap()
        .with_base_url(base_url);

    let err = sender.send("+15551234567", "hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);
    assert!(err.to_string().contains("21211"));
    server.await.unwrap();
}

#[tokio::test]
async fn test_twilio_unparseable_error_reports_status() {
    let (base_url, server) = serve_once("503 Service Unavailable", "oops").await;
    let sender = TwilioSmsSender::new(&twilio_config())
        .unwrap()
        .with_base_url(base_url);

    let err = sender.send("+15551234567", "hi").await.unwrap_err();
    assert!(err.to_string().contains("status 503"));
    server.await.unwrap();
}

#[test]
fn test_twilio_requires_credentials() {
    let mut config = twilio_config();
    config.twilio_from_number = String::new();
    assert!(matches!(
        TwilioSmsSender::new(&config),
        Err(crate::InfrastructureError::Config(_))
    ));
}

#[test]
fn test_create_sms_sender_validates_twilio_config() {
    let mut config = twilio_config();
    config.twilio_auth_token = Secret::new("");
    assert!(create_sms_sender(&config).is_err());

    assert!(create_sms_sender(&SmsConfig::default()).is_ok());
}
