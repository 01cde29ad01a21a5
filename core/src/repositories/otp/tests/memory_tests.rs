//! Unit tests for the in-memory OTP repository

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::otp::OtpRecord;
use crate::errors::ErrorKind;
use crate::repositories::otp::{InMemoryOtpRepository, OtpRepository};

const PHONE: &str = "+15551234567";

fn record(phone: &str, now: DateTime<Utc>, ip: Option<&str>) -> OtpRecord {
    OtpRecord::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        phone,
        "digest",
        now,
        Duration::minutes(5),
        3,
        ip.map(str::to_string),
    )
}

#[tokio::test]
async fn test_replace_active_consumes_previous() {
    let repo = InMemoryOtpRepository::new();
    let now = Utc::now();
    let first = record(PHONE, now, None);
    let second = record(PHONE, now + Duration::seconds(90), None);

    assert_eq!(repo.replace_active(&first).await.unwrap(), 0);
    assert_eq!(repo.replace_active(&second).await.unwrap(), 1);

    let stored = repo.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(stored.consumed_at, Some(second.created_at));

    let active = repo.find_active_by_phone(PHONE).await.unwrap().unwrap();
    assert_eq!(active.id, second.id);
    assert_eq!(repo.records_for(PHONE).await.len(), 2);
}

#[tokio::test]
async fn test_replace_active_leaves_other_phones() {
    let repo = InMemoryOtpRepository::new();
    let now = Utc::now();
    let other = record("+15557654321", now, None);

    repo.replace_active(&other).await.unwrap();
    repo.replace_active(&record(PHONE, now, None)).await.unwrap();

    assert!(repo.find_active_by_phone("+15557654321").await.unwrap().is_some());
}

#[tokio::test]
async fn test_counts_are_strictly_after_since() {
    let repo = InMemoryOtpRepository::new();
    let now = Utc::now();
    let first = record(PHONE, now, Some("198.51.100.1"));
    repo.replace_active(&first).await.unwrap();
    repo.replace_active(&record(PHONE, now + Duration::seconds(61), Some("198.51.100.1")))
        .await
        .unwrap();

    assert_eq!(repo.count_sent_to_phone_since(PHONE, now).await.unwrap(), 1);
    assert_eq!(
        repo.count_sent_to_phone_since(PHONE, now - Duration::seconds(1)).await.unwrap(),
        2
    );
    assert_eq!(
        repo.count_sent_from_ip_since("198.51.100.1", now - Duration::hours(1))
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        repo.count_sent_from_ip_since("198.51.100.2", now - Duration::hours(1))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_latest_created_at_includes_consumed() {
    let repo = InMemoryOtpRepository::new();
    assert!(repo.latest_created_at(PHONE).await.unwrap().is_none());

    let now = Utc::now();
    let issued = record(PHONE, now, None);
    repo.replace_active(&issued).await.unwrap();
    repo.mark_consumed(issued.id, now, None).await.unwrap();

    assert_eq!(repo.latest_created_at(PHONE).await.unwrap(), Some(now));
}

#[tokio::test]
async fn test_try_consume_attempt_stops_at_zero() {
    let repo = InMemoryOtpRepository::new();
    let issued = record(PHONE, Utc::now(), None);
    repo.replace_active(&issued).await.unwrap();

    assert_eq!(repo.try_consume_attempt(issued.id).await.unwrap(), Some(2));
    assert_eq!(repo.try_consume_attempt(issued.id).await.unwrap(), Some(1));
    assert_eq!(repo.try_consume_attempt(issued.id).await.unwrap(), Some(0));
    assert_eq!(repo.try_consume_attempt(issued.id).await.unwrap(), None);

    let stored = repo.find_by_id(issued.id).await.unwrap().unwrap();
    assert_eq!(stored.attempts_remaining, 0);
}

#[tokio::test]
async fn test_try_consume_attempt_refuses_consumed_record() {
    let repo = InMemoryOtpRepository::new();
    let now = Utc::now();
    let issued = record(PHONE, now, None);
    repo.replace_active(&issued).await.unwrap();
    repo.mark_consumed(issued.id, now, None).await.unwrap();

    assert_eq!(repo.try_consume_attempt(issued.id).await.unwrap(), None);
    assert_eq!(repo.try_consume_attempt(Uuid::new_v4()).await.unwrap(), None);
}

#[tokio::test]
async fn test_mark_consumed_only_once() {
    let repo = InMemoryOtpRepository::new();
    let now = Utc::now();
    let issued = record(PHONE, now, None);
    repo.replace_active(&issued).await.unwrap();

    assert!(repo.mark_consumed(issued.id, now, Some("203.0.113.9")).await.unwrap());
    assert!(!repo.mark_consumed(issued.id, now, Some("203.0.113.10")).await.unwrap());

    let stored = repo.find_by_id(issued.id).await.unwrap().unwrap();
    assert_eq!(stored.verify_ip.as_deref(), Some("203.0.113.9"));
    assert!(repo.find_active_by_phone(PHONE).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failing_store_reports_dependency() {
    let repo = InMemoryOtpRepository::new();
    repo.set_failing(true);

    let err = repo.find_active_by_phone(PHONE).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Dependency);

    repo.set_failing(false);
    assert!(repo.find_active_by_phone(PHONE).await.unwrap().is_none());
}
