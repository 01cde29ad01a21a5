//! MySQL implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{mysql::MySqlRow, MySqlPool, Row};
use uuid::Uuid;

use ds_core::domain::entities::user::User;
use ds_core::errors::DomainError;
use ds_core::repositories::UserRepository;
use ds_shared::utils::phone::mask_phone_number;

use super::{parse_uuid, store_error};

/// MySQL-backed user repository
#[derive(Clone)]
pub struct MySqlUserRepository {
    pool: MySqlPool,
}

impl MySqlUserRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to User entity
    fn row_to_user(row: &MySqlRow) -> Result<User, DomainError> {
        let decode = |e: sqlx::Error| DomainError::Internal {
            message: format!("Failed to decode user row: {}", e),
        };

        let id: String = row.try_get("id").map_err(decode)?;

        Ok(User {
            id: parse_uuid("id", &id)?,
            phone: row.try_get("phone").map_err(decode)?,
            email: row.try_get("email").map_err(decode)?,
            created_at: row.try_get("created_at").map_err(decode)?,
        })
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, phone, email, created_at
            FROM users
            WHERE phone = ?
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_user_by_phone", e))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn upsert_by_phone(&self, phone: &str, now: DateTime<Utc>) -> Result<User, DomainError> {
        // The unique key on phone makes concurrent first logins converge on one row
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, phone, email, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?)
            ON DUPLICATE KEY UPDATE updated_at = updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(phone)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("upsert_user", e))?;

        if result.rows_affected() == 1 {
            tracing::info!(phone = %mask_phone_number(phone), "Created user");
        }

        self.find_by_phone(phone).await?.ok_or_else(|| DomainError::Internal {
            message: "User missing after upsert".to_string(),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, phone, email, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_user_by_id", e))?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}
