//! User repository trait defining the data access contract for users
//!
//! The gateway only ever resolves users by phone; profile management lives
//! elsewhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::user::User;
use crate::errors::DomainError;

/// Repository trait for user data access
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Return the user owning `phone`, creating one if none exists
    ///
    /// Concurrent calls for the same phone must resolve to the same user.
    ///
    /// # Arguments
    /// * `phone` - E.164 phone number
    /// * `now` - Creation time used when a new user is inserted
    ///
    /// # Returns
    /// * `Ok(User)` - Existing or newly created user
    /// * `Err(DomainError)` - Store failure
    async fn upsert_by_phone(&self, phone: &str, now: DateTime<Utc>) -> Result<User, DomainError>;

    /// Find user by ID
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - User not found
    /// * `Err(DomainError)` - Store failure
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
}
