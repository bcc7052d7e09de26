use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;
use crate::storage::StoreResult;

/// A dashboard account. The role lives here and only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, name: &str, role: Role, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            name: name.to_string(),
            role,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Emails are unique and compared case-insensitively.
pub fn normalize_email(email: &str) -> String { email.trim().to_ascii_lowercase() }

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>>;
    /// `email` must already be normalized.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    /// Returns false when no such user exists.
    async fn set_user_role(&self, user_id: &str, role: Role) -> StoreResult<bool>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
}
