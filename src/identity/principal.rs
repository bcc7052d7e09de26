use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::Role;
use super::session::Session;
use super::user::User;

/// The caller a guard has admitted: the user as currently stored, plus the
/// session it arrived with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub session_expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn from_parts(user: &User, session: &Session) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            session_expires_at: session.expires_at,
        }
    }
}
