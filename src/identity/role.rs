use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account-level privilege. Assigned to users, never cached on sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Editor,
    Viewer,
}

/// Anyone who may work on site content.
pub const STAFF: &[Role] = &[Role::Editor, Role::Admin, Role::SuperAdmin];
/// Inbox, deletions.
pub const ADMINS: &[Role] = &[Role::Admin, Role::SuperAdmin];
/// Team membership.
pub const SUPER_ADMINS: &[Role] = &[Role::SuperAdmin];
pub const ANY_ROLE: &[Role] = &[Role::Viewer, Role::Editor, Role::Admin, Role::SuperAdmin];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Editor => "EDITOR",
            Role::Viewer => "VIEWER",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "EDITOR" => Ok(Role::Editor),
            "VIEWER" => Ok(Role::Viewer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
