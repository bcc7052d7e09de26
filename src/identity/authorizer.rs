use tracing::debug;

use super::principal::Principal;
use super::role::Role;
use super::session::{token_tag, SessionManager};
use super::user::UserStore;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Unauthenticated,
    Forbidden,
}

/// Pure guard decision. `role` is the current role of the session's owner,
/// or None when there is no valid session.
pub fn authorize(role: Option<Role>, allowed: &[Role]) -> Decision {
    match role {
        None => Decision::Unauthenticated,
        Some(r) if allowed.contains(&r) => Decision::Permit,
        Some(_) => Decision::Forbidden,
    }
}

/// Resolve `token` to a principal whose current role is in `allowed`.
///
/// The owning user is re-read on every call so a role change applies to
/// sessions that already exist. Callers must run this before touching any
/// resource so that unauthorized requests never learn whether it exists.
pub async fn require_role(
    sessions: &SessionManager,
    users: &dyn UserStore,
    token: Option<&str>,
    allowed: &[Role],
) -> AppResult<Principal> {
    let session = match token {
        Some(t) => sessions.resolve(t).await?,
        None => None,
    };
    let user = match &session {
        Some(s) => users.get_user(&s.user_id).await?,
        None => None,
    };
    match (authorize(user.as_ref().map(|u| u.role), allowed), session, user) {
        (Decision::Permit, Some(s), Some(u)) => Ok(Principal::from_parts(&u, &s)),
        (Decision::Forbidden, _, Some(u)) => {
            debug!(target: "auth", user = %u.id, role = %u.role, "guard.forbidden");
            Err(AppError::forbidden("forbidden".to_string(), format!("role {} may not access this resource", u.role)))
        }
        _ => {
            if let Some(t) = token { debug!(target: "auth", token = %token_tag(t), "guard.unauthenticated"); }
            Err(AppError::unauthenticated("unauthenticated", "a valid session is required"))
        }
    }
}
