use std::sync::Arc;

use tracing::{info, warn};

use super::role::Role;
use super::session::{Session, SessionManager};
use super::user::{normalize_email, User, UserStore};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub session: Session,
    pub user: User,
}

/// Email/password login against the `UserStore`, issuing sessions through
/// the shared `SessionManager`.
pub struct LocalAuthProvider {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<SessionManager>,
    /// Verified against when the email is unknown.
    decoy_hash: String,
}

impl LocalAuthProvider {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<SessionManager>) -> Self {
        let decoy_hash = crate::security::decoy_hash().unwrap_or_else(|e| {
            warn!(target: "auth", "decoy password hash unavailable, unknown-email logins will return faster: {}", e);
            String::new()
        });
        Self { users, sessions, decoy_hash }
    }

    pub async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        if req.email.trim().is_empty() || req.password.is_empty() {
            return Err(AppError::user("missing_credentials", "email and password are required"));
        }
        let email = normalize_email(&req.email);
        // Unknown email and wrong password must look the same to the caller,
        // including in how long the answer takes.
        let user = match self.users.find_user_by_email(&email).await? {
            Some(u) => crate::security::verify_password(&u.password_hash, &req.password).then_some(u),
            None => {
                crate::security::verify_password(&self.decoy_hash, &req.password);
                None
            }
        };
        let Some(user) = user else {
            info!(target: "auth", email = %email, "auth.login rejected");
            return Err(AppError::unauthenticated("invalid_credentials", "invalid email or password"));
        };
        let session = self.sessions.issue(&user.id).await?;
        info!(target: "auth", user = %user.id, role = %user.role, "auth.login");
        Ok(LoginResponse { session, user })
    }
}

/// Create a SUPER_ADMIN account for `email` unless one with that email exists.
/// Returns true when an account was created.
pub async fn ensure_bootstrap_admin(users: &dyn UserStore, email: &str, password: &str) -> anyhow::Result<bool> {
    let email = normalize_email(email);
    if users.find_user_by_email(&email).await?.is_some() {
        return Ok(false);
    }
    let hash = crate::security::hash_password(password)?;
    let user = User::new(&email, "Administrator", Role::SuperAdmin, hash);
    users.insert_user(&user).await?;
    info!(target: "startup", email = %email, "bootstrap SUPER_ADMIN account created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn provider(store: Arc<MemoryStore>) -> LocalAuthProvider {
        let sm = Arc::new(SessionManager::new(store.clone(), Duration::hours(1)));
        LocalAuthProvider::new(store, sm)
    }

    #[tokio::test]
    async fn login_issues_a_session_for_valid_credentials() {
        let store = Arc::new(MemoryStore::new());
        assert!(ensure_bootstrap_admin(store.as_ref(), "Root@Site.test", "pw").await.unwrap());
        assert!(!ensure_bootstrap_admin(store.as_ref(), "root@site.test", "other").await.unwrap());

        let p = provider(store.clone());
        let resp = p.login(&LoginRequest { email: "ROOT@site.test".into(), password: "pw".into() }).await.unwrap();
        assert_eq!(resp.user.role, Role::SuperAdmin);
        assert_eq!(p.sessions.resolve(&resp.session.token).await.unwrap().unwrap().user_id, resp.user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let store = Arc::new(MemoryStore::new());
        ensure_bootstrap_admin(store.as_ref(), "root@site.test", "pw").await.unwrap();
        let p = provider(store);

        let a = p.login(&LoginRequest { email: "root@site.test".into(), password: "nope".into() }).await.unwrap_err();
        let b = p.login(&LoginRequest { email: "ghost@site.test".into(), password: "pw".into() }).await.unwrap_err();
        assert_eq!(a.code_str(), "invalid_credentials");
        assert_eq!(a.code_str(), b.code_str());
        assert_eq!(a.http_status(), 401);
    }

    #[tokio::test]
    async fn unknown_email_still_pays_for_a_hash_check() {
        let store = Arc::new(MemoryStore::new());
        ensure_bootstrap_admin(store.as_ref(), "root@site.test", "pw").await.unwrap();
        let p = provider(store);
        assert!(p.decoy_hash.starts_with("$argon2id$"));

        let time = |email: &'static str| {
            let p = &p;
            async move {
                let start = std::time::Instant::now();
                for _ in 0..4 {
                    p.login(&LoginRequest { email: email.into(), password: "nope".into() }).await.unwrap_err();
                }
                start.elapsed()
            }
        };
        let known = time("root@site.test").await;
        let unknown = time("ghost@site.test").await;
        // Both paths run one Argon2 verify; without the decoy the gap is ~20x.
        assert!(unknown * 4 >= known, "unknown={unknown:?} known={known:?}");
    }

    #[tokio::test]
    async fn empty_fields_are_user_input_errors() {
        let p = provider(Arc::new(MemoryStore::new()));
        let e = p.login(&LoginRequest { email: " ".into(), password: "pw".into() }).await.unwrap_err();
        assert_eq!(e.http_status(), 400);
    }
}
