use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::storage::StoreResult;

pub type SessionToken = String;

/// A row in the session store. Carries identity, never privileges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> StoreResult<()>;
    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>>;
    /// Delete-if-exists. Returns whether a row was removed.
    async fn delete_session(&self, token: &str) -> StoreResult<bool>;
    /// Remove every session with `expires_at <= now`.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

fn gen_token() -> AppResult<SessionToken> {
    // 256-bit random token base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf)
        .map_err(|e| AppError::internal("rng_failure".to_string(), e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Stable 32-bit fingerprint of a token, so log lines about one session can be
/// correlated without any of the token's characters appearing in the log.
pub(crate) fn token_tag(token: &str) -> String {
    let mut h = DefaultHasher::new();
    token.hash(&mut h);
    format!("#{:08x}/{}", h.finish() as u32, token.len())
}

/// Session lifecycle over a `SessionStore`: issue, resolve, best-effort destroy, sweep.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    pub ttl: Duration,
    failed_destroys: AtomicU64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl, failed_destroys: AtomicU64::new(0) }
    }

    pub async fn issue(&self, user_id: &str) -> AppResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: gen_token()?,
            user_id: user_id.to_string(),
            expires_at: now + self.ttl,
            created_at: now,
        };
        self.store.insert_session(&session).await?;
        debug!(target: "session", user = user_id, token = %token_tag(&session.token), ttl_secs = self.ttl.num_seconds(), "session.issue");
        Ok(session)
    }

    /// Look up a session; expired rows read as absent and are left for the sweeper.
    pub async fn resolve(&self, token: &str) -> AppResult<Option<Session>> {
        if token.is_empty() { return Ok(None); }
        let found = self.store.find_session(token).await?;
        Ok(found.filter(|s| !s.is_expired(Utc::now())))
    }

    /// Delete the session row if it exists. Never fails: a store error is
    /// logged and counted, and the row lingers until it expires.
    pub async fn destroy(&self, token: &str) {
        if token.is_empty() { return; }
        match self.store.delete_session(token).await {
            Ok(removed) => {
                debug!(target: "session", token = %token_tag(token), removed, "session.destroy");
            }
            Err(e) => {
                let total = self.failed_destroys.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(target: "session", token = %token_tag(token), failed_destroys = total, "session.destroy failed: {}", e);
            }
        }
    }

    /// Purge expired rows; returns how many were removed.
    pub async fn sweep(&self) -> AppResult<u64> {
        let removed = self.store.purge_expired_sessions(Utc::now()).await?;
        if removed > 0 { debug!(target: "session", removed, "session.sweep"); }
        Ok(removed)
    }

    /// Number of destroy attempts whose store delete failed since startup.
    pub fn failed_destroys(&self) -> u64 { self.failed_destroys.load(Ordering::Relaxed) }
}
