use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{StoreError, StoreResult};
use crate::actions::{ContentItem, ContentKind, ContentRepo};
use crate::identity::{Role, Session, SessionStore, User, UserStore};

/// Process-local backend. No lock is held across an `.await`.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
    users: RwLock<HashMap<String, User>>,
    content: RwLock<HashMap<(ContentKind, String), ContentItem>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn session_count(&self) -> usize { self.sessions.read().len() }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        let mut m = self.sessions.write();
        if m.contains_key(&session.token) {
            return Err(StoreError::Conflict("session token already issued".into()));
        }
        m.insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        Ok(self.sessions.write().remove(token).is_some())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut m = self.sessions.write();
        let before = m.len();
        m.retain(|_, s| !s.is_expired(now));
        Ok((before - m.len()) as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().get(user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut m = self.users.write();
        if m.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email already registered: {}", user.email)));
        }
        m.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn set_user_role(&self, user_id: &str, role: Role) -> StoreResult<bool> {
        match self.users.write().get_mut(user_id) {
            Some(u) => { u.role = role; Ok(true) }
            None => Ok(false),
        }
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().values().cloned().collect())
    }
}

#[async_trait]
impl ContentRepo for MemoryStore {
    async fn list_items(&self, kind: ContentKind) -> StoreResult<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self.content.read().values().filter(|i| i.kind == kind).cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get_item(&self, kind: ContentKind, id: &str) -> StoreResult<Option<ContentItem>> {
        Ok(self.content.read().get(&(kind, id.to_string())).cloned())
    }

    async fn insert_item(&self, item: &ContentItem) -> StoreResult<()> {
        self.content.write().insert((item.kind, item.id.clone()), item.clone());
        Ok(())
    }

    async fn delete_item(&self, kind: ContentKind, id: &str) -> StoreResult<bool> {
        Ok(self.content.write().remove(&(kind, id.to_string())).is_some())
    }
}
