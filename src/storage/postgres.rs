use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info};

use super::{from_millis, to_millis, StoreError, StoreResult};
use crate::actions::{ContentItem, ContentKind, ContentRepo};
use crate::identity::{Role, Session, SessionStore, User, UserStore};

const SCHEMA_DDL: &str = include_str!("../../scripts/ddl/001_sitedesk.sql");

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            StoreError::Conflict(e.to_string())
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}

/// PostgreSQL backend over one pipelined client connection.
pub struct PgStore {
    client: Client,
}

impl PgStore {
    /// Connect and drive the connection on a background task.
    pub async fn connect(dsn: &str) -> StoreResult<Self> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(target: "storage", "postgres connection error: {}", e);
            }
        });
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self { Self { client } }

    /// Create tables and indexes if they do not exist yet.
    pub async fn install_schema(&self) -> StoreResult<()> {
        self.client.batch_execute(SCHEMA_DDL).await?;
        info!(target: "storage", "schema installed");
        Ok(())
    }
}

fn corrupt(e: tokio_postgres::Error) -> StoreError { StoreError::Corrupt(e.to_string()) }

fn session_from_row(row: &Row) -> StoreResult<Session> {
    Ok(Session {
        token: row.try_get("token").map_err(corrupt)?,
        user_id: row.try_get("user_id").map_err(corrupt)?,
        expires_at: from_millis(row.try_get("expires_at").map_err(corrupt)?)?,
        created_at: from_millis(row.try_get("created_at").map_err(corrupt)?)?,
    })
}

fn user_from_row(row: &Row) -> StoreResult<User> {
    let role: String = row.try_get("role").map_err(corrupt)?;
    Ok(User {
        id: row.try_get("id").map_err(corrupt)?,
        email: row.try_get("email").map_err(corrupt)?,
        name: row.try_get("name").map_err(corrupt)?,
        role: role.parse::<Role>().map_err(|e| StoreError::Corrupt(e.to_string()))?,
        password_hash: row.try_get("password_hash").map_err(corrupt)?,
        created_at: from_millis(row.try_get("created_at").map_err(corrupt)?)?,
    })
}

fn item_from_row(row: &Row) -> StoreResult<ContentItem> {
    let kind: String = row.try_get("kind").map_err(corrupt)?;
    Ok(ContentItem {
        id: row.try_get("id").map_err(corrupt)?,
        kind: kind.parse::<ContentKind>().map_err(StoreError::Corrupt)?,
        title: row.try_get("title").map_err(corrupt)?,
        body: row.try_get("body").map_err(corrupt)?,
        published: row.try_get("published").map_err(corrupt)?,
        created_at: from_millis(row.try_get("created_at").map_err(corrupt)?)?,
    })
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, s: &Session) -> StoreResult<()> {
        self.client.execute(
            "INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)",
            &[&s.token, &s.user_id, &to_millis(s.expires_at), &to_millis(s.created_at)],
        ).await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> StoreResult<Option<Session>> {
        let row = self.client.query_opt(
            "SELECT token, user_id, expires_at, created_at FROM sessions WHERE token = $1",
            &[&token],
        ).await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let n = self.client.execute("DELETE FROM sessions WHERE token = $1", &[&token]).await?;
        Ok(n > 0)
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        Ok(self.client.execute("DELETE FROM sessions WHERE expires_at <= $1", &[&to_millis(now)]).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let row = self.client.query_opt(
            "SELECT id, email, name, role, password_hash, created_at FROM users WHERE id = $1",
            &[&user_id],
        ).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = self.client.query_opt(
            "SELECT id, email, name, role, password_hash, created_at FROM users WHERE email = $1",
            &[&email],
        ).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(&self, u: &User) -> StoreResult<()> {
        self.client.execute(
            "INSERT INTO users (id, email, name, role, password_hash, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
            &[&u.id, &u.email, &u.name, &u.role.as_str(), &u.password_hash, &to_millis(u.created_at)],
        ).await?;
        Ok(())
    }

    async fn set_user_role(&self, user_id: &str, role: Role) -> StoreResult<bool> {
        let n = self.client.execute("UPDATE users SET role = $2 WHERE id = $1", &[&user_id, &role.as_str()]).await?;
        Ok(n > 0)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = self.client.query(
            "SELECT id, email, name, role, password_hash, created_at FROM users ORDER BY email",
            &[],
        ).await?;
        rows.iter().map(user_from_row).collect()
    }
}

#[async_trait]
impl ContentRepo for PgStore {
    async fn list_items(&self, kind: ContentKind) -> StoreResult<Vec<ContentItem>> {
        let rows = self.client.query(
            "SELECT kind, id, title, body, published, created_at FROM content_items WHERE kind = $1 ORDER BY created_at DESC, id",
            &[&kind.as_str()],
        ).await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn get_item(&self, kind: ContentKind, id: &str) -> StoreResult<Option<ContentItem>> {
        let row = self.client.query_opt(
            "SELECT kind, id, title, body, published, created_at FROM content_items WHERE kind = $1 AND id = $2",
            &[&kind.as_str(), &id],
        ).await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn insert_item(&self, i: &ContentItem) -> StoreResult<()> {
        self.client.execute(
            "INSERT INTO content_items (kind, id, title, body, published, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
            &[&i.kind.as_str(), &i.id, &i.title, &i.body, &i.published, &to_millis(i.created_at)],
        ).await?;
        Ok(())
    }

    async fn delete_item(&self, kind: ContentKind, id: &str) -> StoreResult<bool> {
        let n = self.client.execute("DELETE FROM content_items WHERE kind = $1 AND id = $2", &[&kind.as_str(), &id]).await?;
        Ok(n > 0)
    }
}
