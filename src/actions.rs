//!
//! sitedesk action layer
//! ---------------------
//! Per-domain data access used by the admin and public handlers: blog posts,
//! services, projects, media, inbox, team and the dashboard summary. Every
//! function here is a single query or mutation against a `ContentRepo` or the
//! `UserStore`; none of them check privileges. Handlers run the route guard
//! first and only then call in here.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::identity::{Role, User, UserStore};
use crate::storage::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    BlogPost,
    Service,
    Project,
    Media,
    InboxMessage,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::BlogPost,
        ContentKind::Service,
        ContentKind::Project,
        ContentKind::Media,
        ContentKind::InboxMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::BlogPost => "blog_post",
            ContentKind::Service => "service",
            ContentKind::Project => "project",
            ContentKind::Media => "media",
            ContentKind::InboxMessage => "inbox_message",
        }
    }

    /// Path segment used under `/admin` and `/api/public`.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "blog" => Some(ContentKind::BlogPost),
            "services" => Some(ContentKind::Service),
            "projects" => Some(ContentKind::Project),
            "media" => Some(ContentKind::Media),
            "inbox" => Some(ContentKind::InboxMessage),
            _ => None,
        }
    }

    /// Kinds the public site may list.
    pub fn is_public(&self) -> bool {
        matches!(self, ContentKind::BlogPost | ContentKind::Service | ContentKind::Project)
    }
}

impl Display for ContentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL.into_iter().find(|k| k.as_str() == s).ok_or_else(|| format!("unknown content kind '{}'", s))
    }
}

/// One row of site content. Inbox messages reuse `published` as their read marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(kind: ContentKind, title: &str, body: &str, published: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            title: title.to_string(),
            body: body.to_string(),
            published,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Newest first.
    async fn list_items(&self, kind: ContentKind) -> StoreResult<Vec<ContentItem>>;
    async fn get_item(&self, kind: ContentKind, id: &str) -> StoreResult<Option<ContentItem>>;
    async fn insert_item(&self, item: &ContentItem) -> StoreResult<()>;
    /// Returns false when nothing matched.
    async fn delete_item(&self, kind: ContentKind, id: &str) -> StoreResult<bool>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub blog_posts: usize,
    pub services: usize,
    pub projects: usize,
    pub media: usize,
    pub inbox_messages: usize,
    pub unread_messages: usize,
    pub team_members: usize,
}

#[derive(Clone)]
pub struct Actions {
    content: Arc<dyn ContentRepo>,
    users: Arc<dyn UserStore>,
}

impl Actions {
    pub fn new(content: Arc<dyn ContentRepo>, users: Arc<dyn UserStore>) -> Self { Self { content, users } }

    pub async fn list(&self, kind: ContentKind) -> AppResult<Vec<ContentItem>> {
        Ok(self.content.list_items(kind).await?)
    }

    pub async fn find(&self, kind: ContentKind, id: &str) -> AppResult<Option<ContentItem>> {
        Ok(self.content.get_item(kind, id).await?)
    }

    // blog
    pub async fn blog_posts(&self) -> AppResult<Vec<ContentItem>> { self.list(ContentKind::BlogPost).await }
    pub async fn blog_post(&self, id: &str) -> AppResult<Option<ContentItem>> { self.find(ContentKind::BlogPost, id).await }

    // services
    pub async fn services(&self) -> AppResult<Vec<ContentItem>> { self.list(ContentKind::Service).await }
    pub async fn service(&self, id: &str) -> AppResult<Option<ContentItem>> { self.find(ContentKind::Service, id).await }

    // projects
    pub async fn projects(&self) -> AppResult<Vec<ContentItem>> { self.list(ContentKind::Project).await }
    pub async fn project(&self, id: &str) -> AppResult<Option<ContentItem>> { self.find(ContentKind::Project, id).await }

    pub async fn media(&self) -> AppResult<Vec<ContentItem>> { self.list(ContentKind::Media).await }

    pub async fn inbox(&self) -> AppResult<Vec<ContentItem>> { self.list(ContentKind::InboxMessage).await }

    /// Published items of a public kind; other kinds list nothing.
    pub async fn published(&self, kind: ContentKind) -> AppResult<Vec<ContentItem>> {
        if !kind.is_public() { return Ok(Vec::new()); }
        let mut items = self.list(kind).await?;
        items.retain(|i| i.published);
        Ok(items)
    }

    pub async fn delete_item(&self, kind: ContentKind, id: &str) -> AppResult<bool> {
        let removed = self.content.delete_item(kind, id).await?;
        if removed { tracing::info!(target: "actions", kind = %kind, id, "content item deleted"); }
        Ok(removed)
    }

    // team
    pub async fn team(&self) -> AppResult<Vec<User>> {
        let mut members = self.users.list_users().await?;
        members.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(members)
    }

    /// Returns the updated member, or None when the user does not exist.
    /// The last SUPER_ADMIN cannot be demoted.
    pub async fn set_member_role(&self, user_id: &str, role: Role) -> AppResult<Option<User>> {
        if role != Role::SuperAdmin {
            let members = self.users.list_users().await?;
            let Some(target) = members.iter().find(|u| u.id == user_id) else { return Ok(None) };
            let super_admins = members.iter().filter(|u| u.role == Role::SuperAdmin).count();
            if target.role == Role::SuperAdmin && super_admins <= 1 {
                return Err(AppError::user("last_super_admin", "the last SUPER_ADMIN cannot be demoted"));
            }
        }
        if !self.users.set_user_role(user_id, role).await? { return Ok(None); }
        tracing::info!(target: "actions", user = user_id, role = %role, "team member role changed");
        Ok(self.users.get_user(user_id).await?)
    }

    pub async fn dashboard(&self) -> AppResult<DashboardSummary> {
        let inbox = self.inbox().await?;
        Ok(DashboardSummary {
            blog_posts: self.blog_posts().await?.len(),
            services: self.services().await?.len(),
            projects: self.projects().await?.len(),
            media: self.media().await?.len(),
            inbox_messages: inbox.len(),
            unread_messages: inbox.iter().filter(|m| !m.published).count(),
            team_members: self.users.list_users().await?.len(),
        })
    }
}
