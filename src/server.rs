//!
//! sitedesk HTTP server
//! --------------------
//! Axum router for the admin dashboard backend.
//!
//! Responsibilities:
//! - Session cookie transport (`session_token`): parse, set at login, clear at logout.
//! - Login/logout endpoints backed by the `identity` module.
//! - Role-guarded admin pages that compose the guard with the action layer.
//! - Public listings of published site content.
//! - Background purge of expired sessions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tracing::{info, warn};

use crate::actions::{Actions, ContentRepo};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::identity::{self, LocalAuthProvider, Principal, Role, SessionManager, SessionStore, UserStore};
use crate::storage::{MemoryStore, PgStore};

pub mod admin_routes;
pub mod auth_routes;
pub mod public_routes;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    pub secure: bool,
}

/// Shared server state injected into all handlers.
///
/// Holds no per-session data: every request resolves its cookie against the
/// session store, and every guard re-reads the user.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub users: Arc<dyn UserStore>,
    pub auth: Arc<LocalAuthProvider>,
    pub actions: Actions,
    pub cookies: CookieSettings,
}

impl AppState {
    pub fn new(
        session_store: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        content: Arc<dyn ContentRepo>,
        config: &Config,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(session_store, config.session_ttl()));
        Self {
            auth: Arc::new(LocalAuthProvider::new(users.clone(), sessions.clone())),
            actions: Actions::new(content, users.clone()),
            sessions,
            users,
            cookies: CookieSettings { secure: config.secure_cookies },
        }
    }

    /// All three record families on one in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>, config: &Config) -> Self {
        Self::new(store.clone(), store.clone(), store, config)
    }

    /// Guard for the current request: session cookie → session → current role.
    pub async fn require_role(&self, headers: &HeaderMap, allowed: &[Role]) -> AppResult<Principal> {
        let token = parse_cookie(headers, SESSION_COOKIE);
        identity::require_role(&self.sessions, self.users.as_ref(), token.as_deref(), allowed).await
    }
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all(header::COOKIE) {
        let Ok(s) = cookie.to_str() else { continue };
        for part in s.split(';') {
            if let Some((k, v)) = part.trim().split_once('=') {
                if k == name { return Some(v.trim_matches('"').to_string()); }
            }
        }
    }
    None
}

pub fn set_session_cookie(token: &str, max_age_secs: i64, cookies: CookieSettings) -> AppResult<HeaderValue> {
    let secure = if cookies.secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE, token, max_age_secs, secure
    ))
    .map_err(|e| AppError::internal("bad_cookie".to_string(), e.to_string()))
}

pub fn clear_session_cookie(cookies: CookieSettings) -> HeaderValue {
    if cookies.secure {
        HeaderValue::from_static("session_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Secure")
    } else {
        HeaderValue::from_static("session_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT")
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "sitedesk ok" }))
        .route("/api/auth/login", post(auth_routes::login))
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/auth/me", get(auth_routes::me))
        .route("/admin", get(admin_routes::dashboard))
        .route("/admin/blog", get(admin_routes::blog_index))
        .route("/admin/blog/{id}", delete(admin_routes::delete_blog_post))
        .route("/admin/blog/{id}/edit", get(admin_routes::blog_edit))
        .route("/admin/services", get(admin_routes::services_index))
        .route("/admin/services/{id}", delete(admin_routes::delete_service))
        .route("/admin/services/{id}/edit", get(admin_routes::service_edit))
        .route("/admin/projects", get(admin_routes::projects_index))
        .route("/admin/projects/{id}", delete(admin_routes::delete_project))
        .route("/admin/projects/{id}/edit", get(admin_routes::project_edit))
        .route("/admin/media", get(admin_routes::media_index))
        .route("/admin/media/{id}", delete(admin_routes::delete_media))
        .route("/admin/inbox", get(admin_routes::inbox_index))
        .route("/admin/inbox/{id}", delete(admin_routes::delete_inbox_message))
        .route("/admin/team", get(admin_routes::team_index))
        .route("/admin/team/{user_id}/role", put(admin_routes::set_team_role))
        .route("/api/public/blog", get(public_routes::blog))
        .route("/api/public/services", get(public_routes::services))
        .route("/api/public/projects", get(public_routes::projects))
        .with_state(state)
}

/// Periodically purge expired sessions. Failures are logged and retried on the next tick.
pub fn spawn_session_sweeper(sessions: Arc<SessionManager>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;
            match sessions.sweep().await {
                Ok(removed) if removed > 0 => info!(target: "session", removed, "expired sessions purged"),
                Ok(_) => {}
                Err(e) => warn!(target: "session", "session sweep failed: {}", e),
            }
        }
    })
}

async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    match &config.database_url {
        Some(dsn) => {
            let pg = Arc::new(PgStore::connect(dsn).await.context("While connecting to PostgreSQL")?);
            pg.install_schema().await.context("While installing the sitedesk schema")?;
            info!(target: "startup", "using PostgreSQL store");
            Ok(AppState::new(pg.clone(), pg.clone(), pg, config))
        }
        None => {
            warn!(target: "startup", "no database configured; sessions, users and content live in memory");
            Ok(AppState::in_memory(Arc::new(MemoryStore::new()), config))
        }
    }
}

/// Start the sitedesk HTTP server with the given configuration.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await?;

    if let Some((email, password)) = config.bootstrap_admin() {
        identity::ensure_bootstrap_admin(state.users.as_ref(), email, password)
            .await
            .with_context(|| format!("While ensuring bootstrap admin {}", email))?;
    }

    if config.session_sweep_secs > 0 {
        spawn_session_sweeper(state.sessions.clone(), Duration::from_secs(config.session_sweep_secs));
    } else {
        info!(target: "startup", "session sweeper disabled");
    }

    let addr: SocketAddr = config.http_addr();
    info!(target: "startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("While binding {}", addr))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
