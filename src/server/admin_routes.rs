//! Admin pages. Every handler runs the role guard before it touches the
//! action layer, so an unauthorized caller never triggers a read and never
//! learns whether the requested item exists.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::actions::ContentKind;
use crate::error::AppError;
use crate::identity::{Role, RoleGate, ADMINS, STAFF, SUPER_ADMINS};

pub const LOGIN_PATH: &str = "/login";

/// Error outcome of a page load: a missing session sends the browser to the
/// login surface, everything else renders as the JSON error.
#[derive(Debug)]
pub struct PageError(pub AppError);

impl From<AppError> for PageError {
    fn from(e: AppError) -> Self { PageError(e) }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Unauthenticated { .. } => Redirect::to(LOGIN_PATH).into_response(),
            other => other.into_response(),
        }
    }
}

type PageResult = Result<Json<Value>, PageError>;

/// Roles allowed to view a content section.
fn section_roles(kind: ContentKind) -> &'static [Role] {
    match kind {
        ContentKind::InboxMessage => ADMINS,
        ContentKind::BlogPost | ContentKind::Service | ContentKind::Project | ContentKind::Media => STAFF,
    }
}

struct NavEntry {
    label: &'static str,
    path: &'static str,
    allowed: &'static [Role],
}

const NAV: &[NavEntry] = &[
    NavEntry { label: "Dashboard", path: "/admin", allowed: STAFF },
    NavEntry { label: "Blog", path: "/admin/blog", allowed: STAFF },
    NavEntry { label: "Services", path: "/admin/services", allowed: STAFF },
    NavEntry { label: "Projects", path: "/admin/projects", allowed: STAFF },
    NavEntry { label: "Media", path: "/admin/media", allowed: STAFF },
    NavEntry { label: "Inbox", path: "/admin/inbox", allowed: ADMINS },
    NavEntry { label: "Team", path: "/admin/team", allowed: SUPER_ADMINS },
];

fn navigation(role: Role) -> Vec<Value> {
    NAV.iter()
        .filter_map(|e| RoleGate::new(e.allowed).render(Some(role), || json!({"label": e.label, "path": e.path})))
        .collect()
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> PageResult {
    let user = state.require_role(&headers, STAFF).await?;
    let summary = state.actions.dashboard().await?;
    Ok(Json(json!({
        "user": user,
        "summary": summary,
        "nav": navigation(user.role),
        "can_delete": RoleGate::new(ADMINS).admits(Some(user.role)),
    })))
}

async fn list_page(state: &AppState, headers: &HeaderMap, kind: ContentKind) -> PageResult {
    let user = state.require_role(headers, section_roles(kind)).await?;
    let items = state.actions.list(kind).await?;
    Ok(Json(json!({"user": user, "kind": kind, "items": items})))
}

async fn edit_page(state: &AppState, headers: &HeaderMap, kind: ContentKind, id: &str) -> PageResult {
    let user = state.require_role(headers, section_roles(kind)).await?;
    let Some(item) = state.actions.find(kind, id).await? else {
        return Err(AppError::not_found("not_found".to_string(), format!("no {} with id {}", kind, id)).into());
    };
    Ok(Json(json!({"user": user, "item": item})))
}

async fn delete_page(state: &AppState, headers: &HeaderMap, kind: ContentKind, id: &str) -> PageResult {
    state.require_role(headers, ADMINS).await?;
    if !state.actions.delete_item(kind, id).await? {
        return Err(AppError::not_found("not_found".to_string(), format!("no {} with id {}", kind, id)).into());
    }
    Ok(Json(json!({"success": true})))
}

pub async fn blog_index(State(state): State<AppState>, headers: HeaderMap) -> PageResult {
    list_page(&state, &headers, ContentKind::BlogPost).await
}

pub async fn blog_edit(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    edit_page(&state, &headers, ContentKind::BlogPost, &id).await
}

pub async fn delete_blog_post(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    delete_page(&state, &headers, ContentKind::BlogPost, &id).await
}

pub async fn services_index(State(state): State<AppState>, headers: HeaderMap) -> PageResult {
    list_page(&state, &headers, ContentKind::Service).await
}

pub async fn service_edit(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    edit_page(&state, &headers, ContentKind::Service, &id).await
}

pub async fn delete_service(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    delete_page(&state, &headers, ContentKind::Service, &id).await
}

pub async fn projects_index(State(state): State<AppState>, headers: HeaderMap) -> PageResult {
    list_page(&state, &headers, ContentKind::Project).await
}

pub async fn project_edit(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    edit_page(&state, &headers, ContentKind::Project, &id).await
}

pub async fn delete_project(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    delete_page(&state, &headers, ContentKind::Project, &id).await
}

pub async fn media_index(State(state): State<AppState>, headers: HeaderMap) -> PageResult {
    list_page(&state, &headers, ContentKind::Media).await
}

pub async fn delete_media(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    delete_page(&state, &headers, ContentKind::Media, &id).await
}

pub async fn inbox_index(State(state): State<AppState>, headers: HeaderMap) -> PageResult {
    list_page(&state, &headers, ContentKind::InboxMessage).await
}

pub async fn delete_inbox_message(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> PageResult {
    delete_page(&state, &headers, ContentKind::InboxMessage, &id).await
}

pub async fn team_index(State(state): State<AppState>, headers: HeaderMap) -> PageResult {
    let user = state.require_role(&headers, SUPER_ADMINS).await?;
    let members = state.actions.team().await?;
    Ok(Json(json!({"user": user, "members": members})))
}

#[derive(Debug, Deserialize)]
struct RoleChange {
    role: Role,
}

/// The body is parsed only after the guard passes.
pub async fn set_team_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    body: Bytes,
) -> PageResult {
    state.require_role(&headers, SUPER_ADMINS).await?;
    let change: RoleChange = serde_json::from_slice(&body)
        .map_err(|e| AppError::user("invalid_role".to_string(), e.to_string()))?;
    let Some(member) = state.actions.set_member_role(&user_id, change.role).await? else {
        return Err(AppError::not_found("not_found".to_string(), format!("no team member with id {}", user_id)).into());
    };
    Ok(Json(json!({"success": true, "member": member})))
}
