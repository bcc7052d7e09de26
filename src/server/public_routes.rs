use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::actions::ContentKind;
use crate::error::AppResult;

async fn published(state: &AppState, kind: ContentKind) -> AppResult<Json<Value>> {
    let items = state.actions.published(kind).await?;
    Ok(Json(json!({"kind": kind, "items": items})))
}

pub async fn blog(State(state): State<AppState>) -> AppResult<Json<Value>> { published(&state, ContentKind::BlogPost).await }

pub async fn services(State(state): State<AppState>) -> AppResult<Json<Value>> { published(&state, ContentKind::Service).await }

pub async fn projects(State(state): State<AppState>) -> AppResult<Json<Value>> { published(&state, ContentKind::Project).await }
