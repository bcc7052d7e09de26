use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::{clear_session_cookie, parse_cookie, set_session_cookie, AppState, SESSION_COOKIE};
use crate::error::{AppError, AppResult};
use crate::identity::{LoginRequest, ANY_ROLE};

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Any unreadable body (bad JSON, wrong field types, wrong content type) is a 400 `invalid_payload`.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::user("invalid_payload".to_string(), e.body_text()))?;
    let resp = state.auth.login(&LoginRequest { email: payload.email, password: payload.password }).await?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, set_session_cookie(&resp.session.token, state.sessions.ttl.num_seconds(), state.cookies)?);
    Ok((StatusCode::OK, headers, Json(json!({"success": true, "user": resp.user}))))
}

/// Always reports success and clears the cookie; deleting the session row is best-effort.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = parse_cookie(&headers, SESSION_COOKIE) {
        state.sessions.destroy(&token).await;
    }
    let mut h = HeaderMap::new();
    h.insert(header::SET_COOKIE, clear_session_cookie(state.cookies));
    (StatusCode::OK, h, Json(json!({"success": true})))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = state.require_role(&headers, ANY_ROLE).await?;
    Ok(Json(json!({"success": true, "user": principal})))
}
