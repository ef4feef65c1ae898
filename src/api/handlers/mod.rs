use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::models::{EvaluationRequest, EvaluationResult};
use crate::session::SessionRegistry;

/// Cookie carrying the session id between requests.
pub const SESSION_COOKIE: &str = "snipshell_session";

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Session cookie
// ============================================================

/// The session id from the request's cookies, if present and well formed.
fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: Uuid) -> Result<HeaderValue, (StatusCode, String)> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, id
    ))
    .map_err(internal_error)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Evaluation
// ============================================================

pub async fn evaluate(
    State(sessions): State<SessionRegistry>,
    headers: HeaderMap,
    Json(input): Json<EvaluationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let requested = session_id(&headers);
    let (id, result): (Uuid, EvaluationResult) = sessions
        .evaluate(requested, &input.code)
        .map_err(internal_error)?;
    if !result.status {
        tracing::warn!(session = %id, "Request failed");
    }
    let cookie = session_cookie(id)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(result)))
}

pub async fn end_session(
    State(sessions): State<SessionRegistry>,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    let Some(id) = session_id(&headers) else {
        return Err((StatusCode::NOT_FOUND, "Session not found".to_string()));
    };
    if sessions.end(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Session not found".to_string()))
    }
}
