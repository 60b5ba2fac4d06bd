//! Chat and session handlers. Each request locks its session for the whole submission,
//! so one session is processed strictly in order while other sessions run concurrently.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use unitchat_core::Submission;

use crate::AppState;

/// Chat request from the web UI.
#[derive(serde::Deserialize)]
pub(crate) struct ChatRequest {
    #[serde(default)]
    pub(crate) prompt: String,
    /// Omitted on first contact; the response carries the id to reuse. Ids the server
    /// did not issue are replaced by a fresh one.
    #[serde(default)]
    pub(crate) session_id: Option<String>,
}

/// POST /api/v1/chat – one submission event for a session.
pub(crate) async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<serde_json::Value> {
    let (session_id, session) = state.sessions.get_or_create(req.session_id.as_deref());
    tracing::info!(
        target: "unitchat::chat",
        session_id = %session_id,
        chars = req.prompt.len(),
        "Chat request received"
    );

    let mut ctx = session.lock().await;
    let submission = state.workflow.submit(&mut ctx, &req.prompt).await;
    let view = ctx.state.snapshot();
    drop(ctx);

    match submission {
        Submission::Ignored => Json(serde_json::json!({
            "status": "ignored",
            "session_id": session_id,
            "session": view,
        })),
        Submission::Recorded(exchange) => Json(serde_json::json!({
            "status": "ok",
            "session_id": session_id,
            "exchange": exchange,
            "session": view,
        })),
    }
}

/// GET /api/v1/session/:id – render-ready snapshot.
pub(crate) async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let view = session.lock().await.state.snapshot();
    Ok(Json(serde_json::json!({ "session_id": id, "session": view })))
}

/// POST /api/v1/session/:id/history/toggle – flips history visibility.
pub(crate) async fn toggle_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let session = state.sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let mut ctx = session.lock().await;
    let visible = state.workflow.toggle_history(&mut ctx);
    tracing::debug!(target: "unitchat::chat", session_id = %id, visible, "History toggled");
    Ok(Json(serde_json::json!({
        "session_id": id,
        "session": ctx.state.snapshot(),
    })))
}

/// DELETE /api/v1/session/:id – ends the session and discards its state.
pub(crate) async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
