use axum::extract::{Path, State};

use crate::api::state::AppState;
use crate::api::v1::dto::{EndSessionResponse, SessionResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::error::OcrDeskError;

use super::parse_id;

/// `POST /api/v1/sessions`
///
/// Starts an isolated session. History and share links live inside it and
/// are discarded when it ends or expires.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    operation_id = "sessions.create",
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
    )
)]
pub async fn create_session(State(state): State<AppState>) -> ApiResponse<SessionResponse> {
    let (id, handle) = state.sessions.create();
    let session = handle.lock().await;
    tracing::info!(session_id = %id, "Session created");
    ApiResponse::created(SessionResponse::from(&*session))
}

/// `DELETE /api/v1/sessions/{sessionId}`
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{sessionId}",
    tag = "sessions",
    operation_id = "sessions.end",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session ended and cleared", body = EndSessionResponse),
        (status = 404, description = "Session not found", body = ApiError),
    )
)]
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResponse<EndSessionResponse> {
    let id = match parse_id(&session_id, "Session") {
        Ok(id) => id,
        Err(e) => return e.into(),
    };

    if !state.sessions.end(id) {
        return OcrDeskError::NotFound(format!("Session {id} not found")).into();
    }

    tracing::info!(session_id = %id, "Session ended");
    ApiResponse::success(EndSessionResponse {
        session_id: id.to_string(),
        ended: true,
    })
}
