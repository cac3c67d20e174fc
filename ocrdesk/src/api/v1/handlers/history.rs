//! v1 history handlers: listing, lookup, deletion, export and share
//! resolution. Everything is scoped to one session.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::api::v1::dto::{
    ClearHistoryResponse, DeleteEntryResponse, EntryDetailResponse, ExportQuery,
    HistoryEntrySummary, HistoryQuery, ListHistoryResponse,
};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::api::AppState;
use crate::error::{OcrDeskError, Result, ValidationError};
use crate::export::ExportFormat;
use crate::session::HistoryOrder;

use super::{find_session, parse_id};

fn entry_not_found(entry_id: impl std::fmt::Display) -> OcrDeskError {
    OcrDeskError::NotFound(format!("History entry {entry_id} not found"))
}

/// `GET /api/v1/sessions/{sessionId}/history`
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}/history",
    tag = "history",
    operation_id = "history.list",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "Session history", body = ListHistoryResponse),
        (status = 400, description = "Invalid order", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
    )
)]
pub async fn list_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> ApiResponse<ListHistoryResponse> {
    let order = match query.order.as_deref().map(HistoryOrder::parse).transpose() {
        Ok(order) => order.unwrap_or_default(),
        Err(e) => return OcrDeskError::from(e).into(),
    };
    let handle = match find_session(&state, &session_id) {
        Ok(handle) => handle,
        Err(e) => return e.into(),
    };

    let session = handle.lock().await;
    let entries: Vec<HistoryEntrySummary> = session
        .history()
        .list(order)
        .into_iter()
        .map(HistoryEntrySummary::from)
        .collect();
    let total = entries.len() as u64;

    ApiResponse::success_with_meta(
        ListHistoryResponse { entries },
        ResponseMeta { total: Some(total) },
    )
}

/// `DELETE /api/v1/sessions/{sessionId}/history`
///
/// Clearing an empty history succeeds with `removed: 0`.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{sessionId}/history",
    tag = "history",
    operation_id = "history.clear",
    params(("sessionId" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "History cleared", body = ClearHistoryResponse),
        (status = 404, description = "Session not found", body = ApiError),
    )
)]
pub async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResponse<ClearHistoryResponse> {
    let handle = match find_session(&state, &session_id) {
        Ok(handle) => handle,
        Err(e) => return e.into(),
    };

    let mut session = handle.lock().await;
    let removed = session.history().len();
    session.clear();
    tracing::info!(session_id = %session.id(), removed, "History cleared");

    ApiResponse::success(ClearHistoryResponse { removed })
}

/// `GET /api/v1/sessions/{sessionId}/history/{entryId}`
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}/history/{entryId}",
    tag = "history",
    operation_id = "history.get",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        ("entryId" = String, Path, description = "History entry ID"),
    ),
    responses(
        (status = 200, description = "Full extraction result", body = EntryDetailResponse),
        (status = 404, description = "Session or entry not found", body = ApiError),
    )
)]
pub async fn get_entry(
    State(state): State<AppState>,
    Path((session_id, entry_id)): Path<(String, String)>,
) -> ApiResponse<EntryDetailResponse> {
    match find_entry(&state, &session_id, &entry_id).await {
        Ok(detail) => ApiResponse::success(detail),
        Err(e) => e.into(),
    }
}

async fn find_entry(state: &AppState, session_id: &str, entry_id: &str) -> Result<EntryDetailResponse> {
    let handle = find_session(state, session_id)?;
    let entry_id = parse_id(entry_id, "History entry")?;
    let session = handle.lock().await;
    let entry = session
        .history()
        .get(entry_id)
        .ok_or_else(|| entry_not_found(entry_id))?;
    Ok(EntryDetailResponse::from(entry))
}

/// `DELETE /api/v1/sessions/{sessionId}/history/{entryId}`
///
/// Also revokes the entry's share link.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{sessionId}/history/{entryId}",
    tag = "history",
    operation_id = "history.delete",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        ("entryId" = String, Path, description = "History entry ID"),
    ),
    responses(
        (status = 200, description = "Entry deleted", body = DeleteEntryResponse),
        (status = 404, description = "Session or entry not found", body = ApiError),
    )
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((session_id, entry_id)): Path<(String, String)>,
) -> ApiResponse<DeleteEntryResponse> {
    match remove_entry(&state, &session_id, &entry_id).await {
        Ok(removed_id) => ApiResponse::success(DeleteEntryResponse {
            entry_id: removed_id,
            deleted: true,
        }),
        Err(e) => e.into(),
    }
}

async fn remove_entry(state: &AppState, session_id: &str, entry_id: &str) -> Result<String> {
    let handle = find_session(state, session_id)?;
    let entry_id = parse_id(entry_id, "History entry")?;
    let mut session = handle.lock().await;
    let entry = session
        .remove_entry(entry_id)
        .ok_or_else(|| entry_not_found(entry_id))?;
    tracing::info!(session_id = %session.id(), entry_id = %entry.id, "History entry deleted");
    Ok(entry.id.to_string())
}

/// `GET /api/v1/sessions/{sessionId}/history/{entryId}/export?format=...`
///
/// Returns the rendered file itself, not a JSON envelope. Errors still use
/// the envelope.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}/history/{entryId}/export",
    tag = "history",
    operation_id = "history.export",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        ("entryId" = String, Path, description = "History entry ID"),
        ExportQuery,
    ),
    responses(
        (status = 200, description = "Exported file", content_type = "application/octet-stream", body = String),
        (status = 400, description = "Unknown export format", body = ApiError),
        (status = 404, description = "Session or entry not found", body = ApiError),
        (status = 422, description = "Text cannot be represented in this format", body = ApiError),
    )
)]
pub async fn export_entry(
    State(state): State<AppState>,
    Path((session_id, entry_id)): Path<(String, String)>,
    Query(query): Query<ExportQuery>,
) -> Result<Response> {
    let format = match query.format.as_deref() {
        Some(raw) => ExportFormat::parse(raw)?,
        None => {
            return Err(ValidationError::InvalidSetting("format is required".to_string()).into())
        }
    };
    let handle = find_session(&state, &session_id)?;
    let entry_id = parse_id(&entry_id, "History entry")?;

    let file = {
        let session = handle.lock().await;
        state.pipeline.export(&session, entry_id, format)?
    };

    tracing::info!(
        entry_id = %entry_id,
        format = file.format.extension(),
        size = file.bytes.len(),
        "Export rendered"
    );

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        file.file_name
    ))
    .map_err(|e| OcrDeskError::Internal(format!("invalid export file name: {e}")))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(file.format.mime_type()),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

/// `GET /api/v1/sessions/{sessionId}/shares/{shareId}`
///
/// Resolves a share link issued by this session. Shares from other sessions
/// are indistinguishable from unknown ones.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{sessionId}/shares/{shareId}",
    tag = "history",
    operation_id = "shares.resolve",
    params(
        ("sessionId" = String, Path, description = "Session ID"),
        ("shareId" = String, Path, description = "Share ID"),
    ),
    responses(
        (status = 200, description = "Shared extraction result", body = EntryDetailResponse),
        (status = 404, description = "Session or share not found", body = ApiError),
    )
)]
pub async fn resolve_share(
    State(state): State<AppState>,
    Path((session_id, share_id)): Path<(String, String)>,
) -> ApiResponse<EntryDetailResponse> {
    match find_share(&state, &session_id, &share_id).await {
        Ok(detail) => ApiResponse::success(detail),
        Err(e) => e.into(),
    }
}

async fn find_share(state: &AppState, session_id: &str, share_id: &str) -> Result<EntryDetailResponse> {
    let handle = find_session(state, session_id)?;
    let session = handle.lock().await;
    let entry = session
        .resolve_share(share_id)
        .ok_or_else(|| OcrDeskError::NotFound(format!("Share {share_id} not found")))?;
    Ok(EntryDetailResponse::from(entry))
}
