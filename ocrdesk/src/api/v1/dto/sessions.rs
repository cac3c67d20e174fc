use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::Session;

/// Response body for `POST /v1/sessions`.
///
/// ```json
/// { "sessionId": "550e8400-...", "createdAt": "...", "historyLimit": 20 }
/// ```
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub history_limit: usize,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            created_at: session.created_at(),
            history_limit: session.history().limit(),
        }
    }
}

/// Response body for `DELETE /v1/sessions/{sessionId}`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionResponse {
    pub session_id: String,
    pub ended: bool,
}
