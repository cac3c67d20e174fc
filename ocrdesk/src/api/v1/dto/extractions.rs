use serde::Serialize;

/// Response body for `POST /v1/sessions/{sessionId}/preview`: the adjusted
/// image, inline, so the page can show it before extraction.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub mime_type: String,
    pub size: usize,
    /// `data:image/png;base64,...`
    pub data_url: String,
}
