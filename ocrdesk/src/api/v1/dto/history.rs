use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::HistoryEntry;
use crate::structure::{StructureSummary, TextBlock};

/// One row of the history list.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntrySummary {
    pub entry_id: String,
    pub created_at: DateTime<Utc>,
    pub file_name: String,
    pub language: String,
    pub processing_ms: u64,
    /// First 200 characters of the extracted text.
    pub preview: String,
    pub char_count: usize,
    pub share_id: String,
    pub share_url: String,
}

impl From<&HistoryEntry> for HistoryEntrySummary {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            entry_id: entry.id.to_string(),
            created_at: entry.created_at,
            file_name: entry.file_name.clone(),
            language: entry.language.clone(),
            processing_ms: entry.processing_ms,
            preview: entry.preview.clone(),
            char_count: entry.result.text.chars().count(),
            share_id: entry.share_id.clone(),
            share_url: entry.share_url.clone(),
        }
    }
}

/// Full extraction result: returned by extraction, entry lookup and share
/// resolution.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetailResponse {
    #[serde(flatten)]
    pub entry: HistoryEntrySummary,
    pub text: String,
    pub blocks: Vec<TextBlock>,
    pub structure: StructureSummary,
    pub page_count: usize,
    /// Some pages failed while others were read.
    pub has_errors: bool,
}

impl EntryDetailResponse {
    pub fn new(entry: &HistoryEntry, structure: StructureSummary) -> Self {
        Self {
            entry: HistoryEntrySummary::from(entry),
            text: entry.result.text.clone(),
            blocks: entry.blocks.to_vec(),
            structure,
            page_count: entry.result.pages.len(),
            has_errors: entry.result.has_errors,
        }
    }
}

impl From<&HistoryEntry> for EntryDetailResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self::new(entry, StructureSummary::from_blocks(&entry.blocks))
    }
}

/// Response body for `GET /v1/sessions/{sessionId}/history`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ListHistoryResponse {
    pub entries: Vec<HistoryEntrySummary>,
}

/// Query parameters for `GET /v1/sessions/{sessionId}/history`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// `newest` (default) or `oldest`.
    pub order: Option<String>,
}

/// Query parameters for the export download.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    /// `text`, `pdf`, `docx` or `json`.
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntryResponse {
    pub entry_id: String,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearHistoryResponse {
    pub removed: usize,
}
