use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Result;
use crate::structure::TextBlock;

use super::{export_error, text, ExportFormat, ReportInfo};

/// JSON export body. `blocks` keeps kind, content and order verbatim so the
/// document can be parsed back into the same sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub title: String,
    pub language: String,
    pub generated_at: DateTime<Utc>,
    pub text: String,
    pub blocks: Vec<TextBlock>,
}

pub fn render(blocks: &[TextBlock], info: &ReportInfo) -> Result<Vec<u8>> {
    let document = ExportDocument {
        title: super::REPORT_TITLE.to_string(),
        language: info.language.clone(),
        generated_at: info.generated_at,
        text: text::render(blocks),
        blocks: blocks.to_vec(),
    };
    serde_json::to_vec_pretty(&document).map_err(|e| export_error(ExportFormat::Json, e))
}
