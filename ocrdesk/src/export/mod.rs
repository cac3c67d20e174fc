//! Rendering of analyzed text into downloadable files.
//!
//! Every format takes the same ordered block sequence plus [`ReportInfo`].
//! Plain text drops the block kinds; JSON keeps them verbatim; PDF and Word
//! map each kind onto the format's own styling.

mod docx;
mod json;
mod pdf;
mod text;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{OcrDeskError, Result, ValidationError};
use crate::ocr::find_language;
use crate::structure::TextBlock;

pub use json::ExportDocument;

pub const REPORT_TITLE: &str = "OCR Result Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Pdf,
    Docx,
    Json,
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Text => "text/plain; charset=utf-8",
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Json => "json",
        }
    }

    pub fn parse(value: &str) -> std::result::Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            "json" => Ok(Self::Json),
            other => Err(ValidationError::InvalidSetting(format!(
                "unknown export format '{other}'"
            ))),
        }
    }
}

/// Report metadata written alongside the blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportInfo {
    /// OCR language code, e.g. `eng`.
    pub language: String,
    pub generated_at: DateTime<Utc>,
}

impl ReportInfo {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            generated_at: Utc::now(),
        }
    }

    /// `English (eng)` for known codes, the bare code otherwise.
    pub fn language_label(&self) -> String {
        match find_language(&self.language) {
            Ok(language) => format!("{} ({})", language.name, language.code),
            Err(_) => self.language.clone(),
        }
    }

    pub fn generated_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}

pub fn export(blocks: &[TextBlock], format: ExportFormat, info: &ReportInfo) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Text => Ok(text::render(blocks).into_bytes()),
        ExportFormat::Json => json::render(blocks, info),
        ExportFormat::Pdf => pdf::render(blocks, info),
        ExportFormat::Docx => docx::render(blocks, info),
    }
}

/// Download name for an export, derived from the uploaded file's stem.
pub fn export_file_name(source_name: &str, format: ExportFormat) -> String {
    let stem = std::path::Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("extracted");
    let safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{safe}_ocr.{}", format.extension())
}

fn export_error(format: ExportFormat, detail: impl std::fmt::Display) -> OcrDeskError {
    OcrDeskError::Export(format!("{} export failed: {detail}", format.extension()))
}
