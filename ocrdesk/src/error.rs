use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::api::v1::response::ApiResponse;

/// Reasons an upload or its request options are refused before any work is done.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max {max} bytes)")]
    Oversize { size: usize, max: usize },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Upload exceeds the request size limit (max {max} bytes)")]
    RequestTooLarge { max: usize },

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Unsupported OCR language: {0}")]
    UnsupportedLanguage(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

#[derive(Error, Debug)]
pub enum OcrDeskError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Preprocessing error: {0}")]
    Preprocess(String),

    #[error("Could not reach the OCR service: {0}")]
    Transport(String),

    #[error("OCR service error: {message}")]
    Api { status: Option<u16>, message: String },

    #[error("OCR failed: {0}")]
    OcrFailure(String),

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl OcrDeskError {
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        OcrDeskError::Api {
            status,
            message: message.into(),
        }
    }

    /// True when the user can fix the problem by changing the input
    /// (file, language, settings) rather than by simply trying again.
    pub fn user_fixable(&self) -> bool {
        match self {
            OcrDeskError::Validation(_)
            | OcrDeskError::Preprocess(_)
            | OcrDeskError::OcrFailure(_)
            | OcrDeskError::Export(_)
            | OcrDeskError::NotFound(_) => true,
            OcrDeskError::Api { status, .. } => matches!(status, Some(400..=499)),
            OcrDeskError::Transport(_)
            | OcrDeskError::OcrUnavailable(_)
            | OcrDeskError::Internal(_) => false,
        }
    }
}

impl From<std::io::Error> for OcrDeskError {
    fn from(err: std::io::Error) -> Self {
        OcrDeskError::Internal(err.to_string())
    }
}

impl IntoResponse for OcrDeskError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}

pub type Result<T> = std::result::Result<T, OcrDeskError>;
