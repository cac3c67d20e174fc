use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::preprocessing::PreparedPayload;

use super::language::Language;

/// OCR.Space engine selection. Engine 2 handles special characters and
/// mixed-language text best; engine 3 is the newest and slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct OcrEngine(u8);

impl OcrEngine {
    pub fn new(engine: u8) -> Result<Self, ValidationError> {
        if (1..=3).contains(&engine) {
            Ok(Self(engine))
        } else {
            Err(ValidationError::InvalidSetting(format!(
                "OCR engine must be 1, 2 or 3, got {engine}"
            )))
        }
    }

    pub fn number(&self) -> u8 {
        self.0
    }
}

impl Default for OcrEngine {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for OcrEngine {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OcrEngine> for u8 {
    fn from(engine: OcrEngine) -> Self {
        engine.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOptions {
    pub engine: OcrEngine,
    pub detect_tables: bool,
    pub detect_orientation: bool,
    pub scale: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            engine: OcrEngine::default(),
            detect_tables: false,
            detect_orientation: false,
            scale: false,
        }
    }
}

/// One extraction call. Built per request and consumed by the client.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub payload: PreparedPayload,
    pub language: &'static Language,
    pub options: EngineOptions,
}

/// A recognised word with its bounding box in source-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordBox {
    pub text: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    pub text: String,
    pub min_top: f64,
    pub max_height: f64,
    pub words: Vec<WordBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub text: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub lines: Vec<TextLine>,
}

impl PageResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    /// All page texts joined, with `\r\n` normalised to `\n`.
    pub text: String,
    pub language: String,
    pub pages: Vec<PageResult>,
    pub exit_code: i32,
    /// Set when some pages failed while others succeeded.
    pub has_errors: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_processing_ms: Option<u64>,
}
