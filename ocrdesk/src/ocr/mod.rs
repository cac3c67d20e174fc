//! OCR (Optical Character Recognition) Module
//!
//! Text recognition is delegated to the hosted OCR.Space API. This module
//! owns the request/response types, the language catalogue and the HTTP
//! client; it never inspects pixels itself.
//!
//! # Architecture
//!
//! - `OcrProvider` is what the rest of the crate talks to
//! - `OcrSpaceClient` performs the single multipart POST per extraction
//! - `language` holds the fixed set of accepted language codes
//!
//! # Configuration
//!
//! Controlled via `OcrConfig` (see `config.rs`):
//! - `api_key`: OCR.Space key, supplied through `OCR_SPACE_API_KEY`
//! - `endpoint`: override for proxies and tests
//! - `timeout_secs`: upper bound on one request
//! - `engine`: default OCR engine (1, 2 or 3)

mod api;
mod language;
mod provider;
mod types;

pub use api::OcrSpaceClient;
pub use language::{find_language, Language, LANGUAGES};
pub use provider::OcrProvider;
pub use types::{
    EngineOptions, OcrEngine, OcrRequest, OcrResult, PageResult, TextLine, WordBox,
};
