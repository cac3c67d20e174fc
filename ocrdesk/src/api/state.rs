use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{EngineOptions, OcrEngine, OcrProvider};
use crate::pipeline::ExtractionPipeline;
use crate::session::SessionStore;

/// Floor for the request body limit so small uploads with form overhead
/// never trip it.
const MIN_REQUEST_BYTES: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub pipeline: ExtractionPipeline,
}

impl AppState {
    pub fn new(config: Config, ocr: OcrProvider) -> Self {
        let sessions = Arc::new(SessionStore::new(&config.session));
        let pipeline = ExtractionPipeline::new(ocr, &config);

        Self {
            config: Arc::new(config),
            sessions,
            pipeline,
        }
    }

    /// Hard cap on a request body. Kept well above the upload limit so an
    /// oversize file still reaches validation and gets a precise error.
    pub fn max_request_bytes(&self) -> usize {
        self.config
            .upload
            .max_bytes
            .saturating_mul(4)
            .max(MIN_REQUEST_BYTES)
    }

    pub fn default_engine_options(&self) -> EngineOptions {
        EngineOptions {
            engine: OcrEngine::new(self.config.ocr.engine).unwrap_or_default(),
            ..EngineOptions::default()
        }
    }
}
