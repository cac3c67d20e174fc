use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{OcrDeskError, Result};

use super::api::OcrSpaceClient;
use super::types::{OcrRequest, OcrResult};

#[derive(Clone)]
enum OcrBackend {
    Api { client: OcrSpaceClient },
    Unavailable { reason: String },
}

/// Entry point for text recognition. Degrades to an "unavailable" backend
/// when no API key is configured so the rest of the service still starts.
#[derive(Clone)]
pub struct OcrProvider {
    backend: OcrBackend,
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Self {
        let backend = match OcrSpaceClient::new(config) {
            Ok(client) => {
                info!(endpoint = %client.endpoint(), "OCR.Space backend initialized");
                OcrBackend::Api { client }
            }
            Err(e) => {
                let reason = format!("OCR.Space backend unavailable: {e}");
                warn!("{}", reason);
                OcrBackend::Unavailable { reason }
            }
        };

        Self { backend }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub async fn recognize(&self, request: &OcrRequest) -> Result<OcrResult> {
        match &self.backend {
            OcrBackend::Api { client } => client.recognize(request).await,
            OcrBackend::Unavailable { reason } => {
                Err(OcrDeskError::OcrUnavailable(reason.clone()))
            }
        }
    }
}
