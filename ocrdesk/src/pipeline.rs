use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{OcrDeskError, Result};
use crate::export::{self, ExportFormat, ReportInfo};
use crate::ocr::{find_language, EngineOptions, OcrProvider, OcrRequest};
use crate::preprocessing::{self, PreprocessSettings};
use crate::session::{make_preview, share_id, share_url, HistoryEntry, Session};
use crate::structure::{analyze, StructureSummary};
use crate::upload::UploadValidator;

/// One "extract text" action as received from the user.
#[derive(Debug, Clone)]
pub struct ExtractionInput {
    pub file_name: String,
    pub declared_mime: Option<String>,
    pub bytes: Vec<u8>,
    pub language: String,
    pub settings: PreprocessSettings,
    pub options: EngineOptions,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub entry: HistoryEntry,
    pub summary: StructureSummary,
}

/// A rendered export ready for download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

/// Validation, preprocessing, OCR and structure analysis for one upload.
///
/// Holds no per-user state: the caller passes the session explicitly and is
/// expected to hold its lock for the duration of the call.
#[derive(Clone)]
pub struct ExtractionPipeline {
    ocr: OcrProvider,
    validator: UploadValidator,
    public_url: String,
}

impl ExtractionPipeline {
    pub fn new(ocr: OcrProvider, config: &Config) -> Self {
        Self {
            ocr,
            validator: UploadValidator::new(config.upload.max_bytes),
            public_url: config.server.public_url.clone(),
        }
    }

    pub fn ocr_available(&self) -> bool {
        self.ocr.is_available()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.validator.max_bytes()
    }

    pub async fn extract(&self, session: &mut Session, input: ExtractionInput) -> Result<Extraction> {
        let started = Instant::now();

        let file = self.validator.validate(
            &input.file_name,
            input.declared_mime.as_deref(),
            input.bytes,
        )?;
        let language = find_language(&input.language)?;
        let payload = {
            let file = file.clone();
            let settings = input.settings;
            let max_bytes = self.validator.max_bytes();
            run_blocking(move || preprocessing::prepare_payload(&file, &settings, max_bytes)).await?
        };

        tracing::info!(
            session_id = %session.id(),
            file = %file.name,
            kind = ?file.kind,
            size = file.size(),
            language = language.code,
            engine = input.options.engine.number(),
            "Starting extraction"
        );

        let request = OcrRequest {
            payload,
            language,
            options: input.options,
        };
        let result = self.ocr.recognize(&request).await?;

        let blocks = analyze(&result.text);
        let summary = StructureSummary::from_blocks(&blocks);
        let processing_ms = started.elapsed().as_millis() as u64;

        let created_at = Utc::now();
        let mut id = share_id(&result.text, language.code, created_at);
        let mut attempt = 1;
        while session.has_share(&id) {
            attempt += 1;
            id = format!("{}-{attempt}", share_id(&result.text, language.code, created_at));
        }

        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            created_at,
            file_name: file.name.clone(),
            language: language.code.to_string(),
            processing_ms,
            preview: make_preview(&result.text),
            share_url: share_url(&self.public_url, &id),
            share_id: id,
            result: Arc::new(result),
            blocks: Arc::from(blocks),
        };
        session.record(entry.clone());

        tracing::info!(
            session_id = %session.id(),
            entry_id = %entry.id,
            chars = entry.result.text.chars().count(),
            blocks = entry.blocks.len(),
            processing_ms,
            "Extraction complete"
        );

        Ok(Extraction { entry, summary })
    }

    /// Applies preprocessing settings to an uploaded image without running OCR.
    pub async fn preview(
        &self,
        file_name: &str,
        declared_mime: Option<&str>,
        bytes: Vec<u8>,
        settings: &PreprocessSettings,
    ) -> Result<Vec<u8>> {
        let file = self.validator.validate(file_name, declared_mime, bytes)?;
        let settings = *settings;
        run_blocking(move || preprocessing::render_preview(&file, &settings)).await
    }

    pub fn export(&self, session: &Session, entry_id: Uuid, format: ExportFormat) -> Result<ExportFile> {
        let entry = session
            .history()
            .get(entry_id)
            .ok_or_else(|| OcrDeskError::NotFound(format!("History entry {entry_id} not found")))?;

        let info = ReportInfo::new(entry.language.clone());
        let bytes = export::export(&entry.blocks, format, &info)?;

        Ok(ExportFile {
            file_name: export::export_file_name(&entry.file_name, format),
            format,
            bytes,
        })
    }
}

/// Runs CPU-bound image work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| OcrDeskError::Internal(format!("Image processing task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::structure::BlockKind;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.ocr.api_key = Some("test-key".to_string());
        config.ocr.endpoint = format!("{}/parse/image", server.uri());
        config.ocr.timeout_secs = 5;
        config
    }

    fn pipeline_for(config: &Config) -> ExtractionPipeline {
        ExtractionPipeline::new(OcrProvider::new(&config.ocr), config)
    }

    fn jpeg_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([250, 250, 250])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
        out.into_inner()
    }

    fn input(file_name: &str, bytes: Vec<u8>) -> ExtractionInput {
        ExtractionInput {
            file_name: file_name.to_string(),
            declared_mime: None,
            bytes,
            language: "eng".to_string(),
            settings: PreprocessSettings::default(),
            options: EngineOptions::default(),
        }
    }

    fn parsed(text: &str) -> serde_json::Value {
        serde_json::json!({
            "ParsedResults": [{
                "ParsedText": text,
                "FileParseExitCode": 1,
                "ErrorMessage": "",
                "TextOverlay": { "Lines": [] }
            }],
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false,
            "ProcessingTimeInMilliseconds": "120"
        })
    }

    #[tokio::test]
    async fn test_extract_records_history_and_share() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(parsed("SUMMARY\r\nSales rose in every region.\r\nCosts held.")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let pipeline = pipeline_for(&config);
        let mut session = Session::new(20);

        let extraction = pipeline
            .extract(&mut session, input("scan.jpg", jpeg_bytes()))
            .await
            .unwrap();

        let blocks = &extraction.entry.blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Heading);
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
        assert_eq!(extraction.summary.headings, 1);

        assert_eq!(session.history().len(), 1);
        let share = &extraction.entry.share_id;
        assert!(extraction.entry.share_url.ends_with(&format!("?share={share}")));
        assert_eq!(
            session.resolve_share(share).map(|e| e.id),
            Some(extraction.entry.id)
        );
    }

    #[tokio::test]
    async fn test_oversize_pdf_makes_no_http_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(parsed("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let pipeline = pipeline_for(&config);
        let mut session = Session::new(20);

        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.resize(2 * 1024 * 1024, b'0');
        let err = pipeline
            .extract(&mut session, input("big.pdf", pdf))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OcrDeskError::Validation(ValidationError::Oversize { .. })
        ));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_language_rejected_before_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(parsed("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let pipeline = pipeline_for(&config);
        let mut session = Session::new(20);
        let mut request = input("scan.jpg", jpeg_bytes());
        request.language = "klingon".to_string();

        let err = pipeline.extract(&mut session, request).await.unwrap_err();
        assert!(matches!(
            err,
            OcrDeskError::Validation(ValidationError::UnsupportedLanguage(_))
        ));
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_history_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("The API key is invalid"))
            .mount(&server)
            .await;

        let config = config_for(&server);
        let pipeline = pipeline_for(&config);
        let mut session = Session::new(20);

        let err = pipeline
            .extract(&mut session, input("scan.jpg", jpeg_bytes()))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "OCR service error: The API key is invalid");
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_export_unknown_entry_is_not_found() {
        let config = Config::default();
        let pipeline = ExtractionPipeline::new(OcrProvider::new(&config.ocr), &config);
        let session = Session::new(20);

        let err = pipeline
            .export(&session, Uuid::new_v4(), ExportFormat::Text)
            .unwrap_err();
        assert!(matches!(err, OcrDeskError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_preview_rejects_documents() {
        let config = Config::default();
        let pipeline = ExtractionPipeline::new(OcrProvider::new(&config.ocr), &config);

        let err = pipeline
            .preview("doc.pdf", None, b"%PDF-1.4 body".to_vec(), &PreprocessSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OcrDeskError::Preprocess(_)));
    }

    #[tokio::test]
    async fn test_huge_dimensions_rejected_before_ocr() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let config = config_for(&server);
        let pipeline = pipeline_for(&config);
        let mut session = Session::new(20);

        let img = DynamicImage::ImageLuma8(image::GrayImage::new(12_000, 1));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();

        let err = pipeline
            .extract(&mut session, input("wide.png", out.into_inner()))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrDeskError::Preprocess(_)));
        assert!(session.history().is_empty());
    }
}
