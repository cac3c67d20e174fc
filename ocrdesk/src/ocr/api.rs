use std::time::Duration;

use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{OcrDeskError, Result};
use crate::upload::FileKind;

use super::types::{OcrRequest, OcrResult, PageResult, TextLine, WordBox};

const MAX_BODY_EXCERPT: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorText {
    One(String),
    Many(Vec<String>),
}

impl ErrorText {
    fn joined(self) -> String {
        match self {
            ErrorText::One(message) => message,
            ErrorText::Many(messages) => messages.join(" "),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParseResponse {
    #[serde(default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(rename = "OCRExitCode", default)]
    ocr_exit_code: Option<i32>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<ErrorText>,
    #[serde(default)]
    error_details: Option<ErrorText>,
    #[serde(default)]
    processing_time_in_milliseconds: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    text_overlay: Option<TextOverlay>,
    #[serde(default)]
    file_parse_exit_code: Option<i32>,
    #[serde(default)]
    parsed_text: Option<String>,
    #[serde(default)]
    error_message: Option<ErrorText>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TextOverlay {
    #[serde(default)]
    lines: Option<Vec<OverlayLine>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OverlayLine {
    #[serde(default)]
    line_text: String,
    #[serde(default)]
    words: Option<Vec<OverlayWord>>,
    #[serde(default)]
    max_height: f64,
    #[serde(default)]
    min_top: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OverlayWord {
    #[serde(default)]
    word_text: String,
    #[serde(default)]
    left: f64,
    #[serde(default)]
    top: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    width: f64,
}

/// Thin client for the OCR.Space `parse/image` endpoint.
///
/// One call, one POST: there is no retry and no caching.
#[derive(Clone, Debug)]
pub struct OcrSpaceClient {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout_secs: u64,
}

impl OcrSpaceClient {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| OcrDeskError::OcrUnavailable("API key required for OCR.Space".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrDeskError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn recognize(&self, request: &OcrRequest) -> Result<OcrResult> {
        let form = self.build_form(request)?;

        debug!(
            endpoint = %self.endpoint,
            file = %request.payload.file_name,
            size = request.payload.bytes.len(),
            language = request.language.code,
            engine = request.options.engine.number(),
            "Sending OCR request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        debug!("OCR response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(map_http_error(status, &body));
        }

        let parsed: ParseResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(error = %e, "OCR response is not valid JSON");
            OcrDeskError::api(
                Some(status.as_u16()),
                format!("Malformed response from OCR service: {}", body_excerpt(&body)),
            )
        })?;

        interpret_response(parsed, request.language.code)
    }

    fn build_form(&self, request: &OcrRequest) -> Result<multipart::Form> {
        let payload = &request.payload;
        let file_part = multipart::Part::bytes(payload.bytes.clone())
            .file_name(payload.file_name.clone())
            .mime_str(payload.kind.mime_type())
            .map_err(|e| OcrDeskError::Internal(format!("Invalid MIME type: {e}")))?;

        let options = &request.options;
        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("language", request.language.code)
            .text("isOverlayRequired", "true")
            .text("OCREngine", options.engine.number().to_string())
            .text("isTable", options.detect_tables.to_string())
            .text("detectOrientation", options.detect_orientation.to_string())
            .text("scale", options.scale.to_string());

        if let Some(filetype) = filetype_hint(payload.kind) {
            form = form.text("filetype", filetype);
        }

        Ok(form)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> OcrDeskError {
        if err.is_timeout() {
            OcrDeskError::Transport(format!(
                "OCR request timed out after {} seconds",
                self.timeout_secs
            ))
        } else {
            // without_url keeps the endpoint out of user-facing text
            OcrDeskError::Transport(format!("Request failed: {}", err.without_url()))
        }
    }
}

fn filetype_hint(kind: FileKind) -> Option<&'static str> {
    match kind {
        FileKind::Png => Some("PNG"),
        FileKind::Jpeg => Some("JPG"),
        FileKind::Pdf => Some("PDF"),
        FileKind::Docx | FileKind::Doc => None,
    }
}

/// Non-2xx responses keep the upstream body verbatim so the user sees exactly
/// what the service said.
fn map_http_error(status: StatusCode, body: &str) -> OcrDeskError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string())
    } else {
        body.to_string()
    };
    OcrDeskError::api(Some(status.as_u16()), message)
}

/// Trimmed upstream body, cut after `MAX_BODY_EXCERPT` characters.
fn body_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty body".to_string();
    }
    let mut excerpt: String = trimmed.chars().take(MAX_BODY_EXCERPT).collect();
    if trimmed.chars().count() > MAX_BODY_EXCERPT {
        excerpt.push_str("...");
    }
    excerpt
}

fn interpret_response(response: ParseResponse, language: &str) -> Result<OcrResult> {
    let exit_code = response.ocr_exit_code.unwrap_or(0);

    let pages: Vec<PageResult> = response
        .parsed_results
        .unwrap_or_default()
        .into_iter()
        .map(convert_page)
        .collect();

    let any_page_ok = pages.iter().any(PageResult::succeeded);
    let partial = exit_code == 2 && any_page_ok;

    if (response.is_errored_on_processing && !partial) || !matches!(exit_code, 1 | 2) {
        let message = response
            .error_message
            .map(ErrorText::joined)
            .or_else(|| response.error_details.map(ErrorText::joined))
            .or_else(|| pages.iter().find_map(|p| p.error_message.clone()))
            .unwrap_or_else(|| format!("OCR.Space reported exit code {exit_code}"));
        return Err(OcrDeskError::OcrFailure(message));
    }

    let text = pages
        .iter()
        .filter(|p| p.succeeded())
        .map(|p| p.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if text.is_empty() {
        return Err(OcrDeskError::OcrFailure(
            "No text found in the document".to_string(),
        ));
    }

    let upstream_processing_ms = response
        .processing_time_in_milliseconds
        .and_then(|value| match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .map(|ms| ms.round() as u64);

    Ok(OcrResult {
        text,
        language: language.to_string(),
        has_errors: pages.iter().any(|p| !p.succeeded()),
        pages,
        exit_code,
        upstream_processing_ms,
    })
}

fn convert_page(result: ParsedResult) -> PageResult {
    let lines = result
        .text_overlay
        .and_then(|overlay| overlay.lines)
        .unwrap_or_default()
        .into_iter()
        .map(|line| TextLine {
            text: line.line_text,
            min_top: line.min_top,
            max_height: line.max_height,
            words: line
                .words
                .unwrap_or_default()
                .into_iter()
                .map(|w| WordBox {
                    text: w.word_text,
                    left: w.left,
                    top: w.top,
                    width: w.width,
                    height: w.height,
                })
                .collect(),
        })
        .collect();

    PageResult {
        text: result.parsed_text.unwrap_or_default().replace("\r\n", "\n"),
        exit_code: result.file_parse_exit_code.unwrap_or(0),
        error_message: result.error_message.map(ErrorText::joined),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::language::find_language;
    use crate::ocr::types::EngineOptions;
    use crate::preprocessing::PreparedPayload;
    use wiremock::{
        matchers::{body_string_contains, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(endpoint: String) -> OcrConfig {
        OcrConfig {
            api_key: Some("test-api-key".to_string()),
            endpoint,
            timeout_secs: 5,
            ..OcrConfig::default()
        }
    }

    fn test_request() -> OcrRequest {
        OcrRequest {
            payload: PreparedPayload {
                file_name: "scan.png".to_string(),
                kind: FileKind::Png,
                bytes: b"fake png bytes".to_vec(),
            },
            language: find_language("eng").unwrap(),
            options: EngineOptions::default(),
        }
    }

    fn success_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "ParsedResults": [{
                "TextOverlay": {
                    "Lines": [{
                        "LineText": "SUMMARY",
                        "Words": [{"WordText": "SUMMARY", "Left": 10.0, "Top": 12.0, "Height": 20.0, "Width": 90.0}],
                        "MaxHeight": 20.0,
                        "MinTop": 12.0
                    }],
                    "HasOverlay": true,
                    "Message": null
                },
                "FileParseExitCode": 1,
                "ParsedText": text,
                "ErrorMessage": "",
                "ErrorDetails": ""
            }],
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false,
            "ProcessingTimeInMilliseconds": "343",
            "SearchablePDFURL": "Searchable PDF not generated as it was not requested."
        })
    }

    async fn client_for(server: &MockServer) -> OcrSpaceClient {
        OcrSpaceClient::new(&test_config(format!("{}/parse/image", server.uri()))).unwrap()
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = OcrConfig::default();
        let result = OcrSpaceClient::new(&config);
        assert!(matches!(result, Err(OcrDeskError::OcrUnavailable(_))));
    }

    #[tokio::test]
    async fn test_sends_multipart_with_options_and_key_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .and(header("apikey", "test-api-key"))
            .and(body_string_contains("name=\"language\""))
            .and(body_string_contains("name=\"OCREngine\""))
            .and(body_string_contains("name=\"isTable\""))
            .and(body_string_contains("fake png bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("SUMMARY\r\nBody")))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).await.recognize(&test_request()).await.unwrap();
        assert_eq!(result.text, "SUMMARY\nBody");
        assert_eq!(result.language, "eng");
        assert_eq!(result.exit_code, 1);
        assert!(!result.has_errors);
        assert_eq!(result.upstream_processing_ms, Some(343));
        assert_eq!(result.pages[0].lines[0].words[0].width, 90.0);
    }

    #[tokio::test]
    async fn test_forbidden_passes_upstream_text_through() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("The API key is invalid or has expired"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.recognize(&test_request()).await.unwrap_err();
        match err {
            OcrDeskError::Api { status, message } => {
                assert_eq!(status, Some(403));
                assert_eq!(message, "The API key is invalid or has expired");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_error_body_uses_reason_phrase() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).await.recognize(&test_request()).await.unwrap_err();
        assert!(matches!(
            err,
            OcrDeskError::Api { status: Some(500), ref message } if message == "Internal Server Error"
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.recognize(&test_request()).await.unwrap_err();
        match err {
            OcrDeskError::Api { status: Some(200), message } => {
                assert!(message.contains("<html>oops</html>"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_body_excerpt_truncates_long_bodies() {
        let long = "x".repeat(MAX_BODY_EXCERPT + 50);
        let excerpt = body_excerpt(&long);
        assert_eq!(excerpt.chars().count(), MAX_BODY_EXCERPT + 3);
        assert!(excerpt.ends_with("..."));

        assert_eq!(body_excerpt("  "), "empty body");
        assert_eq!(body_excerpt(" Service busy \n"), "Service busy");
    }

    #[tokio::test]
    async fn test_errored_processing_is_ocr_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ParsedResults": null,
                "OCRExitCode": 3,
                "IsErroredOnProcessing": true,
                "ErrorMessage": ["Unable to recognize the file type", "E216:Unable to detect the file extension"],
                "ErrorDetails": null
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.recognize(&test_request()).await.unwrap_err();
        match err {
            OcrDeskError::OcrFailure(message) => {
                assert!(message.contains("Unable to recognize the file type"));
                assert!(message.contains("E216"));
            }
            other => panic!("expected OcrFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_text_is_ocr_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("  \r\n ")))
            .mount(&server)
            .await;

        let err = client_for(&server).await.recognize(&test_request()).await.unwrap_err();
        assert!(matches!(err, OcrDeskError::OcrFailure(_)));
    }

    #[tokio::test]
    async fn test_partial_parse_keeps_good_pages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ParsedResults": [
                    {"FileParseExitCode": 1, "ParsedText": "Page one"},
                    {"FileParseExitCode": -10, "ParsedText": "", "ErrorMessage": "Page could not be parsed"}
                ],
                "OCRExitCode": 2,
                "IsErroredOnProcessing": true,
                "ProcessingTimeInMilliseconds": 1200
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).await.recognize(&test_request()).await.unwrap();
        assert_eq!(result.text, "Page one");
        assert!(result.has_errors);
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.upstream_processing_ms, Some(1200));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body("late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = test_config(format!("{}/parse/image", server.uri()));
        config.timeout_secs = 1;
        let client = OcrSpaceClient::new(&config).unwrap();

        let err = client.recognize(&test_request()).await.unwrap_err();
        match err {
            OcrDeskError::Transport(message) => assert!(message.contains("timed out")),
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = OcrSpaceClient::new(&test_config("http://127.0.0.1:1/parse/image".to_string()))
            .unwrap();
        let err = client.recognize(&test_request()).await.unwrap_err();
        assert!(matches!(err, OcrDeskError::Transport(_)));
    }

    #[test]
    fn test_filetype_hint_skips_word_documents() {
        assert_eq!(filetype_hint(FileKind::Jpeg), Some("JPG"));
        assert_eq!(filetype_hint(FileKind::Docx), None);
    }
}
