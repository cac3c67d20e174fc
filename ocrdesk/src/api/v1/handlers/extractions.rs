//! v1 extraction handlers.
//!
//! Both endpoints take the same multipart form: a `file` part plus optional
//! `language`, image adjustments (`rotation`, `brightness`, `contrast`,
//! `sharpness`) and engine options (`engine`, `detectTables`,
//! `detectOrientation`, `scale`).

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use base64::Engine;

use crate::api::v1::dto::{EntryDetailResponse, PreviewResponse};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::error::{OcrDeskError, Result, ValidationError};
use crate::ocr::{EngineOptions, OcrEngine};
use crate::pipeline::ExtractionInput;
use crate::preprocessing::PreprocessSettings;

use super::find_session;

fn parse_form_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn form_bool(field: &str, raw: &str) -> Result<bool> {
    parse_form_bool(raw).ok_or_else(|| {
        ValidationError::InvalidSetting(format!(
            "{field} must be one of true/false/1/0/yes/no"
        ))
        .into()
    })
}

fn form_number(field: &str, raw: &str) -> Result<f32> {
    raw.trim().parse::<f32>().map_err(|_| {
        ValidationError::InvalidSetting(format!("{field} must be a number, got '{raw}'")).into()
    })
}

fn multipart_error(err: MultipartError, max_request_bytes: usize) -> OcrDeskError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::RequestTooLarge {
            max: max_request_bytes,
        }
        .into()
    } else {
        ValidationError::Malformed(err.body_text()).into()
    }
}

/// Fields of the upload form after parsing. Unknown parts are ignored.
#[derive(Debug, Default)]
struct UploadForm {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Option<Vec<u8>>,
    language: Option<String>,
    settings: PreprocessSettings,
    options: EngineOptions,
}

impl UploadForm {
    async fn read(multipart: &mut Multipart, state: &AppState) -> Result<Self> {
        let max_request_bytes = state.max_request_bytes();
        let mut form = UploadForm {
            options: state.default_engine_options(),
            ..UploadForm::default()
        };
        let next = |err: MultipartError| multipart_error(err, max_request_bytes);

        while let Some(field) = multipart.next_field().await.map_err(next)? {
            let name = field.name().unwrap_or("").to_string();

            match name.as_str() {
                "file" => {
                    form.file_name = field.file_name().map(str::to_string);
                    form.content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(next)?;
                    form.bytes = Some(bytes.to_vec());
                }
                "language" => {
                    let raw = field.text().await.map_err(next)?;
                    if !raw.trim().is_empty() {
                        form.language = Some(raw.trim().to_string());
                    }
                }
                "rotation" | "brightness" | "contrast" | "sharpness" => {
                    let raw = field.text().await.map_err(next)?;
                    let value = form_number(&name, &raw)?;
                    match name.as_str() {
                        "rotation" => form.settings.rotation = value,
                        "brightness" => form.settings.brightness = value,
                        "contrast" => form.settings.contrast = value,
                        _ => form.settings.sharpness = value,
                    }
                }
                "engine" => {
                    let raw = field.text().await.map_err(next)?;
                    let number = raw.trim().parse::<u8>().map_err(|_| {
                        ValidationError::InvalidSetting(format!(
                            "OCR engine must be 1, 2 or 3, got '{raw}'"
                        ))
                    })?;
                    form.options.engine = OcrEngine::new(number)?;
                }
                "detectTables" | "detect_tables" => {
                    let raw = field.text().await.map_err(next)?;
                    form.options.detect_tables = form_bool("detectTables", &raw)?;
                }
                "detectOrientation" | "detect_orientation" => {
                    let raw = field.text().await.map_err(next)?;
                    form.options.detect_orientation = form_bool("detectOrientation", &raw)?;
                }
                "scale" => {
                    let raw = field.text().await.map_err(next)?;
                    form.options.scale = form_bool("scale", &raw)?;
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Splits off the uploaded file. A missing `file` part is reported the
    /// same way as an empty upload.
    fn take_file(&mut self) -> Result<(String, Option<String>, Vec<u8>)> {
        let bytes = self.bytes.take().ok_or(ValidationError::Empty)?;
        let file_name = self
            .file_name
            .take()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "upload".to_string());
        Ok((file_name, self.content_type.take(), bytes))
    }
}

/// `POST /api/v1/sessions/{sessionId}/extractions`
///
/// Runs the whole pipeline for one upload: validation, preprocessing, OCR
/// and structure analysis. The result is appended to the session history.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/extractions",
    tag = "extractions",
    operation_id = "extractions.create",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body(content_type = "multipart/form-data", content = String, description = "File upload with optional language, image adjustments and engine options"),
    responses(
        (status = 201, description = "Text extracted", body = EntryDetailResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 413, description = "File too large", body = ApiError),
        (status = 415, description = "Unsupported file type", body = ApiError),
        (status = 502, description = "OCR service error", body = ApiError),
        (status = 503, description = "OCR not configured", body = ApiError),
        (status = 504, description = "OCR service unreachable", body = ApiError),
    )
)]
pub async fn create_extraction(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResponse<EntryDetailResponse> {
    match run_extraction(&state, &session_id, &mut multipart).await {
        Ok(detail) => ApiResponse::created(detail),
        Err(e) => e.into(),
    }
}

async fn run_extraction(
    state: &AppState,
    session_id: &str,
    multipart: &mut Multipart,
) -> Result<EntryDetailResponse> {
    let handle = find_session(state, session_id)?;
    let mut form = UploadForm::read(multipart, state).await?;
    let (file_name, declared_mime, bytes) = form.take_file()?;

    let input = ExtractionInput {
        file_name,
        declared_mime,
        bytes,
        language: form
            .language
            .take()
            .unwrap_or_else(|| state.config.ocr.default_language.clone()),
        settings: form.settings,
        options: form.options,
    };

    let mut session = handle.lock().await;
    let extraction = state.pipeline.extract(&mut session, input).await?;
    Ok(EntryDetailResponse::new(&extraction.entry, extraction.summary))
}

/// `POST /api/v1/sessions/{sessionId}/preview`
///
/// Applies the image adjustments and returns the processed image inline.
/// Nothing is sent to the OCR service and history is left untouched.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/preview",
    tag = "extractions",
    operation_id = "extractions.preview",
    params(("sessionId" = String, Path, description = "Session ID")),
    request_body(content_type = "multipart/form-data", content = String, description = "Image upload with optional rotation, brightness, contrast and sharpness"),
    responses(
        (status = 200, description = "Processed image", body = PreviewResponse),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 404, description = "Session not found", body = ApiError),
        (status = 413, description = "File too large", body = ApiError),
        (status = 415, description = "Unsupported file type", body = ApiError),
        (status = 422, description = "Not a previewable image", body = ApiError),
    )
)]
pub async fn preview_image(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResponse<PreviewResponse> {
    match run_preview(&state, &session_id, &mut multipart).await {
        Ok(preview) => ApiResponse::success(preview),
        Err(e) => e.into(),
    }
}

async fn run_preview(
    state: &AppState,
    session_id: &str,
    multipart: &mut Multipart,
) -> Result<PreviewResponse> {
    find_session(state, session_id)?;
    let mut form = UploadForm::read(multipart, state).await?;
    let (file_name, declared_mime, bytes) = form.take_file()?;

    let png = state
        .pipeline
        .preview(&file_name, declared_mime.as_deref(), bytes, &form.settings)
        .await?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
    Ok(PreviewResponse {
        mime_type: "image/png".to_string(),
        size: png.len(),
        data_url: format!("data:image/png;base64,{encoded}"),
    })
}
