use axum::Json;
use utoipa::OpenApi;

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OcrDesk API",
        version = "1.0.0",
        description = "Upload an image or document, extract its text through OCR.Space, inspect the detected structure and export it.",
    ),
    paths(
        handlers::health::health_check,
        handlers::languages::list_languages,
        handlers::sessions::create_session,
        handlers::sessions::end_session,
        handlers::extractions::create_extraction,
        handlers::extractions::preview_image,
        handlers::history::list_history,
        handlers::history::clear_history,
        handlers::history::get_entry,
        handlers::history::delete_entry,
        handlers::history::export_entry,
        handlers::history::resolve_share,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        // Sessions
        dto::SessionResponse,
        dto::EndSessionResponse,
        // Languages
        dto::LanguageDto,
        dto::LanguagesResponse,
        // Extractions & history
        dto::PreviewResponse,
        dto::HistoryEntrySummary,
        dto::EntryDetailResponse,
        dto::ListHistoryResponse,
        dto::DeleteEntryResponse,
        dto::ClearHistoryResponse,
        crate::structure::BlockKind,
        crate::structure::TextBlock,
        crate::structure::StructureSummary,
        crate::export::ExportFormat,
        crate::export::ExportDocument,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::OcrStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "languages", description = "Supported OCR languages"),
        (name = "sessions", description = "Per-user session lifecycle"),
        (name = "extractions", description = "Image preview and text extraction"),
        (name = "history", description = "Session history, exports and share links"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
