use axum::extract::State;

use crate::api::state::AppState;
use crate::api::v1::dto::{LanguageDto, LanguagesResponse};
use crate::api::v1::response::{ApiResponse, ResponseMeta};
use crate::ocr::LANGUAGES;

/// `GET /api/v1/languages`
#[utoipa::path(
    get,
    path = "/api/v1/languages",
    tag = "languages",
    operation_id = "languages.list",
    responses(
        (status = 200, description = "Supported OCR languages", body = LanguagesResponse),
    )
)]
pub async fn list_languages(State(state): State<AppState>) -> ApiResponse<LanguagesResponse> {
    let languages: Vec<LanguageDto> = LANGUAGES.iter().map(LanguageDto::from).collect();
    let total = languages.len() as u64;

    ApiResponse::success_with_meta(
        LanguagesResponse {
            default_language: state.config.ocr.default_language.clone(),
            languages,
        },
        ResponseMeta { total: Some(total) },
    )
}
