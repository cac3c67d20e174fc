use serde::Serialize;

use crate::ocr::Language;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LanguageDto {
    /// OCR.Space language code, e.g. `eng`.
    pub code: String,
    pub name: String,
}

impl From<&Language> for LanguageDto {
    fn from(language: &Language) -> Self {
        Self {
            code: language.code.to_string(),
            name: language.name.to_string(),
        }
    }
}

/// Response body for `GET /v1/languages`.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LanguagesResponse {
    pub default_language: String,
    pub languages: Vec<LanguageDto>,
}
