//! # V1 API Response Envelope & Error Contract
//!
//! Every JSON endpoint returns an [`ApiResponse<T>`] envelope:
//!
//! ```json
//! {
//!   "data": { ... },                 // present on success, absent on error
//!   "meta": { "total": 3 },          // optional, list endpoints only
//!   "error": {                       // present on error, absent on success
//!     "code": "upstream_error",
//!     "message": "The API key is invalid",
//!     "userFixable": true
//!   }
//! }
//! ```
//!
//! `userFixable` tells the page whether changing the input (file, language,
//! settings) can help, or whether the problem is transient and the user
//! should simply try again later.
//!
//! Errors reported by the OCR service are passed through with the upstream
//! message unmodified.
//!
//! ## ID Formats
//!
//! - **sessionId**, **entryId**: UUID v4
//! - **shareId**: `<unix-seconds>_<8 hex digits>`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{OcrDeskError, ValidationError};

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed request, unsupported language or invalid setting. HTTP 400.
    InvalidRequest,
    /// The requested session, history entry or share does not exist. HTTP 404.
    NotFound,
    /// The upload exceeds the size limit. HTTP 413.
    PayloadTooLarge,
    /// The upload is not one of the accepted file types. HTTP 415.
    UnsupportedMediaType,
    /// The input was understood but could not be processed: undecodable
    /// image, unreadable document, or content an export format rejects.
    /// HTTP 422.
    UnprocessableContent,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
    /// The OCR service answered with an error. HTTP 502.
    UpstreamError,
    /// OCR is not configured on this server. HTTP 503.
    ServiceUnavailable,
    /// The OCR service could not be reached in time. HTTP 504.
    UpstreamTimeout,
}

impl ErrorCode {
    /// Returns the HTTP status code corresponding to this error code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::UnprocessableContent => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::UnsupportedMediaType => write!(f, "unsupported_media_type"),
            Self::UnprocessableContent => write!(f, "unprocessable_content"),
            Self::InternalError => write!(f, "internal_error"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::UpstreamTimeout => write!(f, "upstream_timeout"),
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error classification.
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
    /// True when the user can fix the problem by changing the input.
    pub user_fixable: bool,
}

/// Metadata included in list responses.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Canonical v1 API response envelope.
///
/// On success, `data` is present and `error` is absent. On error, `error` is
/// present and `data` is absent. The HTTP status is derived from the error
/// code, or set by constructors like [`ApiResponse::created`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Success response with list metadata (HTTP 200).
    pub fn success_with_meta(data: T, meta: ResponseMeta) -> Self {
        Self {
            data: Some(data),
            meta: Some(meta),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Resource created response (HTTP 201).
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            meta: None,
            error: None,
            status: StatusCode::CREATED,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`];
    /// `userFixable` defaults to true for 4xx codes.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let user_fixable = code.status().is_client_error();
        Self::error_with_hint(code, message, user_fixable)
    }

    fn error_with_hint(code: ErrorCode, message: impl Into<String>, user_fixable: bool) -> Self {
        let status = code.status();
        Self {
            data: None,
            meta: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                user_fixable,
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred",
                        "userFixable": false
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl<T: Serialize> From<OcrDeskError> for ApiResponse<T> {
    /// Convert an [`OcrDeskError`] into a v1 [`ApiResponse`].
    ///
    /// Upstream OCR messages are kept verbatim. Internal error details are
    /// **never** leaked: a generic message is returned and the real error is
    /// logged via `tracing::error!`.
    fn from(err: OcrDeskError) -> Self {
        let user_fixable = err.user_fixable();
        match err {
            OcrDeskError::Validation(ref validation) => {
                let code = match validation {
                    ValidationError::Oversize { .. } | ValidationError::RequestTooLarge { .. } => {
                        ErrorCode::PayloadTooLarge
                    }
                    ValidationError::UnsupportedType(_) => ErrorCode::UnsupportedMediaType,
                    ValidationError::Empty
                    | ValidationError::Malformed(_)
                    | ValidationError::UnsupportedLanguage(_)
                    | ValidationError::InvalidSetting(_) => ErrorCode::InvalidRequest,
                };
                ApiResponse::error_with_hint(code, validation.to_string(), user_fixable)
            }

            OcrDeskError::Api { ref message, .. } => {
                ApiResponse::error_with_hint(ErrorCode::UpstreamError, message.clone(), user_fixable)
            }

            OcrDeskError::Transport(_) => ApiResponse::error_with_hint(
                ErrorCode::UpstreamTimeout,
                err.to_string(),
                user_fixable,
            ),

            OcrDeskError::Preprocess(_) | OcrDeskError::OcrFailure(_) | OcrDeskError::Export(_) => {
                ApiResponse::error_with_hint(
                    ErrorCode::UnprocessableContent,
                    err.to_string(),
                    user_fixable,
                )
            }

            OcrDeskError::OcrUnavailable(_) => ApiResponse::error_with_hint(
                ErrorCode::ServiceUnavailable,
                "OCR is not configured on this server",
                user_fixable,
            ),

            OcrDeskError::NotFound(ref msg) => {
                ApiResponse::error_with_hint(ErrorCode::NotFound, msg.clone(), user_fixable)
            }

            ref internal @ OcrDeskError::Internal(_) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error_with_hint(
                    ErrorCode::InternalError,
                    "An internal error occurred",
                    user_fixable,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_of(resp: &ApiResponse<()>) -> &ApiError {
        resp.error.as_ref().expect("error")
    }

    #[test]
    fn success_response_serializes_without_error() {
        let resp = ApiResponse::success("hello");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["data"], "hello");
        assert!(json.get("error").is_none());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn error_response_serializes_without_data() {
        let resp = ApiResponse::<()>::error(ErrorCode::NotFound, "gone");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "gone");
        assert_eq!(json["error"]["userFixable"], true);
    }

    #[test]
    fn success_with_meta_serializes_total() {
        let resp = ApiResponse::success_with_meta(vec![1, 2, 3], ResponseMeta { total: Some(3) });
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["meta"]["total"], 3);
    }

    #[test]
    fn created_response_has_201_status() {
        assert_eq!(ApiResponse::created("new").status(), StatusCode::CREATED);
    }

    #[test]
    fn error_code_status_mapping() {
        assert_eq!(ErrorCode::InvalidRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            ErrorCode::UnsupportedMediaType.status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(ErrorCode::UpstreamError.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ErrorCode::ServiceUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let json = serde_json::to_value(&ErrorCode::UnsupportedMediaType).expect("serialize");
        assert_eq!(json, "unsupported_media_type");
        assert_eq!(ErrorCode::UpstreamTimeout.to_string(), "upstream_timeout");
    }

    #[test]
    fn oversize_maps_to_payload_too_large() {
        let resp: ApiResponse<()> =
            OcrDeskError::from(ValidationError::Oversize { size: 2, max: 1 }).into();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(error_of(&resp).user_fixable);
    }

    #[test]
    fn upstream_message_passes_through_unmodified() {
        let resp: ApiResponse<()> = OcrDeskError::api(Some(403), "The API key is invalid").into();
        let err = error_of(&resp);
        assert_eq!(err.code, ErrorCode::UpstreamError);
        assert_eq!(err.message, "The API key is invalid");
        assert!(err.user_fixable);
    }

    #[test]
    fn transport_errors_are_not_user_fixable() {
        let resp: ApiResponse<()> = OcrDeskError::Transport("timed out".into()).into();
        let err = error_of(&resp);
        assert_eq!(err.code, ErrorCode::UpstreamTimeout);
        assert!(!err.user_fixable);
    }

    #[test]
    fn internal_does_not_leak() {
        let resp: ApiResponse<()> = OcrDeskError::Internal("secret debug info".into()).into();
        let err = error_of(&resp);
        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(err.message, "An internal error occurred");
    }

    #[test]
    fn unavailable_maps_to_503() {
        let resp: ApiResponse<()> = OcrDeskError::OcrUnavailable("no key".into()).into();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
