//! The single page, embedded into the binary.

use axum::body::Body;
use axum::extract::Path;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "frontend/"]
struct PageAssets;

const INDEX: &str = "index.html";

pub async fn serve_root() -> Response {
    serve_asset(INDEX)
}

pub async fn serve_path(Path(path): Path<String>) -> Response {
    let requested = path.trim_start_matches('/');
    if requested.is_empty() {
        return serve_asset(INDEX);
    }
    if requested.contains("..") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    // unmatched API paths must not turn into the page
    if requested.starts_with("api/") {
        return StatusCode::NOT_FOUND.into_response();
    }
    serve_asset(requested)
}

fn serve_asset(path: &str) -> Response {
    asset_response(path).unwrap_or_else(|| StatusCode::NOT_FOUND.into_response())
}

fn asset_response(path: &str) -> Option<Response> {
    let file = PageAssets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let mut response = Response::new(Body::from(file.data.into_owned()));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.as_ref()).ok()?,
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Some(response)
}
