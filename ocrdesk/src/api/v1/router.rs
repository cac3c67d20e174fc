use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    let history = Router::new()
        .route(
            "/",
            get(handlers::history::list_history).delete(handlers::history::clear_history),
        )
        .route(
            "/{entryId}",
            get(handlers::history::get_entry).delete(handlers::history::delete_entry),
        )
        .route("/{entryId}/export", get(handlers::history::export_entry));

    let session = Router::new()
        .route("/", delete(handlers::sessions::end_session))
        .route("/preview", post(handlers::extractions::preview_image))
        .route("/extractions", post(handlers::extractions::create_extraction))
        .route("/shares/{shareId}", get(handlers::history::resolve_share))
        .nest("/history", history);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/languages", get(handlers::languages::list_languages))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .route("/sessions", post(handlers::sessions::create_session))
        .nest("/sessions/{sessionId}", session)
}
