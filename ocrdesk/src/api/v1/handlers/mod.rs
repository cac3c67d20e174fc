pub mod extractions;
pub mod health;
pub mod history;
pub mod languages;
pub mod sessions;

pub use health::health_check;

use uuid::Uuid;

use crate::api::AppState;
use crate::error::{OcrDeskError, Result};
use crate::session::SessionHandle;

/// Unknown and malformed ids are both reported as not found.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| OcrDeskError::NotFound(format!("{what} {raw} not found")))
}

pub(crate) fn find_session(state: &AppState, raw_id: &str) -> Result<SessionHandle> {
    let id = parse_id(raw_id, "Session")?;
    state
        .sessions
        .get(id)
        .ok_or_else(|| OcrDeskError::NotFound(format!("Session {id} not found")))
}
