//! Per-user state: extraction history, share links and the registry that
//! keeps sessions apart. Nothing is persisted; ending or expiring a session
//! discards everything it held.

mod history;
mod share;
mod store;

pub use history::{make_preview, HistoryEntry, HistoryOrder, SessionHistory, PREVIEW_CHARS};
pub use share::{share_id, share_url};
pub use store::{Session, SessionHandle, SessionStore};
