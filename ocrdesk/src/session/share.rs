use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// `<unix-seconds>_<first 8 hex digits of SHA-256(text, language, seconds)>`
pub fn share_id(text: &str, language: &str, at: DateTime<Utc>) -> String {
    let seconds = at.timestamp();
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(language.as_bytes());
    hasher.update(seconds.to_string().as_bytes());
    let digest = hasher.finalize();
    let short: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("{seconds}_{short}")
}

pub fn share_url(public_url: &str, id: &str) -> String {
    format!("{}/?share={id}", public_url.trim_end_matches('/'))
}
