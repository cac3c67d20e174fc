use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::ocr::OcrResult;
use crate::structure::TextBlock;

pub const PREVIEW_CHARS: usize = 200;

/// One successful extraction kept for the lifetime of its session.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub file_name: String,
    pub language: String,
    pub processing_ms: u64,
    pub preview: String,
    pub share_id: String,
    pub share_url: String,
    pub result: Arc<OcrResult>,
    pub blocks: Arc<[TextBlock]>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryOrder {
    #[default]
    Newest,
    Oldest,
}

impl HistoryOrder {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" | "desc" => Ok(Self::Newest),
            "oldest" | "asc" => Ok(Self::Oldest),
            other => Err(ValidationError::InvalidSetting(format!(
                "history order must be 'newest' or 'oldest', got '{other}'"
            ))),
        }
    }
}

/// Bounded, append-only log of a session's extractions. Appending past the
/// limit drops the oldest entry.
#[derive(Debug)]
pub struct SessionHistory {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl SessionHistory {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Returns the entries evicted to stay within the limit.
    pub fn append(&mut self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        self.entries.push_back(entry);
        let mut evicted = Vec::new();
        while self.entries.len() > self.limit {
            if let Some(oldest) = self.entries.pop_front() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn list(&self, order: HistoryOrder) -> Vec<&HistoryEntry> {
        match order {
            HistoryOrder::Oldest => self.entries.iter().collect(),
            HistoryOrder::Newest => self.entries.iter().rev().collect(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<HistoryEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// First [`PREVIEW_CHARS`] characters, with an ellipsis when cut.
pub fn make_preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
