use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lru::LruCache;
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;

use super::history::{HistoryEntry, SessionHistory};

/// Everything one user accumulates: extraction history and the share links
/// pointing into it. Nothing here is visible to other sessions.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    history: SessionHistory,
    shares: HashMap<String, Uuid>,
}

impl Session {
    pub fn new(history_limit: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            history: SessionHistory::new(history_limit),
            shares: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn has_share(&self, share_id: &str) -> bool {
        self.shares.contains_key(share_id)
    }

    /// Appends to history and registers the entry's share id. Shares of
    /// entries pushed out by the history limit go with them.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.shares.insert(entry.share_id.clone(), entry.id);
        for evicted in self.history.append(entry) {
            self.shares.remove(&evicted.share_id);
        }
    }

    pub fn remove_entry(&mut self, id: Uuid) -> Option<HistoryEntry> {
        let entry = self.history.remove(id)?;
        self.shares.remove(&entry.share_id);
        Some(entry)
    }

    pub fn resolve_share(&self, share_id: &str) -> Option<&HistoryEntry> {
        let entry_id = self.shares.get(share_id)?;
        self.history.get(*entry_id)
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.shares.clear();
    }
}

pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

struct Slot {
    session: SessionHandle,
    last_seen: Instant,
}

/// Registry of live sessions. Bounded by `max_active` with least-recently
/// used eviction; idle sessions are removed by [`SessionStore::sweep_expired`].
pub struct SessionStore {
    slots: Mutex<LruCache<Uuid, Slot>>,
    history_limit: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_active).unwrap_or(NonZeroUsize::MIN);
        Self {
            slots: Mutex::new(LruCache::new(capacity)),
            history_limit: config.history_limit,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, LruCache<Uuid, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(&self) -> (Uuid, SessionHandle) {
        let session = Session::new(self.history_limit);
        let id = session.id();
        let handle = Arc::new(tokio::sync::Mutex::new(session));

        let evicted = self.slots().push(
            id,
            Slot {
                session: handle.clone(),
                last_seen: Instant::now(),
            },
        );
        if let Some((evicted_id, slot)) = evicted {
            debug!(session_id = %evicted_id, "Evicting least recently used session");
            clear_slot(slot);
        }

        (id, handle)
    }

    /// Looks up a session and marks it as used.
    pub fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let mut slots = self.slots();
        let slot = slots.get_mut(&id)?;
        slot.last_seen = Instant::now();
        Some(slot.session.clone())
    }

    /// Removes a session and clears its data. Returns false if it was unknown.
    pub fn end(&self, id: Uuid) -> bool {
        let removed = self.slots().pop(&id);
        match removed {
            Some(slot) => {
                clear_slot(slot);
                true
            }
            None => false,
        }
    }

    /// Drops every session idle for longer than the configured timeout.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_idle_since(Instant::now())
    }

    fn sweep_idle_since(&self, now: Instant) -> usize {
        let mut slots = self.slots();
        let expired: Vec<Uuid> = slots
            .iter()
            .filter(|(_, slot)| now.saturating_duration_since(slot.last_seen) > self.idle_timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(slot) = slots.pop(id) {
                debug!(session_id = %id, "Session expired");
                clear_slot(slot);
            }
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A request may still hold the session; in that case its data is freed
/// when the last handle drops.
fn clear_slot(slot: Slot) {
    if let Ok(mut session) = slot.session.try_lock() {
        session.clear();
    }
}
