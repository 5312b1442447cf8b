//! Per-session single-slot clipboard store

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local};

use crate::domain::paste::{MimeType, PasteData};
use crate::domain::session::{Caller, SessionKey};

/// Current clipboard of one session
#[derive(Debug, Clone)]
struct StoreEntry {
    data: PasteData,
    owner: Caller,
    stored_at: DateTime<Local>,
}

/// Read-only view of one stored entry, for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySummary {
    pub session: SessionKey,
    pub owner: Caller,
    pub stored_at: DateTime<Local>,
    pub record_count: usize,
    pub mime_types: Vec<MimeType>,
}

/// Holds at most one `PasteData` per session.
///
/// The lock is held only for the map operation itself. Callers notify
/// observers after these methods return.
#[derive(Debug, Default)]
pub struct ClipboardStore {
    entries: Mutex<BTreeMap<SessionKey, StoreEntry>>,
}

impl ClipboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SessionKey, StoreEntry>> {
        // A panicked writer cannot leave a half-replaced entry behind
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the session's clipboard. The previous value is dropped.
    pub fn set(&self, session: SessionKey, owner: Caller, data: PasteData) {
        let entry = StoreEntry {
            data,
            owner,
            stored_at: Local::now(),
        };
        self.lock().insert(session, entry);
    }

    /// Snapshot of the session's clipboard
    pub fn get(&self, session: SessionKey) -> Option<PasteData> {
        self.lock().get(&session).map(|entry| entry.data.clone())
    }

    pub fn has(&self, session: SessionKey) -> bool {
        self.lock().contains_key(&session)
    }

    /// Remove the session's clipboard. Returns whether anything was removed.
    pub fn clear(&self, session: SessionKey) -> bool {
        self.lock().remove(&session).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Summaries of every stored entry, ordered by session
    pub fn snapshot(&self) -> Vec<EntrySummary> {
        self.lock()
            .iter()
            .map(|(session, entry)| EntrySummary {
                session: *session,
                owner: entry.owner,
                stored_at: entry.stored_at,
                record_count: entry.data.record_count(),
                mime_types: entry.data.mime_types(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn caller() -> Caller {
        Caller::new(1000, Some(42))
    }

    #[test]
    fn set_then_get_returns_same_data() {
        let store = ClipboardStore::new();
        let session = SessionKey::new(7);
        let data = PasteData::html("<b>x</b>");

        store.set(session, caller(), data.clone());

        assert!(store.has(session));
        assert_eq!(store.get(session), Some(data));
    }

    #[test]
    fn set_replaces_previous_data() {
        let store = ClipboardStore::new();
        let session = SessionKey::new(7);

        store.set(session, caller(), PasteData::plain_text("first"));
        store.set(session, caller(), PasteData::plain_text("second"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(session), Some(PasteData::plain_text("second")));
    }

    #[test]
    fn clear_reports_removal() {
        let store = ClipboardStore::new();
        let session = SessionKey::new(7);

        assert!(!store.clear(session));
        store.set(session, caller(), PasteData::plain_text("hi"));
        assert!(store.clear(session));
        assert!(!store.has(session));
        assert!(store.get(session).is_none());
    }

    #[test]
    fn empty_data_is_distinct_from_cleared() {
        let store = ClipboardStore::new();
        let session = SessionKey::new(3);

        store.set(session, caller(), PasteData::new());

        assert!(store.has(session));
        assert_eq!(store.get(session).map(|d| d.record_count()), Some(0));
    }

    #[test]
    fn sessions_are_isolated() {
        let store = ClipboardStore::new();
        store.set(SessionKey::new(1), caller(), PasteData::plain_text("one"));

        assert!(!store.has(SessionKey::new(2)));
        assert!(store.clear(SessionKey::new(1)));
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_lists_entries() {
        let store = ClipboardStore::new();
        let mut data = PasteData::html("<p>a</p>");
        data.add_text_record("a");
        data.add_text_record("b");
        store.set(SessionKey::new(5), caller(), data);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].session, SessionKey::new(5));
        assert_eq!(snapshot[0].record_count, 3);
        assert_eq!(snapshot[0].mime_types.len(), 2);
        assert_eq!(snapshot[0].owner.uid, 1000);
    }

    #[test]
    fn concurrent_writers_leave_one_entry() {
        let store = Arc::new(ClipboardStore::new());
        let session = SessionKey::new(9);

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.set(session, caller(), PasteData::plain_text(format!("{n}-{i}")));
                        let _ = store.get(session);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1);
        assert!(store.get(session).is_some());
    }
}
