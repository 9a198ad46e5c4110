//! Local note cache: the last successfully fetched listing, used as the
//! offline fallback view.

use std::sync::Arc;

use crate::models::Note;
use crate::storage::{KeyValueStore, NOTES_CACHE_KEY};

pub struct NoteCache<K> {
    store: Arc<K>,
}

impl<K: KeyValueStore> NoteCache<K> {
    pub const fn new(store: Arc<K>) -> Self {
        Self { store }
    }

    /// Persist a snapshot of the note list; failures are logged and ignored
    pub async fn save(&self, notes: &[Note]) {
        let serialized = match serde_json::to_string(notes) {
            Ok(serialized) => serialized,
            Err(error) => {
                tracing::warn!("Failed to serialize note cache: {error}");
                return;
            }
        };

        if let Err(error) = self.store.set(NOTES_CACHE_KEY, &serialized).await {
            tracing::warn!("Failed to write note cache: {error}");
        }
    }

    /// The cached listing, or `None` when nothing usable is stored
    pub async fn load(&self) -> Option<Vec<Note>> {
        let raw = match self.store.get(NOTES_CACHE_KEY).await {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!("Failed to read note cache: {error}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(notes) => Some(notes),
            Err(error) => {
                tracing::warn!("Ignoring unreadable note cache: {error}");
                None
            }
        }
    }

    pub async fn clear(&self) {
        if let Err(error) = self.store.remove(&[NOTES_CACHE_KEY]).await {
            tracing::warn!("Failed to clear note cache: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteId, NotePayload};
    use crate::storage::SqliteKeyValueStore;
    use crate::testing::FailingStore;
    use pretty_assertions::assert_eq;

    fn note(id: &str) -> Note {
        Note::from_draft(NoteId::new(id), "owner", NotePayload::new(id, "body"))
    }

    #[tokio::test]
    async fn save_then_load_returns_snapshot() {
        let cache = NoteCache::new(Arc::new(SqliteKeyValueStore::open_in_memory().unwrap()));
        assert_eq!(cache.load().await, None);

        let notes = vec![note("a"), note("b")];
        cache.save(&notes).await;
        assert_eq!(cache.load().await, Some(notes));

        cache.clear().await;
        assert_eq!(cache.load().await, None);
    }

    #[tokio::test]
    async fn empty_snapshot_is_distinct_from_missing() {
        let cache = NoteCache::new(Arc::new(SqliteKeyValueStore::open_in_memory().unwrap()));
        cache.save(&[]).await;
        assert_eq!(cache.load().await, Some(Vec::new()));
    }

    #[tokio::test]
    async fn corrupt_or_unreadable_cache_loads_as_none() {
        let store = Arc::new(SqliteKeyValueStore::open_in_memory().unwrap());
        store.set(NOTES_CACHE_KEY, "[{broken").await.unwrap();
        assert_eq!(NoteCache::new(store).load().await, None);

        let failing = NoteCache::new(Arc::new(FailingStore));
        failing.save(&[note("a")]).await;
        assert_eq!(failing.load().await, None);
    }
}
