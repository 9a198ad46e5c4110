//! Client state store.
//!
//! One [`ClientStore`] per running client holds the in-memory [`ClientState`]
//! and the durable stores behind it. State lives in a `watch` channel: UI
//! layers call [`ClientStore::subscribe`] and re-render on every change, and
//! all mutation goes through the named actions below.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::cache::NoteCache;
use crate::error::Result;
use crate::models::{Note, NoteId, User};
use crate::queue::OperationQueue;
use crate::session::{Session, SessionStore};
use crate::storage::KeyValueStore;

/// Client-local belief about backend reachability
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

impl Connectivity {
    pub const fn from_offline_flag(is_offline: bool) -> Self {
        if is_offline {
            Self::Offline
        } else {
            Self::Online
        }
    }
}

/// Snapshot of everything the UI renders
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    pub user: Option<User>,
    pub token: Option<String>,
    /// Most recently added first
    pub notes: Vec<Note>,
    pub is_offline: bool,
    pub is_loading: bool,
    pub pending_operations_count: usize,
    /// `notes` holds a search or visibility subset, which is never cached
    pub is_filtered: bool,
}

impl ClientState {
    pub const fn connectivity(&self) -> Connectivity {
        Connectivity::from_offline_flag(self.is_offline)
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| &note.id == id)
    }
}

impl fmt::Debug for ClientState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientState")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("notes", &self.notes.len())
            .field("is_offline", &self.is_offline)
            .field("is_loading", &self.is_loading)
            .field("pending_operations_count", &self.pending_operations_count)
            .field("is_filtered", &self.is_filtered)
            .finish()
    }
}

/// Explicit state container passed to every component that needs it
pub struct ClientStore<K> {
    state: watch::Sender<ClientState>,
    queue: OperationQueue<K>,
    cache: NoteCache<K>,
    session: SessionStore<K>,
}

impl<K: KeyValueStore> ClientStore<K> {
    pub fn new(store: Arc<K>) -> Self {
        let (state, _) = watch::channel(ClientState::default());
        Self {
            state,
            queue: OperationQueue::new(store.clone()),
            cache: NoteCache::new(store.clone()),
            session: SessionStore::new(store),
        }
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.borrow().clone()
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.state.borrow().notes.clone()
    }

    pub fn note(&self, id: &NoteId) -> Option<Note> {
        self.state.borrow().note(id).cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_offline(&self) -> bool {
        self.state.borrow().is_offline
    }

    pub fn connectivity(&self) -> Connectivity {
        self.state.borrow().connectivity()
    }

    pub const fn queue(&self) -> &OperationQueue<K> {
        &self.queue
    }

    pub fn set_notes(&self, notes: Vec<Note>) {
        self.state.send_modify(|state| state.notes = notes);
    }

    /// Replace the note list with a listing, remembering whether it is a
    /// filtered subset
    pub fn set_listing(&self, notes: Vec<Note>, is_filtered: bool) {
        self.state.send_modify(|state| {
            state.notes = notes;
            state.is_filtered = is_filtered;
        });
    }

    /// Prepend a note
    pub fn add_note(&self, note: Note) {
        self.state.send_modify(|state| state.notes.insert(0, note));
    }

    /// Replace the note with the same id; unknown ids are ignored
    pub fn update_note(&self, note: Note) {
        self.state.send_if_modified(|state| {
            let Some(existing) = state.notes.iter_mut().find(|existing| existing.id == note.id)
            else {
                return false;
            };
            *existing = note;
            true
        });
    }

    /// Swap the note stored under `previous_id` (typically a temporary
    /// placeholder) for `note` in place.
    ///
    /// A placeholder that is no longer listed was deleted locally, so nothing
    /// is inserted. Returns whether a note was replaced.
    pub fn replace_note(&self, previous_id: &NoteId, note: Note) -> bool {
        self.state.send_if_modified(|state| {
            let Some(existing) = state
                .notes
                .iter_mut()
                .find(|existing| &existing.id == previous_id)
            else {
                return false;
            };
            *existing = note;
            true
        })
    }

    pub fn delete_note(&self, id: &NoteId) {
        self.state.send_if_modified(|state| {
            let before = state.notes.len();
            state.notes.retain(|note| &note.id != id);
            state.notes.len() != before
        });
    }

    /// Set the offline flag, returning the previous value
    pub fn set_offline(&self, is_offline: bool) -> bool {
        let mut previous = is_offline;
        self.state.send_if_modified(|state| {
            previous = state.is_offline;
            if previous == is_offline {
                return false;
            }
            state.is_offline = is_offline;
            true
        });

        if previous != is_offline {
            tracing::info!(
                "Connectivity changed: {:?}",
                Connectivity::from_offline_flag(is_offline)
            );
        }
        previous
    }

    pub fn set_loading(&self, is_loading: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.is_loading != is_loading;
            state.is_loading = is_loading;
            changed
        });
    }

    /// Persist the current note list as the offline fallback.
    ///
    /// Filtered listings are skipped so the cache always holds every note.
    pub async fn save_notes_to_cache(&self) {
        let (notes, is_filtered) = {
            let state = self.state.borrow();
            (state.notes.clone(), state.is_filtered)
        };
        if is_filtered {
            tracing::debug!("Not caching a filtered listing of {} notes", notes.len());
            return;
        }
        self.cache.save(&notes).await;
    }

    /// Replace the note list with the cached listing, if any
    pub async fn load_notes_from_cache(&self) {
        if let Some(notes) = self.cache.load().await {
            tracing::debug!("Loaded {} notes from cache", notes.len());
            self.set_listing(notes, false);
        }
    }

    pub async fn update_pending_operations_count(&self) {
        let count = self.queue.len().await;
        self.state.send_if_modified(|state| {
            let changed = state.pending_operations_count != count;
            state.pending_operations_count = count;
            changed
        });
    }

    /// Store a freshly established session
    pub async fn set_auth(&self, user: User, token: String) -> Result<()> {
        let session = Session { user, token };
        self.session.save(&session).await?;
        self.state.send_modify(|state| {
            state.user = Some(session.user);
            state.token = Some(session.token);
        });
        Ok(())
    }

    /// Restore the persisted session; returns whether one was found
    pub async fn load_auth(&self) -> bool {
        match self.session.load().await {
            Ok(Some(session)) => {
                self.state.send_modify(|state| {
                    state.user = Some(session.user);
                    state.token = Some(session.token);
                });
                true
            }
            Ok(None) => false,
            Err(error) => {
                tracing::warn!("Failed to restore session: {error}");
                false
            }
        }
    }

    /// Reset client state and wipe the session, cache and pending queue
    pub async fn logout(&self) {
        self.state.send_modify(|state| {
            state.user = None;
            state.token = None;
            state.notes.clear();
            state.is_filtered = false;
            state.is_loading = false;
            state.pending_operations_count = 0;
        });

        if let Err(error) = self.session.clear().await {
            tracing::warn!("Failed to clear stored session: {error}");
        }
        self.cache.clear().await;
        self.queue.clear().await;
        tracing::info!("Signed out; local notes and pending operations cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotePayload, OperationRequest};
    use crate::storage::SqliteKeyValueStore;
    use pretty_assertions::assert_eq;

    fn store() -> ClientStore<SqliteKeyValueStore> {
        ClientStore::new(Arc::new(SqliteKeyValueStore::open_in_memory().unwrap()))
    }

    fn note(id: &str, title: &str) -> Note {
        Note::from_draft(NoteId::new(id), "owner", NotePayload::new(title, "body"))
    }

    fn ids(store: &ClientStore<SqliteKeyValueStore>) -> Vec<String> {
        store
            .notes()
            .into_iter()
            .map(|note| note.id.to_string())
            .collect()
    }

    #[test]
    fn initial_state_is_empty_and_online() {
        let state = store().snapshot();
        assert_eq!(state.user, None);
        assert_eq!(state.token, None);
        assert!(state.notes.is_empty());
        assert!(!state.is_offline);
        assert!(!state.is_loading);
        assert_eq!(state.connectivity(), Connectivity::Online);
    }

    #[test]
    fn note_actions_follow_list_conventions() {
        let store = store();
        store.add_note(note("a", "A"));
        store.add_note(note("b", "B"));
        assert_eq!(ids(&store), vec!["b", "a"]);

        store.update_note(note("a", "A2"));
        assert_eq!(store.note(&NoteId::new("a")).unwrap().title, "A2");

        store.update_note(note("missing", "X"));
        assert_eq!(ids(&store), vec!["b", "a"]);

        store.delete_note(&NoteId::new("b"));
        assert_eq!(ids(&store), vec!["a"]);
    }

    #[test]
    fn replace_note_swaps_placeholder_in_place() {
        let store = store();
        let temp = NoteId::temporary();
        store.add_note(note("a", "A"));
        store.add_note(Note::from_draft(
            temp.clone(),
            "",
            NotePayload::new("Draft", ""),
        ));
        store.add_note(note("c", "C"));

        assert!(store.replace_note(&temp, note("srv-1", "Draft")));
        assert_eq!(ids(&store), vec!["c", "srv-1", "a"]);
    }

    #[test]
    fn replace_note_ignores_missing_placeholder() {
        let store = store();
        store.add_note(note("a", "A"));

        assert!(!store.replace_note(&NoteId::temporary(), note("srv-2", "Other")));
        assert_eq!(ids(&store), vec!["a"]);
    }

    #[test]
    fn set_offline_reports_previous_value() {
        let store = store();
        assert!(!store.set_offline(true));
        assert!(store.set_offline(true));
        assert!(store.set_offline(false));
        assert_eq!(store.connectivity(), Connectivity::Online);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let store = store();
        let mut receiver = store.subscribe();

        store.set_loading(true);
        receiver.changed().await.unwrap();
        assert!(receiver.borrow_and_update().is_loading);

        store.set_loading(true);
        assert!(!receiver.has_changed().unwrap());
    }

    #[tokio::test]
    async fn cache_roundtrip_through_actions() {
        let store = store();
        store.set_notes(vec![note("a", "A"), note("b", "B")]);
        store.save_notes_to_cache().await;

        store.set_notes(Vec::new());
        store.load_notes_from_cache().await;
        assert_eq!(ids(&store), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn pending_count_tracks_queue() {
        let store = store();
        store
            .queue()
            .enqueue(OperationRequest::delete(NoteId::new("a")))
            .await
            .unwrap();
        store.update_pending_operations_count().await;
        assert_eq!(store.snapshot().pending_operations_count, 1);
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let kv = Arc::new(SqliteKeyValueStore::open_in_memory().unwrap());
        let store = ClientStore::new(kv.clone());
        store
            .set_auth(
                User {
                    id: "u-1".to_string(),
                    email: "ada@example.com".to_string(),
                },
                "token".to_string(),
            )
            .await
            .unwrap();
        store.set_notes(vec![note("a", "A")]);
        store.save_notes_to_cache().await;
        store
            .queue()
            .enqueue(OperationRequest::delete(NoteId::new("a")))
            .await
            .unwrap();
        store.update_pending_operations_count().await;

        store.logout().await;

        let state = store.snapshot();
        assert_eq!(state.token, None);
        assert_eq!(state.user, None);
        assert!(state.notes.is_empty());
        assert_eq!(state.pending_operations_count, 0);
        assert!(store.queue().is_empty().await);

        let fresh = ClientStore::new(kv);
        assert!(!fresh.load_auth().await);
        fresh.load_notes_from_cache().await;
        assert!(fresh.notes().is_empty());
    }

    #[tokio::test]
    async fn load_auth_restores_persisted_session() {
        let kv = Arc::new(SqliteKeyValueStore::open_in_memory().unwrap());
        ClientStore::new(kv.clone())
            .set_auth(
                User {
                    id: "u-1".to_string(),
                    email: "ada@example.com".to_string(),
                },
                "token".to_string(),
            )
            .await
            .unwrap();

        let restored = ClientStore::new(kv);
        assert!(restored.load_auth().await);
        assert_eq!(restored.token().as_deref(), Some("token"));
        assert_eq!(restored.user().unwrap().id, "u-1");
    }

    #[tokio::test]
    async fn filtered_listing_is_not_cached() {
        let store = store();
        store.set_listing(vec![note("a", "A"), note("b", "B")], false);
        store.save_notes_to_cache().await;

        store.set_listing(vec![note("b", "B")], true);
        store.save_notes_to_cache().await;

        store.load_notes_from_cache().await;
        assert_eq!(ids(&store), vec!["a", "b"]);
        assert!(!store.snapshot().is_filtered);
    }
}
