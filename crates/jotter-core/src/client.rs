//! Connectivity-aware notes client.
//!
//! [`NotesClient`] decides online vs. offline from the outcome of each
//! listing fetch, routes mutations either straight to the backend or through
//! the pending queue, and triggers a sync pass when connectivity returns.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, HttpNotesApi, NotesApi};
use crate::error::Error;
use crate::models::{
    Note, NoteId, NotePayload, NoteQuery, OperationIntent, OperationRequest, PendingOperation,
};
use crate::state::ClientStore;
use crate::storage::KeyValueStore;
use crate::sync::{SyncReport, Synchronizer};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Session expired; sign in again")]
    SessionExpired,
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Note not found: {0}")]
    NoteNotFound(NoteId),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Local(#[from] Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Where the current note list came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Fetched from the backend; `synced` is set when a sync pass ran
    Remote {
        page: u32,
        total_pages: u32,
        synced: Option<SyncReport>,
    },
    /// Backend unreachable; notes restored from the local cache
    Cached { notes: usize },
}

impl LoadOutcome {
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Confirmed by the backend
    Saved(Note),
    /// Applied locally and queued for the next sync pass
    Queued(Note),
}

impl SaveOutcome {
    pub const fn note(&self) -> &Note {
        match self {
            Self::Saved(note) | Self::Queued(note) => note,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Queued,
}

pub struct NotesClient<A, K> {
    api: Arc<A>,
    store: ClientStore<K>,
    synchronizer: Synchronizer<A>,
}

impl<A: NotesApi, K: KeyValueStore> NotesClient<A, K> {
    pub fn new(api: Arc<A>, storage: Arc<K>) -> Self {
        Self {
            synchronizer: Synchronizer::new(api.clone()),
            store: ClientStore::new(storage),
            api,
        }
    }

    pub const fn store(&self) -> &ClientStore<K> {
        &self.store
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Restore the persisted session and pending count; returns whether signed in
    pub async fn restore_session(&self) -> bool {
        let restored = self.store.load_auth().await;
        self.store.update_pending_operations_count().await;
        restored
    }

    /// Fetch the listing and decide connectivity from the outcome.
    ///
    /// Success marks the client online, overlays queued intents on the page,
    /// caches it, and runs a sync pass if the client was offline before.
    /// Auth failures end the session. Any other failure marks the client
    /// offline and falls back to the cached listing, filtered locally.
    /// Filtered pages are never written to the cache.
    pub async fn load_notes(&self, query: &NoteQuery) -> ClientResult<LoadOutcome> {
        let token = self.store.token();
        self.store.set_loading(true);
        let result = self.api.list_notes(token.as_deref(), query).await;
        self.store.set_loading(false);

        match result {
            Ok(page) => {
                let was_offline = self.store.set_offline(false);
                let pending = self.store.queue().get_all().await;
                let owner_id = self.owner_id();
                self.store.set_listing(
                    apply_pending(page.content, &pending, &owner_id),
                    query.is_filtered(),
                );
                self.store.save_notes_to_cache().await;

                let synced = if was_offline {
                    Some(self.sync_pending_operations().await)
                } else {
                    None
                };
                self.store.update_pending_operations_count().await;

                Ok(LoadOutcome::Remote {
                    page: page.page,
                    total_pages: page.total_pages,
                    synced,
                })
            }
            Err(error) if error.is_auth_failure() => {
                tracing::warn!("Listing rejected, ending session: {error}");
                self.store.logout().await;
                Err(ClientError::SessionExpired)
            }
            Err(error) => {
                tracing::warn!("Listing fetch failed, using cached notes: {error}");
                self.store.set_offline(true);
                self.store.load_notes_from_cache().await;
                if query.is_filtered() {
                    let notes = self.store.notes();
                    self.store.set_listing(
                        notes.into_iter().filter(|note| query.matches(note)).collect(),
                        true,
                    );
                }
                self.store.update_pending_operations_count().await;
                Ok(LoadOutcome::Cached {
                    notes: self.store.notes().len(),
                })
            }
        }
    }

    /// Reload the listing, then drain the queue if the backend is reachable
    pub async fn refresh(&self, query: &NoteQuery) -> ClientResult<LoadOutcome> {
        let outcome = self.load_notes(query).await?;
        match outcome {
            LoadOutcome::Remote {
                page,
                total_pages,
                synced: None,
            } if !self.store.is_offline() => Ok(LoadOutcome::Remote {
                page,
                total_pages,
                synced: Some(self.sync_pending_operations().await),
            }),
            other => Ok(other),
        }
    }

    /// A single note: the local list first, then the backend.
    ///
    /// Fetched notes are returned as-is and not merged into the list.
    pub async fn note(&self, note_id: &NoteId) -> ClientResult<Note> {
        if let Some(note) = self.store.note(note_id) {
            return Ok(note);
        }

        let token = self.require_session()?;
        if note_id.is_temporary() {
            return Err(ClientError::NoteNotFound(note_id.clone()));
        }

        match self.api.get_note(Some(&token), note_id).await {
            Ok(note) => Ok(note),
            Err(error) if error.is_auth_failure() => {
                tracing::warn!("Note fetch rejected, ending session: {error}");
                self.store.logout().await;
                Err(ClientError::SessionExpired)
            }
            Err(error) if error.is_not_found() => Err(ClientError::NoteNotFound(note_id.clone())),
            Err(error) => {
                if error.is_transient() {
                    self.store.set_offline(true);
                }
                Err(error.into())
            }
        }
    }

    pub async fn sync_pending_operations(&self) -> SyncReport {
        self.synchronizer.run(&self.store).await
    }

    pub async fn create_note(&self, payload: NotePayload) -> ClientResult<SaveOutcome> {
        let token = self.require_session()?;
        let payload = payload.normalized()?;

        if !self.store.is_offline() {
            match self.api.create_note(Some(&token), &payload).await {
                Ok(Some(note)) => {
                    self.store.add_note(note.clone());
                    self.store.save_notes_to_cache().await;
                    return Ok(SaveOutcome::Saved(note));
                }
                Ok(None) => {
                    return Err(ApiError::InvalidPayload(
                        "create response did not include the note".to_string(),
                    )
                    .into())
                }
                Err(error) => self.fall_back_offline(error).await?,
            }
        }

        let placeholder = NoteId::temporary();
        let note = Note::from_draft(placeholder.clone(), self.owner_id(), payload.clone());
        self.store
            .queue()
            .enqueue(OperationRequest::create(placeholder, payload))
            .await?;
        self.store.add_note(note.clone());
        self.persist_optimistic_change().await;
        Ok(SaveOutcome::Queued(note))
    }

    /// Edits of notes still waiting for their `CREATE` always go through the queue
    pub async fn update_note(
        &self,
        note_id: &NoteId,
        payload: NotePayload,
    ) -> ClientResult<SaveOutcome> {
        let token = self.require_session()?;
        let payload = payload.normalized()?;
        let existing = self.store.note(note_id);

        if !self.store.is_offline() && !note_id.is_temporary() {
            match self.api.update_note(Some(&token), note_id, &payload).await {
                Ok(returned) => {
                    let note = returned.unwrap_or_else(|| {
                        self.local_edit(note_id, existing.as_ref(), payload.clone())
                    });
                    self.store.update_note(note.clone());
                    self.store.save_notes_to_cache().await;
                    return Ok(SaveOutcome::Saved(note));
                }
                Err(error) => self.fall_back_offline(error).await?,
            }
        }

        self.store
            .queue()
            .enqueue(OperationRequest::update(note_id.clone(), payload.clone()))
            .await?;
        let note = self.local_edit(note_id, existing.as_ref(), payload);
        self.store.update_note(note.clone());
        self.persist_optimistic_change().await;
        Ok(SaveOutcome::Queued(note))
    }

    pub async fn delete_note(&self, note_id: &NoteId) -> ClientResult<DeleteOutcome> {
        let token = self.require_session()?;

        if !self.store.is_offline() && !note_id.is_temporary() {
            match self.api.delete_note(Some(&token), note_id).await {
                Ok(()) => {
                    self.store.delete_note(note_id);
                    self.store.save_notes_to_cache().await;
                    return Ok(DeleteOutcome::Deleted);
                }
                Err(error) => self.fall_back_offline(error).await?,
            }
        }

        self.store
            .queue()
            .enqueue(OperationRequest::delete(note_id.clone()))
            .await?;
        self.store.delete_note(note_id);
        self.persist_optimistic_change().await;
        Ok(DeleteOutcome::Queued)
    }

    pub async fn logout(&self) {
        self.store.logout().await;
    }

    fn require_session(&self) -> ClientResult<String> {
        self.store.token().ok_or(ClientError::NotSignedIn)
    }

    fn owner_id(&self) -> String {
        self.store.user().map(|user| user.id).unwrap_or_default()
    }

    fn local_edit(&self, note_id: &NoteId, existing: Option<&Note>, payload: NotePayload) -> Note {
        existing.map_or_else(
            || Note::from_draft(note_id.clone(), self.owner_id(), payload.clone()),
            |note| note.with_payload(payload.clone()),
        )
    }

    /// Classify a failed online mutation: auth failures end the session,
    /// unreachable backends switch to offline mode, anything else surfaces
    async fn fall_back_offline(&self, error: ApiError) -> ClientResult<()> {
        if error.is_auth_failure() {
            tracing::warn!("Mutation rejected, ending session: {error}");
            self.store.logout().await;
            return Err(ClientError::SessionExpired);
        }
        if error.is_transient() {
            tracing::warn!("Backend unreachable, queueing change: {error}");
            self.store.set_offline(true);
            return Ok(());
        }
        Err(error.into())
    }

    async fn persist_optimistic_change(&self) {
        self.store.save_notes_to_cache().await;
        self.store.update_pending_operations_count().await;
    }
}

impl<K: KeyValueStore> NotesClient<HttpNotesApi, K> {
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<()> {
        validate_credentials(email, password)?;
        let response = self.api.sign_in(email, password).await?;
        self.store
            .set_auth(response.user, response.access_token)
            .await?;
        tracing::info!("Signed in");
        Ok(())
    }

    pub async fn register(&self, email: &str, password: &str) -> ClientResult<()> {
        validate_credentials(email, password)?;
        let response = self.api.register(email, password).await?;
        self.store
            .set_auth(response.user, response.access_token)
            .await?;
        tracing::info!("Account created");
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> ClientResult<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(Error::InvalidInput("Email and password are required".to_string()).into());
    }
    Ok(())
}

/// Layer queued intents over a fetched listing so unconfirmed local changes
/// stay visible until they are replayed
pub fn apply_pending(
    mut notes: Vec<Note>,
    pending: &[PendingOperation],
    owner_id: &str,
) -> Vec<Note> {
    for operation in pending {
        let Some(note_id) = operation.note_id.as_ref() else {
            continue;
        };
        match &operation.intent {
            OperationIntent::Create { payload } => {
                if !notes.iter().any(|note| &note.id == note_id) {
                    notes.insert(
                        0,
                        Note::from_draft(note_id.clone(), owner_id, payload.clone()),
                    );
                }
            }
            OperationIntent::Update { payload } => {
                if let Some(note) = notes.iter_mut().find(|note| &note.id == note_id) {
                    *note = note.with_payload(payload.clone());
                }
            }
            OperationIntent::Delete => notes.retain(|note| &note.id != note_id),
        }
    }
    notes
}
