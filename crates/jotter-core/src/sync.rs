//! Synchronizer: replays the pending operation queue against the backend.
//!
//! A pass is strictly sequential. Operation N+1 is dispatched only once the
//! outcome of operation N is known, so an `UPDATE` queued after a `CREATE` on
//! the same placeholder always sees the confirmed note id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::api::NotesApi;
use crate::models::{Note, NoteId, OperationIntent, PendingOperation};
use crate::queue::RetryStatus;
use crate::state::ClientStore;
use crate::storage::KeyValueStore;

/// Outcome counters for one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Operations dispatched to the backend
    pub attempted: usize,
    /// Confirmed and removed from the queue
    pub replayed: usize,
    /// Failed and kept for a later pass
    pub retried: usize,
    /// Failed at the retry ceiling and discarded
    pub dropped: usize,
    /// Left untouched because they target a note whose `CREATE` is still queued
    pub deferred: usize,
    /// The pass stopped at an authentication failure
    pub halted_on_auth: bool,
}

impl SyncReport {
    pub const fn ran(&self) -> bool {
        self.attempted > 0 || self.deferred > 0 || self.dropped > 0
    }
}

pub struct Synchronizer<A> {
    api: Arc<A>,
}

impl<A: NotesApi> Synchronizer<A> {
    pub const fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Run one reconciliation pass over the pending queue.
    ///
    /// Does nothing but refresh the pending count while offline or signed out.
    pub async fn run<K: KeyValueStore>(&self, store: &ClientStore<K>) -> SyncReport {
        let mut report = SyncReport::default();

        let token = store.token();
        if store.is_offline() || token.is_none() {
            tracing::debug!("Skipping sync pass: offline or signed out");
            store.update_pending_operations_count().await;
            return report;
        }

        let operations = store.queue().get_all().await;
        if operations.is_empty() {
            store.update_pending_operations_count().await;
            return report;
        }

        store.set_loading(true);
        tracing::info!("Replaying {} pending operations", operations.len());

        let mut confirmed_ids: HashMap<NoteId, NoteId> = HashMap::new();
        let mut unconfirmed_creates: HashSet<NoteId> = HashSet::new();
        let mut queued_creates: HashSet<NoteId> = operations
            .iter()
            .filter(|operation| matches!(operation.intent, OperationIntent::Create { .. }))
            .filter_map(|operation| operation.note_id.clone())
            .collect();

        for mut operation in operations {
            if let Some((placeholder, confirmed)) = operation
                .note_id
                .as_ref()
                .and_then(|note_id| confirmed_ids.get_key_value(note_id))
            {
                operation.retarget(placeholder, confirmed);
            }

            if is_orphaned(&operation, &queued_creates) {
                tracing::warn!(
                    "Dropping {} {}: its note was never created",
                    operation.kind(),
                    operation.endpoint
                );
                store.queue().remove(operation.id).await;
                report.dropped += 1;
                continue;
            }

            if depends_on_unconfirmed_create(&operation, &unconfirmed_creates) {
                tracing::debug!(
                    "Deferring {} {} until its note is created",
                    operation.kind(),
                    operation.endpoint
                );
                report.deferred += 1;
                continue;
            }

            report.attempted += 1;
            match self.api.replay(token.as_deref(), &operation).await {
                Ok(note) => {
                    tracing::debug!(
                        "Replayed {} {} {}",
                        operation.kind(),
                        operation.method,
                        operation.endpoint
                    );
                    report.replayed += 1;
                    store.queue().remove(operation.id).await;
                    merge_result(store, &operation, note, &mut confirmed_ids).await;
                }
                Err(error) if error.is_auth_failure() => {
                    tracing::warn!(
                        "Sync halted at {} {}: {error}",
                        operation.kind(),
                        operation.endpoint
                    );
                    report.halted_on_auth = true;
                    break;
                }
                Err(error) => {
                    tracing::warn!(
                        "Replay of {} {} failed: {error}",
                        operation.kind(),
                        operation.endpoint
                    );
                    let status = store.queue().mark_failed(operation.id).await;
                    let placeholder = match (&operation.intent, &operation.note_id) {
                        (OperationIntent::Create { .. }, Some(placeholder)) => Some(placeholder),
                        _ => None,
                    };
                    match status {
                        RetryStatus::Dropped => {
                            report.dropped += 1;
                            if let Some(placeholder) = placeholder {
                                queued_creates.remove(placeholder);
                                store.delete_note(placeholder);
                            }
                        }
                        RetryStatus::Retrying { .. } | RetryStatus::NotQueued => {
                            report.retried += 1;
                            if let Some(placeholder) = placeholder {
                                unconfirmed_creates.insert(placeholder.clone());
                            }
                        }
                    }
                }
            }
        }

        store.save_notes_to_cache().await;
        store.update_pending_operations_count().await;
        store.set_loading(false);

        tracing::info!(
            "Sync pass finished: {} replayed, {} retried, {} dropped, {} deferred",
            report.replayed,
            report.retried,
            report.dropped,
            report.deferred
        );
        report
    }
}

/// A follow-up edit of a local placeholder whose `CREATE` is no longer queued
fn is_orphaned(operation: &PendingOperation, queued_creates: &HashSet<NoteId>) -> bool {
    !matches!(operation.intent, OperationIntent::Create { .. })
        && operation
            .note_id
            .as_ref()
            .is_some_and(|note_id| note_id.is_temporary() && !queued_creates.contains(note_id))
}

fn depends_on_unconfirmed_create(
    operation: &PendingOperation,
    unconfirmed_creates: &HashSet<NoteId>,
) -> bool {
    !matches!(operation.intent, OperationIntent::Create { .. })
        && operation
            .note_id
            .as_ref()
            .is_some_and(|note_id| unconfirmed_creates.contains(note_id))
}

async fn merge_result<K: KeyValueStore>(
    store: &ClientStore<K>,
    operation: &PendingOperation,
    note: Option<Note>,
    confirmed_ids: &mut HashMap<NoteId, NoteId>,
) {
    match (&operation.intent, note) {
        (OperationIntent::Create { .. }, Some(note)) => {
            let Some(placeholder) = &operation.note_id else {
                store.add_note(note);
                return;
            };
            if placeholder != &note.id {
                let rewritten = store.queue().rewrite_note_id(placeholder, &note.id).await;
                tracing::debug!(
                    "Note {placeholder} confirmed as {}; {rewritten} queued operations retargeted",
                    note.id
                );
                confirmed_ids.insert(placeholder.clone(), note.id.clone());
            }
            store.replace_note(placeholder, note);
        }
        (OperationIntent::Update { .. }, Some(note)) => store.update_note(note),
        (OperationIntent::Delete, _) => {
            if let Some(note_id) = &operation.note_id {
                store.delete_note(note_id);
            }
        }
        (_, None) => {}
    }
}
