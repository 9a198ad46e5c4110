//! Durable FIFO queue of mutations made while offline.
//!
//! The whole queue is stored as one JSON array under [`QUEUE_KEY`]. Every
//! read-modify-write runs under an internal lock, so concurrent enqueue and
//! remove calls from the same process never lose each other's writes.
//!
//! Read failures are treated as an empty queue; use [`OperationQueue::try_get_all`]
//! when a caller needs to tell the two apart.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{NoteId, OperationId, OperationRequest, PendingOperation};
use crate::storage::{KeyValueStore, QUEUE_KEY};
use crate::util::unix_timestamp_millis;

/// Failed replays after which an operation is dropped
pub const MAX_RETRIES: u32 = 3;

/// Result of recording a failed replay attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStatus {
    /// Still queued with the given number of failed attempts
    Retrying { retries: u32 },
    /// Reached the retry ceiling and was removed
    Dropped,
    /// No operation with that id was queued
    NotQueued,
}

/// Operation Queue Manager over a durable key-value store
pub struct OperationQueue<K> {
    store: Arc<K>,
    write_lock: Mutex<()>,
}

impl<K: KeyValueStore> OperationQueue<K> {
    pub fn new(store: Arc<K>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Append an operation with a fresh id, the current time and zero retries.
    ///
    /// Fails without writing when the stored queue cannot be read, so earlier
    /// operations are never overwritten.
    pub async fn enqueue(&self, request: OperationRequest) -> Result<PendingOperation> {
        let _guard = self.write_lock.lock().await;

        let mut queue = self.try_get_all().await?;
        let operation = PendingOperation::from_request(request, unix_timestamp_millis());
        queue.push(operation.clone());
        self.write(&queue).await?;

        tracing::debug!(
            "Queued {} {} {} ({} pending)",
            operation.kind(),
            operation.method,
            operation.endpoint,
            queue.len()
        );
        Ok(operation)
    }

    /// All pending operations in enqueue order; empty when storage is unreadable
    pub async fn get_all(&self) -> Vec<PendingOperation> {
        match self.try_get_all().await {
            Ok(queue) => queue,
            Err(error) => {
                tracing::warn!("Pending operation queue unreadable, treating as empty: {error}");
                Vec::new()
            }
        }
    }

    /// All pending operations, surfacing storage and decoding errors
    pub async fn try_get_all(&self) -> Result<Vec<PendingOperation>> {
        match self.store.get(QUEUE_KEY).await? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Remove the operation with the given id; unknown ids are a no-op
    pub async fn remove(&self, id: OperationId) {
        let _guard = self.write_lock.lock().await;
        self.remove_unlocked(id).await;
    }

    /// Record a failed replay, dropping the operation at the retry ceiling
    pub async fn mark_failed(&self, id: OperationId) -> RetryStatus {
        let _guard = self.write_lock.lock().await;

        let mut queue = self.get_all().await;
        let Some(operation) = queue.iter_mut().find(|operation| operation.id == id) else {
            return RetryStatus::NotQueued;
        };

        operation.retries += 1;
        let retries = operation.retries;
        if retries >= MAX_RETRIES {
            tracing::warn!(
                "Dropping {} {} after {retries} failed attempts",
                operation.kind(),
                operation.endpoint
            );
            self.remove_unlocked(id).await;
            return RetryStatus::Dropped;
        }

        if let Err(error) = self.write(&queue).await {
            tracing::warn!("Failed to persist retry count for operation {id}: {error}");
        }
        RetryStatus::Retrying { retries }
    }

    /// Point every queued operation targeting `from` at `to`.
    ///
    /// Used once a locally created note has been confirmed by the backend.
    /// Returns how many operations were rewritten.
    pub async fn rewrite_note_id(&self, from: &NoteId, to: &NoteId) -> usize {
        let _guard = self.write_lock.lock().await;

        let mut queue = self.get_all().await;
        let rewritten = queue
            .iter_mut()
            .map(|operation| operation.retarget(from, to))
            .filter(|changed| *changed)
            .count();

        if rewritten > 0 {
            if let Err(error) = self.write(&queue).await {
                tracing::warn!("Failed to persist note id rewrite {from} -> {to}: {error}");
                return 0;
            }
        }
        rewritten
    }

    /// Delete the entire persisted queue
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(error) = self.store.remove(&[QUEUE_KEY]).await {
            tracing::warn!("Failed to clear pending operation queue: {error}");
        }
    }

    /// Number of pending operations
    pub async fn len(&self) -> usize {
        self.get_all().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn remove_unlocked(&self, id: OperationId) {
        let queue = self.get_all().await;
        let before = queue.len();
        let filtered: Vec<PendingOperation> = queue
            .into_iter()
            .filter(|operation| operation.id != id)
            .collect();
        if filtered.len() == before {
            return;
        }

        if let Err(error) = self.write(&filtered).await {
            tracing::warn!("Failed to remove operation {id} from queue: {error}");
        }
    }

    async fn write(&self, queue: &[PendingOperation]) -> Result<()> {
        let serialized = serde_json::to_string(queue)?;
        self.store.set(QUEUE_KEY, &serialized).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, NotePayload};
    use crate::storage::SqliteKeyValueStore;
    use crate::testing::{FailingStore, FlakyStore};
    use pretty_assertions::assert_eq;

    fn queue() -> OperationQueue<SqliteKeyValueStore> {
        OperationQueue::new(Arc::new(SqliteKeyValueStore::open_in_memory().unwrap()))
    }

    fn update(id: &str) -> OperationRequest {
        OperationRequest::update(NoteId::new(id), NotePayload::new("title", "body"))
    }

    #[tokio::test]
    async fn get_all_preserves_enqueue_order_with_unique_ids() {
        let queue = queue();
        let first = queue.enqueue(update("a")).await.unwrap();
        let second = queue
            .enqueue(OperationRequest::delete(NoteId::new("b")))
            .await
            .unwrap();
        let third = queue
            .enqueue(OperationRequest::create(
                NoteId::temporary(),
                NotePayload::new("new", ""),
            ))
            .await
            .unwrap();

        let all = queue.get_all().await;
        let ids: Vec<OperationId> = all.iter().map(|operation| operation.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
        assert_ne!(first.id, second.id);
        assert_ne!(second.id, third.id);
        assert!(all.iter().all(|operation| operation.retries == 0));
        assert_eq!(queue.len().await, 3);
    }

    #[tokio::test]
    async fn concurrent_enqueues_are_not_lost() {
        let queue = queue();
        let (a, b, c) = tokio::join!(
            queue.enqueue(update("a")),
            queue.enqueue(update("b")),
            queue.enqueue(update("c")),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(queue.len().await, 3);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let queue = queue();
        let kept = queue.enqueue(update("a")).await.unwrap();
        let removed = queue.enqueue(update("b")).await.unwrap();

        queue.remove(removed.id).await;
        queue.remove(removed.id).await;
        queue.remove(OperationId::new()).await;

        let all = queue.get_all().await;
        assert_eq!(all, vec![kept]);
    }

    #[tokio::test]
    async fn mark_failed_drops_at_ceiling() {
        let queue = queue();
        let operation = queue.enqueue(update("a")).await.unwrap();

        assert_eq!(
            queue.mark_failed(operation.id).await,
            RetryStatus::Retrying { retries: 1 }
        );
        assert_eq!(
            queue.mark_failed(operation.id).await,
            RetryStatus::Retrying { retries: 2 }
        );
        assert_eq!(queue.get_all().await[0].retries, 2);

        assert_eq!(queue.mark_failed(operation.id).await, RetryStatus::Dropped);
        assert!(queue.get_all().await.is_empty());
        assert_eq!(queue.mark_failed(operation.id).await, RetryStatus::NotQueued);
    }

    #[tokio::test]
    async fn queue_survives_reload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jotter.db");
        let payload = NotePayload::new("Offline title", "offline body").with_tags(["a"]);

        let enqueued = {
            let queue = OperationQueue::new(Arc::new(SqliteKeyValueStore::open(&path).unwrap()));
            queue
                .enqueue(OperationRequest::update(NoteId::new("n-1"), payload.clone()))
                .await
                .unwrap()
        };

        let reloaded = OperationQueue::new(Arc::new(SqliteKeyValueStore::open(&path).unwrap()));
        let all = reloaded.get_all().await;
        assert_eq!(all.len(), 1);
        let operation = &all[0];
        assert_eq!(operation, &enqueued);
        assert_eq!(operation.kind(), "UPDATE");
        assert_eq!(operation.method, HttpMethod::Put);
        assert_eq!(operation.endpoint, "/notes/n-1");
        assert_eq!(operation.note_id, Some(NoteId::new("n-1")));
        assert_eq!(operation.payload(), Some(&payload));
        assert_eq!(operation.retries, 0);
    }

    #[tokio::test]
    async fn corrupted_queue_reads_as_empty() {
        let store = Arc::new(SqliteKeyValueStore::open_in_memory().unwrap());
        store.set(QUEUE_KEY, "{not json").await.unwrap();
        let queue = OperationQueue::new(store);

        assert!(queue.get_all().await.is_empty());
        assert!(queue.try_get_all().await.is_err());
        assert_eq!(queue.len().await, 0);
    }

    #[tokio::test]
    async fn unreadable_storage_is_swallowed() {
        let queue = OperationQueue::new(Arc::new(FailingStore));

        assert!(queue.get_all().await.is_empty());
        queue.remove(OperationId::new()).await;
        queue.clear().await;
        assert_eq!(queue.mark_failed(OperationId::new()).await, RetryStatus::NotQueued);
        assert!(queue.enqueue(update("a")).await.is_err());
    }

    #[tokio::test]
    async fn rewrite_note_id_retargets_dependent_operations() {
        let queue = queue();
        let temp = NoteId::temporary();
        let confirmed = NoteId::new("srv-1");
        queue
            .enqueue(OperationRequest::update(
                temp.clone(),
                NotePayload::new("t", "c"),
            ))
            .await
            .unwrap();
        queue
            .enqueue(OperationRequest::delete(temp.clone()))
            .await
            .unwrap();
        queue.enqueue(update("other")).await.unwrap();

        assert_eq!(queue.rewrite_note_id(&temp, &confirmed).await, 2);

        let endpoints: Vec<String> = queue
            .get_all()
            .await
            .into_iter()
            .map(|operation| operation.endpoint)
            .collect();
        assert_eq!(
            endpoints,
            vec!["/notes/srv-1", "/notes/srv-1", "/notes/other"]
        );
    }

    #[tokio::test]
    async fn clear_empties_queue() {
        let queue = queue();
        queue.enqueue(update("a")).await.unwrap();
        queue.clear().await;
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn enqueue_after_failed_read_keeps_earlier_operations() {
        let store = Arc::new(FlakyStore::new());
        let queue = OperationQueue::new(store.clone());
        for id in ["a", "b", "c"] {
            queue
                .enqueue(OperationRequest::delete(NoteId::new(id)))
                .await
                .unwrap();
        }

        store.fail_next_get();
        assert!(queue.enqueue(update("d")).await.is_err());
        assert_eq!(queue.len().await, 3);

        queue.enqueue(update("d")).await.unwrap();
        assert_eq!(queue.len().await, 4);
    }

    #[tokio::test]
    async fn corrupted_queue_is_not_overwritten_by_enqueue() {
        let store = Arc::new(SqliteKeyValueStore::open_in_memory().unwrap());
        store.set(QUEUE_KEY, "{not json").await.unwrap();
        let queue = OperationQueue::new(store.clone());

        assert!(queue.enqueue(update("a")).await.is_err());
        assert_eq!(
            store.get(QUEUE_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }
}
