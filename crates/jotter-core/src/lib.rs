//! jotter-core - Core library for Jotter
//!
//! This crate contains the note models, the durable offline operation queue,
//! the local note cache, the client state store and the synchronizer that
//! replays queued edits against the notes backend once it is reachable again.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod queue;
pub mod session;
pub mod state;
pub mod storage;
pub mod sync;
pub mod util;

#[cfg(test)]
mod testing;

pub use api::{ApiError, HttpNotesApi, NotesApi};
pub use client::{ClientError, DeleteOutcome, LoadOutcome, NotesClient, SaveOutcome};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::{Note, NoteId, NotePayload, NoteQuery, PendingOperation, Visibility};
pub use queue::{OperationQueue, RetryStatus, MAX_RETRIES};
pub use state::{ClientState, ClientStore, Connectivity};
pub use storage::{KeyValueStore, SqliteKeyValueStore};
pub use sync::{SyncReport, Synchronizer};
