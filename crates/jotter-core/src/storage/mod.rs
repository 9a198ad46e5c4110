//! On-device key-value storage
//!
//! The queue, the note cache and the session all persist serialized JSON
//! under fixed keys of a single [`KeyValueStore`].

mod migrations;
mod sqlite;

pub use sqlite::SqliteKeyValueStore;

use crate::error::Result;

/// Key holding the serialized pending-operation sequence
pub const QUEUE_KEY: &str = "pending_operations_queue";
/// Key holding the last successfully fetched note listing
pub const NOTES_CACHE_KEY: &str = "notes_cache";
/// Key holding the bearer session token
pub const TOKEN_KEY: &str = "token";
/// Key holding the serialized signed-in user
pub const USER_KEY: &str = "user";

/// Trait for durable key-value storage (async)
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every listed key; missing keys are ignored
    async fn remove(&self, keys: &[&str]) -> Result<()>;
}
