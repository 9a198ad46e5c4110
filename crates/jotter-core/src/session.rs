//! Persisted session: bearer token plus the signed-in user.

use std::sync::Arc;

use crate::error::Result;
use crate::models::User;
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};

/// A restored or freshly established session
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

pub struct SessionStore<K> {
    store: Arc<K>,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub const fn new(store: Arc<K>) -> Self {
        Self { store }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        self.store.set(TOKEN_KEY, &session.token).await?;
        let user = serde_json::to_string(&session.user)?;
        self.store.set(USER_KEY, &user).await
    }

    /// Restore the stored session; both the token and the user must be present
    pub async fn load(&self) -> Result<Option<Session>> {
        let Some(token) = self.store.get(TOKEN_KEY).await? else {
            return Ok(None);
        };
        let Some(user) = self.store.get(USER_KEY).await? else {
            return Ok(None);
        };
        if token.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(Session {
            user: serde_json::from_str(&user)?,
            token,
        }))
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&[TOKEN_KEY, USER_KEY]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteKeyValueStore;

    fn session() -> Session {
        Session {
            user: User {
                id: "u-1".to_string(),
                email: "ada@example.com".to_string(),
            },
            token: "secret-token".to_string(),
        }
    }

    #[tokio::test]
    async fn save_load_clear_roundtrip() {
        let store = SessionStore::new(Arc::new(SqliteKeyValueStore::open_in_memory().unwrap()));
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&session()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session()));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn token_without_user_is_not_a_session() {
        let kv = Arc::new(SqliteKeyValueStore::open_in_memory().unwrap());
        kv.set(TOKEN_KEY, "orphan").await.unwrap();
        assert_eq!(SessionStore::new(kv).load().await.unwrap(), None);
    }

    #[test]
    fn session_debug_redacts_token() {
        let debug = format!("{:?}", session());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
