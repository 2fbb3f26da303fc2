//! Session Store: the single owner of the authenticated identity.
//!
//! Lifecycle: `restore()` once at start-up, `save()` after login/register,
//! `clear()` on logout or any 401. The store is cheap to clone; clones share
//! the same state and backing storage.

pub mod storage;

use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::errors::ClientError;
use crate::models::{Session, User};

pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// An empty store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Loads the persisted session. Corrupt or partial state is treated as
    /// no session and wiped; this never fails.
    pub fn restore(&self) -> Option<Session> {
        let restored = match self.read_persisted() {
            Ok(Some(session)) => Some(session),
            Ok(None) => None,
            Err(e) => {
                warn!("Discarding unreadable session: {e}");
                self.wipe_storage();
                None
            }
        };
        *self.write() = restored.clone();
        restored
    }

    /// Persists token and user as one unit, then makes the session current.
    pub fn save(&self, session: Session) -> Result<(), ClientError> {
        let user_json = serde_json::to_string(&session.user())?;
        self.storage.set_all(&[
            (TOKEN_KEY, session.token.clone()),
            (USER_KEY, user_json),
        ])?;
        info!("Session saved for user {}", session.user_id);
        *self.write() = Some(session);
        Ok(())
    }

    /// Drops the in-memory session and removes both persisted keys.
    pub fn clear(&self) {
        *self.write() = None;
        self.wipe_storage();
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    fn read_persisted(&self) -> Result<Option<Session>, ClientError> {
        let mut values = self.storage.get_all(&[TOKEN_KEY, USER_KEY])?.into_iter();
        let (token, user) = (values.next().flatten(), values.next().flatten());

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) if !token.is_empty() => {
                let user: User = serde_json::from_str(&user)?;
                Ok(Some(Session {
                    user_id: user.id,
                    email: user.email,
                    token,
                }))
            }
            _ => Err(ClientError::Storage(
                "token and user must be stored together".to_string(),
            )),
        }
    }

    fn wipe_storage(&self) {
        if let Err(e) = self.storage.remove_all(&[TOKEN_KEY, USER_KEY]) {
            warn!("Failed to clear persisted session: {e}");
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            user_id: 1,
            email: "a@b.com".to_string(),
            token: "T".to_string(),
        }
    }

    #[test]
    fn test_restore_after_save_returns_same_session() {
        let storage = Arc::new(MemoryStore::new());
        let store = SessionStore::new(storage.clone());
        store.save(session()).unwrap();

        let reloaded = SessionStore::new(storage);
        assert_eq!(reloaded.restore(), Some(session()));
        assert!(reloaded.is_authenticated());
    }

    #[test]
    fn test_save_persists_both_keys() {
        let storage = Arc::new(MemoryStore::new());
        let store = SessionStore::new(storage.clone());
        store.save(session()).unwrap();

        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("T"));
        let user: serde_json::Value =
            serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(user, serde_json::json!({"id": 1, "email": "a@b.com"}));
    }

    #[test]
    fn test_restore_with_corrupt_user_clears_storage() {
        let storage = Arc::new(MemoryStore::new());
        storage
            .set_all(&[(TOKEN_KEY, "T".to_string()), (USER_KEY, "{oops".to_string())])
            .unwrap();
        let store = SessionStore::new(storage.clone());

        assert!(store.restore().is_none());
        assert!(!store.is_authenticated());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(storage.get(USER_KEY).unwrap().is_none());
    }

    #[test]
    fn test_restore_with_token_but_no_user_clears_storage() {
        let storage = Arc::new(MemoryStore::new());
        storage.set_all(&[(TOKEN_KEY, "T".to_string())]).unwrap();
        let store = SessionStore::new(storage.clone());

        assert!(store.restore().is_none());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_restore_with_corrupt_file_clears_it() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = SessionStore::new(Arc::new(FileStore::new(&path)));
        assert!(store.restore().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_restore_empty_storage_is_unauthenticated() {
        let store = SessionStore::in_memory();
        assert!(store.restore().is_none());
        assert!(store.token().is_none());
    }

    /// Lets another writer save a fresh session right after each of the
    /// first reads has taken its snapshot.
    struct RacingStore {
        inner: MemoryStore,
        raced: std::sync::atomic::AtomicBool,
    }

    impl KeyValueStore for RacingStore {
        fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>, ClientError> {
            let values = self.inner.get_all(keys)?;
            if !self.raced.swap(true, std::sync::atomic::Ordering::SeqCst) {
                self.inner.set_all(&[
                    (TOKEN_KEY, "T2".to_string()),
                    (USER_KEY, r#"{"id":2,"email":"b@c.com"}"#.to_string()),
                ])?;
            }
            Ok(values)
        }

        fn set_all(&self, entries: &[(&str, String)]) -> Result<(), ClientError> {
            self.inner.set_all(entries)
        }

        fn remove_all(&self, keys: &[&str]) -> Result<(), ClientError> {
            self.inner.remove_all(keys)
        }
    }

    #[test]
    fn test_restore_racing_a_login_keeps_new_session() {
        let storage = Arc::new(RacingStore {
            inner: MemoryStore::new(),
            raced: std::sync::atomic::AtomicBool::new(false),
        });
        let store = SessionStore::new(storage.clone());

        // The snapshot predates the write: no session, and nothing wiped.
        assert!(store.restore().is_none());
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("T2"));

        let restored = store.restore().unwrap();
        assert_eq!(restored.token, "T2");
        assert_eq!(restored.user_id, 2);
    }

    #[test]
    fn test_clear_is_visible_through_clones() {
        let store = SessionStore::in_memory();
        let clone = store.clone();
        store.save(session()).unwrap();
        assert!(clone.is_authenticated());

        clone.clear();
        assert!(!store.is_authenticated());
        assert!(store.restore().is_none());
    }
}
