pub mod storage;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::Role;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};

pub const DEFAULT_STORAGE_NAMESPACE: &str = "auth-storage";

/// Identity of the logged-in user as the access layer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    /// None while the profile is still loading
    pub role: Option<Role>,
}

/// Snapshot of authentication state read by the guard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user: Option<SessionUser>,
    pub is_authenticated: bool,
    pub has_hydrated: bool,
}

impl Session {
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|user| user.role)
    }
}

/// Shape written to storage
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user: Option<SessionUser>,
    token: Option<String>,
    is_authenticated: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session storage unavailable: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Owns one client's session and keeps it in sync with storage
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
    session: Session,
    token: Option<String>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>, namespace: &str, client: &str) -> Self {
        Self {
            storage,
            key: format!("{}-{}", namespace, client),
            session: Session::default(),
            token: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Restore persisted state
    ///
    /// A storage failure leaves the store un-hydrated so the guard keeps waiting.
    /// Unreadable contents are dropped and the store hydrates as logged out.
    pub async fn hydrate(&mut self) -> Result<(), SessionError> {
        let raw = self.storage.load(&self.key).await.map_err(|e| {
            tracing::warn!("Session hydration failed for '{}': {}", self.key, e);
            e
        })?;

        if let Some(raw) = raw {
            match serde_json::from_str::<PersistedSession>(&raw) {
                Ok(persisted) => {
                    self.session.is_authenticated = persisted.is_authenticated && persisted.user.is_some();
                    self.session.user = persisted.user;
                    self.token = persisted.token;
                }
                Err(e) => {
                    tracing::warn!("Discarding unreadable session '{}': {}", self.key, e);
                    self.clear();
                    if let Err(e) = self.storage.remove(&self.key).await {
                        tracing::warn!("Failed to remove unreadable session '{}': {}", self.key, e);
                    }
                }
            }
        }

        self.session.has_hydrated = true;
        tracing::debug!(
            "Session '{}' hydrated (authenticated: {})",
            self.key,
            self.session.is_authenticated
        );
        Ok(())
    }

    pub async fn login(&mut self, user: SessionUser, token: String) -> Result<(), SessionError> {
        tracing::info!("Login for user '{}' ({:?})", user.name, user.role);
        self.session.user = Some(user);
        self.session.is_authenticated = true;
        self.token = Some(token);
        self.persist().await
    }

    pub async fn logout(&mut self) -> Result<(), SessionError> {
        if let Some(user) = &self.session.user {
            tracing::info!("Logout for user '{}'", user.name);
        }
        self.clear();
        self.storage.remove(&self.key).await?;
        Ok(())
    }

    fn clear(&mut self) {
        self.session.user = None;
        self.session.is_authenticated = false;
        self.token = None;
    }

    async fn persist(&self) -> Result<(), SessionError> {
        let persisted = PersistedSession {
            user: self.session.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.session.is_authenticated,
        };
        let raw = serde_json::to_string(&persisted)?;
        self.storage.save(&self.key, &raw).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;

    struct BrokenStorage;

    #[async_trait]
    impl SessionStorage for BrokenStorage {
        async fn load(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        async fn save(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        async fn remove(&self, _key: &str) -> io::Result<()> {
            Ok(())
        }
    }

    fn driver() -> SessionUser {
        SessionUser {
            id: "u-1".to_string(),
            name: "Marta".to_string(),
            email: Some("marta@example.com".to_string()),
            role: Some(Role::Driver),
        }
    }

    #[tokio::test]
    async fn test_new_store_is_not_hydrated() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_NAMESPACE, "c1");
        assert!(!store.session().has_hydrated);
        assert!(!store.session().is_authenticated);
        assert_eq!(store.storage_key(), "auth-storage-c1");
    }

    #[tokio::test]
    async fn test_hydrate_empty_storage() {
        let mut store = SessionStore::new(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_NAMESPACE, "c1");
        store.hydrate().await.unwrap();
        assert!(store.session().has_hydrated);
        assert!(!store.session().is_authenticated);
        assert!(store.session().user.is_none());
    }

    #[tokio::test]
    async fn test_login_survives_restart() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());

        let mut first = SessionStore::new(storage.clone(), DEFAULT_STORAGE_NAMESPACE, "c1");
        first.hydrate().await.unwrap();
        first.login(driver(), "tok".to_string()).await.unwrap();

        let mut second = SessionStore::new(storage, DEFAULT_STORAGE_NAMESPACE, "c1");
        second.hydrate().await.unwrap();
        assert!(second.session().is_authenticated);
        assert_eq!(second.session().role(), Some(Role::Driver));
        assert_eq!(second.token(), Some("tok"));
    }

    #[tokio::test]
    async fn test_logout_clears_persisted_state() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());

        let mut store = SessionStore::new(storage.clone(), DEFAULT_STORAGE_NAMESPACE, "c1");
        store.hydrate().await.unwrap();
        store.login(driver(), "tok".to_string()).await.unwrap();
        store.logout().await.unwrap();

        assert!(!store.session().is_authenticated);
        assert!(store.token().is_none());
        assert_eq!(storage.load("auth-storage-c1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_session_hydrates_logged_out() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        storage.save("auth-storage-c1", "not json").await.unwrap();

        let mut store = SessionStore::new(storage.clone(), DEFAULT_STORAGE_NAMESPACE, "c1");
        store.hydrate().await.unwrap();

        assert!(store.session().has_hydrated);
        assert!(!store.session().is_authenticated);
        assert_eq!(storage.load("auth-storage-c1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_store_unhydrated() {
        let mut store = SessionStore::new(Arc::new(BrokenStorage), DEFAULT_STORAGE_NAMESPACE, "c1");
        let result = store.hydrate().await;

        assert!(matches!(result, Err(SessionError::Storage(_))));
        assert!(!store.session().has_hydrated);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());

        let mut a = SessionStore::new(storage.clone(), "ns-a", "c1");
        a.hydrate().await.unwrap();
        a.login(driver(), "tok".to_string()).await.unwrap();

        let mut b = SessionStore::new(storage, "ns-b", "c1");
        b.hydrate().await.unwrap();
        assert!(!b.session().is_authenticated);
    }
}
