use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::access::{AccessGuard, PermissionError};
use crate::config::AppConfig;
use crate::history::NavigationHistory;
use crate::session::{FileStorage, MemoryStorage, SessionStorage, SessionStore};

/// Everything the host keeps for one browser
pub struct ClientState {
    pub session: SessionStore,
    pub history: NavigationHistory,
}

pub type SharedClient = Arc<Mutex<ClientState>>;

struct ClientSlot {
    state: SharedClient,
    last_seen: Instant,
}

/// Settings handlers need at request time
#[derive(Debug, Clone)]
pub struct HostSettings {
    pub namespace: String,
    pub cookie_name: String,
    pub jwt_secret: String,
    pub history_capacity: usize,
    pub max_clients: usize,
    /// Clients not seen for this long are dropped first when the registry is full
    pub client_idle_timeout: Duration,
}

/// Shared application state handed to every router
#[derive(Clone)]
pub struct AppState {
    pub guard: AccessGuard,
    pub settings: Arc<HostSettings>,
    storage: Arc<dyn SessionStorage>,
    clients: Arc<Mutex<HashMap<String, ClientSlot>>>,
}

impl AppState {
    pub fn new(guard: AccessGuard, storage: Arc<dyn SessionStorage>, settings: HostSettings) -> Self {
        Self {
            guard,
            settings: Arc::new(settings),
            storage,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, PermissionError> {
        let table = config.permission_table()?;
        let guard = AccessGuard::new(Arc::new(table), config.guard_routes());

        let storage: Arc<dyn SessionStorage> = match &config.session.storage_dir {
            Some(dir) => {
                tracing::info!("Persisting sessions under {}", dir.display());
                Arc::new(FileStorage::new(dir))
            }
            None => {
                tracing::info!("No session storage directory configured, sessions are in-memory");
                Arc::new(MemoryStorage::new())
            }
        };

        let settings = HostSettings {
            namespace: config.session.namespace.clone(),
            cookie_name: config.session.cookie_name.clone(),
            jwt_secret: config.security.jwt_secret.clone(),
            history_capacity: config.guard.history_capacity,
            max_clients: config.session.max_clients,
            client_idle_timeout: Duration::from_secs(config.session.client_idle_minutes.saturating_mul(60)),
        };

        Ok(Self::new(guard, storage, settings))
    }

    /// Fetch a client's state, creating an un-hydrated one on first sight.
    /// Persisted sessions outlive eviction: a dropped client hydrates again from storage.
    pub async fn client(&self, client_id: &str) -> SharedClient {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        if let Some(slot) = clients.get_mut(client_id) {
            slot.last_seen = now;
            return slot.state.clone();
        }

        if clients.len() >= self.settings.max_clients {
            self.evict(&mut clients, now);
        }

        tracing::debug!("New client {}", client_id);
        let state = Arc::new(Mutex::new(ClientState {
            session: SessionStore::new(self.storage.clone(), &self.settings.namespace, client_id),
            history: NavigationHistory::with_capacity(self.settings.history_capacity),
        }));
        clients.insert(
            client_id.to_string(),
            ClientSlot {
                state: state.clone(),
                last_seen: now,
            },
        );
        state
    }

    /// Drop idle clients, then the least recently seen ones until a new client fits
    fn evict(&self, clients: &mut HashMap<String, ClientSlot>, now: Instant) {
        let before = clients.len();
        let idle_timeout = self.settings.client_idle_timeout;
        clients.retain(|_, slot| now.duration_since(slot.last_seen) < idle_timeout);

        let limit = self.settings.max_clients.max(1);
        while clients.len() >= limit {
            let oldest = clients
                .iter()
                .min_by_key(|(_, slot)| slot.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => clients.remove(&id),
                None => break,
            };
        }

        tracing::debug!("Evicted {} clients from the registry", before - clients.len());
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_state_is_shared_per_id() {
        let config = AppConfig::from_lookup(|_| None);
        let state = AppState::from_config(&config).unwrap();

        let a = state.client("a").await;
        a.lock().await.history.record("/dashboard");

        let again = state.client("a").await;
        assert_eq!(again.lock().await.history.len(), 1);

        let b = state.client("b").await;
        assert!(b.lock().await.history.is_empty());
        assert_eq!(state.client_count().await, 2);
    }

    fn capped_state(max_clients: usize, idle: Duration) -> AppState {
        let mut config = AppConfig::from_lookup(|_| None);
        config.session.max_clients = max_clients;
        let mut state = AppState::from_config(&config).unwrap();
        Arc::make_mut(&mut state.settings).client_idle_timeout = idle;
        state
    }

    #[tokio::test]
    async fn test_registry_never_exceeds_cap() {
        let state = capped_state(10, Duration::from_secs(3600));
        for n in 0..200 {
            state.client(&format!("anon-{}", n)).await;
        }
        assert_eq!(state.client_count().await, 10);
    }

    #[tokio::test]
    async fn test_least_recently_seen_client_is_evicted() {
        let state = capped_state(2, Duration::from_secs(3600));
        state.client("a").await.lock().await.history.record("/envios");
        tokio::time::sleep(Duration::from_millis(5)).await;
        state.client("b").await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Touching "a" makes "b" the oldest
        state.client("a").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        state.client("c").await;

        assert_eq!(state.client_count().await, 2);
        let a = state.client("a").await;
        assert_eq!(a.lock().await.history.len(), 1);
    }

    #[tokio::test]
    async fn test_idle_clients_are_swept_when_full() {
        let state = capped_state(3, Duration::ZERO);
        for id in ["a", "b", "c"] {
            state.client(id).await;
        }
        state.client("d").await;
        assert_eq!(state.client_count().await, 1);
    }
}
