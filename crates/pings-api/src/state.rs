use std::sync::Arc;
use std::time::Duration;

use pings_blob::BlobStore;
use pings_db::DocumentStore;
use pings_notify::Notifier;

use crate::records::IdClock;

/// Default lifetime of signed photo URLs.
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(3600);

/// Longest lifetime a signed photo URL may be configured with (7 days).
pub const MAX_URL_EXPIRY: Duration = Duration::from_secs(7 * 24 * 3600);

/// Handler-facing configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Topic for family alerts. `None` disables them.
    pub family_topic: Option<String>,
    pub url_expiry: Duration,
    /// HS256 secret for bearer tokens. `None` leaves the API open.
    pub auth_secret: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            family_topic: None,
            url_expiry: DEFAULT_URL_EXPIRY,
            auth_secret: None,
        }
    }
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub notifier: Arc<dyn Notifier>,
    pub config: ApiConfig,
    pub clock: IdClock,
}

impl AppStateInner {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        config: ApiConfig,
    ) -> AppState {
        Arc::new(Self {
            store,
            blobs,
            notifier,
            config,
            clock: IdClock::new(),
        })
    }

    /// Run a store call off the async runtime.
    pub async fn with_store<F, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&dyn DocumentStore) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(store.as_ref())).await?
    }
}
