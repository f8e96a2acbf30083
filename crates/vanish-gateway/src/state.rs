use std::sync::Arc;
use std::time::Duration;

use vanish_paste::PasteStore;

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn PasteStore>,
    public_base_url: Option<String>,
    health_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn PasteStore>) -> Self {
        Self {
            store,
            public_base_url: None,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// Fixes the origin used in paste URLs, e.g. `https://paste.example.com`.
    /// Without it the origin is taken from the request headers.
    pub fn with_public_base_url(mut self, public_base_url: impl Into<String>) -> Self {
        let url: String = public_base_url.into();
        self.public_base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn store(&self) -> &dyn PasteStore {
        self.store.as_ref()
    }

    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref()
    }

    pub fn health_timeout(&self) -> Duration {
        self.health_timeout
    }
}
