use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;
use vanish_core::error::Result;
use vanish_core::StorageError;

/// Connection settings for the Redis backend.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use vanish_storage::RedisSettings;
///
/// let settings = RedisSettings::builder()
///     .url("redis://127.0.0.1:6379")
///     .max_retries(5)
///     .response_timeout(Duration::from_millis(500))
///     .build();
/// assert_eq!(settings.connect_timeout, Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisSettings {
    /// Redis connection URL, e.g. `redis://127.0.0.1:6379/0`.
    #[builder(setter(into))]
    pub url: String,

    /// Reconnect attempts made by the transport before giving up.
    #[builder(default = 3)]
    pub max_retries: usize,

    /// Upper bound on the backoff between reconnect attempts.
    #[builder(default = Duration::from_secs(1))]
    pub max_backoff: Duration,

    #[builder(default = Duration::from_secs(2))]
    pub connect_timeout: Duration,

    #[builder(default = Duration::from_secs(2))]
    pub response_timeout: Duration,
}

pub(crate) fn map_redis_error(operation: &str, err: redis::RedisError) -> StorageError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() || message.to_ascii_lowercase().contains("timed out") {
        StorageError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        StorageError::Unavailable(message)
    } else {
        StorageError::Operation(message)
    }
}

/// Whether an error means the cached connection should not be reused.
pub(crate) fn is_connection_failure(err: &redis::RedisError) -> bool {
    err.is_timeout()
        || err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_unrecoverable_error()
}

/// A process-wide, lazily established Redis connection.
///
/// The first caller connects and every later caller reuses the cached
/// handle. Callers that arrive while a connection attempt is in flight
/// wait for it instead of starting their own. After a connection-level
/// failure the handle is dropped and the next caller reconnects.
///
/// Clones share the same cached connection.
#[derive(Clone)]
pub struct RedisConnector {
    client: redis::Client,
    settings: Arc<RedisSettings>,
    slot: Arc<Mutex<Option<ConnectionManager>>>,
}

impl std::fmt::Debug for RedisConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnector")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RedisConnector {
    /// Creates a connector without touching the network.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Operation` if the URL cannot be parsed.
    pub fn new(settings: RedisSettings) -> Result<Self> {
        let client = redis::Client::open(settings.url.as_str())
            .map_err(|e| StorageError::Operation(format!("invalid Redis URL: {e}")))?;

        Ok(Self {
            client,
            settings: Arc::new(settings),
            slot: Arc::new(Mutex::new(None)),
        })
    }

    fn manager_config(&self) -> ConnectionManagerConfig {
        ConnectionManagerConfig::new()
            .set_number_of_retries(self.settings.max_retries)
            .set_max_delay(self.settings.max_backoff)
            .set_connection_timeout(Some(self.settings.connect_timeout))
            .set_response_timeout(Some(self.settings.response_timeout))
    }

    /// Returns the cached connection, connecting first if there is none.
    pub async fn connection(&self) -> Result<ConnectionManager> {
        // Held across the connect so concurrent first callers share one attempt.
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        debug!(settings = ?self.settings, "Connecting to Redis");
        match ConnectionManager::new_with_config(self.client.clone(), self.manager_config()).await
        {
            Ok(conn) => {
                info!("Connected to Redis");
                *slot = Some(conn.clone());
                Ok(conn)
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to Redis");
                Err(map_redis_error("failed to connect to Redis", e))
            }
        }
    }

    /// Drops the cached connection so the next caller reconnects.
    pub async fn invalidate(&self) {
        if self.slot.lock().await.take().is_some() {
            debug!("Discarded cached Redis connection");
        }
    }

    /// Inspects an error returned by an operation and discards the cached
    /// connection if the error was connection-level.
    pub(crate) async fn observe(&self, err: &redis::RedisError) {
        if is_connection_failure(err) {
            self.invalidate().await;
        }
    }

    /// Sends `PING` and expects `PONG`.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        match conn.ping::<String>().await {
            Ok(reply) if reply == "PONG" => Ok(()),
            Ok(reply) => {
                warn!(reply = %reply, "Unexpected PING reply from Redis");
                self.invalidate().await;
                Err(StorageError::Operation(format!(
                    "unexpected PING reply: {reply}"
                )))
            }
            Err(e) => {
                warn!(error = %e, "Redis PING failed");
                self.invalidate().await;
                Err(map_redis_error("failed to ping Redis", e))
            }
        }
    }
}
