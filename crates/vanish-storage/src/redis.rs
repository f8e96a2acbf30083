use async_trait::async_trait;
use jiff::Timestamp;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};
use vanish_core::error::Result;
use vanish_core::{Admission, PasteId, PasteRecord, PasteRepository, StorageError};

use crate::connection::{map_redis_error, RedisConnector};

/// Default prefix for paste keys.
pub const DEFAULT_KEY_PREFIX: &str = "paste:";

/// Admission decision for one view, run atomically inside Redis.
///
/// KEYS[1] is the paste key, ARGV[1] the current time in milliseconds.
/// Replies `{"missing"}`, `{"expired"}`, `{"exhausted"}`, or
/// `{"ok", <updated record>}`. Only `views_used` is rewritten; every other
/// byte of the stored JSON is kept as written by [`PasteRepository::insert`].
const CONSUME_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
  return {'missing'}
end

local paste = cjson.decode(raw)
local now_ms = tonumber(ARGV[1])
local expires_at_ms = paste.expires_at_ms
local max_views = paste.max_views

if expires_at_ms and expires_at_ms ~= cjson.null and now_ms >= expires_at_ms then
  redis.call('DEL', KEYS[1])
  return {'expired'}
end

local limited = max_views and max_views ~= cjson.null
if limited and paste.views_used >= max_views then
  redis.call('DEL', KEYS[1])
  return {'exhausted'}
end

-- Splice the counter into the stored text. Re-encoding with cjson would
-- round 15-digit timestamps to 14 significant digits.
local views_used = paste.views_used + 1
local updated, replaced = string.gsub(
  raw, '"views_used":%s*%d+', '"views_used":' .. string.format('%d', views_used), 1)
if replaced ~= 1 then
  return redis.error_reply('stored paste has no views_used field')
end

if limited and views_used >= max_views then
  redis.call('DEL', KEYS[1])
else
  redis.call('SET', KEYS[1], updated, 'KEEPTTL')
end

return {'ok', updated}
"#;

/// A Redis implementation of [`PasteRepository`].
///
/// Records are stored as JSON strings. `consume` is a single Lua script,
/// so the admission decision is atomic across every process sharing the
/// Redis instance.
#[derive(Debug, Clone)]
pub struct RedisRepository {
    connector: RedisConnector,
    key_prefix: String,
    consume_script: redis::Script,
}

fn seconds_rounded_up(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

fn decode_record(key: &str, raw: &str) -> Result<PasteRecord> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::InvalidData(format!("invalid value for key '{key}': {e}")))
}

impl RedisRepository {
    /// Creates a new Redis repository.
    pub fn new(connector: RedisConnector) -> Self {
        Self::with_prefix(connector, DEFAULT_KEY_PREFIX)
    }

    /// Creates a new Redis repository with a custom key prefix.
    ///
    /// # Arguments
    ///
    /// * `connector` - Shared lazy Redis connection
    /// * `key_prefix` - Prefix for paste keys (e.g., "myapp:paste:")
    pub fn with_prefix(connector: RedisConnector, key_prefix: impl Into<String>) -> Self {
        Self {
            connector,
            key_prefix: key_prefix.into(),
            consume_script: redis::Script::new(CONSUME_SCRIPT),
        }
    }

    /// Generates the storage key for a paste id.
    fn key(&self, id: &PasteId) -> String {
        format!("{}{}", self.key_prefix, id.as_str())
    }

    async fn fail(&self, operation: &str, err: redis::RedisError) -> StorageError {
        self.connector.observe(&err).await;
        map_redis_error(operation, err)
    }
}

#[async_trait]
impl PasteRepository for RedisRepository {
    async fn insert(&self, record: &PasteRecord, ttl: Option<Duration>) -> Result<()> {
        let key = self.key(&record.id);
        trace!(id = %record.id, ?ttl, "Storing paste in Redis");

        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                warn!(id = %record.id, error = %e, "Failed to serialize paste");
                return Err(StorageError::Serialization(format!(
                    "failed to serialize paste: {e}"
                )));
            }
        };

        let mut conn = self.connector.connection().await?;
        let written = match ttl {
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(&key, json, seconds_rounded_up(ttl))
                    .await
            }
            None => conn.set::<_, _, ()>(&key, json).await,
        };

        match written {
            Ok(()) => {
                debug!(id = %record.id, "Stored paste in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "Failed to store paste in Redis");
                Err(self.fail("failed to write paste to Redis", e).await)
            }
        }
    }

    async fn get(&self, id: &PasteId) -> Result<Option<PasteRecord>> {
        let key = self.key(id);
        trace!(id = %id, "Fetching paste from Redis");

        let mut conn = self.connector.connection().await?;
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(raw)) => decode_record(&key, &raw).map(Some).inspect_err(|e| {
                warn!(id = %id, error = %e, "Failed to deserialize stored paste");
            }),
            Ok(None) => {
                trace!(id = %id, "Paste not in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Redis error on get");
                Err(self.fail("failed to fetch paste from Redis", e).await)
            }
        }
    }

    async fn delete(&self, id: &PasteId) -> Result<bool> {
        let key = self.key(id);
        trace!(id = %id, "Removing paste from Redis");

        let mut conn = self.connector.connection().await?;
        match conn.del::<_, usize>(&key).await {
            Ok(removed) => {
                debug!(id = %id, removed, "Removed paste from Redis");
                Ok(removed > 0)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Failed to remove paste from Redis");
                Err(self.fail("failed to delete paste from Redis", e).await)
            }
        }
    }

    async fn consume(&self, id: &PasteId, now: Timestamp) -> Result<Admission> {
        let key = self.key(id);
        let now_ms = now.as_millisecond();
        trace!(id = %id, now_ms, "Consuming a view in Redis");

        let mut conn = self.connector.connection().await?;
        let reply = self
            .consume_script
            .key(&key)
            .arg(now_ms)
            .invoke_async::<Vec<String>>(&mut conn)
            .await;

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                warn!(id = %id, error = %e, "Consume script failed");
                return Err(self.fail("failed to consume paste view in Redis", e).await);
            }
        };

        let admission = match reply.as_slice() {
            [status] if status == "missing" => Admission::Missing,
            [status] if status == "expired" => Admission::Expired,
            [status] if status == "exhausted" => Admission::Exhausted,
            [status, raw] if status == "ok" => Admission::Admitted(decode_record(&key, raw)?),
            other => {
                return Err(StorageError::InvalidData(format!(
                    "unexpected consume reply for key '{key}': {other:?}"
                )));
            }
        };

        debug!(id = %id, ?admission, "Consume decided");
        Ok(admission)
    }

    async fn ping(&self) -> Result<()> {
        self.connector.ping().await
    }
}
