use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use std::time::Duration;
use tracing::{debug, trace};
use vanish_core::error::Result;
use vanish_core::{Admission, Clock, PasteId, PasteRecord, PasteRepository, SystemClock};

/// A record together with its emulated backend TTL.
#[derive(Debug, Clone)]
struct StoredPaste {
    record: PasteRecord,
    evict_at: Option<Timestamp>,
}

impl StoredPaste {
    fn is_evicted_at(&self, now: Timestamp) -> bool {
        self.evict_at.is_some_and(|evict_at| now >= evict_at)
    }
}

/// In-memory implementation of [`PasteRepository`] using DashMap.
///
/// `consume` runs under the shard lock of its key, which makes it atomic
/// within this process. The backend TTL is emulated with a deadline read
/// from `C`, independent of the instant passed to `consume`.
#[derive(Debug)]
pub struct InMemoryRepository<C = SystemClock> {
    storage: DashMap<String, StoredPaste>,
    clock: C,
}

impl InMemoryRepository<SystemClock> {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryRepository<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryRepository<C> {
    /// Creates a repository whose TTL eviction follows `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            storage: DashMap::new(),
            clock,
        }
    }

    /// Number of keys currently held, including ones past their TTL that
    /// have not been touched since.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl<C: Clock> PasteRepository for InMemoryRepository<C> {
    async fn insert(&self, record: &PasteRecord, ttl: Option<Duration>) -> Result<()> {
        let evict_at = ttl.and_then(|ttl| self.clock.now().checked_add(ttl).ok());
        trace!(id = %record.id, ?evict_at, "Storing paste in memory");

        self.storage.insert(
            record.id.as_str().to_owned(),
            StoredPaste {
                record: record.clone(),
                evict_at,
            },
        );
        Ok(())
    }

    async fn get(&self, id: &PasteId) -> Result<Option<PasteRecord>> {
        let now = self.clock.now();

        let entry = self.storage.get(id.as_str());
        match entry {
            Some(stored) if stored.is_evicted_at(now) => {
                // Drop the read guard before removing to avoid a deadlock.
                drop(stored);
                self.storage
                    .remove_if(id.as_str(), |_, stored| stored.is_evicted_at(now));
                debug!(id = %id, "Evicted paste past its TTL");
                Ok(None)
            }
            Some(stored) => Ok(Some(stored.record.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &PasteId) -> Result<bool> {
        Ok(self.storage.remove(id.as_str()).is_some())
    }

    async fn consume(&self, id: &PasteId, now: Timestamp) -> Result<Admission> {
        let wall = self.clock.now();

        let mut slot = match self.storage.entry(id.as_str().to_owned()) {
            Entry::Vacant(_) => return Ok(Admission::Missing),
            Entry::Occupied(slot) => slot,
        };

        if slot.get().is_evicted_at(wall) {
            slot.remove();
            debug!(id = %id, "Evicted paste past its TTL");
            return Ok(Admission::Missing);
        }

        let admission = slot.get().record.admit(now);
        match &admission {
            Admission::Admitted(next) if next.is_exhausted() => {
                slot.remove();
                debug!(id = %id, views_used = next.views_used, "Served last view, paste removed");
            }
            Admission::Admitted(next) => {
                slot.get_mut().record = next.clone();
                trace!(id = %id, views_used = next.views_used, "View admitted");
            }
            Admission::Expired | Admission::Exhausted => {
                slot.remove();
                debug!(id = %id, ?admission, "Removed unreadable paste");
            }
            Admission::Missing => {}
        }

        Ok(admission)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;
    use std::sync::Arc;
    use vanish_core::ManualClock;

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_millisecond(ms).unwrap()
    }

    fn record(id: &str, expires_at_ms: Option<i64>, max_views: Option<u32>) -> PasteRecord {
        PasteRecord {
            id: PasteId::parse(id).unwrap(),
            content: "hello".to_string(),
            created_at_ms: 0,
            expires_at_ms,
            max_views,
            views_used: 0,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = InMemoryRepository::new();
        let r = record("abc", None, None);

        repo.insert(&r, None).await.unwrap();
        assert_eq!(repo.get(&r.id).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = InMemoryRepository::new();
        let id = PasteId::parse("missing").unwrap();
        assert_eq!(repo.get(&id).await.unwrap(), None);
        assert_eq!(repo.consume(&id, ts(0)).await.unwrap(), Admission::Missing);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryRepository::new();
        let r = record("abc", None, None);
        repo.insert(&r, None).await.unwrap();

        assert!(repo.delete(&r.id).await.unwrap());
        assert!(!repo.delete(&r.id).await.unwrap());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_consume_counts_down_and_removes() {
        let repo = InMemoryRepository::new();
        let r = record("abc", None, Some(2));
        repo.insert(&r, None).await.unwrap();

        let Admission::Admitted(first) = repo.consume(&r.id, ts(0)).await.unwrap() else {
            panic!("first view should be admitted");
        };
        assert_eq!(first.views_used, 1);
        assert_eq!(repo.get(&r.id).await.unwrap().unwrap().views_used, 1);

        let Admission::Admitted(second) = repo.consume(&r.id, ts(0)).await.unwrap() else {
            panic!("second view should be admitted");
        };
        assert_eq!(second.views_used, 2);
        assert!(repo.is_empty());

        assert_eq!(repo.consume(&r.id, ts(0)).await.unwrap(), Admission::Missing);
    }

    #[tokio::test]
    async fn test_consume_expired_removes() {
        let repo = InMemoryRepository::new();
        let r = record("abc", Some(60_000), None);
        repo.insert(&r, None).await.unwrap();

        assert!(repo.consume(&r.id, ts(59_000)).await.unwrap().is_admitted());
        assert_eq!(
            repo.consume(&r.id, ts(60_000)).await.unwrap(),
            Admission::Expired
        );
        assert!(repo.is_empty());

        // moving time backwards does not bring it back
        assert_eq!(repo.consume(&r.id, ts(0)).await.unwrap(), Admission::Missing);
    }

    #[tokio::test]
    async fn test_exhausted_record_is_removed() {
        let repo = InMemoryRepository::new();
        let mut r = record("abc", None, Some(1));
        r.views_used = 1;
        repo.insert(&r, None).await.unwrap();

        assert_eq!(
            repo.consume(&r.id, ts(0)).await.unwrap(),
            Admission::Exhausted
        );
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_backend_ttl_evicts() {
        let clock = ManualClock::new(ts(0));
        let repo = InMemoryRepository::with_clock(clock.clone());
        let r = record("abc", None, None);
        repo.insert(&r, Some(Duration::from_secs(10))).await.unwrap();

        clock.advance(SignedDuration::from_secs(9));
        assert!(repo.get(&r.id).await.unwrap().is_some());

        clock.advance(SignedDuration::from_secs(1));
        assert!(repo.get(&r.id).await.unwrap().is_none());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_consume_admits_exactly_budget() {
        let repo = Arc::new(InMemoryRepository::new());
        let r = record("race", None, Some(5));
        repo.insert(&r, None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = Arc::clone(&repo);
            let id = r.id.clone();
            handles.push(tokio::spawn(async move {
                repo.consume(&id, ts(0)).await.unwrap().is_admitted()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }
}
