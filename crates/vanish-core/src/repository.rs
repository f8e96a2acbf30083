use crate::error::Result;
use crate::paste::{Admission, PasteRecord};
use crate::paste_id::PasteId;
use async_trait::async_trait;
use jiff::Timestamp;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait PasteRepository: Send + Sync + 'static {
    /// Stores a paste record, replacing any record with the same id.
    /// When `ttl` is given the backend evicts the key on its own after it elapses.
    async fn insert(&self, record: &PasteRecord, ttl: Option<Duration>) -> Result<()>;

    /// Retrieves the record for a given id without touching its view count.
    /// Returns `None` if the id does not exist.
    async fn get(&self, id: &PasteId) -> Result<Option<PasteRecord>>;

    /// Deletes the record for a given id.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, id: &PasteId) -> Result<bool>;

    /// Atomically decides whether one more view of `id` is admitted at `now`.
    ///
    /// The decision follows [`PasteRecord::admit`] and is indivisible with
    /// respect to every other `consume` on the same id, across processes.
    /// Expired and exhausted records are removed, and a record whose budget
    /// is used up by this call is removed in the same step. Admitted views
    /// keep the backend TTL of the key intact.
    async fn consume(&self, id: &PasteId, now: Timestamp) -> Result<Admission>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
impl<T: PasteRepository + ?Sized> PasteRepository for Arc<T> {
    async fn insert(&self, record: &PasteRecord, ttl: Option<Duration>) -> Result<()> {
        (**self).insert(record, ttl).await
    }

    async fn get(&self, id: &PasteId) -> Result<Option<PasteRecord>> {
        (**self).get(id).await
    }

    async fn delete(&self, id: &PasteId) -> Result<bool> {
        (**self).delete(id).await
    }

    async fn consume(&self, id: &PasteId, now: Timestamp) -> Result<Admission> {
        (**self).consume(id, now).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}
