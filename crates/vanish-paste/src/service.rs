use crate::error::PasteError;
use crate::generator::IdGenerator;
use crate::params::NewPaste;
use crate::store::PasteStore;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use vanish_core::{
    Admission, Clock, Paste, PasteId, PasteRecord, PasteRepository, StorageError, SystemClock,
    TimeSource,
};

/// The paste store.
///
/// Wraps a [`PasteRepository`], an [`IdGenerator`] and a [`TimeSource`]:
/// - `create` validates nothing itself; [`NewPaste`] already did
/// - `read_and_consume` spends one view through the repository's atomic step
/// - `peek` reads without spending a view
///
/// Every operation takes an optional override instant. It only has an
/// effect when the time source runs in [`TimeMode::Deterministic`](vanish_core::TimeMode::Deterministic).
#[derive(Debug)]
pub struct PasteService<R, G, C = SystemClock> {
    repository: Arc<R>,
    generator: Arc<G>,
    time: TimeSource<C>,
}

impl<R, G, C: Clone> Clone for PasteService<R, G, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            time: self.time.clone(),
        }
    }
}

/// Drops sub-millisecond precision so the instant survives the round trip
/// through the persisted record unchanged.
fn truncate_to_millis(at: Timestamp) -> Timestamp {
    Timestamp::from_millisecond(at.as_millisecond()).unwrap_or(at)
}

fn storage_to_paste_error(e: StorageError) -> PasteError {
    warn!(error = %e, "Storage backend failed");
    PasteError::from(e)
}

impl<R: PasteRepository, G: IdGenerator, C: Clock> PasteService<R, G, C> {
    pub fn new(repository: R, generator: G, time: TimeSource<C>) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            time,
        }
    }
}

#[async_trait]
impl<R: PasteRepository, G: IdGenerator, C: Clock> PasteStore for PasteService<R, G, C> {
    #[instrument(
        skip(self, params),
        fields(ttl_seconds = ?params.ttl_seconds(), max_views = ?params.max_views())
    )]
    async fn create(
        &self,
        params: NewPaste,
        now_override: Option<Timestamp>,
    ) -> Result<Paste, PasteError> {
        let now = truncate_to_millis(self.time.now(now_override));

        let expires_at = match params.ttl_seconds() {
            None => None,
            Some(ttl) => Some(now.checked_add(SignedDuration::from_secs(ttl)).map_err(|_| {
                PasteError::Validation(format!("ttl_seconds {ttl} is too large"))
            })?),
        };

        let ttl = params.ttl();
        let max_views = params.max_views();
        let paste = Paste {
            id: self.generator.generate(),
            content: params.into_content(),
            created_at: now,
            expires_at,
            max_views,
            views_used: 0,
        };

        self.repository
            .insert(&PasteRecord::from(&paste), ttl)
            .await
            .map_err(storage_to_paste_error)?;

        info!(id = %paste.id, "Created paste");
        Ok(paste)
    }

    #[instrument(skip(self))]
    async fn read_and_consume(
        &self,
        id: &PasteId,
        now_override: Option<Timestamp>,
    ) -> Result<Option<Paste>, PasteError> {
        let now = self.time.now(now_override);

        // the repository re-checks expiry and budget inside its atomic step
        let admission = self
            .repository
            .consume(id, now)
            .await
            .map_err(storage_to_paste_error)?;

        match admission {
            Admission::Admitted(record) => {
                let paste = Paste::try_from(record).map_err(storage_to_paste_error)?;
                debug!(id = %id, remaining_views = ?paste.remaining_views(), "View admitted");
                Ok(Some(paste))
            }
            other => {
                debug!(id = %id, admission = ?other, "View refused");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn peek(
        &self,
        id: &PasteId,
        now_override: Option<Timestamp>,
    ) -> Result<Option<Paste>, PasteError> {
        let now = self.time.now(now_override);

        let Some(record) = self
            .repository
            .get(id)
            .await
            .map_err(storage_to_paste_error)?
        else {
            return Ok(None);
        };

        if record.is_expired_at(now) {
            self.repository
                .delete(id)
                .await
                .map_err(storage_to_paste_error)?;
            debug!(id = %id, "Removed expired paste");
            return Ok(None);
        }

        if record.is_exhausted() {
            return Ok(None);
        }

        Paste::try_from(record)
            .map(Some)
            .map_err(storage_to_paste_error)
    }

    async fn ping(&self) -> Result<(), PasteError> {
        self.repository.ping().await.map_err(storage_to_paste_error)
    }
}
