use crate::error::PasteError;
use crate::params::NewPaste;
use async_trait::async_trait;
use jiff::Timestamp;
use vanish_core::{Paste, PasteId};

/// The operations the outside world performs on pastes.
///
/// `now_override` replaces the clock for one call, but only when the store
/// runs in [`TimeMode::Deterministic`](vanish_core::TimeMode::Deterministic). Otherwise it is ignored.
#[async_trait]
pub trait PasteStore: Send + Sync + 'static {
    /// Stores a new paste and returns it.
    ///
    /// `expires_at` is `now + ttl_seconds` when a TTL is given. The same TTL
    /// is handed to the backend as its own eviction deadline.
    async fn create(
        &self,
        params: NewPaste,
        now_override: Option<Timestamp>,
    ) -> Result<Paste, PasteError>;

    /// Reads a paste and spends one view of its budget.
    ///
    /// Returns `None` when the paste never existed, has expired, or has no
    /// views left. The caller cannot tell these apart. The reader that
    /// spends the last view still gets the paste, with zero views remaining.
    async fn read_and_consume(
        &self,
        id: &PasteId,
        now_override: Option<Timestamp>,
    ) -> Result<Option<Paste>, PasteError>;

    /// Reads a paste without spending a view.
    ///
    /// Applies the same expiry check as [`read_and_consume`](Self::read_and_consume),
    /// removing a paste found past its expiry. A paste with no views left is
    /// reported as missing.
    async fn peek(
        &self,
        id: &PasteId,
        now_override: Option<Timestamp>,
    ) -> Result<Option<Paste>, PasteError>;

    /// Checks that the storage backend is reachable.
    async fn ping(&self) -> Result<(), PasteError>;
}
