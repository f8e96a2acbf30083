use crate::generator::IdGenerator;
use std::sync::atomic::{AtomicU64, Ordering};
use vanish_core::{CoreError, PasteId};

/// Produces predictable ids like "t000000", "t000001", ...
///
/// Useful in tests and demos where ids must be known up front.
#[derive(Debug)]
pub struct SeqIdGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SeqIdGenerator {
    /// Creates a generator whose ids start with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidPasteId` if the prefix contains characters
    /// that are not allowed in an id or leaves no room for the counter.
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self, CoreError> {
        let prefix = prefix.into();
        // validate the longest id this generator can produce
        PasteId::parse(format!("{prefix}{}", u64::MAX))?;

        Ok(Self {
            counter: AtomicU64::new(0),
            prefix,
        })
    }
}

impl IdGenerator for SeqIdGenerator {
    fn generate(&self) -> PasteId {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        PasteId::new_unchecked(format!("{}{:06}", self.prefix, count))
    }
}
