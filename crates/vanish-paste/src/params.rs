use crate::error::PasteError;
use std::time::Duration;

pub const CONTENT_REQUIRED: &str = "content must be a non-empty string";
pub const INVALID_TTL: &str = "ttl_seconds must be an integer >= 1";
pub const INVALID_MAX_VIEWS: &str = "max_views must be an integer >= 1";

/// A validated request to create a paste.
///
/// The only way to obtain one is [`NewPaste::new`], so holding a
/// `NewPaste` means every field already satisfied its constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaste {
    content: String,
    ttl_seconds: Option<i64>,
    max_views: Option<u32>,
}

impl NewPaste {
    /// Validates the raw fields of a create request.
    ///
    /// Fails on the first field that violates its constraint:
    /// - `content` must contain something other than whitespace
    /// - `ttl_seconds`, when present, must be at least 1
    /// - `max_views`, when present, must be at least 1 and fit in a `u32`
    pub fn new(
        content: String,
        ttl_seconds: Option<i64>,
        max_views: Option<i64>,
    ) -> Result<Self, PasteError> {
        if content.trim().is_empty() {
            return Err(PasteError::Validation(CONTENT_REQUIRED.to_string()));
        }

        if ttl_seconds.is_some_and(|ttl| ttl < 1) {
            return Err(PasteError::Validation(INVALID_TTL.to_string()));
        }

        let max_views = match max_views {
            None => None,
            Some(n) if n < 1 => {
                return Err(PasteError::Validation(INVALID_MAX_VIEWS.to_string()));
            }
            Some(n) => Some(u32::try_from(n).map_err(|_| {
                PasteError::Validation(format!("max_views must be at most {}", u32::MAX))
            })?),
        };

        Ok(Self {
            content,
            ttl_seconds,
            max_views,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn ttl_seconds(&self) -> Option<i64> {
        self.ttl_seconds
    }

    /// The TTL as a duration, for the backend-native expiry.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds
            .map(|ttl| Duration::from_secs(ttl.unsigned_abs()))
    }

    pub fn max_views(&self) -> Option<u32> {
        self.max_views
    }

    pub(crate) fn into_content(self) -> String {
        self.content
    }
}
