use crate::error::StorageError;
use crate::paste_id::PasteId;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A paste as the rest of the system sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paste {
    pub id: PasteId,
    pub content: String,
    pub created_at: Timestamp,
    /// `None` means the paste never expires by time.
    pub expires_at: Option<Timestamp>,
    /// `None` means the paste may be read any number of times.
    pub max_views: Option<u32>,
    pub views_used: u32,
}

impl Paste {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_views
            .is_some_and(|max_views| self.views_used >= max_views)
    }

    /// Views left in the budget, or `None` when the budget is unlimited.
    pub fn remaining_views(&self) -> Option<u32> {
        self.max_views
            .map(|max_views| max_views.saturating_sub(self.views_used))
    }

    /// Projects the paste into the shape returned to readers.
    pub fn view(&self) -> PasteView {
        PasteView {
            content: self.content.clone(),
            remaining_views: self.remaining_views(),
            expires_at: self.expires_at.map(|at| format!("{at:.3}")),
        }
    }
}

/// The persisted shape of a paste, stored as JSON under `paste:{id}`.
///
/// Timestamps are milliseconds since the Unix epoch so that server-side
/// scripts can compare them without parsing dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteRecord {
    pub id: PasteId,
    pub content: String,
    pub created_at_ms: i64,
    pub expires_at_ms: Option<i64>,
    pub max_views: Option<u32>,
    pub views_used: u32,
}

impl PasteRecord {
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at_ms
            .is_some_and(|expires_at_ms| now.as_millisecond() >= expires_at_ms)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_views
            .is_some_and(|max_views| self.views_used >= max_views)
    }

    /// Decides whether one more view may be served at `now`.
    ///
    /// This is the rule every backend applies inside its atomic step. On
    /// admission the returned record already has `views_used` advanced by
    /// one; the caller persists it, or deletes the key when the returned
    /// record [`is_exhausted`](Self::is_exhausted).
    pub fn admit(&self, now: Timestamp) -> Admission {
        if self.is_expired_at(now) {
            return Admission::Expired;
        }
        if self.is_exhausted() {
            return Admission::Exhausted;
        }

        let mut next = self.clone();
        next.views_used = next.views_used.saturating_add(1);
        Admission::Admitted(next)
    }
}

/// Outcome of an atomic consume attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The view was granted. Holds the record as of this read.
    Admitted(PasteRecord),
    Missing,
    Expired,
    Exhausted,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

impl From<&Paste> for PasteRecord {
    fn from(paste: &Paste) -> Self {
        Self {
            id: paste.id.clone(),
            content: paste.content.clone(),
            created_at_ms: paste.created_at.as_millisecond(),
            expires_at_ms: paste.expires_at.map(|at| at.as_millisecond()),
            max_views: paste.max_views,
            views_used: paste.views_used,
        }
    }
}

impl TryFrom<PasteRecord> for Paste {
    type Error = StorageError;

    fn try_from(record: PasteRecord) -> Result<Self, Self::Error> {
        let to_timestamp = |field: &str, ms: i64| {
            Timestamp::from_millisecond(ms).map_err(|e| {
                StorageError::InvalidData(format!(
                    "paste '{}' has invalid {field} {ms}: {e}",
                    record.id
                ))
            })
        };

        let created_at = to_timestamp("created_at_ms", record.created_at_ms)?;
        let expires_at = record
            .expires_at_ms
            .map(|ms| to_timestamp("expires_at_ms", ms))
            .transpose()?;

        Ok(Self {
            id: record.id,
            content: record.content,
            created_at,
            expires_at,
            max_views: record.max_views,
            views_used: record.views_used,
        })
    }
}

/// What a reader receives for a successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteView {
    pub content: String,
    pub remaining_views: Option<u32>,
    /// ISO-8601 UTC with millisecond precision.
    pub expires_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_millisecond(ms).unwrap()
    }

    fn record(expires_at_ms: Option<i64>, max_views: Option<u32>, views_used: u32) -> PasteRecord {
        PasteRecord {
            id: PasteId::parse("abc123").unwrap(),
            content: "hello".to_string(),
            created_at_ms: 0,
            expires_at_ms,
            max_views,
            views_used,
        }
    }

    #[test]
    fn unlimited_record_is_always_admitted() {
        let r = record(None, None, 41);
        match r.admit(ts(i64::from(i32::MAX))) {
            Admission::Admitted(next) => {
                assert_eq!(next.views_used, 42);
                assert!(!next.is_exhausted());
            }
            other => panic!("expected admission, got {other:?}"),
        }
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let r = record(Some(60_000), None, 0);
        assert!(r.admit(ts(59_999)).is_admitted());
        assert_eq!(r.admit(ts(60_000)), Admission::Expired);
        assert_eq!(r.admit(ts(60_001)), Admission::Expired);
    }

    #[test]
    fn last_view_is_admitted_then_exhausted() {
        let r = record(None, Some(2), 1);
        let Admission::Admitted(next) = r.admit(ts(0)) else {
            panic!("last view should be admitted");
        };
        assert_eq!(next.views_used, 2);
        assert!(next.is_exhausted());
        assert_eq!(next.admit(ts(0)), Admission::Exhausted);
    }

    #[test]
    fn expiry_wins_over_exhaustion() {
        let r = record(Some(10), Some(1), 1);
        assert_eq!(r.admit(ts(10)), Admission::Expired);
    }

    #[test]
    fn record_round_trips_through_paste() {
        let r = record(Some(60_000), Some(3), 1);
        let paste = Paste::try_from(r.clone()).unwrap();
        assert_eq!(paste.expires_at, Some(ts(60_000)));
        assert_eq!(PasteRecord::from(&paste), r);
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let mut r = record(None, None, 0);
        r.created_at_ms = i64::MAX;
        let err = Paste::try_from(r).unwrap_err();
        assert!(matches!(err, StorageError::InvalidData(_)));
    }

    #[test]
    fn record_json_shape() {
        let r = record(None, Some(2), 0);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "abc123",
                "content": "hello",
                "created_at_ms": 0,
                "expires_at_ms": null,
                "max_views": 2,
                "views_used": 0,
            })
        );
    }

    #[test]
    fn view_projection() {
        let paste = Paste::try_from(record(Some(60_000), Some(2), 2)).unwrap();
        let view = paste.view();
        assert_eq!(view.remaining_views, Some(0));
        assert_eq!(view.expires_at.as_deref(), Some("1970-01-01T00:01:00.000Z"));

        let unlimited = Paste::try_from(record(None, None, 7)).unwrap().view();
        assert_eq!(unlimited.remaining_views, None);
        assert_eq!(unlimited.expires_at, None);
    }

    #[test]
    fn remaining_views_never_underflows() {
        let paste = Paste::try_from(record(None, Some(1), 5)).unwrap();
        assert_eq!(paste.remaining_views(), Some(0));
        assert!(paste.is_exhausted());
    }
}
