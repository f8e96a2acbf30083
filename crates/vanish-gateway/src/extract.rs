use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jiff::Timestamp;
use std::convert::Infallible;

/// Header carrying a simulated "now", in milliseconds since the Unix epoch.
pub const TEST_NOW_HEADER: &str = "x-test-now-ms";

/// The instant requested through [`TEST_NOW_HEADER`], if any.
///
/// Extraction never fails: a missing or malformed header yields `None` and
/// the store falls back to its clock. Whether a present value is honoured
/// is up to the store's time mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NowOverride(pub Option<Timestamp>);

pub fn parse_now_override(headers: &HeaderMap) -> Option<Timestamp> {
    let raw = headers.get(TEST_NOW_HEADER)?.to_str().ok()?;
    let ms = raw.trim().parse::<i64>().ok()?;
    Timestamp::from_millisecond(ms).ok()
}

impl<S: Send + Sync> FromRequestParts<S> for NowOverride {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parse_now_override(&parts.headers)))
    }
}
