use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// Length of a freshly generated paste id.
pub const PASTE_ID_LENGTH: usize = 12;

/// Minimum number of entropy bytes that always encode to at least
/// [`PASTE_ID_LENGTH`] base58 characters.
pub const MIN_ENTROPY_BYTES: usize = 16;

const MAX_LENGTH: usize = 64;

/// An opaque, URL-safe paste identifier.
///
/// Generated ids are 12 base58 characters. Ids parsed from the outside
/// world are accepted if they are 1-64 characters of `[a-zA-Z0-9_-]`, so
/// lookups for ids that were never issued simply miss.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PasteId(SmolStr);

impl PasteId {
    /// Creates a `PasteId` by base58-encoding the given entropy and keeping
    /// the first [`PASTE_ID_LENGTH`] characters.
    ///
    /// Callers should pass at least [`MIN_ENTROPY_BYTES`] random bytes;
    /// shorter input yields a shorter id.
    ///
    /// # Examples
    ///
    /// ```
    /// use vanish_core::PasteId;
    ///
    /// let id = PasteId::from_entropy([7u8; 16]);
    /// assert_eq!(id.as_str().len(), 12);
    /// ```
    pub fn from_entropy<T: AsRef<[u8]>>(bytes: T) -> Self {
        let encoded = bs58::encode(bytes).into_string();
        let end = encoded.len().min(PASTE_ID_LENGTH);
        Self(SmolStr::new(&encoded[..end]))
    }

    /// Parses an id received from a client.
    pub fn parse(id: impl AsRef<str>) -> Result<Self, CoreError> {
        let id = id.as_ref();
        Self::validate(id)?;
        Ok(Self(SmolStr::new(id)))
    }

    /// Creates a `PasteId` without validation.
    ///
    /// The caller must ensure the id would pass [`PasteId::parse`].
    pub fn new_unchecked(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), CoreError> {
        if id.is_empty() || id.len() > MAX_LENGTH {
            return Err(CoreError::InvalidPasteId(format!(
                "length must be between 1 and {}, got {}",
                MAX_LENGTH,
                id.len()
            )));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidPasteId(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                id
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for PasteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasteId").field(&self.0).finish()
    }
}

impl Display for PasteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PasteId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PasteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = SmolStr::deserialize(deserializer)?;
        PasteId::parse(&s).map_err(serde::de::Error::custom)
    }
}
