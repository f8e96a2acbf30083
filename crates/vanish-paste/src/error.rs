use thiserror::Error;
use vanish_core::StorageError;

#[derive(Debug, Clone, Error)]
pub enum PasteError {
    #[error("{0}")]
    Validation(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for PasteError {
    fn from(value: StorageError) -> Self {
        if value.is_unavailable() {
            Self::Unavailable(value.to_string())
        } else {
            Self::Storage(value.to_string())
        }
    }
}
