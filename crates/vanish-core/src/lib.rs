//! Core types and traits for the Vanish paste store.
//!
//! This crate holds the paste entity, its persisted and public shapes,
//! the clock abstraction, and the storage contract that every backend
//! implements. It performs no I/O of its own.

pub mod clock;
pub mod error;
pub mod paste;
pub mod paste_id;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock, TimeMode, TimeSource};
pub use error::{CoreError, StorageError};
pub use paste::{Admission, Paste, PasteRecord, PasteView};
pub use paste_id::PasteId;
pub use repository::PasteRepository;
