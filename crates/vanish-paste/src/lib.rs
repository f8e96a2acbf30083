//! The paste store service.
//!
//! [`PasteService`] implements [`PasteStore`] and owns paste creation and
//! the read-and-consume lifecycle. Storage is delegated to a
//! [`vanish_core::PasteRepository`] and time to a [`vanish_core::TimeSource`].

pub mod error;
pub mod generator;
pub mod params;
pub mod service;
pub mod store;

pub use error::PasteError;
pub use generator::{IdGenerator, RandomIdGenerator};
pub use params::NewPaste;
pub use service::PasteService;
pub use store::PasteStore;
