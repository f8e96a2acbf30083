//! HTTP surface of the Vanish paste store.

pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod model;
pub mod page;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use state::AppState;
