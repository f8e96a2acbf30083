//! Storage backends for the Vanish paste store.

pub mod connection;
pub mod memory;
pub mod redis;

pub use connection::{RedisConnector, RedisSettings};
pub use memory::InMemoryRepository;
pub use self::redis::RedisRepository;
