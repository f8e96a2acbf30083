pub mod seq;

use rand::RngCore;
use vanish_core::paste_id::MIN_ENTROPY_BYTES;
use vanish_core::PasteId;

/// Trait for generating paste ids.
///
/// Implementations are pure generators that don't interact with storage.
/// Collisions are not detected, so the id space must make them negligible.
pub trait IdGenerator: Send + Sync + 'static {
    fn generate(&self) -> PasteId;
}

/// Generates 12-character base58 ids from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> PasteId {
        let mut bytes = [0u8; MIN_ENTROPY_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        PasteId::from_entropy(bytes)
    }
}
