pub mod file;
pub mod ids;
pub mod memory;

pub use file::FileStore;
pub use ids::IdAllocator;
pub use memory::MemoryStore;

use anyhow::Result;

use crate::domain::{Id, Tournament};

/// Persistence of whole tournaments, keyed by id.
///
/// `add` fails on an existing id, `replace` and `delete` on a missing one,
/// both with a [`crate::errors::PairingError::Store`] conflict.
pub trait Store: Send + Sync {
    fn ids(&self) -> &IdAllocator;

    fn list(&self) -> Result<Vec<Id>>;

    fn get(&self, id: Id) -> Result<Option<Tournament>>;

    fn add(&self, tournament: &Tournament) -> Result<()>;

    fn replace(&self, tournament: &Tournament) -> Result<()>;

    fn delete(&self, id: Id) -> Result<()>;
}
