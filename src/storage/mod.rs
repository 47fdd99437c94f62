pub mod base;
pub mod disk;
pub mod factory;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

pub use base::{CharacterRecord, CharacterStore, MonitoredCharacter, StorageError, StorageResult};
pub use disk::DiskStore;
pub use factory::{create_store, StorageType};
pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;
