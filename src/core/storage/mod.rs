//! Document store collaborator and the map persistence adapter built on it.

pub mod implementations;
pub mod persistence;
pub mod traits;

pub use implementations::file::FileDocumentStore;
pub use implementations::in_memory::MemoryDocumentStore;
pub use persistence::MapPersistence;
pub use traits::{DocumentStore, Revision, StoredDocument};
