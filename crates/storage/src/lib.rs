#![forbid(unsafe_code)]

pub mod learner_store;
pub mod repository;
pub mod sqlite;

pub use learner_store::{LearnerSnapshot, LearnerStore, PersistenceReadError};
pub use repository::{InMemoryRepository, KeyValueStore, Storage, StorageError};
