//! Storage layer

mod storage;

pub use storage::{EngineStorage, StorageError, StorageResult};
