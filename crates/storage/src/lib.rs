//! Storage layer for the registration engine: the `Repository` trait and
//! its in-memory implementation.

pub mod error;
pub mod in_memory;
pub mod repository;

pub use error::StorageError;
pub use in_memory::InMemoryRepository;
pub use repository::{Repository, filter_status};
