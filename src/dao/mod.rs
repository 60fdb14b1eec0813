/// Data backend abstraction: row CRUD plus per-table change feeds.
pub mod backend;
/// In-memory backend used by tests and feature-less builds.
pub mod memory;
/// Entity model definitions shared across backends.
pub mod models;
/// Storage abstraction layer for backend errors.
pub mod storage;

#[cfg(feature = "mongo-store")]
pub mod mongodb;
