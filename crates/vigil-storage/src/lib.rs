//! Session store backends.
//!
//! This crate provides:
//! - The [`SessionStore`] trait the session manager and aggregator write to
//! - An in-memory store for tests and embedded deployments
//! - A Redis-backed store for durable deployments

pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use redis_store::{RedisStore, RedisStoreConfig};
pub use store::SessionStore;
