//! Local persistence for the loaded dataset and user preferences.
//!
//! This module provides:
//! - A raw key-value backend trait with SQLite, in-memory and no-op backends
//! - A namespaced cache store that wraps values with an optional expiry
//! - Lazy expiry: stale entries are removed when read

mod storage;
mod store;
mod traits;

pub use storage::{Backend, MemoryBackend, NoopBackend, SqliteBackend};
pub use store::{CacheEntry, CacheStore};
pub use traits::{Clock, KvBackend, SystemClock};

#[cfg(test)]
pub use traits::ManualClock;
