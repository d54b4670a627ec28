//! Generic query cache for one application session.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Caches query results under `kind:params` keys
//! - Serves entries without a network call while inside their stale window
//! - Shares one in-flight fetch between concurrent readers of a key
//! - Supports direct writes, per-key and per-kind invalidation, and prefetch

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{MemoryStorage, NoopStorage};
pub use traits::{CacheSource, QueryKey};
