//! # ttlcache
//!
//! Bounded, time-expiring, thread-safe object cache for transient keyed
//! records that are expensive to rebuild.
//!
//! ## Architecture
//! - **Index**: AHash map from key to list handle (O(1))
//! - **Recency List**: arena-backed doubly-linked list; insertions at the
//!   head, evictions from the tail (O(1))
//! - **Lock**: one `RwLock` per cache; reads shared, structural changes exclusive
//! - **Sweeper**: background thread removing expired entries from the tail
//! - **Promoter**: background thread moving frequently read entries to the head
//!
//! ## Example
//! ```
//! use std::time::Duration;
//! use ttlcache::{Cache, CacheConfig};
//!
//! let cache: Cache<&str, i32> = Cache::with_config(
//!     CacheConfig::new(Duration::from_secs(30)).max_size(2),
//! )?;
//!
//! cache.add("a", 1)?;
//! cache.add("b", 2)?;
//! cache.add("c", 3)?; // evicts "a"
//!
//! assert!(cache.get("a").is_none());
//! assert_eq!(cache.get("c").as_deref(), Some(&3));
//! # Ok::<(), ttlcache::CacheError>(())
//! ```

#![warn(missing_docs)]

mod background;
mod cache;
mod config;
mod entry;
mod error;
mod recency;
mod stats;
mod store;

pub use cache::Cache;
pub use config::{
    CacheConfig, DEFAULT_MAX_SIZE, DEFAULT_PROMOTION_QUEUE_BOUND, DEFAULT_PROMOTION_THRESHOLD,
    DEFAULT_SWEEP_INTERVAL,
};
pub use error::{CacheError, Result};
pub use stats::CacheStats;
