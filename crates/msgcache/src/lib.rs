//! # msgcache
//!
//! Fixed-capacity message cache in front of an append-only message log.
//!
//! ## Architecture
//! - **Hash table**: `key % buckets`, chained buckets, arena-backed entries
//! - **Recency order**: doubly-linked list over arena handles (O(1) moves)
//! - **Eviction**: LRU (tail of the recency order) or random
//! - **Fallback**: misses scan the log and promote hits into the cache
//! - **Write-through**: every put appends to the log unless already there
//!
//! Every key in the hash table owns exactly one recency node and every node
//! belongs to exactly one table entry.

#![warn(missing_docs)]

mod cache;
mod clock;
mod config;
mod error;
mod lru;
mod policy;
mod record;
mod shared;
mod stats;
mod store;
mod table;

/// Message identifier used as the cache key
pub type CacheKey = u64;

pub use cache::{MessageCache, PutOutcome, WriteThrough};
pub use clock::{Clock, SystemClock};
pub use config::{CacheConfig, PolicyKind, DEFAULT_BUCKET_COUNT, DEFAULT_CAPACITY};
pub use error::{CacheError, Result};
pub use lru::{LruOrder, NodeHandle};
pub use policy::{EvictionPolicy, LruPolicy, RandomIndex, RandomPolicy, RngIndex, Sampling};
pub use record::{CachedRecord, Lookup, Origin};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::DurableStore;
pub use table::{Entry, HashTable};
