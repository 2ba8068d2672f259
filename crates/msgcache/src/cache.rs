//! MessageCache: fixed-capacity cache in front of a message log

use ahash::AHashSet;
use msglog::Message;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::lru::LruOrder;
use crate::policy::EvictionPolicy;
use crate::record::{CachedRecord, Lookup};
use crate::stats::CacheStats;
use crate::store::DurableStore;
use crate::table::HashTable;
use crate::CacheKey;

/// What happened to the durable copy during a put
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteThrough {
    /// A new line was appended to the log
    Appended,
    /// The log already had this key
    AlreadyPresent,
    /// The log could not be checked or written; the cache entry stands
    Failed,
}

/// Outcome of a successful put
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    /// Key evicted to make room, if any
    pub evicted: Option<CacheKey>,
    /// Durable copy status
    pub write_through: WriteThrough,
}

/// Bounded message cache with pluggable eviction and log fallback
///
/// Single-threaded: wrap in [`SharedCache`](crate::SharedCache) to share it.
pub struct MessageCache<S, C = SystemClock> {
    /// Key -> record + recency handle
    table: HashTable<CachedRecord>,

    /// Recency order, head = most recently used
    order: LruOrder,

    /// Active eviction policy
    policy: Box<dyn EvictionPolicy>,

    /// Backing message log
    store: S,

    /// Access-time source
    clock: C,

    /// Maximum number of entries
    capacity: usize,

    /// Cache statistics
    stats: CacheStats,

    /// Extra slots requested on every reservation
    #[cfg(test)]
    reserve_padding: usize,
}

impl<S: DurableStore> MessageCache<S> {
    /// Create a cache over `store` using the system clock
    ///
    /// # Arguments
    /// * `store` - Backing message log
    /// * `config` - Capacity, bucket count and policy
    ///
    /// # Returns
    /// * `Result<MessageCache>` - Empty cache
    pub fn new(store: S, config: CacheConfig) -> Result<Self> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: DurableStore, C: Clock> MessageCache<S, C> {
    /// Create a cache with an explicit clock
    pub fn with_clock(store: S, config: CacheConfig, clock: C) -> Result<Self> {
        let policy = config.build_policy();
        Self::with_policy(store, config, clock, policy)
    }

    /// Create a cache with an explicit clock and policy instance
    ///
    /// The policy fields of `config` are ignored.
    pub fn with_policy(
        store: S,
        config: CacheConfig,
        clock: C,
        policy: Box<dyn EvictionPolicy>,
    ) -> Result<Self> {
        config.validate()?;

        debug!(
            capacity = config.capacity,
            buckets = config.bucket_count,
            policy = policy.name(),
            "creating message cache"
        );

        Ok(Self {
            table: HashTable::new(config.bucket_count),
            order: LruOrder::with_capacity(config.capacity),
            policy,
            store,
            clock,
            capacity: config.capacity,
            stats: CacheStats::new(),
            #[cfg(test)]
            reserve_padding: 0,
        })
    }

    /// Look a message up, falling back to the log on a miss
    ///
    /// A hit refreshes the entry's recency and access time. A log hit is
    /// promoted into the cache, which may evict. Log read failures are
    /// reported as [`Lookup::NotFound`].
    pub fn lookup(&mut self, key: CacheKey) -> Result<Lookup> {
        let now = self.clock.now_millis();

        if let Some(entry) = self.table.find_mut(key) {
            let node = entry.node();
            let record = entry.value_mut();
            record.last_access_ms = now;
            let record = record.clone();

            self.order.move_to_front(node);
            self.stats.record_hit();
            debug!(key, "message served from cache");
            return Ok(Lookup::Hit(record));
        }

        let message = match self.store.scan_for_key(key) {
            Ok(Some(message)) => message,
            Ok(None) => {
                self.stats.record_not_found();
                debug!(key, "message not found in cache or log");
                return Ok(Lookup::NotFound);
            }
            Err(e) => {
                self.stats.record_not_found();
                warn!(key, error = %e, "message log unavailable, treating lookup as not found");
                return Ok(Lookup::NotFound);
            }
        };

        self.stats.record_store_hit();
        debug!(key, "message not in cache, found in log");

        // already durable, so no write-through
        let record = CachedRecord::new(message, now);
        self.insert(record.clone())?;
        Ok(Lookup::FromStore(record))
    }

    /// Cache a message and write it through to the log
    ///
    /// If the cache is full the active policy evicts one entry first. An
    /// already-cached key is overwritten in place and refreshed instead.
    /// Write-through failures do not undo the insert.
    pub fn put(&mut self, message: Message) -> Result<PutOutcome> {
        let record = CachedRecord::new(message.clone(), self.clock.now_millis());
        let evicted = self.insert(record)?;

        Ok(PutOutcome {
            evicted,
            write_through: self.write_through(&message),
        })
    }

    /// Evict one entry chosen by the active policy
    ///
    /// # Returns
    /// * `Ok(None)` - Cache was empty, nothing evicted
    /// * `Ok(Some(key))` - Key that was evicted
    pub fn evict_one(&mut self) -> Result<Option<CacheKey>> {
        match self.policy.select_victim(&self.table, &self.order) {
            Some(victim) => {
                self.evict(victim)?;
                Ok(Some(victim))
            }
            None => Ok(None),
        }
    }

    /// Check for a cached key without touching recency
    pub fn contains(&self, key: CacheKey) -> bool {
        self.table.find(key).is_some()
    }

    /// Read a cached record without touching recency
    pub fn peek(&self, key: CacheKey) -> Option<&CachedRecord> {
        self.table.find(key).map(|entry| entry.value())
    }

    /// Cached keys from most to least recently used
    pub fn keys_by_recency(&self) -> Vec<CacheKey> {
        self.order.iter().collect()
    }

    /// Get current number of cached entries
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Name of the active eviction policy
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Backing message log
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop every cached entry (the log is untouched)
    pub fn clear(&mut self) {
        let released = self.table.len();
        self.table.clear();
        self.order.clear();
        info!(released, "message cache cleared");
    }

    /// Verify that the hash table and recency order hold the same keys
    pub fn check_consistency(&self) -> Result<()> {
        if self.table.len() != self.order.len() {
            return Err(CacheError::ConsistencyViolation {
                key: None,
                detail: "hash table and recency order sizes differ",
            });
        }
        if self.table.len() > self.capacity {
            return Err(CacheError::ConsistencyViolation {
                key: None,
                detail: "entry count exceeds capacity",
            });
        }

        let mut seen = AHashSet::with_capacity(self.table.len());
        for entry in self.table.iter() {
            if self.order.key(entry.node()) != Some(entry.key()) {
                return Err(CacheError::ConsistencyViolation {
                    key: Some(entry.key()),
                    detail: "entry does not own a matching recency node",
                });
            }
            if !seen.insert(entry.key()) {
                return Err(CacheError::ConsistencyViolation {
                    key: Some(entry.key()),
                    detail: "key cached twice",
                });
            }
        }

        match self.order.iter().find(|key| !seen.contains(key)) {
            Some(key) => Err(CacheError::ConsistencyViolation {
                key: Some(key),
                detail: "recency node without hash table entry",
            }),
            None => Ok(()),
        }
    }

    /// Cache `record`, returning the key evicted to make room
    fn insert(&mut self, record: CachedRecord) -> Result<Option<CacheKey>> {
        let key = record.message.id;

        if let Some(entry) = self.table.find_mut(key) {
            let node = entry.node();
            *entry.value_mut() = record;
            self.order.move_to_front(node);
            debug!(key, "refreshed cached message");
            return Ok(None);
        }

        // Reserve before touching either structure so a failure leaves both intact.
        self.reserve_slot()?;

        let mut evicted = None;
        if self.table.len() >= self.capacity {
            evicted = self.evict_one()?;
            if evicted.is_none() {
                warn!(key, capacity = self.capacity, "cache full but no victim available");
            }
        }

        let node = self.order.push_front(key);
        self.table.insert(key, record, node);
        self.stats.record_insert();
        debug!(key, "stored message in cache");

        Ok(evicted)
    }

    fn reserve_slot(&mut self) -> Result<()> {
        #[cfg(test)]
        let additional = self.reserve_padding.saturating_add(1);
        #[cfg(not(test))]
        let additional = 1;

        self.table.try_reserve(additional)?;
        self.order.try_reserve(additional)?;
        Ok(())
    }

    fn evict(&mut self, victim: CacheKey) -> Result<()> {
        let entry = self
            .table
            .remove(victim)
            .ok_or(CacheError::ConsistencyViolation {
                key: Some(victim),
                detail: "victim missing from hash table",
            })?;

        if self.order.release(entry.node()) != Some(victim) {
            return Err(CacheError::ConsistencyViolation {
                key: Some(victim),
                detail: "victim missing from recency order",
            });
        }

        self.stats.record_eviction();
        debug!(key = victim, policy = self.policy.name(), "evicted message from cache");
        Ok(())
    }

    fn write_through(&self, message: &Message) -> WriteThrough {
        match self.store.append(message) {
            Ok(true) => {
                debug!(key = message.id, "message written to log");
                WriteThrough::Appended
            }
            Ok(false) => WriteThrough::AlreadyPresent,
            Err(e) => {
                self.stats.record_write_through_failure();
                warn!(key = message.id, error = %e, "write-through to message log failed");
                WriteThrough::Failed
            }
        }
    }
}

impl<S, C> std::fmt::Debug for MessageCache<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCache")
            .field("len", &self.table.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}
