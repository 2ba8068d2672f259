//! Coarse-locked handle for sharing a cache between threads
//!
//! One mutex guards the whole engine; a lookup that falls back to the log
//! and promotes the record holds the lock for the full operation.

use std::sync::Arc;

use msglog::Message;
use parking_lot::Mutex;

use crate::cache::{MessageCache, PutOutcome};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::record::Lookup;
use crate::store::DurableStore;
use crate::CacheKey;

/// Cloneable, thread-safe wrapper around a [`MessageCache`]
pub struct SharedCache<S, C = SystemClock> {
    inner: Arc<Mutex<MessageCache<S, C>>>,
}

impl<S, C> Clone for SharedCache<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DurableStore, C: Clock> SharedCache<S, C> {
    /// Take ownership of a cache
    pub fn new(cache: MessageCache<S, C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Locked [`MessageCache::lookup`]
    pub fn lookup(&self, key: CacheKey) -> Result<Lookup> {
        self.inner.lock().lookup(key)
    }

    /// Locked [`MessageCache::put`]
    pub fn put(&self, message: Message) -> Result<PutOutcome> {
        self.inner.lock().put(message)
    }

    /// Get current number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run `f` with exclusive access to the cache
    pub fn with<R>(&self, f: impl FnOnce(&mut MessageCache<S, C>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<S, C> std::fmt::Debug for SharedCache<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, PolicyKind};
    use msglog::MessageLog;
    use std::thread;
    use tempfile::TempDir;

    fn message(id: CacheKey) -> Message {
        Message::new(id, "Sender", "Receiver", "x", false).unwrap()
    }

    #[test]
    fn test_shared_across_threads() {
        let dir = TempDir::new().unwrap();
        let log = MessageLog::open(dir.path()).unwrap();
        let config = CacheConfig::new(8).with_policy(PolicyKind::Random).with_seed(5);
        let shared = SharedCache::new(MessageCache::new(log, config).unwrap());
        assert!(shared.is_empty());

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        let id = t * 10 + i;
                        shared.put(message(id)).unwrap();
                        shared.lookup(id).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.len(), 8);
        shared.with(|cache| cache.check_consistency()).unwrap();
        assert_eq!(shared.with(|cache| cache.store().len().unwrap()), 40);

        for id in 0..40 {
            assert!(shared.lookup(id).unwrap().record().is_some());
        }
    }
}
