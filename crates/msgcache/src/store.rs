//! Durable store seam used for miss fallback and write-through

use msglog::{Message, MessageLog, Result};

use crate::CacheKey;

/// Operations the cache needs from its backing log
///
/// All calls are synchronous and may block for a full scan.
pub trait DurableStore {
    /// First message with the given key, if any
    fn scan_for_key(&self, key: CacheKey) -> Result<Option<Message>>;

    /// Whether a message with the given key has been written
    fn exists_key(&self, key: CacheKey) -> Result<bool>;

    /// Append a message unless its key is present; returns whether it wrote
    ///
    /// Implementations must refuse duplicates; the cache does not check
    /// `exists_key` before calling this.
    fn append(&self, message: &Message) -> Result<bool>;
}

impl DurableStore for MessageLog {
    fn scan_for_key(&self, key: CacheKey) -> Result<Option<Message>> {
        MessageLog::scan_for_key(self, key)
    }

    fn exists_key(&self, key: CacheKey) -> Result<bool> {
        MessageLog::exists_key(self, key)
    }

    fn append(&self, message: &Message) -> Result<bool> {
        MessageLog::append(self, message)
    }
}
