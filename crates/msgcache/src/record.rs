//! Cached payloads and lookup results

use msglog::Message;

/// A message held in the cache plus access metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRecord {
    /// The cached message
    pub message: Message,
    /// Wall-clock milliseconds of the most recent hit (or insertion)
    pub last_access_ms: i64,
}

impl CachedRecord {
    /// Wrap a message stamped at `now_ms`
    pub fn new(message: Message, now_ms: i64) -> Self {
        Self {
            message,
            last_access_ms: now_ms,
        }
    }
}

/// Where a lookup was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Served from memory
    FoundInCache,
    /// Missed memory, found in the message log
    FoundInStore,
    /// Neither in memory nor in the log
    NotFound,
}

/// Result of [`MessageCache::lookup`](crate::MessageCache::lookup)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Cache hit
    Hit(CachedRecord),
    /// Cache miss resolved from the log and promoted into the cache
    FromStore(CachedRecord),
    /// Not found anywhere
    NotFound,
}

impl Lookup {
    /// Where this result came from
    pub fn origin(&self) -> Origin {
        match self {
            Lookup::Hit(_) => Origin::FoundInCache,
            Lookup::FromStore(_) => Origin::FoundInStore,
            Lookup::NotFound => Origin::NotFound,
        }
    }

    /// Resolved record, if any
    pub fn record(&self) -> Option<&CachedRecord> {
        match self {
            Lookup::Hit(record) | Lookup::FromStore(record) => Some(record),
            Lookup::NotFound => None,
        }
    }

    /// Consume into the resolved record, if any
    pub fn into_record(self) -> Option<CachedRecord> {
        match self {
            Lookup::Hit(record) | Lookup::FromStore(record) => Some(record),
            Lookup::NotFound => None,
        }
    }

    /// True for a cache hit
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CachedRecord {
        let msg = Message::new(1, "a", "b", "c", false).unwrap();
        CachedRecord::new(msg, 10)
    }

    #[test]
    fn test_origin() {
        assert_eq!(Lookup::Hit(record()).origin(), Origin::FoundInCache);
        assert_eq!(Lookup::FromStore(record()).origin(), Origin::FoundInStore);
        assert_eq!(Lookup::NotFound.origin(), Origin::NotFound);
    }

    #[test]
    fn test_record_access() {
        let hit = Lookup::Hit(record());
        assert!(hit.is_hit());
        assert_eq!(hit.record().unwrap().last_access_ms, 10);
        assert_eq!(hit.into_record(), Some(record()));

        assert!(!Lookup::FromStore(record()).is_hit());
        assert!(Lookup::NotFound.record().is_none());
        assert!(Lookup::NotFound.into_record().is_none());
    }
}
