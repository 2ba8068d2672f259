//! Error types for msgcache

use std::collections::TryReserveError;
use std::fmt;

use crate::CacheKey;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors surfaced by the cache engine
///
/// Log failures never appear here: a failed fallback read degrades to a miss
/// and a failed write-through is reported in the put outcome.
#[derive(Debug)]
pub enum CacheError {
    /// Rejected configuration
    InvalidConfig(String),

    /// Could not reserve room for a new entry; nothing was modified
    AllocationFailure(TryReserveError),

    /// Hash table and recency order disagree
    ConsistencyViolation {
        /// Key involved, when one is known
        key: Option<CacheKey>,
        /// What disagreed
        detail: &'static str,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidConfig(msg) => write!(f, "Invalid cache config: {}", msg),
            CacheError::AllocationFailure(e) => write!(f, "Allocation failed: {}", e),
            CacheError::ConsistencyViolation {
                key: Some(key),
                detail,
            } => write!(f, "Cache consistency violation for key {}: {}", key, detail),
            CacheError::ConsistencyViolation { key: None, detail } => {
                write!(f, "Cache consistency violation: {}", detail)
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::AllocationFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TryReserveError> for CacheError {
    fn from(err: TryReserveError) -> Self {
        CacheError::AllocationFailure(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CacheError::ConsistencyViolation {
            key: Some(4),
            detail: "victim missing from hash table",
        };
        assert_eq!(
            err.to_string(),
            "Cache consistency violation for key 4: victim missing from hash table"
        );

        let err = CacheError::InvalidConfig("capacity must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid cache config: capacity must be greater than 0"
        );
    }

    #[test]
    fn test_allocation_source() {
        let reserve_err = Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err();
        let err = CacheError::from(reserve_err);

        assert!(matches!(err, CacheError::AllocationFailure(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
