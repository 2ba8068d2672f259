//! Cache configuration

use std::fmt;
use std::str::FromStr;

use crate::error::{CacheError, Result};
use crate::policy::{EvictionPolicy, LruPolicy, RandomPolicy, RngIndex, Sampling};

/// Default number of cached entries
pub const DEFAULT_CAPACITY: usize = 16;

/// Default number of hash buckets
pub const DEFAULT_BUCKET_COUNT: usize = 16;

/// Which eviction policy to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// Least recently used
    #[default]
    Lru,
    /// Uniform random
    Random,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Lru => write!(f, "LRU"),
            PolicyKind::Random => write!(f, "Random"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = CacheError;

    /// Accepts `0`/`lru` and `1`/`random`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "lru" => Ok(PolicyKind::Lru),
            "1" | "random" | "rand" => Ok(PolicyKind::Random),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown policy '{}' (use 0 for LRU or 1 for Random)",
                other
            ))),
        }
    }
}

/// Construction parameters for [`MessageCache`](crate::MessageCache)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    pub capacity: usize,
    /// Number of hash buckets
    pub bucket_count: usize,
    /// Eviction policy
    pub policy: PolicyKind,
    /// Victim sampling for the random policy
    pub sampling: Sampling,
    /// Seed for the random policy; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            bucket_count: DEFAULT_BUCKET_COUNT,
            policy: PolicyKind::default(),
            sampling: Sampling::default(),
            seed: None,
        }
    }
}

impl CacheConfig {
    /// Default config with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Set the bucket count
    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Set the eviction policy
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    /// Set the random sampling mode
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Seed the random policy
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if self.bucket_count == 0 {
            return Err(CacheError::InvalidConfig(
                "bucket count must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Instantiate the configured policy
    pub fn build_policy(&self) -> Box<dyn EvictionPolicy> {
        match self.policy {
            PolicyKind::Lru => Box::new(LruPolicy),
            PolicyKind::Random => {
                let rng = match self.seed {
                    Some(seed) => RngIndex::seeded(seed),
                    None => RngIndex::from_entropy(),
                };
                Box::new(RandomPolicy::with_source(rng, self.sampling))
            }
        }
    }
}
