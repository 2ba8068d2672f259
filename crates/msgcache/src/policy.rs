//! Victim selection for a full cache
//!
//! Two interchangeable strategies:
//! - [`LruPolicy`]: evict the tail of the recency order
//! - [`RandomPolicy`]: evict a randomly drawn occupied key

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::CacheError;
use crate::lru::LruOrder;
use crate::record::CachedRecord;
use crate::table::{Entry, HashTable};
use crate::CacheKey;

/// Picks the key to remove when the cache is full
pub trait EvictionPolicy: Send {
    /// Choose a victim; `None` when nothing is cached
    fn select_victim(
        &mut self,
        table: &HashTable<CachedRecord>,
        order: &LruOrder,
    ) -> Option<CacheKey>;

    /// Short policy name for logs and reports
    fn name(&self) -> &'static str;
}

/// Least-recently-used eviction
#[derive(Debug, Clone, Copy, Default)]
pub struct LruPolicy;

impl EvictionPolicy for LruPolicy {
    fn select_victim(
        &mut self,
        _table: &HashTable<CachedRecord>,
        order: &LruOrder,
    ) -> Option<CacheKey> {
        order.peek_tail()
    }

    fn name(&self) -> &'static str {
        "LRU"
    }
}

/// Source of uniform indices in `[0, bound)`
pub trait RandomIndex: Send {
    /// Draw an index; `bound` is always greater than zero
    fn uniform_index(&mut self, bound: usize) -> usize;
}

/// [`RandomIndex`] backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RngIndex<R>(R);

impl<R> RngIndex<R> {
    /// Wrap an existing generator
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngIndex<StdRng> {
    /// Generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Reproducible generator
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomIndex for RngIndex<R> {
    fn uniform_index(&mut self, bound: usize) -> usize {
        self.0.gen_range(0..bound)
    }
}

/// How [`RandomPolicy`] draws its victim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// One draw over all occupied keys
    #[default]
    Uniform,
    /// Random start bucket, walk to the next non-empty one, then draw within
    /// its chain. Keys in short chains are favoured over keys in long ones.
    BucketWalk,
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sampling::Uniform => write!(f, "uniform"),
            Sampling::BucketWalk => write!(f, "bucket-walk"),
        }
    }
}

impl FromStr for Sampling {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(Sampling::Uniform),
            "bucket-walk" | "bucketwalk" | "bucket" => Ok(Sampling::BucketWalk),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown sampling mode '{}'",
                other
            ))),
        }
    }
}

/// Random eviction
pub struct RandomPolicy<R = RngIndex<StdRng>> {
    rng: R,
    sampling: Sampling,
}

impl RandomPolicy {
    /// Uniform random policy seeded from entropy
    pub fn new() -> Self {
        Self::with_source(RngIndex::from_entropy(), Sampling::Uniform)
    }

    /// Uniform random policy with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self::with_source(RngIndex::seeded(seed), Sampling::Uniform)
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomIndex> RandomPolicy<R> {
    /// Random policy over an arbitrary index source
    pub fn with_source(rng: R, sampling: Sampling) -> Self {
        Self { rng, sampling }
    }

    /// Change the sampling mode
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Active sampling mode
    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    fn uniform(&mut self, table: &HashTable<CachedRecord>) -> Option<CacheKey> {
        if table.is_empty() {
            return None;
        }
        let pick = self.rng.uniform_index(table.len());
        table.iter().nth(pick).map(Entry::key)
    }

    fn bucket_walk(&mut self, table: &HashTable<CachedRecord>) -> Option<CacheKey> {
        if table.is_empty() {
            return None;
        }

        let buckets = table.bucket_count();
        let start = self.rng.uniform_index(buckets);
        let bucket = (0..buckets)
            .map(|step| (start + step) % buckets)
            .find(|&bucket| table.chain(bucket).next().is_some())?;

        let chain_len = table.chain(bucket).count();
        let pick = self.rng.uniform_index(chain_len);
        table.chain(bucket).nth(pick).map(Entry::key)
    }
}

impl<R> fmt::Debug for RandomPolicy<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomPolicy")
            .field("sampling", &self.sampling)
            .finish_non_exhaustive()
    }
}

impl<R: RandomIndex> EvictionPolicy for RandomPolicy<R> {
    fn select_victim(
        &mut self,
        table: &HashTable<CachedRecord>,
        _order: &LruOrder,
    ) -> Option<CacheKey> {
        match self.sampling {
            Sampling::Uniform => self.uniform(table),
            Sampling::BucketWalk => self.bucket_walk(table),
        }
    }

    fn name(&self) -> &'static str {
        "Random"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use msglog::Message;
    use std::collections::VecDeque;

    /// Replays a fixed list of indices
    #[derive(Debug, Default)]
    pub(crate) struct Scripted(pub VecDeque<usize>);

    impl Scripted {
        pub(crate) fn new(picks: &[usize]) -> Self {
            Self(picks.iter().copied().collect())
        }
    }

    impl RandomIndex for Scripted {
        fn uniform_index(&mut self, bound: usize) -> usize {
            self.0.pop_front().unwrap_or(0) % bound
        }
    }

    fn populated(bucket_count: usize, keys: &[CacheKey]) -> (HashTable<CachedRecord>, LruOrder) {
        let mut table = HashTable::new(bucket_count);
        let mut order = LruOrder::new();
        for &key in keys {
            let msg = Message::new(key, "s", "r", "c", false).unwrap();
            let node = order.push_front(key);
            table.insert(key, CachedRecord::new(msg, 0), node);
        }
        (table, order)
    }

    #[test]
    fn test_lru_picks_tail() {
        let (table, order) = populated(4, &[1, 2, 3]);
        assert_eq!(LruPolicy.select_victim(&table, &order), Some(1));
    }

    #[test]
    fn test_lru_empty() {
        let (table, order) = populated(4, &[]);
        assert_eq!(LruPolicy.select_victim(&table, &order), None);
    }

    #[test]
    fn test_random_empty() {
        let (table, order) = populated(4, &[]);
        let mut policy = RandomPolicy::seeded(1);
        assert_eq!(policy.select_victim(&table, &order), None);

        let mut walk = RandomPolicy::seeded(1).with_sampling(Sampling::BucketWalk);
        assert_eq!(walk.select_victim(&table, &order), None);
    }

    #[test]
    fn test_random_sampling_mode() {
        assert_eq!(RandomPolicy::seeded(1).sampling(), Sampling::Uniform);

        let walk = RandomPolicy::seeded(1).with_sampling(Sampling::BucketWalk);
        assert_eq!(walk.sampling(), Sampling::BucketWalk);
    }

    #[test]
    fn test_uniform_follows_table_order() {
        // bucket 0: [4, 0], bucket 1: [5, 1]
        let (table, order) = populated(4, &[0, 1, 4, 5]);
        let mut policy = RandomPolicy::with_source(Scripted::new(&[0, 1, 2, 3]), Sampling::Uniform);

        let picks: Vec<_> = (0..4)
            .map(|_| policy.select_victim(&table, &order).unwrap())
            .collect();
        assert_eq!(picks, vec![4, 0, 5, 1]);
    }

    #[test]
    fn test_bucket_walk_skips_empty_buckets() {
        // only bucket 2 occupied: chain [10, 6, 2]
        let (table, order) = populated(4, &[2, 6, 10]);
        let mut policy =
            RandomPolicy::with_source(Scripted::new(&[3, 1]), Sampling::BucketWalk);

        // start at 3, wrap to 0, 1, 2; second draw picks chain index 1
        assert_eq!(policy.select_victim(&table, &order), Some(6));
    }

    #[test]
    fn test_bucket_walk_favours_short_chains() {
        // bucket 0: [8, 4, 0], bucket 1: [1]
        let (table, order) = populated(2, &[0, 4, 8, 1]);
        let mut policy =
            RandomPolicy::with_source(Scripted::new(&[1, 0]), Sampling::BucketWalk);

        assert_eq!(policy.select_victim(&table, &order), Some(1));
    }

    #[test]
    fn test_seeded_victim_is_cached() {
        let keys = [3, 7, 11, 12, 40];
        let (table, order) = populated(16, &keys);
        let mut policy = RandomPolicy::seeded(42);

        for _ in 0..50 {
            let victim = policy.select_victim(&table, &order).unwrap();
            assert!(keys.contains(&victim));
        }
    }

    #[test]
    fn test_sampling_from_str() {
        assert_eq!("uniform".parse::<Sampling>().unwrap(), Sampling::Uniform);
        assert_eq!("Bucket-Walk".parse::<Sampling>().unwrap(), Sampling::BucketWalk);
        assert!("zipf".parse::<Sampling>().is_err());
        assert_eq!(Sampling::BucketWalk.to_string(), "bucket-walk");
    }

    #[test]
    fn test_names() {
        assert_eq!(LruPolicy.name(), "LRU");
        assert_eq!(RandomPolicy::seeded(0).name(), "Random");
    }
}
