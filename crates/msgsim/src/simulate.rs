//! Seeding and lookup phases of a hit-rate run

use anyhow::Result;
use msgcache::{CacheKey, DurableStore, MessageCache, Origin};
use msglog::Message;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

/// Sender name used for generated messages
pub const SENDER: &str = "Sender";

/// Receiver name used for generated messages
pub const RECEIVER: &str = "Receiver";

/// One lookup during a phase
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Access {
    pub id: CacheKey,
    pub origin: &'static str,
}

/// Result of a run of random lookups
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub name: String,
    pub accesses: Vec<Access>,
    pub hits: usize,
    pub misses: usize,
}

impl PhaseReport {
    pub fn hit_rate_percent(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhaseSummary {
    pub accesses: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate_percent: f64,
}

impl From<&PhaseReport> for PhaseSummary {
    fn from(phase: &PhaseReport) -> Self {
        Self {
            accesses: phase.accesses.len(),
            hits: phase.hits,
            misses: phase.misses,
            hit_rate_percent: phase.hit_rate_percent(),
        }
    }
}

/// Whole-run summary written as JSON
#[derive(Debug, Serialize)]
pub struct Summary {
    pub policy: String,
    pub capacity: usize,
    pub messages: u64,
    pub warmup: PhaseSummary,
    pub simulation: PhaseSummary,
    pub evictions: u64,
    pub store_hits: u64,
    pub write_through_failures: u64,
}

pub fn origin_label(origin: Origin) -> &'static str {
    match origin {
        Origin::FoundInCache => "cache",
        Origin::FoundInStore => "store",
        Origin::NotFound => "not_found",
    }
}

/// Digit string of 1 to 10 characters
pub fn random_digits<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(1..=10);
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Drives a cache through seeding and lookup phases
pub struct Simulation<S> {
    cache: MessageCache<S>,
    rng: StdRng,
}

impl<S: DurableStore> Simulation<S> {
    pub fn new(cache: MessageCache<S>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { cache, rng }
    }

    pub fn cache(&self) -> &MessageCache<S> {
        &self.cache
    }

    /// Create and cache messages with ids `0..count`
    pub fn seed_messages(&mut self, count: u64) -> Result<Vec<Message>> {
        let mut seeded = Vec::with_capacity(count as usize);

        for id in 0..count {
            let content = random_digits(&mut self.rng);
            let message = Message::new(id, SENDER, RECEIVER, &content, false)?;
            self.cache.put(message.clone())?;
            seeded.push(message);
        }

        info!(
            count,
            cached = self.cache.len(),
            evictions = self.cache.stats().evictions(),
            "seeded messages"
        );
        Ok(seeded)
    }

    /// Look up `count` ids drawn uniformly from `0..key_space`
    pub fn run_phase(&mut self, name: &str, count: usize, key_space: u64) -> Result<PhaseReport> {
        anyhow::ensure!(key_space > 0, "key space must not be empty");

        let mut report = PhaseReport {
            name: name.to_string(),
            accesses: Vec::with_capacity(count),
            hits: 0,
            misses: 0,
        };

        for _ in 0..count {
            let id = self.rng.gen_range(0..key_space);
            let origin = self.cache.lookup(id)?.origin();

            if origin == Origin::FoundInCache {
                report.hits += 1;
            } else {
                report.misses += 1;
            }
            report.accesses.push(Access {
                id,
                origin: origin_label(origin),
            });
        }

        info!(
            phase = name,
            hits = report.hits,
            misses = report.misses,
            "hit rate {:.2}%",
            report.hit_rate_percent()
        );
        Ok(report)
    }

    pub fn summary(&self, messages: u64, warmup: &PhaseReport, simulation: &PhaseReport) -> Summary {
        let stats = self.cache.stats();
        Summary {
            policy: self.cache.policy_name().to_string(),
            capacity: self.cache.capacity(),
            messages,
            warmup: warmup.into(),
            simulation: simulation.into(),
            evictions: stats.evictions(),
            store_hits: stats.store_hits(),
            write_through_failures: stats.write_through_failures(),
        }
    }
}
