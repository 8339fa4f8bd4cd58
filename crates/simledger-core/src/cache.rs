//! # Aggregation Cache
//!
//! Remembers the last aggregation so repeated reads of an unchanged ledger
//! within the same time bucket do not rerun the pipeline.
//!
//! ## Key
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CacheKey                                                               │
//! │  ├── snapshot   LedgerSnapshot::fingerprint()   any record changes      │
//! │  ├── config     hash of EngineConfig            thresholds change       │
//! │  └── bucket     now / cache_bucket_secs         the clock moves on      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Overdue status depends on the clock, so a cached result is only reused
//! inside its bucket. Within a bucket the views reflect the bucket's first
//! request (`Aggregation::computed_at`).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::{aggregate, Aggregation, LedgerSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    snapshot: u64,
    config: u64,
    bucket: i64,
}

impl CacheKey {
    fn new(snapshot: &LedgerSnapshot, now: DateTime<Utc>, config: &EngineConfig) -> Self {
        let mut hasher = DefaultHasher::new();
        config.hash(&mut hasher);

        // a zero bucket is rejected by EngineConfig::validate; treat it as 1s here
        let width = config.cache_bucket_secs.max(1) as i64;

        Self {
            snapshot: snapshot.fingerprint(),
            config: hasher.finish(),
            bucket: now.timestamp().div_euclid(width),
        }
    }
}

/// Single-slot memo for [`aggregate`].
#[derive(Debug, Default)]
pub struct AggregationCache {
    slot: Option<(CacheKey, Arc<Aggregation>)>,
    hits: u64,
    misses: u64,
}

impl AggregationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached aggregation for this key, computing it on a miss.
    pub fn get_or_compute(
        &mut self,
        snapshot: &LedgerSnapshot,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> Arc<Aggregation> {
        let key = CacheKey::new(snapshot, now, config);

        if let Some((cached_key, aggregation)) = &self.slot {
            if *cached_key == key {
                self.hits += 1;
                return Arc::clone(aggregation);
            }
        }

        self.misses += 1;
        debug!(bucket = key.bucket, misses = self.misses, "Aggregation cache miss");

        let aggregation = Arc::new(aggregate(snapshot, now, config));
        self.slot = Some((key, Arc::clone(&aggregation)));
        aggregation
    }

    /// Drops the cached aggregation.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
