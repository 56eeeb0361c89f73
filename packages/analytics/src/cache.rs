//! Memoization of filter + aggregate passes.
//!
//! Entries are keyed on everything a pass depends on: the complaint table,
//! the boundary layer, the filter, the granularity and whether categories
//! were tracked. Eviction is oldest-first once the capacity is reached.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use complaint_map_analytics_models::FilterSpec;
use complaint_map_geography_models::Granularity;

use crate::aggregate::RegionAggregate;

/// Number of passes kept by [`ChoroplethCache::default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Identity of one choropleth pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// [`crate::table::ComplaintTable::version`] of the source table.
    pub table_version: u64,
    /// [`complaint_map_geography_models::BoundaryLayer::version`] of the
    /// joined layer.
    pub layer_version: u64,
    /// Aggregation level.
    pub granularity: Granularity,
    /// Whether per-category tallies were kept.
    pub track_categories: bool,
    /// The filter the rows were selected with.
    pub filter: FilterSpec,
}

/// A memoized pass: the surviving rows and their aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPass {
    /// Row positions that survived the filter.
    pub rows: Vec<usize>,
    /// Counts grouped at the key's granularity.
    pub aggregate: RegionAggregate,
}

/// Bounded cache of recent passes.
#[derive(Debug)]
pub struct ChoroplethCache {
    capacity: usize,
    entries: HashMap<CacheKey, Arc<CachedPass>>,
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl Default for ChoroplethCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ChoroplethCache {
    /// Creates a cache holding at most `capacity` passes. A capacity of
    /// zero disables caching.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the cached pass for `key`, computing and storing it on a
    /// miss. Errors are returned as-is and never cached.
    ///
    /// # Errors
    ///
    /// Propagates any error from `compute`.
    pub fn get_or_try_insert<E>(
        &mut self,
        key: CacheKey,
        compute: impl FnOnce() -> Result<CachedPass, E>,
    ) -> Result<Arc<CachedPass>, E> {
        if let Some(pass) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Arc::clone(pass));
        }

        self.misses += 1;
        let pass = Arc::new(compute()?);

        if self.capacity > 0 {
            while self.order.len() >= self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            self.order.push_back(key.clone());
            self.entries.insert(key, Arc::clone(&pass));
        }

        Ok(pass)
    }

    /// Number of cached passes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that had to compute.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
