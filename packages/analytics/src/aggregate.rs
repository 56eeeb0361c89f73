//! Region aggregator.
//!
//! Groups a filtered view by normalized region key at one granularity.
//! Keys are normalized on both the complaint and the boundary side at every
//! level, so state and district names get the same treatment as
//! municipalities.

use std::collections::BTreeMap;

use complaint_map_analytics_models::CategoryCount;
use complaint_map_geography_models::Granularity;

use crate::filter::FilteredComplaints;

/// Complaint tally for one region key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionTally {
    /// Number of complaints mapped to the region.
    pub count: u64,
    /// Per-category counts. Only populated when categories are tracked.
    pub categories: BTreeMap<String, u64>,
}

impl RegionTally {
    /// The most frequent category, ties going to the lexicographically
    /// smallest label.
    #[must_use]
    pub fn dominant_category(&self) -> Option<&str> {
        let mut best: Option<(&str, u64)> = None;
        // BTreeMap iterates in label order, so keeping the first maximum
        // gives the smallest label on ties.
        for (label, &count) in &self.categories {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label)
    }
}

/// Complaint counts per normalized region key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionAggregate {
    granularity: Granularity,
    tallies: BTreeMap<String, RegionTally>,
    unnamed: usize,
}

impl RegionAggregate {
    /// The granularity the counts were grouped at.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Tally for a normalized key. Empty keys never have one.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RegionTally> {
        self.tallies.get(key)
    }

    /// Count for a normalized key, zero when absent.
    #[must_use]
    pub fn count(&self, key: &str) -> u64 {
        self.get(key).map_or(0, |t| t.count)
    }

    /// All tallies ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionTally)> {
        self.tallies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of distinct region keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    /// Whether no complaint landed on any key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Sum of all tallies.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.tallies.values().map(|t| t.count).sum()
    }

    /// Complaints left out because their region name normalized to nothing.
    #[must_use]
    pub const fn unnamed(&self) -> usize {
        self.unnamed
    }

    /// Plain key → count mapping.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<&str, u64> {
        self.iter().map(|(k, t)| (k, t.count)).collect()
    }
}

/// Counts filtered complaints per normalized region key.
///
/// With `track_categories` set, each tally also records per-category
/// counts so [`RegionTally::dominant_category`] can be answered. Records
/// with no usable region name are counted in
/// [`RegionAggregate::unnamed`] instead of an empty-key bucket.
#[must_use]
pub fn aggregate_regions(
    filtered: &FilteredComplaints<'_>,
    granularity: Granularity,
    track_categories: bool,
) -> RegionAggregate {
    let mut tallies: BTreeMap<String, RegionTally> = BTreeMap::new();
    let mut unnamed = 0;

    for (key, record) in filtered.keyed(granularity) {
        let Some(key) = key else {
            unnamed += 1;
            continue;
        };

        let tally = tallies.entry(key.to_string()).or_default();
        tally.count += 1;

        if track_categories && let Some(category) = record.category.as_deref() {
            *tally.categories.entry(category.to_string()).or_default() += 1;
        }
    }

    log::debug!(
        "Aggregated {} complaints into {} {granularity} buckets ({unnamed} unnamed)",
        filtered.len(),
        tallies.len(),
    );

    RegionAggregate {
        granularity,
        tallies,
        unnamed,
    }
}

/// Counts filtered complaints per category label, most frequent first and
/// ties by label. Records without a category are not counted.
#[must_use]
pub fn category_counts(filtered: &FilteredComplaints<'_>) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for category in filtered.records().filter_map(|r| r.category.as_deref()) {
        *counts.entry(category).or_default() += 1;
    }

    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    out
}
