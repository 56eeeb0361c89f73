//! Boundary join.
//!
//! Left-joins a [`RegionAggregate`] onto an ordered boundary feature list.
//! The output has exactly one entry per input feature, in input order.
//! Features without matching complaints get a count of zero; aggregate
//! buckets without a matching feature are dropped.

use std::collections::BTreeSet;

use complaint_map_analytics_models::RegionCountRow;
use complaint_map_geography_models::{BoundaryLayer, RegionFeature};

use crate::AnalyticsError;
use crate::aggregate::RegionAggregate;

/// A boundary feature with its derived complaint statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRegion<'a> {
    /// The untouched boundary feature.
    pub feature: &'a RegionFeature,
    /// Matching filtered complaints; zero when nothing matched.
    pub issue_count: u64,
    /// Most common category, only when requested and something matched.
    pub dominant_category: Option<String>,
}

impl JoinedRegion<'_> {
    /// Detaches the statistics from the geometry.
    #[must_use]
    pub fn to_row(&self) -> RegionCountRow {
        RegionCountRow {
            name: self.feature.name.clone(),
            normalized_name: self.feature.normalized_name.clone(),
            issue_count: self.issue_count,
            dominant_category: self.dominant_category.clone(),
        }
    }
}

/// Result of joining counts onto a feature list.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedLayer<'a> {
    /// One entry per input feature, in input order.
    pub regions: Vec<JoinedRegion<'a>>,
    /// Filtered complaints whose bucket matched at least one feature.
    pub attributed: u64,
    /// Aggregate buckets that matched no feature.
    pub dropped_buckets: usize,
}

/// Attaches counts (and optionally dominant categories) to every feature.
///
/// Features whose name normalizes to nothing never match, even though no
/// aggregate bucket is keyed by the empty string either. Several features
/// sharing a normalized name each receive the full count.
#[must_use]
pub fn join_regions<'a>(
    features: &'a [RegionFeature],
    aggregate: &RegionAggregate,
    include_dominant_category: bool,
) -> JoinedLayer<'a> {
    let regions: Vec<JoinedRegion<'a>> = features
        .iter()
        .map(|feature| {
            let tally = feature.key().and_then(|key| aggregate.get(key));
            JoinedRegion {
                feature,
                issue_count: tally.map_or(0, |t| t.count),
                dominant_category: tally
                    .filter(|_| include_dominant_category)
                    .and_then(|t| t.dominant_category())
                    .map(str::to_string),
            }
        })
        .collect();

    let feature_keys: BTreeSet<&str> = features.iter().filter_map(RegionFeature::key).collect();
    let mut attributed = 0;
    let mut dropped_buckets = 0;
    for (key, tally) in aggregate.iter() {
        if feature_keys.contains(key) {
            attributed += tally.count;
        } else {
            dropped_buckets += 1;
        }
    }

    if dropped_buckets > 0 {
        log::warn!(
            "{dropped_buckets} {} buckets had no matching boundary feature",
            aggregate.granularity()
        );
    }

    JoinedLayer {
        regions,
        attributed,
        dropped_buckets,
    }
}

/// Joins counts onto a whole [`BoundaryLayer`], checking that both sides
/// describe the same granularity.
///
/// # Errors
///
/// Returns [`AnalyticsError::GranularityMismatch`] if the aggregate was
/// grouped at a different level than the layer.
pub fn join_layer<'a>(
    layer: &'a BoundaryLayer,
    aggregate: &RegionAggregate,
    include_dominant_category: bool,
) -> Result<JoinedLayer<'a>, AnalyticsError> {
    if layer.granularity() != aggregate.granularity() {
        return Err(AnalyticsError::GranularityMismatch {
            layer: layer.granularity(),
            aggregate: aggregate.granularity(),
        });
    }

    Ok(join_regions(
        layer.features(),
        aggregate,
        include_dominant_category,
    ))
}
