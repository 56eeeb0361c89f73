//! Choropleth pass composition.
//!
//! [`MapData`] owns the loaded complaint table and one optional boundary
//! layer per granularity. Each [`ChoroplethRequest`] runs filter →
//! aggregate → join and hands back the two sequences the renderer draws:
//! joined regions for the fill layer and located complaints for markers.

use std::collections::BTreeMap;

use complaint_map_analytics_models::{FilterSpec, MarkerRow, RegionCountRow, ViewSummary};
use complaint_map_complaint_models::ComplaintRecord;
use complaint_map_geography_models::{BoundaryLayer, Granularity};

use crate::AnalyticsError;
use crate::aggregate::{RegionAggregate, aggregate_regions};
use crate::cache::{CacheKey, CachedPass, ChoroplethCache};
use crate::filter::{FilteredComplaints, filter_complaints};
use crate::join::{JoinedRegion, join_layer};
use crate::table::ComplaintTable;

/// One user interaction's worth of parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoroplethRequest {
    /// Level to aggregate and draw at.
    pub granularity: Granularity,
    /// Active filter selection.
    pub filter: FilterSpec,
    /// Whether to compute the most common category per region.
    pub include_dominant_category: bool,
}

impl ChoroplethRequest {
    /// An unfiltered request without dominant categories.
    #[must_use]
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            filter: FilterSpec::default(),
            include_dominant_category: false,
        }
    }

    /// Replaces the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    /// Enables or disables dominant category computation.
    #[must_use]
    pub const fn with_dominant_category(mut self, include: bool) -> Self {
        self.include_dominant_category = include;
        self
    }
}

/// Output of one choropleth pass.
#[derive(Debug, Clone)]
pub struct ChoroplethView<'a> {
    /// Boundary features with counts, in layer order.
    pub regions: Vec<JoinedRegion<'a>>,
    /// Filtered complaints that have coordinates.
    pub markers: Vec<&'a ComplaintRecord>,
    /// Pass bookkeeping.
    pub summary: ViewSummary,
}

impl ChoroplethView<'_> {
    /// Region statistics without geometry.
    #[must_use]
    pub fn region_rows(&self) -> Vec<RegionCountRow> {
        self.regions.iter().map(JoinedRegion::to_row).collect()
    }

    /// Marker rows for the renderer.
    #[must_use]
    pub fn marker_rows(&self) -> Vec<MarkerRow> {
        self.markers
            .iter()
            .filter_map(|record| MarkerRow::from_record(record))
            .collect()
    }
}

/// Loaded complaints and boundary layers.
#[derive(Debug)]
pub struct MapData {
    complaints: ComplaintTable,
    layers: BTreeMap<Granularity, BoundaryLayer>,
}

impl MapData {
    /// Wraps a complaint table with no boundary layers yet.
    #[must_use]
    pub const fn new(complaints: ComplaintTable) -> Self {
        Self {
            complaints,
            layers: BTreeMap::new(),
        }
    }

    /// Adds a boundary layer, replacing any previous layer at the same
    /// granularity.
    #[must_use]
    pub fn with_layer(mut self, layer: BoundaryLayer) -> Self {
        self.insert_layer(layer);
        self
    }

    /// Adds a boundary layer, returning the layer it replaced.
    pub fn insert_layer(&mut self, layer: BoundaryLayer) -> Option<BoundaryLayer> {
        log::debug!(
            "Registering {} boundary layer with {} features",
            layer.granularity(),
            layer.len()
        );
        self.layers.insert(layer.granularity(), layer)
    }

    /// The loaded complaint table.
    #[must_use]
    pub const fn complaints(&self) -> &ComplaintTable {
        &self.complaints
    }

    /// Boundary layer for a granularity, if one was loaded.
    #[must_use]
    pub fn layer(&self, granularity: Granularity) -> Option<&BoundaryLayer> {
        self.layers.get(&granularity)
    }

    /// Granularities with a loaded layer, coarsest first.
    pub fn granularities(&self) -> impl Iterator<Item = Granularity> + '_ {
        self.layers.keys().copied()
    }

    /// Applies a filter to the complaint table.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidFilter`] if the spec is malformed.
    pub fn filter(&self, spec: &FilterSpec) -> Result<FilteredComplaints<'_>, AnalyticsError> {
        filter_complaints(&self.complaints, spec)
    }

    /// Runs one full filter → aggregate → join pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter is malformed or no layer is loaded
    /// for the requested granularity.
    pub fn choropleth(
        &self,
        request: &ChoroplethRequest,
    ) -> Result<ChoroplethView<'_>, AnalyticsError> {
        let layer = self.require_layer(request.granularity)?;
        let filtered = self.filter(&request.filter)?;
        let aggregate = aggregate_regions(
            &filtered,
            request.granularity,
            request.include_dominant_category,
        );
        self.assemble(layer, &filtered, &aggregate, request)
    }

    /// Like [`Self::choropleth`], reusing a memoized filter + aggregate
    /// result when the same request was seen before.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter is malformed or no layer is loaded
    /// for the requested granularity.
    pub fn choropleth_cached(
        &self,
        request: &ChoroplethRequest,
        cache: &mut ChoroplethCache,
    ) -> Result<ChoroplethView<'_>, AnalyticsError> {
        let layer = self.require_layer(request.granularity)?;
        let key = CacheKey {
            table_version: self.complaints.version(),
            layer_version: layer.version(),
            granularity: request.granularity,
            track_categories: request.include_dominant_category,
            filter: request.filter.clone(),
        };

        let pass = cache.get_or_try_insert(key, || {
            let filtered = self.filter(&request.filter)?;
            let aggregate = aggregate_regions(
                &filtered,
                request.granularity,
                request.include_dominant_category,
            );
            Ok::<_, AnalyticsError>(CachedPass {
                rows: filtered.rows().to_vec(),
                aggregate,
            })
        })?;

        let filtered = FilteredComplaints::from_rows(&self.complaints, pass.rows.clone());
        self.assemble(layer, &filtered, &pass.aggregate, request)
    }

    fn require_layer(&self, granularity: Granularity) -> Result<&BoundaryLayer, AnalyticsError> {
        self.layer(granularity)
            .ok_or(AnalyticsError::MissingBoundaryLayer { granularity })
    }

    fn assemble<'a>(
        &'a self,
        layer: &'a BoundaryLayer,
        filtered: &FilteredComplaints<'a>,
        aggregate: &RegionAggregate,
        request: &ChoroplethRequest,
    ) -> Result<ChoroplethView<'a>, AnalyticsError> {
        let joined = join_layer(layer, aggregate, request.include_dominant_category)?;
        let markers: Vec<&'a ComplaintRecord> = filtered.markers().collect();

        let summary = ViewSummary {
            granularity: Some(request.granularity),
            total_filtered: filtered.len(),
            attributed: usize::try_from(joined.attributed).unwrap_or(usize::MAX),
            unnamed: aggregate.unnamed(),
            dropped_buckets: joined.dropped_buckets,
            with_coordinates: markers.len(),
        };

        log::debug!(
            "Choropleth pass at {}: {} filtered, {} attributed, {} unnamed, {} dropped buckets",
            request.granularity,
            summary.total_filtered,
            summary.attributed,
            summary.unnamed,
            summary.dropped_buckets,
        );

        Ok(ChoroplethView {
            regions: joined.regions,
            markers,
            summary,
        })
    }
}
