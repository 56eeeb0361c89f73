#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Complaint filtering, regional aggregation and boundary joins.
//!
//! Every user interaction runs one synchronous pass over in-memory data:
//! [`filter::filter_complaints`] narrows the [`table::ComplaintTable`],
//! [`aggregate::aggregate_regions`] counts the survivors per normalized
//! region key, and [`join::join_regions`] left-joins those counts onto the
//! boundary features of the requested granularity. [`pipeline::MapData`]
//! composes the three and [`cache::ChoroplethCache`] memoizes them.

pub mod aggregate;
pub mod cache;
pub mod facets;
pub mod filter;
pub mod join;
pub mod pipeline;
pub mod table;
pub mod trend;

#[cfg(test)]
pub(crate) mod fixtures;

use complaint_map_analytics_models::InvalidFilterError;
use complaint_map_geography_models::{Granularity, InvalidGranularityError};
use thiserror::Error;

/// Errors that can occur during analytics operations.
///
/// Only caller-contract violations are errors. Bad data (unparsable
/// dates, unmatched region names) degrades to exclusion or a zero count.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The granularity selector names no known administrative level.
    #[error("Configuration error: {0}")]
    InvalidGranularity(#[from] InvalidGranularityError),

    /// The filter specification cannot be evaluated.
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] InvalidFilterError),

    /// No boundary features were loaded for the requested granularity.
    #[error("No boundary layer loaded for granularity '{granularity}'")]
    MissingBoundaryLayer {
        /// The requested granularity.
        granularity: Granularity,
    },

    /// Counts aggregated at one level were joined onto another level's
    /// boundaries.
    #[error("Cannot join {aggregate} counts onto {layer} boundaries")]
    GranularityMismatch {
        /// Granularity of the boundary layer.
        layer: Granularity,
        /// Granularity the counts were aggregated at.
        aggregate: Granularity,
    },
}

/// Parses a granularity selector, failing fast on unknown values.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidGranularity`] if the selector is not
/// one of `state`, `district` or `municipality`.
pub fn parse_granularity(selector: &str) -> Result<Granularity, AnalyticsError> {
    Ok(selector.parse()?)
}
