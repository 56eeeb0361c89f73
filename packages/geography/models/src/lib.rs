#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary types and region name normalization.
//!
//! These types represent the polygon layers (states, districts,
//! municipalities) that complaint counts are joined onto. Geometry is
//! carried through untouched; only the display name takes part in
//! matching.

pub mod normalize;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Administrative level at which complaints are counted and boundaries are
/// drawn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Granularity {
    /// Federal states (Länder).
    State,
    /// Districts (Kreise).
    District,
    /// Municipalities (Gemeinden).
    Municipality,
}

impl Granularity {
    /// Returns all variants, coarsest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::State, Self::District, Self::Municipality]
    }

    /// Human-readable label for legends and tooltips.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::State => "State",
            Self::District => "District",
            Self::Municipality => "Municipality",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = InvalidGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" => Ok(Self::State),
            "district" => Ok(Self::District),
            "municipality" => Ok(Self::Municipality),
            _ => Err(InvalidGranularityError {
                value: s.to_string(),
            }),
        }
    }
}

/// Error returned when a granularity selector names no known level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidGranularityError {
    /// The selector that was provided.
    pub value: String,
}

impl std::fmt::Display for InvalidGranularityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid granularity '{}': expected state, district or municipality",
            self.value
        )
    }
}

impl std::error::Error for InvalidGranularityError {}

/// One boundary polygon at a given granularity.
///
/// The normalized name is derived once at construction. Geometry is shared
/// behind an [`Arc`] so derived views never copy it.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    /// Raw display name from the boundary dataset.
    pub name: String,
    /// Canonical matching key (see [`normalize::normalize_name`]).
    pub normalized_name: String,
    /// Polygon or multipolygon outline in WGS84.
    pub geometry: Arc<MultiPolygon<f64>>,
}

impl RegionFeature {
    /// Creates a feature, deriving its normalized name.
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let name = name.into();
        Self {
            normalized_name: normalize::normalize_name(Some(&name)),
            name,
            geometry: Arc::new(geometry),
        }
    }

    /// Returns the join key, or `None` if the name normalizes to nothing.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        if self.normalized_name.is_empty() {
            None
        } else {
            Some(&self.normalized_name)
        }
    }
}

static NEXT_LAYER_VERSION: AtomicU64 = AtomicU64::new(1);

/// An ordered, immutable set of boundary features for one granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    granularity: Granularity,
    version: u64,
    features: Vec<RegionFeature>,
}

impl BoundaryLayer {
    /// Creates a layer. Every layer gets a process-unique version number
    /// so cached aggregates can tell boundary sets apart.
    #[must_use]
    pub fn new(granularity: Granularity, features: Vec<RegionFeature>) -> Self {
        Self {
            granularity,
            version: NEXT_LAYER_VERSION.fetch_add(1, Ordering::Relaxed),
            features,
        }
    }

    /// The administrative level of this layer.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Process-unique identifier of this boundary set.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Features in their original order.
    #[must_use]
    pub fn features(&self) -> &[RegionFeature] {
        &self.features
    }

    /// Number of features in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the layer has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
