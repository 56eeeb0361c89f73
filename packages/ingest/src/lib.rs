#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads complaint tables and boundary layers from disk.
//!
//! Complaints come from a CSV export, boundaries from one `GeoJSON`
//! `FeatureCollection` per administrative level. A TOML data config ties
//! the files together; [`config::load_map_data`] reads everything once at
//! startup and hands back a ready [`complaint_map_analytics::pipeline::MapData`].
//!
//! Only structural problems (unreadable files, malformed CSV/JSON/TOML) are
//! errors. Bad cell values degrade to missing values.

pub mod boundaries;
pub mod complaints;
pub mod config;
pub mod parsing;

use thiserror::Error;

/// Errors that can occur while loading data.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `GeoJSON` structure could not be interpreted.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The data config could not be parsed.
    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value could not be converted to the expected type.
    #[error("Conversion error: {0}")]
    Conversion(String),
}
