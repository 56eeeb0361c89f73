//! `GeoJSON` boundary layer loader.
//!
//! Each layer file is a `FeatureCollection` whose features carry a display
//! name in one property (`GEN` in the official German boundary exports).
//! Coordinates must already be WGS84; nothing is reprojected.

use std::path::Path;

use complaint_map_geography_models::{BoundaryLayer, Granularity, RegionFeature};
use geo::MultiPolygon;
use geojson::{Feature, GeoJson};

use crate::IngestError;

/// Property holding the display name when the config does not say.
pub const DEFAULT_NAME_FIELD: &str = "GEN";

/// Parses a `FeatureCollection` into a boundary layer, preserving feature
/// order.
///
/// Features without a usable name or without polygonal geometry are
/// skipped with a warning.
///
/// # Errors
///
/// Returns [`IngestError::Json`] for invalid JSON, [`IngestError::GeoJson`]
/// for invalid `GeoJSON`, and [`IngestError::Conversion`] if the document
/// is not a `FeatureCollection`.
pub fn parse_boundary_layer(
    json: &str,
    granularity: Granularity,
    name_field: &str,
) -> Result<BoundaryLayer, IngestError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let GeoJson::FeatureCollection(collection) = GeoJson::from_json_value(value)? else {
        return Err(IngestError::Conversion(format!(
            "{granularity} boundaries must be a FeatureCollection"
        )));
    };

    let total = collection.features.len();
    let features: Vec<RegionFeature> = collection
        .features
        .into_iter()
        .enumerate()
        .filter_map(|(idx, feature)| to_region_feature(idx, feature, name_field))
        .collect();

    if features.len() < total {
        log::warn!(
            "Skipped {} of {total} {granularity} boundary features",
            total - features.len()
        );
    }
    log::info!(
        "Loaded {} {granularity} boundary features",
        features.len()
    );

    Ok(BoundaryLayer::new(granularity, features))
}

/// Reads a boundary layer from a `GeoJSON` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid
/// `FeatureCollection`.
pub fn load_boundary_layer(
    path: &Path,
    granularity: Granularity,
    name_field: &str,
) -> Result<BoundaryLayer, IngestError> {
    log::info!(
        "Loading {granularity} boundaries from {}",
        path.display()
    );
    let json = std::fs::read_to_string(path)?;
    parse_boundary_layer(&json, granularity, name_field)
}

fn to_region_feature(idx: usize, feature: Feature, name_field: &str) -> Option<RegionFeature> {
    let Some(name) = feature_name(&feature, name_field) else {
        log::warn!("Boundary feature {idx} has no '{name_field}' property");
        return None;
    };

    let Some(geometry) = feature.geometry else {
        log::warn!("Boundary feature {name:?} has no geometry");
        return None;
    };

    let Some(multi_polygon) = to_multipolygon(geometry) else {
        log::warn!("Boundary feature {name:?} is not a polygon");
        return None;
    };

    Some(RegionFeature::new(name, multi_polygon))
}

fn feature_name(feature: &Feature, name_field: &str) -> Option<String> {
    let name = match feature.property(name_field)? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!name.is_empty()).then_some(name)
}

fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}
