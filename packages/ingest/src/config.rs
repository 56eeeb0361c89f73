//! TOML data config.
//!
//! ```toml
//! [complaints]
//! path = "data/complete_issues_data.csv"
//!
//! [[boundaries]]
//! granularity = "state"
//! path = "data/states.geojson"
//!
//! [[boundaries]]
//! granularity = "municipality"
//! path = "data/municipalities.geojson"
//! optional = true
//! ```
//!
//! Relative paths are resolved against the directory holding the config
//! file.

use std::path::{Path, PathBuf};

use complaint_map_analytics::pipeline::MapData;
use complaint_map_analytics::table::ComplaintTable;
use complaint_map_geography_models::Granularity;
use serde::Deserialize;

use crate::IngestError;
use crate::boundaries::{DEFAULT_NAME_FIELD, load_boundary_layer};
use crate::complaints::load_complaints;

/// Config file read when neither the flag nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "complaint_map.toml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_ENV_VAR: &str = "COMPLAINT_MAP_CONFIG";

fn default_delimiter() -> char {
    ','
}

fn default_name_field() -> String {
    DEFAULT_NAME_FIELD.to_string()
}

/// Where the complaint table lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComplaintSource {
    /// CSV file path.
    pub path: PathBuf,
    /// Single-byte field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// Where one boundary layer lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoundarySource {
    /// Administrative level of the layer.
    pub granularity: Granularity,
    /// `GeoJSON` file path.
    pub path: PathBuf,
    /// Feature property holding the display name.
    #[serde(default = "default_name_field")]
    pub name_field: String,
    /// Skip this layer with a warning instead of failing when the file is
    /// missing.
    #[serde(default)]
    pub optional: bool,
}

/// Complete data config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataConfig {
    /// Complaint table source.
    pub complaints: ComplaintSource,
    /// Boundary layers, at most one per granularity.
    #[serde(default)]
    pub boundaries: Vec<BoundarySource>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl DataConfig {
    /// Parses a config from TOML text. Relative paths stay relative to the
    /// working directory.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Toml`] if the TOML is malformed and
    /// [`IngestError::Conversion`] if the delimiter is not a single byte or
    /// a granularity is listed twice.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, IngestError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        log::debug!("Reading data config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Picks the config path: explicit flag first, then
    /// [`CONFIG_ENV_VAR`], then [`DEFAULT_CONFIG_PATH`].
    #[must_use]
    pub fn resolve_path(cli_path: Option<PathBuf>) -> PathBuf {
        cli_path
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Complaint CSV delimiter as a byte.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Conversion`] if the delimiter is not ASCII.
    pub fn delimiter(&self) -> Result<u8, IngestError> {
        u8::try_from(self.complaints.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                IngestError::Conversion(format!(
                    "CSV delimiter {:?} must be a single ASCII character",
                    self.complaints.delimiter
                ))
            })
    }

    /// Resolves a configured path against the config file's directory.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn validate(&self) -> Result<(), IngestError> {
        self.delimiter()?;
        for (idx, source) in self.boundaries.iter().enumerate() {
            if self.boundaries[..idx]
                .iter()
                .any(|other| other.granularity == source.granularity)
            {
                return Err(IngestError::Conversion(format!(
                    "Boundary layer '{}' is configured more than once",
                    source.granularity
                )));
            }
        }
        Ok(())
    }
}

/// Loads the complaint table and every configured boundary layer.
///
/// Optional layers whose file does not exist are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the complaint table or a required layer cannot be
/// loaded.
pub fn load_map_data(config: &DataConfig) -> Result<MapData, IngestError> {
    let records = load_complaints(
        &config.resolve(&config.complaints.path),
        config.delimiter()?,
    )?;
    let mut data = MapData::new(ComplaintTable::new(records));

    for source in &config.boundaries {
        let path = config.resolve(&source.path);
        if source.optional && !path.exists() {
            log::warn!(
                "Optional {} boundary file {} not found, skipping",
                source.granularity,
                path.display()
            );
            continue;
        }
        data.insert_layer(load_boundary_layer(
            &path,
            source.granularity,
            &source.name_field,
        )?);
    }

    let loaded: Vec<String> = data.granularities().map(|g| g.to_string()).collect();
    log::info!(
        "Loaded {} complaints with boundary layers: {}",
        data.complaints().len(),
        if loaded.is_empty() {
            "none".to_string()
        } else {
            loaded.join(", ")
        }
    );

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [complaints]
        path = "data/complete_issues_data.csv"

        [[boundaries]]
        granularity = "state"
        path = "data/states.geojson"

        [[boundaries]]
        granularity = "municipality"
        path = "data/municipalities.geojson"
        name_field = "NAME"
        optional = true
    "#;

    #[test]
    fn parses_config_with_defaults() {
        let config = DataConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.complaints.delimiter, ',');
        assert_eq!(config.boundaries.len(), 2);
        assert_eq!(config.boundaries[0].granularity, Granularity::State);
        assert_eq!(config.boundaries[0].name_field, "GEN");
        assert!(!config.boundaries[0].optional);
        assert_eq!(config.boundaries[1].name_field, "NAME");
        assert!(config.boundaries[1].optional);
    }

    #[test]
    fn rejects_unknown_granularity() {
        let toml_str = r#"
            [complaints]
            path = "c.csv"

            [[boundaries]]
            granularity = "county"
            path = "x.geojson"
        "#;
        assert!(matches!(
            DataConfig::from_toml_str(toml_str),
            Err(IngestError::Toml(_))
        ));
    }

    #[test]
    fn rejects_duplicate_layers_and_bad_delimiters() {
        let duplicate = r#"
            [complaints]
            path = "c.csv"

            [[boundaries]]
            granularity = "state"
            path = "a.geojson"

            [[boundaries]]
            granularity = "state"
            path = "b.geojson"
        "#;
        assert!(matches!(
            DataConfig::from_toml_str(duplicate),
            Err(IngestError::Conversion(_))
        ));

        let delimiter = "[complaints]\npath = \"c.csv\"\ndelimiter = \"§\"\n";
        assert!(matches!(
            DataConfig::from_toml_str(delimiter),
            Err(IngestError::Conversion(_))
        ));
    }

    #[test]
    fn resolves_relative_paths_against_config_dir() {
        let mut config = DataConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(
            config.resolve(Path::new("a.csv")),
            PathBuf::from("a.csv")
        );
        config.base_dir = Some(PathBuf::from("/srv/map"));
        assert_eq!(
            config.resolve(Path::new("a.csv")),
            PathBuf::from("/srv/map/a.csv")
        );
        assert_eq!(
            config.resolve(Path::new("/data/a.csv")),
            PathBuf::from("/data/a.csv")
        );
    }

    #[test]
    fn explicit_config_path_wins() {
        assert_eq!(
            DataConfig::resolve_path(Some(PathBuf::from("custom.toml"))),
            PathBuf::from("custom.toml")
        );
    }

    #[test]
    fn loads_map_data_from_disk() {
        let dir = std::env::temp_dir().join(format!(
            "complaint_map_ingest_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("complaints.csv"),
            "state,category\nHessen,Umwelt\nHessen,Verkehr\nBayern,Umwelt\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("states.geojson"),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"GEN":"Hessen"},
                 "geometry":{"type":"Polygon","coordinates":[[[8,50],[9,50],[9,51],[8,50]]]}}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("complaint_map.toml"),
            r#"
                [complaints]
                path = "complaints.csv"

                [[boundaries]]
                granularity = "state"
                path = "states.geojson"

                [[boundaries]]
                granularity = "district"
                path = "missing.geojson"
                optional = true
            "#,
        )
        .unwrap();

        let config = DataConfig::from_path(&dir.join("complaint_map.toml")).unwrap();
        let data = load_map_data(&config).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(data.complaints().len(), 3);
        assert!(data.layer(Granularity::State).is_some());
        assert!(data.layer(Granularity::District).is_none());
    }
}
