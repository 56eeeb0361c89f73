#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the complaint map toolchain.
//!
//! Every subcommand loads the configured data once, runs a single
//! analytics pass and prints JSON to stdout. Logs go to stderr.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use complaint_map_analytics::aggregate::category_counts;
use complaint_map_analytics::facets::facets;
use complaint_map_analytics::parse_granularity;
use complaint_map_analytics::pipeline::{ChoroplethRequest, MapData};
use complaint_map_analytics::trend::trend;
use complaint_map_analytics_models::{
    DateRange, FilterSpec, InvalidFilterError, TextSearch, TimeGranularity,
};
use complaint_map_complaint_models::ComplaintField;
use complaint_map_ingest::config::{DataConfig, load_map_data};

#[derive(Parser)]
#[command(name = "complaint_map", about = "Complaint map aggregation tool")]
struct Cli {
    /// Data config file (overrides the `COMPLAINT_MAP_CONFIG` env var)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print per-region complaint counts for one boundary layer
    Aggregate {
        /// Administrative level: state, district or municipality
        #[arg(long, default_value = "state")]
        granularity: String,
        /// Also compute the most common category per region
        #[arg(long)]
        dominant: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the values each filter can take
    Facets,
    /// Print complaint counts per period
    Trend {
        /// Bucket size: daily, weekly, monthly or yearly
        #[arg(long, default_value = "monthly")]
        period: TimeGranularity,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print complaint counts per category
    Categories {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Start the HTTP API server
    Serve,
}

/// Filter flags shared by the analytics subcommands.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// First day included (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// Comma-separated category labels
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,
    /// Comma-separated age brackets
    #[arg(long, value_delimiter = ',')]
    age_groups: Vec<String>,
    /// Comma-separated genders
    #[arg(long, value_delimiter = ',')]
    genders: Vec<String>,
    /// Comma-separated origins
    #[arg(long, value_delimiter = ',')]
    origins: Vec<String>,
    /// Comma-separated state names
    #[arg(long, value_delimiter = ',')]
    states: Vec<String>,
    /// Comma-separated responsible entity levels
    #[arg(long, value_delimiter = ',')]
    entity_levels: Vec<String>,
    /// Case-insensitive substring to search for
    #[arg(long)]
    search: Option<String>,
    /// Comma-separated fields to search (default: municipality, district)
    #[arg(long, value_delimiter = ',')]
    search_fields: Vec<ComplaintField>,
}

impl FilterArgs {
    fn to_spec(&self) -> Result<FilterSpec, InvalidFilterError> {
        let mut spec = FilterSpec::default()
            .with_values(ComplaintField::Category, self.categories.iter().cloned())
            .with_values(ComplaintField::AgeGroup, self.age_groups.iter().cloned())
            .with_values(ComplaintField::Gender, self.genders.iter().cloned())
            .with_values(ComplaintField::Origin, self.origins.iter().cloned())
            .with_values(ComplaintField::State, self.states.iter().cloned())
            .with_values(
                ComplaintField::ResponsibleEntityLevel,
                self.entity_levels.iter().cloned(),
            );

        if self.from.is_some() || self.to.is_some() {
            spec = spec.with_date_range(DateRange::new(
                self.from.unwrap_or(NaiveDate::MIN),
                self.to.unwrap_or(NaiveDate::MAX),
            )?);
        }

        if let Some(query) = &self.search {
            let mut search = TextSearch::new(query.trim());
            if !self.search_fields.is_empty() {
                search = search.with_fields(self.search_fields.clone());
            }
            spec = spec.with_search(search);
        }

        spec.validate()?;
        Ok(spec)
    }
}

fn load(config: Option<PathBuf>) -> Result<MapData, Box<dyn std::error::Error>> {
    let path = DataConfig::resolve_path(config);
    let config = DataConfig::from_path(&path)?;
    Ok(load_map_data(&config)?)
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Aggregate {
            granularity,
            dominant,
            filters,
        } => {
            let granularity = parse_granularity(&granularity)?;
            let request = ChoroplethRequest::new(granularity)
                .with_filter(filters.to_spec()?)
                .with_dominant_category(dominant);
            let data = load(cli.config)?;
            let view = data.choropleth(&request)?;
            print_json(&serde_json::json!({
                "regions": view.region_rows(),
                "summary": view.summary,
            }))?;
        }
        Commands::Facets => {
            let data = load(cli.config)?;
            print_json(&facets(data.complaints()))?;
        }
        Commands::Trend { period, filters } => {
            let spec = filters.to_spec()?;
            let data = load(cli.config)?;
            print_json(&trend(&data.filter(&spec)?, period))?;
        }
        Commands::Categories { filters } => {
            let spec = filters.to_spec()?;
            let data = load(cli.config)?;
            print_json(&category_counts(&data.filter(&spec)?))?;
        }
        Commands::Serve => {
            let path = DataConfig::resolve_path(cli.config);
            log::info!("Starting API server");
            actix_web::rt::System::new().block_on(complaint_map_server::serve(&path))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("complaint_map").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_aggregate_filters() {
        let cli = parse(&[
            "aggregate",
            "--granularity",
            "municipality",
            "--categories",
            "Umwelt,Bildung",
            "--from",
            "2024-01-01",
            "--search",
            "main",
            "--search-fields",
            "municipality",
            "--config",
            "other.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("other.toml")));
        let Commands::Aggregate {
            granularity,
            dominant,
            filters,
        } = cli.command
        else {
            panic!("expected aggregate");
        };
        assert_eq!(granularity, "municipality");
        assert!(!dominant);

        let spec = filters.to_spec().unwrap();
        assert_eq!(spec.categories.len(), 2);
        assert_eq!(
            spec.date_range.unwrap().start,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(
            spec.search.unwrap().fields,
            vec![ComplaintField::Municipality]
        );
    }

    #[test]
    fn trend_period_defaults_to_monthly() {
        let Commands::Trend { period, filters } = parse(&["trend"]).command else {
            panic!("expected trend");
        };
        assert_eq!(period, TimeGranularity::Monthly);
        assert!(filters.to_spec().unwrap().is_unrestricted());
    }

    #[test]
    fn rejects_reversed_dates() {
        let filters = FilterArgs {
            from: NaiveDate::from_ymd_opt(2024, 3, 1),
            to: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..FilterArgs::default()
        };
        assert!(filters.to_spec().is_err());
    }

    #[test]
    fn rejects_unknown_period() {
        assert!(Cli::try_parse_from(["complaint_map", "trend", "--period", "hourly"]).is_err());
    }
}
