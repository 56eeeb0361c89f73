//! Filter control options derived from the loaded table.

use std::collections::BTreeSet;

use complaint_map_analytics_models::FilterFacets;
use complaint_map_complaint_models::{ComplaintField, ComplaintRecord};

use crate::table::ComplaintTable;

fn distinct(records: &[ComplaintRecord], field: ComplaintField) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.field(field))
        .filter(|v| !v.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted distinct values for every multi-valued filter plus the date
/// bounds a date picker should offer.
#[must_use]
pub fn facets(table: &ComplaintTable) -> FilterFacets {
    let records = table.records();
    let dates = records.iter().filter_map(|r| r.date);

    FilterFacets {
        categories: distinct(records, ComplaintField::Category),
        age_groups: distinct(records, ComplaintField::AgeGroup),
        genders: distinct(records, ComplaintField::Gender),
        origins: distinct(records, ComplaintField::Origin),
        states: distinct(records, ComplaintField::State),
        entity_levels: distinct(records, ComplaintField::ResponsibleEntityLevel),
        min_date: dates.clone().min(),
        max_date: dates.max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{complaint, day, scenario_table};

    #[test]
    fn scenario_facets() {
        let facets = facets(&scenario_table());
        assert_eq!(facets.categories, vec!["Umwelt", "Verkehr"]);
        assert_eq!(facets.states, vec!["Bavaria", "Hesse"]);
        assert!(facets.genders.is_empty());
        assert_eq!(facets.min_date, Some(day(2024, 1, 5)));
        assert_eq!(facets.max_date, Some(day(2024, 2, 1)));
    }

    #[test]
    fn blank_values_are_not_offered() {
        let table = ComplaintTable::new(vec![
            ComplaintRecord {
                gender: Some("  ".to_string()),
                ..complaint("Hesse", "Umwelt", None)
            },
            ComplaintRecord {
                gender: Some("divers".to_string()),
                ..complaint("Hesse", "Umwelt", None)
            },
        ]);
        let facets = facets(&table);
        assert_eq!(facets.genders, vec!["divers"]);
        assert_eq!(facets.min_date, None);
    }

    #[test]
    fn empty_table_has_no_facets() {
        assert_eq!(
            facets(&ComplaintTable::new(Vec::new())),
            FilterFacets::default()
        );
    }
}
