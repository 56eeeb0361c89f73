//! Cell-level parsing for the complaint export.
//!
//! Every function here is lenient: anything that does not parse becomes
//! `None` instead of an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-only formats accepted in the `date` column.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Date-time formats accepted in the `date` column. Only the calendar date
/// is kept.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Trims a cell, treating blank cells as missing.
#[must_use]
pub fn clean_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a complaint date, dropping any time-of-day component.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    log::trace!("Unparsable date: {s:?}");
    None
}

/// Parses one coordinate axis. Accepts a decimal comma. Non-finite values
/// are rejected.
#[must_use]
pub fn parse_coordinate(value: &str) -> Option<f64> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }
    let parsed = s
        .parse::<f64>()
        .or_else(|_| s.replace(',', ".").parse::<f64>())
        .ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Parses a latitude/longitude pair. Returns `None` unless both axes parse
/// and fall inside WGS84 bounds.
#[must_use]
pub fn parse_lat_lng(lat: Option<&str>, lng: Option<&str>) -> Option<(f64, f64)> {
    let latitude = parse_coordinate(lat?)?;
    let longitude = parse_coordinate(lng?)?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_plain_dates() {
        assert_eq!(parse_date("2024-01-15"), Some(day(2024, 1, 15)));
        assert_eq!(parse_date(" 15.01.2024 "), Some(day(2024, 1, 15)));
    }

    #[test]
    fn drops_time_of_day() {
        assert_eq!(parse_date("2024-01-15T23:59:59"), Some(day(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 08:00:00"), Some(day(2024, 1, 15)));
        assert_eq!(
            parse_date("2024-01-15T14:30:00.000"),
            Some(day(2024, 1, 15))
        );
        assert_eq!(
            parse_date("2024-01-15T14:30:00+01:00"),
            Some(day(2024, 1, 15))
        );
    }

    #[test]
    fn rejects_invalid_dates() {
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn blank_text_is_missing() {
        assert_eq!(clean_text(None), None);
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(Some(" Umwelt ")), Some("Umwelt".to_string()));
    }

    #[test]
    fn parses_coordinates() {
        let (lat, lng) = parse_lat_lng(Some("50.1109"), Some("8,6821")).unwrap();
        assert!((lat - 50.1109).abs() < f64::EPSILON);
        assert!((lng - 8.6821).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_partial_or_out_of_range_coordinates() {
        assert!(parse_lat_lng(None, Some("8.68")).is_none());
        assert!(parse_lat_lng(Some("abc"), Some("8.68")).is_none());
        assert!(parse_lat_lng(Some("91.0"), Some("8.68")).is_none());
        assert!(parse_lat_lng(Some("NaN"), Some("8.68")).is_none());
    }
}
