//! Complaint CSV loader.
//!
//! Expects a header row with the snake-case column names of
//! [`ComplaintRecord`]. Unknown columns are ignored and missing columns
//! are treated as blank.
//!
//! Cells are decoded one at a time. A cell that is not valid UTF-8 is read
//! as Latin-1, which covers the umlauts in legacy Windows exports, so a
//! single badly encoded cell never costs the whole row.

use std::io::Read;
use std::path::Path;

use complaint_map_complaint_models::ComplaintRecord;

use crate::IngestError;
use crate::parsing::{clean_text, parse_date, parse_lat_lng};

/// One CSV row before cell parsing.
#[derive(Debug, Default)]
struct RawComplaint {
    category: Option<String>,
    date: Option<String>,
    age_group: Option<String>,
    gender: Option<String>,
    origin: Option<String>,
    state: Option<String>,
    district: Option<String>,
    municipality: Option<String>,
    responsible_entity_level: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    description: Option<String>,
}

/// Decodes one cell, falling back to Latin-1 when it is not UTF-8.
///
/// Returns the text and whether the fallback was used.
fn decode_cell(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (bytes.iter().copied().map(char::from).collect(), true),
    }
}

impl RawComplaint {
    /// Picks the known columns out of a row. Returns the row and the number
    /// of cells that needed the Latin-1 fallback.
    fn from_byte_record(headers: &[String], record: &csv::ByteRecord) -> (Self, usize) {
        let mut raw = Self::default();
        let mut recoded = 0;
        for (name, bytes) in headers.iter().zip(record.iter()) {
            let slot = match name.as_str() {
                "category" => &mut raw.category,
                "date" => &mut raw.date,
                "age_group" => &mut raw.age_group,
                "gender" => &mut raw.gender,
                "origin" => &mut raw.origin,
                "state" => &mut raw.state,
                "district" => &mut raw.district,
                "municipality" => &mut raw.municipality,
                "responsible_entity_level" => &mut raw.responsible_entity_level,
                "latitude" => &mut raw.latitude,
                "longitude" => &mut raw.longitude,
                "description" => &mut raw.description,
                _ => continue,
            };
            let (text, fallback) = decode_cell(bytes);
            if fallback {
                recoded += 1;
            }
            *slot = Some(text);
        }
        (raw, recoded)
    }

    fn into_record(self, id: usize) -> ComplaintRecord {
        let coordinates = parse_lat_lng(self.latitude.as_deref(), self.longitude.as_deref());

        ComplaintRecord {
            id,
            category: clean_text(self.category.as_deref()),
            date: self.date.as_deref().and_then(parse_date),
            age_group: clean_text(self.age_group.as_deref()),
            gender: clean_text(self.gender.as_deref()),
            origin: clean_text(self.origin.as_deref()),
            state: clean_text(self.state.as_deref()),
            district: clean_text(self.district.as_deref()),
            municipality: clean_text(self.municipality.as_deref()),
            responsible_entity_level: clean_text(self.responsible_entity_level.as_deref()),
            latitude: coordinates.map(|(lat, _)| lat),
            longitude: coordinates.map(|(_, lng)| lng),
            description: clean_text(self.description.as_deref()),
        }
    }
}

/// Reads complaint records from any CSV source.
///
/// Rows the CSV reader cannot split are skipped with a warning; cells
/// that fail to parse become missing values.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] if the header row cannot be read.
pub fn read_complaints(
    reader: impl Read,
    delimiter: u8,
) -> Result<Vec<ComplaintRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader
        .byte_headers()?
        .iter()
        .map(|bytes| decode_cell(bytes).0)
        .collect();

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut recoded = 0usize;
    for result in csv_reader.byte_records() {
        match result {
            Ok(record) => {
                let (raw, fallbacks) = RawComplaint::from_byte_record(&headers, &record);
                if fallbacks > 0 {
                    log::debug!(
                        "Complaint row {} has {fallbacks} non-UTF-8 cell(s), read as Latin-1",
                        records.len()
                    );
                    recoded += fallbacks;
                }
                let id = records.len();
                records.push(raw.into_record(id));
            }
            Err(e) => {
                log::warn!("Skipping malformed complaint row: {e}");
                skipped += 1;
            }
        }
    }

    let undated = records.iter().filter(|r| r.date.is_none()).count();
    let located = records.iter().filter(|r| r.coordinates().is_some()).count();
    if recoded > 0 {
        log::warn!("{recoded} complaint cell(s) were not UTF-8 and were read as Latin-1");
    }
    log::info!(
        "Read {} complaints ({skipped} skipped, {undated} undated, {located} with coordinates)",
        records.len(),
    );

    Ok(records)
}

/// Reads complaint records from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header row cannot
/// be read.
pub fn load_complaints(path: &Path, delimiter: u8) -> Result<Vec<ComplaintRecord>, IngestError> {
    log::info!("Loading complaints from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_complaints(std::io::BufReader::new(file), delimiter)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const SAMPLE: &str = "\
category,date,age_group,gender,origin,state,district,municipality,responsible_entity_level,latitude,longitude,description
Verkehr,2024-01-05,18-29,weiblich,Inland,Bayern,Nürnberg,Nürnberg,Kommune,49.4521,11.0767,Schlagloch
Umwelt,kaputt,30-44,,Inland,Hessen,,Frankfurt am Main,Land,,,Müll im Park
 Bildung ,05.02.2024,,,,  ,Kassel,Kassel,Bund,51.3127,abc,
";

    #[test]
    fn reads_rows_in_order() {
        let records = read_complaints(SAMPLE.as_bytes(), b',').unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(records[0].municipality.as_deref(), Some("Nürnberg"));
        assert_eq!(records[0].coordinates(), Some((49.4521, 11.0767)));
    }

    #[test]
    fn bad_cells_become_missing() {
        let records = read_complaints(SAMPLE.as_bytes(), b',').unwrap();

        assert_eq!(records[1].date, None);
        assert_eq!(records[1].gender, None);
        assert_eq!(records[1].coordinates(), None);
        assert_eq!(records[1].district, None);

        assert_eq!(records[2].category.as_deref(), Some("Bildung"));
        assert_eq!(records[2].date, NaiveDate::from_ymd_opt(2024, 2, 5));
        assert_eq!(records[2].state, None);
        assert_eq!(records[2].latitude, None);
        assert_eq!(records[2].description, None);
    }

    #[test]
    fn non_utf8_cells_keep_their_row() {
        let data = b"state,category,description\nHessen,Umwelt,ok\nBayern,Verkehr,M\xFCll\nSaarland,Umwelt,ok\n";
        let records = read_complaints(&data[..], b',').unwrap();

        assert_eq!(
            records
                .iter()
                .map(|r| r.state.as_deref())
                .collect::<Vec<_>>(),
            vec![Some("Hessen"), Some("Bayern"), Some("Saarland")]
        );
        assert_eq!(records[1].category.as_deref(), Some("Verkehr"));
        assert_eq!(records[1].description.as_deref(), Some("Müll"));
        assert_eq!(records[1].id, 1);
    }

    #[test]
    fn latin1_region_names_decode() {
        let data = b"state,municipality\nBaden-W\xFCrttemberg,T\xFCbingen\n";
        let records = read_complaints(&data[..], b',').unwrap();
        assert_eq!(records[0].state.as_deref(), Some("Baden-Württemberg"));
        assert_eq!(records[0].municipality.as_deref(), Some("Tübingen"));
    }

    #[test]
    fn honors_delimiter_and_missing_columns() {
        let data = "state;category\nSaarland;Umwelt\n";
        let records = read_complaints(data.as_bytes(), b';').unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state.as_deref(), Some("Saarland"));
        assert_eq!(records[0].municipality, None);
        assert_eq!(records[0].date, None);
    }
}
