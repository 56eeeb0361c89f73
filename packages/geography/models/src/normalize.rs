//! Region name normalization.
//!
//! Complaint tables and boundary datasets spell region names differently
//! ("Frankfurt am Main" vs "frankfurt-am-main"). Both sides are reduced to
//! the same canonical key before joining: lower-cased, with every character
//! that is not a letter or digit removed.
//!
//! No transliteration is attempted, so "Müller" and "Mueller" produce
//! different keys. Names are composed to NFC first, so a decomposed
//! "Mu\u{308}ller" and a precomposed "Müller" share a key.

use unicode_normalization::UnicodeNormalization;

/// Normalizes a raw region name into its canonical matching key.
///
/// The pipeline:
/// 1. Compose to NFC
/// 2. Lower-case
/// 3. Drop everything that is not alphanumeric (whitespace, punctuation,
///    underscores, leftover combining marks)
/// 4. Compose to NFC again, since lower-casing can decompose (`İ`)
///
/// A missing name normalizes to the empty string.
#[must_use]
pub fn normalize_name(name: Option<&str>) -> String {
    name.map_or_else(String::new, |name| {
        name.nfc()
            .collect::<String>()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .nfc()
            .collect()
    })
}

/// Returns the join key for a raw region name, or `None` when the name
/// normalizes to the empty string.
///
/// An empty key never matches anything, including another empty key, so
/// callers should treat `None` as "unmatched".
#[must_use]
pub fn region_key(name: Option<&str>) -> Option<String> {
    let key = normalize_name(name);
    if key.is_empty() { None } else { Some(key) }
}
