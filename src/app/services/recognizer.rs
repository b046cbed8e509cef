//! Format recognizer
//!
//! Classifies a raw field into one [`SourceFormat`]. Checks run in a fixed
//! precedence, most distinctive encoding first, so that a field matching
//! several shapes always lands in the same class. Classification is pure; the
//! parsers do the actual reading.

use crate::app::models::SourceFormat;
use crate::app::services::encoding;
use crate::app::services::format_parsers::{dms, glued, labeled, nmea, structured};
use crate::app::services::lexer;
use once_cell::sync::Lazy;
use regex::Regex;

/// Spanish cadastral reference shapes (urban 20/14 characters, rural 20/14)
static CADASTRAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[0-9]{7}[A-Z]{2}[0-9]{4}[A-Z][0-9]{4}[A-Z]{2}$",
        r"^[0-9]{7}[A-Z]{2}[0-9]{4}[A-Z]$",
        r"^[0-9]{5}[A-Z][0-9]{12}[A-Z]{2}$",
        r"^[0-9]{5}[A-Z][0-9]{8}$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid cadastral regex"))
    .collect()
});

/// Minimum letters for a digit-free field to count as a place name
const MIN_TOPONYM_LETTERS: usize = 3;

/// Canonical form of a cadastral reference: uppercase, no spaces
pub fn cadastral_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Whether a field is a Spanish cadastral reference
pub fn is_cadastral(text: &str) -> bool {
    let key = cadastral_key(text);
    CADASTRAL_PATTERNS.iter().any(|regex| regex.is_match(&key))
}

fn is_toponym(text: &str) -> bool {
    labeled::is_wordy(text) && text.chars().filter(|c| c.is_alphabetic()).count() >= MIN_TOPONYM_LETTERS
}

/// Classify a raw field
pub fn classify(value: &str) -> SourceFormat {
    let text = value.trim();

    if lexer::is_placeholder(text) {
        return SourceFormat::Placeholder;
    }
    if structured::is_wkt(text) {
        return SourceFormat::Wkt;
    }
    if structured::is_geojson(text) {
        return SourceFormat::GeoJson;
    }
    if let Some(format) = dms::classify(text) {
        return format;
    }
    if nmea::is_nmea(text) {
        return SourceFormat::Nmea;
    }
    if glued::is_glued(text) {
        return SourceFormat::Glued;
    }
    if labeled::is_labeled(text) {
        return SourceFormat::Labeled;
    }
    if labeled::is_cardinal(text) {
        return SourceFormat::Cardinal;
    }
    if is_cadastral(text) {
        return SourceFormat::Cadastral;
    }
    if encoding::has_mojibake(text) {
        return SourceFormat::Mojibake;
    }
    if labeled::is_tight_comma_pair(text) {
        return SourceFormat::CombinedPair;
    }
    if let Some(format) = lexer::numeric_format(text) {
        return format;
    }
    if labeled::is_combined(text) {
        return SourceFormat::CombinedPair;
    }
    if labeled::is_narrative(text) {
        return SourceFormat::Narrative;
    }
    if is_toponym(text) {
        return SourceFormat::Toponym;
    }

    SourceFormat::Unknown
}
