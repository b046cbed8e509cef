//! Application constants for the coordinate normalizer
//!
//! This module contains the fixed bounds, thresholds, vocabularies, projection
//! parameters and scoring weights used throughout the normalization pipeline.
//! Values that are hand-tuned to Andalucian documents are kept here as named
//! constants so that the configuration layer can override them explicitly.

// =============================================================================
// Target Reference System
// =============================================================================

/// EPSG code of the canonical output frame (ETRS89 / UTM zone 30N)
pub const TARGET_EPSG: u32 = 25830;

/// Target envelope in meters (UTM30 / ETRS89)
pub mod bounds {
    pub const MIN_X: f64 = 100_000.0;
    pub const MAX_X: f64 = 800_000.0;
    pub const MIN_Y: f64 = 3_980_000.0;
    pub const MAX_Y: f64 = 4_320_000.0;
}

/// Geographic envelope used to recognise a lon/lat pair
pub mod geographic {
    pub const MIN_LON: f64 = -8.0;
    pub const MAX_LON: f64 = 0.0;
    pub const MIN_LAT: f64 = 35.0;
    pub const MAX_LAT: f64 = 40.0;

    /// Upper bound for the "missing west sign" repair on a positive longitude
    pub const MAX_UNSIGNED_LON: f64 = 8.0;
}

/// Planar envelope of the Spanish Lambert Conformal Conic grid over the region
pub mod lambert_envelope {
    pub const MIN_X: f64 = 200_000.0;
    pub const MAX_X: f64 = 900_000.0;
    pub const MIN_Y: f64 = 100_000.0;
    pub const MAX_Y: f64 = 600_000.0;
}

// =============================================================================
// Structural Correction Thresholds
// =============================================================================

/// Thresholds for the structural error corrector
pub mod structural {
    /// X values at or above this look like a Y (northing) value
    pub const SWAP_Y_MAGNITUDE: f64 = 1_000_000.0;

    /// Lower bound of the X-like range used by the swap check
    pub const SWAP_X_MIN: f64 = 100_000.0;

    /// Upper bound of the X-like range used by the swap check
    pub const SWAP_X_MAX: f64 = 900_000.0;

    /// Leading digit prepended to a six-digit Y starting 0-3
    pub const Y_MISSING_LEADING_DIGIT: &str = "4";

    /// Highest leading digit of a six-digit Y that gets the "4" prefix
    pub const Y_PREFIXABLE_MAX_LEADING: char = '3';

    /// Multiplier for a six-digit Y that already starts with "4"
    pub const Y_MISSING_TRAILING_FACTOR: f64 = 10.0;

    /// Multiplier for a five-digit X
    pub const X_FIVE_DIGIT_FACTOR: f64 = 10.0;

    /// Multiplier for a four-digit X
    pub const X_FOUR_DIGIT_FACTOR: f64 = 100.0;

    /// Kilometer to meter factor
    pub const KM_FACTOR: f64 = 1000.0;

    /// Exclusive upper bound for an X expressed in kilometers
    pub const KM_X_MAX: f64 = 1000.0;

    /// Exclusive lower bound for a Y expressed in kilometers
    pub const KM_Y_MIN: f64 = 3900.0;

    /// Exclusive upper bound for a Y expressed in kilometers
    pub const KM_Y_MAX: f64 = 4400.0;
}

/// Heuristic rescue constants
pub mod rescue {
    /// Offset added to a Y missing its millions component
    pub const Y_MILLIONS_OFFSET: f64 = 4_000_000.0;

    /// Base confidence (0-100) assigned to each rescue hypothesis
    pub const KM_CONFIDENCE: u8 = 70;
    pub const COMMA_THOUSANDS_CONFIDENCE: u8 = 65;
    pub const X_TRUNCATED_CONFIDENCE: u8 = 55;
    pub const Y_OFFSET_CONFIDENCE: u8 = 50;
    pub const DOT_THOUSANDS_CONFIDENCE: u8 = 60;
}

// =============================================================================
// Province Prefixes
// =============================================================================

/// Default two-digit prefix for a five-digit Y
pub const DEFAULT_Y_PREFIX: &str = "40";

/// Two-digit Y prefixes per Andalucian province (normalised lowercase, no accents)
pub const PROVINCE_Y_PREFIXES: &[(&str, &str)] = &[
    ("almeria", "40"),
    ("cadiz", "40"),
    ("cordoba", "41"),
    ("granada", "41"),
    ("huelva", "41"),
    ("jaen", "42"),
    ("malaga", "40"),
    ("sevilla", "41"),
];

// =============================================================================
// Placeholder Vocabulary
// =============================================================================

/// Literal placeholders (compared lowercase, trimmed)
pub const PLACEHOLDER_WORDS: &[&str] = &[
    "indicar",
    "pendiente",
    "n/a",
    "n.a.",
    "na",
    "n/d",
    "s/d",
    "s/n",
    "sin datos",
    "sin dato",
    "sin coordenadas",
    "no disponible",
    "no consta",
    "desconocido",
    "desconocida",
    "por determinar",
    "null",
    "none",
    "?",
];

// =============================================================================
// Datum Transformation
// =============================================================================

/// Document-year thresholds that select a legacy datum
pub mod datum {
    /// Documents before this year are assumed to use the Madrid datum
    pub const MADRID_DATUM_BEFORE_YEAR: i32 = 1970;

    /// Documents before this year (and not Madrid) are assumed ED50
    pub const ED50_BEFORE_YEAR: i32 = 2007;

    /// Planar ED50 -> ETRS89 shift in meters for southern Spain
    pub const ED50_DX: f64 = -110.0;
    pub const ED50_DY: f64 = -208.0;

    /// Planar Madrid datum -> ETRS89 shift in meters (empirical, ~5-10 m accuracy)
    pub const MADRID_DX: f64 = -128.0;
    pub const MADRID_DY: f64 = -215.0;

    /// Constant Lambert -> UTM30 offset used when the projection cannot be inverted
    pub const LAMBERT_FALLBACK_DX: f64 = -161_300.0;
    pub const LAMBERT_FALLBACK_DY: f64 = 3_827_700.0;
}

// =============================================================================
// Projection Parameters
// =============================================================================

/// GRS80 ellipsoid (ETRS89)
pub mod grs80 {
    pub const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
    pub const INVERSE_FLATTENING: f64 = 298.257_222_101;
}

/// UTM zone 30N
pub mod utm30 {
    pub const SCALE_FACTOR: f64 = 0.9996;
    pub const FALSE_EASTING: f64 = 500_000.0;
    pub const FALSE_NORTHING: f64 = 0.0;
    pub const CENTRAL_MERIDIAN_DEG: f64 = -3.0;
}

/// Spanish Lambert Conformal Conic grid (Madrid 1870 datum, Struve 1860 ellipsoid)
pub mod lambert_spain {
    pub const SEMI_MAJOR_AXIS: f64 = 6_378_298.3;
    pub const INVERSE_FLATTENING: f64 = 294.73;
    pub const STANDARD_PARALLEL_DEG: f64 = 40.0;
    pub const SCALE_FACTOR: f64 = 0.998_808_529_3;
    pub const FALSE_EASTING: f64 = 600_000.0;
    pub const FALSE_NORTHING: f64 = 600_922.04;

    /// Longitude of the Madrid meridian relative to Greenwich
    pub const MADRID_MERIDIAN_DEG: f64 = -3.687_938_888_888_889;

    /// Latitude iteration limits for the inverse projection
    pub const MAX_ITERATIONS: usize = 15;
    pub const CONVERGENCE_EPSILON: f64 = 1e-12;
}

// =============================================================================
// Scoring
// =============================================================================

/// Score penalties and confidence thresholds
pub mod scoring {
    pub const MAX_SCORE: i32 = 100;

    pub const P0_PENALTY: i32 = 10;
    pub const P1_PENALTY: i32 = 5;
    pub const P2_PENALTY: i32 = 3;
    pub const P3_PENALTY: i32 = 0;

    pub const ERROR_FLAG_PENALTY: i32 = 25;
    pub const WARNING_FLAG_PENALTY: i32 = 10;

    /// Penalty per axis whose final value has no fractional part
    pub const INTEGRAL_VALUE_PENALTY: i32 = 3;

    pub const HIGH_THRESHOLD: u8 = 76;
    pub const MEDIUM_THRESHOLD: u8 = 51;
    pub const LOW_THRESHOLD: u8 = 26;

    /// Minimum score for a range-valid result to be reported as valid
    pub const MIN_VALID_SCORE: u8 = 50;
}

// =============================================================================
// Batch Processing Defaults
// =============================================================================

/// Minimum items per concurrent batch chunk
pub const MIN_BATCH_CHUNK_SIZE: usize = 64;

/// Default field delimiter for CLI batch input
pub const DEFAULT_BATCH_DELIMITER: char = ';';

/// Earliest document year accepted on the command line
pub const MIN_DOCUMENT_YEAR: i32 = 1850;

/// Normalise a province name for prefix lookup (lowercase, accents removed)
pub fn normalize_province_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            other => other,
        })
        .collect()
}

/// Look up the built-in Y prefix for a province
pub fn province_y_prefix(province: &str) -> Option<&'static str> {
    let normalized = normalize_province_name(province);
    PROVINCE_Y_PREFIXES
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, prefix)| *prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_province_lookup_ignores_case_and_accents() {
        assert_eq!(province_y_prefix("Almería"), Some("40"));
        assert_eq!(province_y_prefix("  JAÉN "), Some("42"));
        assert_eq!(province_y_prefix("Sevilla"), Some("41"));
        assert_eq!(province_y_prefix("Madrid"), None);
    }

    #[test]
    fn test_bounds_are_ordered() {
        assert!(bounds::MIN_X < bounds::MAX_X);
        assert!(bounds::MIN_Y < bounds::MAX_Y);
        assert!(scoring::LOW_THRESHOLD < scoring::MEDIUM_THRESHOLD);
        assert!(scoring::MEDIUM_THRESHOLD < scoring::HIGH_THRESHOLD);
    }
}
