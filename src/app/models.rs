//! Data models for coordinate normalization
//!
//! This module contains the core data structures exchanged by the pipeline:
//! the raw observation handed in by a document extractor, the audit records
//! appended while it is repaired, and the immutable result handed back.

use crate::constants::scoring;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// =============================================================================
// Input Structures
// =============================================================================

/// A raw coordinate field as it arrived from the source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Numeric cell (spreadsheet number)
    Number(f64),
    /// Text cell, possibly corrupted
    Text(String),
}

impl RawValue {
    /// Text view of the value; numbers are rendered with Rust's shortest round-trip form
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RawValue::Number(value) => Cow::Owned(value.to_string()),
            RawValue::Text(text) => Cow::Borrowed(text.as_str()),
        }
    }

    /// Whether the field carries no usable characters
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Number(value) => !value.is_finite(),
            RawValue::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// One observation: a coordinate pair plus document context
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateInput {
    /// Easting field (raw)
    pub x: Option<RawValue>,

    /// Northing field (raw)
    pub y: Option<RawValue>,

    /// Municipality the record belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,

    /// Province, used to pick the Y prefix for five-digit northings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,

    /// Year the source document was produced; selects the legacy datum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_year: Option<i32>,

    /// Free text that may encode both axes (WKT, GeoJSON, labeled text, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,

    /// Explicit source reference system, when the caller knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crs_hint: Option<SourceCrs>,
}

impl CoordinateInput {
    /// Create an input from an x/y pair
    pub fn new(x: impl Into<RawValue>, y: impl Into<RawValue>) -> Self {
        Self {
            x: Some(x.into()),
            y: Some(y.into()),
            ..Default::default()
        }
    }

    /// Create an input whose only content is free text
    pub fn from_raw_text(text: impl Into<String>) -> Self {
        Self {
            raw_text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.municipality = Some(municipality.into());
        self
    }

    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    pub fn with_document_year(mut self, year: i32) -> Self {
        self.document_year = Some(year);
        self
    }

    pub fn with_raw_text(mut self, text: impl Into<String>) -> Self {
        self.raw_text = Some(text.into());
        self
    }

    pub fn with_crs_hint(mut self, crs: SourceCrs) -> Self {
        self.crs_hint = Some(crs);
        self
    }
}

// =============================================================================
// Audit Records
// =============================================================================

/// Which field a correction or reading applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    X,
    Y,
    Both,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::X => write!(f, "x"),
            Field::Y => write!(f, "y"),
            Field::Both => write!(f, "both"),
        }
    }
}

/// Trust level of a correction; lower ordinal dominates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CorrectionPriority {
    /// Structural: placeholder, swap, truncation, scale
    P0,
    /// Format: separators and textual encodings
    P1,
    /// Historical datum
    P2,
    /// Cosmetic
    P3,
}

/// Kind of repair applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrectionType {
    SeparatorFixed,
    PlaceholderDetected,
    XYSwapped,
    YTruncated,
    XTruncated,
    KmToMeters,
    HeuristicRescue,
    Ed50Transformed,
    LambertTransformed,
    MadridDatumTransformed,
    DmsConverted,
    NmeaConverted,
    WktParsed,
    GeojsonParsed,
    NarrativeExtracted,
    CardinalExtracted,
    CoordsSeparated,
}

impl CorrectionType {
    /// Priority class this kind of correction belongs to
    pub fn priority(&self) -> CorrectionPriority {
        match self {
            CorrectionType::PlaceholderDetected
            | CorrectionType::XYSwapped
            | CorrectionType::YTruncated
            | CorrectionType::XTruncated
            | CorrectionType::KmToMeters
            | CorrectionType::HeuristicRescue => CorrectionPriority::P0,
            CorrectionType::SeparatorFixed
            | CorrectionType::DmsConverted
            | CorrectionType::NmeaConverted
            | CorrectionType::NarrativeExtracted
            | CorrectionType::CardinalExtracted
            | CorrectionType::CoordsSeparated => CorrectionPriority::P1,
            CorrectionType::Ed50Transformed
            | CorrectionType::LambertTransformed
            | CorrectionType::MadridDatumTransformed => CorrectionPriority::P2,
            CorrectionType::WktParsed | CorrectionType::GeojsonParsed => CorrectionPriority::P3,
        }
    }
}

/// One applied repair, kept for the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub correction_type: CorrectionType,
    pub field: Field,
    pub from: String,
    pub to: String,
    /// Name of the specific rule that fired
    pub pattern: String,
    pub priority: CorrectionPriority,
}

impl Correction {
    /// Create a correction whose priority follows from its type
    pub fn new(
        correction_type: CorrectionType,
        field: Field,
        from: impl Into<String>,
        to: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            correction_type,
            field,
            from: from.into(),
            to: to.into(),
            pattern: pattern.into(),
            priority: correction_type.priority(),
        }
    }
}

/// Corrections and flags accumulated while one input moves through the pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditTrail {
    pub corrections: Vec<Correction>,
    pub flags: Vec<Flag>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn correct(&mut self, correction: Correction) {
        self.corrections.push(correction);
    }

    pub fn flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }

    pub fn has_correction(&self, correction_type: CorrectionType) -> bool {
        self.corrections
            .iter()
            .any(|c| c.correction_type == correction_type)
    }
}

/// Kind of non-corrective observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagType {
    OutOfRange,
    MissingDecimals,
    SuspiciousValue,
    GeocodingNeeded,
    ManualReview,
    HeuristicApplied,
    Ed50Detected,
    GeographicCoords,
    LambertDetected,
    MadridDatumDetected,
    CadastralReference,
    ToponymDetected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A non-corrective observation about the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub flag_type: FlagType,
    pub severity: Severity,
    pub message: String,
}

impl Flag {
    pub fn new(flag_type: FlagType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            flag_type,
            severity,
            message: message.into(),
        }
    }

    pub fn info(flag_type: FlagType, message: impl Into<String>) -> Self {
        Self::new(flag_type, Severity::Info, message)
    }

    pub fn warning(flag_type: FlagType, message: impl Into<String>) -> Self {
        Self::new(flag_type, Severity::Warning, message)
    }

    pub fn error(flag_type: FlagType, message: impl Into<String>) -> Self {
        Self::new(flag_type, Severity::Error, message)
    }
}

// =============================================================================
// Classification Enumerations
// =============================================================================

/// Confidence bucket derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Critical,
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Map a 0-100 score onto a confidence bucket
    pub fn from_score(score: u8) -> Self {
        if score >= scoring::HIGH_THRESHOLD {
            Confidence::High
        } else if score >= scoring::MEDIUM_THRESHOLD {
            Confidence::Medium
        } else if score >= scoring::LOW_THRESHOLD {
            Confidence::Low
        } else {
            Confidence::Critical
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Critical => "CRITICAL",
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        };
        write!(f, "{}", label)
    }
}

/// Textual encoding recognised in a raw field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    Placeholder,
    Wkt,
    GeoJson,
    /// `-37°23'45"`
    DmsSigned,
    /// `N 37°23'45"`
    DmsCardinal,
    /// `37:23:45 N`
    DmsColon,
    /// `37 23 45 N`
    DmsSpace,
    /// `37°23'45"N`, `37º 23,5'`
    DmsSymbols,
    /// `$GPGGA,...` or `3723.4567N`
    Nmea,
    /// Both axes concatenated in 12-14 digits
    Glued,
    /// `X=504750 Y=4077905`, `Este: ... Norte: ...`
    Labeled,
    /// Single value with a cardinal marker: `Norte 4077905`, `37.5N`
    Cardinal,
    /// Spanish cadastral reference
    Cadastral,
    /// Contains UTF-8-read-as-Latin-1 artifacts
    Mojibake,
    /// `504.750,92`
    EuropeanGrouped,
    /// `504750,92`
    CommaDecimal,
    /// `4.077.905`, `504.891`
    DotThousands,
    /// `504 750`, `4 077 153,36`
    SpaceThousands,
    /// `504750~92`, `504 750´´92`
    TildeDecimal,
    /// `4,077,905.5`
    CommaThousands,
    /// `504750.92`, `4077905`
    Decimal,
    /// Two numbers in one field
    CombinedPair,
    /// Free text with embedded numbers
    Narrative,
    /// Place name with no coordinate content
    Toponym,
    Unknown,
}

impl SourceFormat {
    /// Whether the format is one of the DMS variants
    pub fn is_dms(&self) -> bool {
        matches!(
            self,
            SourceFormat::DmsSigned
                | SourceFormat::DmsCardinal
                | SourceFormat::DmsColon
                | SourceFormat::DmsSpace
                | SourceFormat::DmsSymbols
        )
    }

    /// Whether the numeric lexer handles the format directly
    pub fn is_numeric_family(&self) -> bool {
        matches!(
            self,
            SourceFormat::EuropeanGrouped
                | SourceFormat::CommaDecimal
                | SourceFormat::DotThousands
                | SourceFormat::SpaceThousands
                | SourceFormat::TildeDecimal
                | SourceFormat::CommaThousands
                | SourceFormat::Decimal
        )
    }
}

/// Reference system the input was expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceCrs {
    /// ETRS89 / UTM 30N (already canonical)
    Etrs89Utm30,
    /// Longitude/latitude degrees
    Geographic,
    /// ED50 / UTM 30N
    Ed50Utm30,
    /// Pre-1970 Madrid datum planar values
    MadridDatum,
    /// Spanish Lambert Conformal Conic grid
    LambertSpain,
}

/// Hemisphere marker attached to an angular or cardinal reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// Parse a hemisphere letter or word (Spanish "O"/"Oeste" is west)
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_lowercase().as_str() {
            "n" | "norte" | "north" => Some(Hemisphere::North),
            "s" | "sur" | "south" => Some(Hemisphere::South),
            "e" | "este" | "east" => Some(Hemisphere::East),
            "w" | "o" | "oeste" | "west" => Some(Hemisphere::West),
            _ => None,
        }
    }

    pub fn is_latitude(&self) -> bool {
        matches!(self, Hemisphere::North | Hemisphere::South)
    }

    /// Sign applied to an angular magnitude
    pub fn sign(&self) -> f64 {
        match self {
            Hemisphere::South | Hemisphere::West => -1.0,
            Hemisphere::North | Hemisphere::East => 1.0,
        }
    }

    /// Planar axis a marker points to (north -> Y, east -> X)
    pub fn planar_field(&self) -> Field {
        if self.is_latitude() { Field::Y } else { Field::X }
    }
}

// =============================================================================
// Result Structure
// =============================================================================

/// Snapshot of the raw input, for the audit trail
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OriginalInput {
    pub x: Option<String>,
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl OriginalInput {
    pub fn from_input(input: &CoordinateInput) -> Self {
        Self {
            x: input.x.as_ref().map(|v| v.as_text().into_owned()),
            y: input.y.as_ref().map(|v| v.as_text().into_owned()),
            raw_text: input.raw_text.clone(),
        }
    }
}

/// Details of the heuristic rescue rule that produced a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicInfo {
    pub rule: String,
    pub hypothesis: String,
    pub field: Field,
    pub base_confidence: u8,
}

/// Outcome of normalizing one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationResult {
    /// Easting in meters (UTM30 / ETRS89)
    pub x: Option<f64>,

    /// Northing in meters (UTM30 / ETRS89)
    pub y: Option<f64>,

    pub original: OriginalInput,

    /// Ordered, append-only audit trail
    pub corrections: Vec<Correction>,

    pub flags: Vec<Flag>,

    /// 0-100
    pub score: u8,

    pub confidence: Confidence,

    /// Range-valid and score at or above the validity threshold
    pub is_valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub heuristic_applied: Option<HeuristicInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_format: Option<SourceFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_crs: Option<SourceCrs>,

    /// Set when the field is a cadastral reference that needs external lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadastral_ref: Option<String>,

    /// Set when the field is a place name that needs geocoding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toponym: Option<String>,
}

impl NormalizationResult {
    /// Whether the result hands off to an external geocoder
    pub fn needs_geocoding(&self) -> bool {
        self.cadastral_ref.is_some() || self.toponym.is_some()
    }

    /// Whether a correction of the given type was recorded
    pub fn has_correction(&self, correction_type: CorrectionType) -> bool {
        self.corrections
            .iter()
            .any(|c| c.correction_type == correction_type)
    }

    /// Whether a flag of the given type was recorded
    pub fn has_flag(&self, flag_type: FlagType) -> bool {
        self.flags.iter().any(|f| f.flag_type == flag_type)
    }

    /// Final pair, if both axes were resolved
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}
