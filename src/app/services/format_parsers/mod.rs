//! Format-specific parsers
//!
//! Each parser turns one recognised textual encoding into a numeric reading.
//! Parsers never fail loudly: they return [`FieldParse::Rejected`] for input
//! they cannot read, or [`FieldParse::ParsedWithWarning`] when the value is
//! usable but something about it is doubtful (a DMS value without hemisphere).
//!
//! Two shapes of reading come back. An [`AxisReading`] is one value for one
//! field, possibly carrying a hemisphere and an angular marker. A pair reading
//! carries both axes at once (WKT, GeoJSON, NMEA sentences, labeled text,
//! glued digits, two numbers in one cell).

pub mod dms;
pub mod glued;
pub mod labeled;
pub mod nmea;
pub mod structured;

#[cfg(test)]
mod tests;

use crate::app::models::{Correction, Field, Hemisphere, SourceFormat};
use crate::app::services::lexer::{self, CleanedNumber};
use crate::config::TargetBounds;

/// One numeric value read from a field
#[derive(Debug, Clone, PartialEq)]
pub struct AxisReading {
    pub value: f64,

    /// Canonical numeral the value came from; keeps leading zeros for digit counting
    pub text: String,

    /// Hemisphere marker found next to the value
    pub hemisphere: Option<Hemisphere>,

    /// Value is in degrees rather than meters
    pub angular: bool,
}

impl AxisReading {
    /// Planar reading from a cleaned numeral
    pub fn planar(cleaned: CleanedNumber) -> Self {
        Self {
            value: cleaned.value,
            text: cleaned.text,
            hemisphere: None,
            angular: false,
        }
    }

    /// Angular reading with an optional hemisphere
    pub fn angular(value: f64, hemisphere: Option<Hemisphere>) -> Self {
        Self {
            value,
            text: format!("{:.8}", value),
            hemisphere,
            angular: true,
        }
    }

    /// Digits of the integer part, without sign
    pub fn integer_digits(&self) -> &str {
        let unsigned = self.text.trim_start_matches(['-', '+']);
        unsigned.split('.').next().unwrap_or("")
    }

    /// Whether the source numeral had a decimal part
    pub fn has_fraction(&self) -> bool {
        self.text.contains('.')
    }
}

/// What a parser extracted
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// A value for the field being parsed
    Axis(AxisReading),
    /// Both axes from a single text
    Pair { x: AxisReading, y: AxisReading },
}

/// Outcome of a format parser
#[derive(Debug, Clone, PartialEq)]
pub enum FieldParse {
    Parsed(Reading),
    ParsedWithWarning(Reading, String),
    Rejected,
}

impl FieldParse {
    /// The reading, if the parser produced one
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            FieldParse::Parsed(reading) | FieldParse::ParsedWithWarning(reading, _) => {
                Some(reading)
            }
            FieldParse::Rejected => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, FieldParse::Rejected)
    }
}

/// State shared with a parser while it reads one field
#[derive(Debug)]
pub struct ParseContext<'a> {
    /// Field the text came from
    pub field: Field,

    /// Envelope used to choose between ambiguous splits
    pub bounds: &'a TargetBounds,

    /// Audit trail the parser appends its own corrections to
    pub corrections: &'a mut Vec<Correction>,
}

impl<'a> ParseContext<'a> {
    pub fn new(field: Field, bounds: &'a TargetBounds, corrections: &'a mut Vec<Correction>) -> Self {
        Self {
            field,
            bounds,
            corrections,
        }
    }

    /// Run a numeric fragment through the lexer, logging any separator repair
    pub fn clean(&mut self, text: &str, field: Field) -> Option<CleanedNumber> {
        lexer::clean(text, field, self.corrections)
    }

    pub fn push(&mut self, correction: Correction) {
        self.corrections.push(correction);
    }
}

/// Whether a format always carries both axes in one text
pub fn is_pair_format(format: SourceFormat) -> bool {
    matches!(
        format,
        SourceFormat::Wkt
            | SourceFormat::GeoJson
            | SourceFormat::Glued
            | SourceFormat::Labeled
            | SourceFormat::CombinedPair
    )
}

/// Parse a single field according to its recognised format
///
/// Numeric families go straight through the lexer. Pair formats are accepted
/// here too: when a field holds both axes the caller gets a [`Reading::Pair`].
pub fn parse_field(format: SourceFormat, value: &str, ctx: &mut ParseContext) -> FieldParse {
    let field = ctx.field;
    match format {
        f if f.is_dms() => dms::parse(value, format, ctx),
        f if f.is_numeric_family() => match ctx.clean(value, field) {
            Some(cleaned) => FieldParse::Parsed(Reading::Axis(AxisReading::planar(cleaned))),
            None => FieldParse::Rejected,
        },
        SourceFormat::Nmea => nmea::parse(value, ctx),
        SourceFormat::Wkt => structured::parse_wkt(value, ctx),
        SourceFormat::GeoJson => structured::parse_geojson(value, ctx),
        SourceFormat::Glued => glued::parse(value, ctx),
        SourceFormat::Labeled => labeled::parse_labeled(value, ctx),
        SourceFormat::Cardinal => labeled::parse_cardinal(value, ctx),
        SourceFormat::CombinedPair => labeled::parse_combined(value, ctx),
        SourceFormat::Narrative => labeled::parse_narrative(value, ctx),
        _ => FieldParse::Rejected,
    }
}
