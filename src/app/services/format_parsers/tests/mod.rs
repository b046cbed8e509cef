//! Tests for the format parsers

pub mod glued_tests;
pub mod labeled_tests;
pub mod nmea_tests;

use crate::app::models::{Correction, Field, SourceFormat};
use crate::app::services::format_parsers::{
    AxisReading, FieldParse, ParseContext, Reading, parse_field,
};
use crate::config::TargetBounds;

/// Parse a field with default bounds and return the outcome plus its corrections
pub fn parse_with_log(
    format: SourceFormat,
    value: &str,
    field: Field,
) -> (FieldParse, Vec<Correction>) {
    let bounds = TargetBounds::default();
    let mut corrections = Vec::new();
    let outcome = {
        let mut ctx = ParseContext::new(field, &bounds, &mut corrections);
        parse_field(format, value, &mut ctx)
    };
    (outcome, corrections)
}

/// Unwrap an axis reading, panicking on any other outcome
pub fn expect_axis(outcome: &FieldParse) -> &AxisReading {
    match outcome.reading() {
        Some(Reading::Axis(reading)) => reading,
        other => panic!("expected an axis reading, got {:?}", other),
    }
}

/// Unwrap a pair reading, panicking on any other outcome
pub fn expect_pair(outcome: &FieldParse) -> (&AxisReading, &AxisReading) {
    match outcome.reading() {
        Some(Reading::Pair { x, y }) => (x, y),
        other => panic!("expected a pair reading, got {:?}", other),
    }
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected}, got {actual}"
    );
}
