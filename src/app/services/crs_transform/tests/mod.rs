//! Tests for the reference system transformer

pub mod datum_tests;

use crate::app::models::{AuditTrail, SourceCrs};
use crate::app::services::crs_transform::TransformContext;
use crate::app::services::format_parsers::AxisReading;
use crate::app::services::lexer::CleanedNumber;
use crate::config::NormalizerConfig;

/// Transformer context without a hint
pub fn context(config: &NormalizerConfig, document_year: Option<i32>) -> TransformContext<'_> {
    TransformContext {
        document_year,
        crs_hint: None,
        config,
    }
}

/// Transformer context with an explicit source system
pub fn hinted(config: &NormalizerConfig, crs: SourceCrs) -> TransformContext<'_> {
    TransformContext {
        document_year: None,
        crs_hint: Some(crs),
        config,
    }
}

pub fn reading(value: f64) -> AxisReading {
    AxisReading::planar(CleanedNumber {
        text: value.to_string(),
        value,
    })
}

pub fn empty_trail() -> AuditTrail {
    AuditTrail::new()
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected}, got {actual}"
    );
}
