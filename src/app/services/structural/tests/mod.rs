//! Tests for the structural error corrector


use crate::app::models::AuditTrail;
use crate::app::services::format_parsers::AxisReading;
use crate::app::services::lexer::CleanedNumber;
use crate::app::services::structural::correct;
use crate::config::TargetBounds;

/// Reading built from canonical numeral text, so digit counts match a cleaned field
pub fn reading(text: &str) -> AxisReading {
    AxisReading::planar(CleanedNumber {
        text: text.to_string(),
        value: text.parse().unwrap(),
    })
}

/// Run the corrector with default bounds and prefix "40"
pub fn run(x: &str, y: &str) -> ((f64, f64), AuditTrail) {
    run_with_prefix(x, y, "40")
}

pub fn run_with_prefix(x: &str, y: &str, prefix: &str) -> ((f64, f64), AuditTrail) {
    let mut trail = AuditTrail::new();
    let result = correct(
        &reading(x),
        &reading(y),
        prefix,
        &TargetBounds::default(),
        &mut trail,
    );
    (result, trail)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
