//! Tests for the numeric lexer

pub mod placeholder_tests;

use crate::app::models::{Correction, Field};
use crate::app::services::lexer::{CleanedNumber, clean};

/// Clean a field and return the value plus the corrections it produced
pub fn clean_with_log(raw: &str, field: Field) -> (Option<CleanedNumber>, Vec<Correction>) {
    let mut corrections = Vec::new();
    let cleaned = clean(raw, field, &mut corrections);
    (cleaned, corrections)
}

/// Assert two floats are equal to within a millimeter
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}
