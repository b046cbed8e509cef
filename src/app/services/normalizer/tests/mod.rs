//! Tests for the normalization engine
//!
//! Shared fixtures live here; each submodule covers one part of the engine.

pub mod pipeline_tests;

use crate::app::models::{CoordinateInput, NormalizationResult};
use crate::app::services::normalizer::CoordinateNormalizer;
use crate::config::NormalizerConfig;

/// Normalizer with default settings and a fixed worker count
pub fn default_normalizer() -> CoordinateNormalizer {
    CoordinateNormalizer::new(NormalizerConfig::default().with_workers(4))
}

/// Normalize an x/y text pair with default settings
pub fn normalize_pair(x: &str, y: &str) -> NormalizationResult {
    default_normalizer().normalize(&CoordinateInput::new(x, y))
}

/// A mixed batch covering clean, repaired, short-circuited and invalid inputs
pub fn mixed_inputs(count: usize) -> Vec<CoordinateInput> {
    let templates = [
        CoordinateInput::new("521581.88", "4185653.05"),
        CoordinateInput::new(4077905.0, 504750.0),
        CoordinateInput::new("504 750´´92", "4 077 153´´36"),
        CoordinateInput::new("Indicar", "4077905"),
        CoordinateInput::new("504750.5", "77905"),
        CoordinateInput::new("9872023VH5797S0001WX", ""),
        CoordinateInput::new("-5", "4077905.5"),
        CoordinateInput::from_raw_text("POINT(504750.5 4077905.5)"),
    ];
    templates.iter().cycle().take(count).cloned().collect()
}

pub fn assert_close(actual: Option<f64>, expected: f64, tolerance: f64) {
    let actual = actual.expect("value should be present");
    assert!(
        (actual - expected).abs() < tolerance,
        "expected {expected}, got {actual}"
    );
}
