//! Heuristic rescue engine
//!
//! Last resort for an axis the structural corrector could not bring into
//! range. Rules form a static, ordered table; each is tried at most once per
//! axis and the first whose result lands in range wins. There is no
//! re-entry, so the engine cannot loop.

use crate::app::models::Field;
use crate::app::services::structural::round_mm;
use crate::config::TargetBounds;
use crate::constants::{rescue as limits, structural};
use tracing::debug;

/// The axis being rescued
#[derive(Debug, Clone, Copy)]
pub struct RescueCandidate<'a> {
    pub field: Field,
    /// Current (out-of-range) value
    pub value: f64,
    /// Field text as it arrived, before any cleaning
    pub original: &'a str,
}

/// One rescue hypothesis
pub struct RescueRule {
    pub name: &'static str,
    pub hypothesis: &'static str,
    pub base_confidence: u8,
    apply: fn(&RescueCandidate) -> Option<f64>,
}

impl std::fmt::Debug for RescueRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RescueRule")
            .field("name", &self.name)
            .field("base_confidence", &self.base_confidence)
            .finish()
    }
}

/// A successful rescue
#[derive(Debug, Clone, Copy)]
pub struct Rescued {
    pub value: f64,
    pub rule: &'static RescueRule,
}

fn x_in_km(candidate: &RescueCandidate) -> Option<f64> {
    (candidate.field == Field::X && candidate.value > 0.0 && candidate.value < structural::KM_X_MAX)
        .then(|| round_mm(candidate.value * structural::KM_FACTOR))
}

fn strip_and_parse(text: &str, grouping: char, decimal_from: Option<char>) -> Option<f64> {
    let mut rebuilt: String = text
        .chars()
        .filter(|c| *c != grouping && !c.is_whitespace())
        .collect();
    if let Some(mark) = decimal_from {
        rebuilt = rebuilt.replace(mark, ".");
    }
    if rebuilt.matches('.').count() > 1 {
        return None;
    }
    rebuilt.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn comma_as_thousands(candidate: &RescueCandidate) -> Option<f64> {
    if !candidate.original.contains(',') {
        return None;
    }
    strip_and_parse(candidate.original, ',', None)
}

fn x_missing_digit(candidate: &RescueCandidate) -> Option<f64> {
    (candidate.field == Field::X && (10_000.0..100_000.0).contains(&candidate.value))
        .then(|| round_mm(candidate.value * structural::X_FIVE_DIGIT_FACTOR))
}

fn y_missing_millions(candidate: &RescueCandidate) -> Option<f64> {
    (candidate.field == Field::Y && candidate.value > 0.0 && candidate.value < 1_000_000.0)
        .then(|| round_mm(candidate.value + limits::Y_MILLIONS_OFFSET))
}

fn dot_as_thousands(candidate: &RescueCandidate) -> Option<f64> {
    if !candidate.original.contains('.') {
        return None;
    }
    strip_and_parse(candidate.original, '.', Some(','))
}

/// Rescue rules in the order they are tried
pub static RESCUE_RULES: [RescueRule; 5] = [
    RescueRule {
        name: "X_IN_KILOMETERS",
        hypothesis: "X was written in kilometers",
        base_confidence: limits::KM_CONFIDENCE,
        apply: x_in_km,
    },
    RescueRule {
        name: "COMMA_AS_THOUSANDS",
        hypothesis: "Comma was a thousands separator, not a decimal mark",
        base_confidence: limits::COMMA_THOUSANDS_CONFIDENCE,
        apply: comma_as_thousands,
    },
    RescueRule {
        name: "X_MISSING_TRAILING_DIGIT",
        hypothesis: "Five-digit X lost its last digit",
        base_confidence: limits::X_TRUNCATED_CONFIDENCE,
        apply: x_missing_digit,
    },
    RescueRule {
        name: "Y_MISSING_MILLIONS",
        hypothesis: "Y lost its leading millions digit",
        base_confidence: limits::Y_OFFSET_CONFIDENCE,
        apply: y_missing_millions,
    },
    RescueRule {
        name: "DOT_AS_THOUSANDS",
        hypothesis: "Dot was a thousands separator, not a decimal mark",
        base_confidence: limits::DOT_THOUSANDS_CONFIDENCE,
        apply: dot_as_thousands,
    },
];

/// Try each rule once; the first in-range result wins
pub fn rescue(candidate: &RescueCandidate, bounds: &TargetBounds) -> Option<Rescued> {
    let in_range = |value: f64| match candidate.field {
        Field::X => bounds.x_in_range(value),
        Field::Y => bounds.y_in_range(value),
        Field::Both => bounds.x_in_range(value) && bounds.y_in_range(value),
    };

    for rule in RESCUE_RULES.iter() {
        let Some(value) = (rule.apply)(candidate) else {
            continue;
        };
        if value == candidate.value || !in_range(value) {
            debug!(
                "Rescue rule {} gave {} for {} {}; rejected",
                rule.name, value, candidate.field, candidate.value
            );
            continue;
        }
        debug!(
            "Rescue rule {} moved {} from {} to {}",
            rule.name, candidate.field, candidate.value, value
        );
        return Some(Rescued { value, rule });
    }

    None
}
