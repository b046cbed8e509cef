//! Structural error corrector
//!
//! Repairs the transcription errors that change a value's magnitude rather
//! than its spelling. Fixes run in a fixed order:
//!
//! 1. X/Y swap (a northing sitting in the X field)
//! 2. Y truncation (missing leading "4", missing trailing digit, missing
//!    province prefix)
//! 3. X truncation (five or four digits)
//! 4. Kilometers instead of meters
//!
//! Each step only touches an axis that is still out of range, and each
//! candidate fix is kept only if it lands the axis inside the target envelope.

#[cfg(test)]
mod tests;

use crate::app::models::{AuditTrail, Correction, CorrectionType, Field};
use crate::app::services::format_parsers::AxisReading;
use crate::config::TargetBounds;
use crate::constants::structural;
use tracing::debug;

/// Working copy of one axis
#[derive(Debug, Clone, PartialEq)]
struct Axis {
    value: f64,
    digits: String,
    has_fraction: bool,
}

impl Axis {
    fn from_reading(reading: &AxisReading) -> Self {
        Self {
            value: reading.value,
            digits: reading.integer_digits().to_string(),
            has_fraction: reading.has_fraction(),
        }
    }
}

/// Round to the millimeter to drop float noise introduced by scaling
pub fn round_mm(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A candidate fix for one axis
struct Fix {
    correction_type: CorrectionType,
    value: f64,
    pattern: String,
}

/// Repair a planar pair
///
/// # Arguments
///
/// * `x`, `y` - Readings after CRS transformation
/// * `y_prefix` - Two-digit prefix for a five-digit Y (province dependent)
/// * `bounds` - Target envelope
/// * `trail` - Audit trail receiving one correction per accepted fix
///
/// # Returns
///
/// The repaired `(x, y)` values; axes that could not be fixed are returned as is
pub fn correct(
    x: &AxisReading,
    y: &AxisReading,
    y_prefix: &str,
    bounds: &TargetBounds,
    trail: &mut AuditTrail,
) -> (f64, f64) {
    let mut x_axis = Axis::from_reading(x);
    let mut y_axis = Axis::from_reading(y);

    swap_if_transposed(&mut x_axis, &mut y_axis, bounds, trail);

    if !bounds.y_in_range(y_axis.value) {
        if let Some(fix) = y_truncation_fix(&y_axis, y_prefix) {
            accept(&mut y_axis, Field::Y, fix, |v| bounds.y_in_range(v), trail);
        }
    }

    if !bounds.x_in_range(x_axis.value) {
        if let Some(fix) = x_truncation_fix(&x_axis) {
            accept(&mut x_axis, Field::X, fix, |v| bounds.x_in_range(v), trail);
        }
    }

    if !bounds.x_in_range(x_axis.value) {
        if let Some(fix) = x_km_fix(&x_axis) {
            accept(&mut x_axis, Field::X, fix, |v| bounds.x_in_range(v), trail);
        }
    }

    if !bounds.y_in_range(y_axis.value) {
        if let Some(fix) = y_km_fix(&y_axis) {
            accept(&mut y_axis, Field::Y, fix, |v| bounds.y_in_range(v), trail);
        }
    }

    (x_axis.value, y_axis.value)
}

fn accept(
    axis: &mut Axis,
    field: Field,
    fix: Fix,
    in_range: impl Fn(f64) -> bool,
    trail: &mut AuditTrail,
) {
    if !in_range(fix.value) {
        debug!(
            "Discarded {} on {}: {} -> {} is still out of range",
            fix.pattern, field, axis.value, fix.value
        );
        return;
    }

    debug!(
        "Applied {} on {}: {} -> {}",
        fix.pattern, field, axis.value, fix.value
    );
    trail.correct(Correction::new(
        fix.correction_type,
        field,
        axis.value.to_string(),
        fix.value.to_string(),
        fix.pattern,
    ));
    axis.value = fix.value;
}

fn swap_if_transposed(x: &mut Axis, y: &mut Axis, bounds: &TargetBounds, trail: &mut AuditTrail) {
    let looks_transposed = x.value >= structural::SWAP_Y_MAGNITUDE
        && (structural::SWAP_X_MIN..=structural::SWAP_X_MAX).contains(&y.value);
    if !looks_transposed {
        return;
    }

    if !bounds.contains(y.value, x.value) {
        debug!(
            "Swap of ({}, {}) discarded: swapped pair is out of range",
            x.value, y.value
        );
        return;
    }

    trail.correct(Correction::new(
        CorrectionType::XYSwapped,
        Field::Both,
        format!("{}, {}", x.value, y.value),
        format!("{}, {}", y.value, x.value),
        "NORTHING_IN_X_FIELD",
    ));
    std::mem::swap(x, y);
}

fn y_truncation_fix(y: &Axis, y_prefix: &str) -> Option<Fix> {
    if y.value <= 0.0 {
        return None;
    }
    let first = y.digits.chars().next()?;

    match y.digits.len() {
        6 if first <= structural::Y_PREFIXABLE_MAX_LEADING => {
            let prefixed = format!("{}{}", structural::Y_MISSING_LEADING_DIGIT, y.digits);
            let integer = prefixed.parse::<f64>().ok()?;
            Some(Fix {
                correction_type: CorrectionType::YTruncated,
                value: round_mm(integer + y.value.fract()),
                pattern: "MISSING_LEADING_4".to_string(),
            })
        }
        6 if y.digits.starts_with(structural::Y_MISSING_LEADING_DIGIT) => Some(Fix {
            correction_type: CorrectionType::YTruncated,
            value: round_mm(y.value * structural::Y_MISSING_TRAILING_FACTOR),
            pattern: "MISSING_TRAILING_DIGIT".to_string(),
        }),
        5 => {
            let prefixed = format!("{}{}", y_prefix, y.digits);
            let integer = prefixed.parse::<f64>().ok()?;
            Some(Fix {
                correction_type: CorrectionType::YTruncated,
                value: round_mm(integer + y.value.fract()),
                pattern: format!("PROVINCE_PREFIX_{}", y_prefix),
            })
        }
        _ => None,
    }
}

fn x_truncation_fix(x: &Axis) -> Option<Fix> {
    if x.value <= 0.0 {
        return None;
    }
    let (factor, pattern) = match x.digits.len() {
        5 => (structural::X_FIVE_DIGIT_FACTOR, "FIVE_DIGIT_X"),
        4 => (structural::X_FOUR_DIGIT_FACTOR, "FOUR_DIGIT_X"),
        _ => return None,
    };
    Some(Fix {
        correction_type: CorrectionType::XTruncated,
        value: round_mm(x.value * factor),
        pattern: pattern.to_string(),
    })
}

fn x_km_fix(x: &Axis) -> Option<Fix> {
    if x.value <= 0.0 || x.value >= structural::KM_X_MAX {
        return None;
    }
    let scaled = x.value * structural::KM_FACTOR;
    let (value, pattern) = if x.has_fraction {
        (scaled.round(), "X_KM_DECIMAL_AS_THOUSANDS")
    } else {
        (scaled, "X_KM_TO_METERS")
    };
    Some(Fix {
        correction_type: CorrectionType::KmToMeters,
        value,
        pattern: pattern.to_string(),
    })
}

fn y_km_fix(y: &Axis) -> Option<Fix> {
    if y.value <= structural::KM_Y_MIN || y.value >= structural::KM_Y_MAX {
        return None;
    }
    Some(Fix {
        correction_type: CorrectionType::KmToMeters,
        value: round_mm(y.value * structural::KM_FACTOR),
        pattern: "Y_KM_TO_METERS".to_string(),
    })
}
