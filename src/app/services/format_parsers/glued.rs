//! Splitter for both axes concatenated into one run of digits
//!
//! `5047504077905` is X = 504750 and Y = 4077905 with the separator lost.
//! Every split that leaves a plausible X (5-8 digits) and Y (6-9 digits) is
//! tried; X keeps six integer digits and Y seven, any surplus becomes the
//! fraction. Short halves get the same repairs the structural corrector
//! applies (five-digit X times ten, six-digit Y with a leading "4").

use super::{AxisReading, FieldParse, ParseContext, Reading};
use crate::app::models::{Correction, CorrectionType, Field};
use crate::app::services::lexer::CleanedNumber;
use crate::config::TargetBounds;
use crate::constants::structural;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static GLUED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{12,14}$").expect("valid glued regex"));

const X_INTEGER_DIGITS: usize = 6;
const Y_INTEGER_DIGITS: usize = 7;

/// Whether a field is a bare run of 12-14 digits
pub fn is_glued(text: &str) -> bool {
    GLUED.is_match(text.trim())
}

/// One way of cutting the digit run
#[derive(Debug, Clone, PartialEq)]
struct Split {
    x: CleanedNumber,
    y: CleanedNumber,
    x_repaired: bool,
    y_repaired: bool,
    /// Difference between the fraction lengths of the two halves
    imbalance: usize,
}

impl Split {
    fn repairs(&self) -> usize {
        usize::from(self.x_repaired) + usize::from(self.y_repaired)
    }

    fn rank(&self) -> (usize, usize) {
        (self.repairs(), self.imbalance)
    }
}

fn with_fraction(integer: &str, fraction: &str) -> Option<CleanedNumber> {
    let text = if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, fraction)
    };
    let value = text.parse::<f64>().ok()?;
    Some(CleanedNumber { text, value })
}

fn split_x(digits: &str) -> Option<(CleanedNumber, bool)> {
    if digits.len() == X_INTEGER_DIGITS - 1 {
        let padded = with_fraction(digits, "")?;
        let value = padded.value * structural::X_FIVE_DIGIT_FACTOR;
        return Some((
            CleanedNumber {
                text: format!("{}", value),
                value,
            },
            true,
        ));
    }
    let (integer, fraction) = digits.split_at(X_INTEGER_DIGITS.min(digits.len()));
    with_fraction(integer, fraction).map(|n| (n, false))
}

fn split_y(digits: &str) -> Option<(CleanedNumber, bool)> {
    if digits.len() == Y_INTEGER_DIGITS - 1 {
        let first = digits.chars().next()?;
        if first > structural::Y_PREFIXABLE_MAX_LEADING {
            return None;
        }
        let prefixed = format!("{}{}", structural::Y_MISSING_LEADING_DIGIT, digits);
        return with_fraction(&prefixed, "").map(|n| (n, true));
    }
    let (integer, fraction) = digits.split_at(Y_INTEGER_DIGITS.min(digits.len()));
    with_fraction(integer, fraction).map(|n| (n, false))
}

fn candidate_splits(digits: &str, bounds: &TargetBounds) -> Vec<Split> {
    let total = digits.len();
    (5..=8)
        .filter(|x_len| (6..=9).contains(&(total.saturating_sub(*x_len))))
        .filter_map(|x_len| {
            let (x_digits, y_digits) = digits.split_at(x_len);
            let (x, x_repaired) = split_x(x_digits)?;
            let (y, y_repaired) = split_y(y_digits)?;
            if !bounds.contains(x.value, y.value) {
                return None;
            }
            let x_fraction = x_len.saturating_sub(X_INTEGER_DIGITS);
            let y_fraction = y_digits.len().saturating_sub(Y_INTEGER_DIGITS);
            Some(Split {
                x,
                y,
                x_repaired,
                y_repaired,
                imbalance: x_fraction.abs_diff(y_fraction),
            })
        })
        .collect()
}

/// Split a glued digit run into an X/Y pair
///
/// Returns `Rejected` when no split lands in the target envelope or when two
/// splits are equally good.
pub fn parse(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let digits = value.trim();
    if !is_glued(digits) {
        return FieldParse::Rejected;
    }

    let mut splits = candidate_splits(digits, ctx.bounds);
    splits.sort_by_key(Split::rank);

    let best = match splits.as_slice() {
        [] => {
            debug!("No in-range split for glued digits '{}'", digits);
            return FieldParse::Rejected;
        }
        [first, second, ..] if first.rank() == second.rank() => {
            debug!("Ambiguous split for glued digits '{}'", digits);
            return FieldParse::Rejected;
        }
        [first, ..] => first.clone(),
    };

    ctx.push(Correction::new(
        CorrectionType::CoordsSeparated,
        Field::Both,
        digits,
        format!("{}, {}", best.x.text, best.y.text),
        "GLUED_DIGITS",
    ));
    if best.x_repaired {
        ctx.push(Correction::new(
            CorrectionType::XTruncated,
            Field::X,
            digits,
            best.x.text.clone(),
            "GLUED_X_FIVE_DIGITS",
        ));
    }
    if best.y_repaired {
        ctx.push(Correction::new(
            CorrectionType::YTruncated,
            Field::Y,
            digits,
            best.y.text.clone(),
            "GLUED_Y_ADD_4_PREFIX",
        ));
    }

    FieldParse::Parsed(Reading::Pair {
        x: AxisReading::planar(best.x),
        y: AxisReading::planar(best.y),
    })
}
