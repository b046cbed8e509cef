//! Confidence scorer
//!
//! Pure function of the audit trail and the final values: start at 100,
//! subtract a penalty per correction by priority, per flag by severity and per
//! axis whose value has no decimals, then clamp to 0-100.

use crate::app::models::{Confidence, Correction, CorrectionPriority, Flag, Severity};
use crate::constants::scoring;

/// Whether a value carries no fractional part
pub fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

fn correction_penalty(priority: CorrectionPriority) -> i32 {
    match priority {
        CorrectionPriority::P0 => scoring::P0_PENALTY,
        CorrectionPriority::P1 => scoring::P1_PENALTY,
        CorrectionPriority::P2 => scoring::P2_PENALTY,
        CorrectionPriority::P3 => scoring::P3_PENALTY,
    }
}

fn flag_penalty(severity: Severity) -> i32 {
    match severity {
        Severity::Error => scoring::ERROR_FLAG_PENALTY,
        Severity::Warning => scoring::WARNING_FLAG_PENALTY,
        Severity::Info => 0,
    }
}

/// Score a result
pub fn score(corrections: &[Correction], flags: &[Flag], x: Option<f64>, y: Option<f64>) -> u8 {
    let corrections_total: i32 = corrections
        .iter()
        .map(|c| correction_penalty(c.priority))
        .sum();
    let flags_total: i32 = flags.iter().map(|f| flag_penalty(f.severity)).sum();
    let integral_total = [x, y]
        .into_iter()
        .flatten()
        .filter(|v| is_integral(*v))
        .count() as i32
        * scoring::INTEGRAL_VALUE_PENALTY;

    let raw = scoring::MAX_SCORE - corrections_total - flags_total - integral_total;
    raw.clamp(0, scoring::MAX_SCORE) as u8
}

/// Confidence bucket for a score
pub fn confidence(score: u8) -> Confidence {
    Confidence::from_score(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{CorrectionType, Field, FlagType};

    fn correction(correction_type: CorrectionType) -> Correction {
        Correction::new(correction_type, Field::X, "a", "b", "TEST")
    }

    #[test]
    fn test_clean_decimal_pair_scores_100() {
        assert_eq!(score(&[], &[], Some(521581.88), Some(4185653.05)), 100);
        assert_eq!(confidence(100), Confidence::High);
    }

    #[test]
    fn test_penalties_by_priority_and_severity() {
        let corrections = vec![
            correction(CorrectionType::XYSwapped),
            correction(CorrectionType::SeparatorFixed),
            correction(CorrectionType::Ed50Transformed),
            correction(CorrectionType::WktParsed),
        ];
        let flags = vec![
            Flag::warning(FlagType::HeuristicApplied, "w"),
            Flag::info(FlagType::GeographicCoords, "i"),
        ];
        // 100 - 10 - 5 - 3 - 0 - 10 - 0, then one integral axis
        assert_eq!(score(&corrections, &flags, Some(504750.0), Some(4077905.5)), 69);
    }

    #[test]
    fn test_score_is_clamped() {
        let flags: Vec<Flag> = (0..6)
            .map(|_| Flag::error(FlagType::OutOfRange, "e"))
            .collect();
        assert_eq!(score(&[], &flags, None, None), 0);
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(confidence(76), Confidence::High);
        assert_eq!(confidence(75), Confidence::Medium);
        assert_eq!(confidence(51), Confidence::Medium);
        assert_eq!(confidence(50), Confidence::Low);
        assert_eq!(confidence(26), Confidence::Low);
        assert_eq!(confidence(25), Confidence::Critical);
    }

    #[test]
    fn test_integral_detection() {
        assert!(is_integral(504750.0));
        assert!(!is_integral(504750.5));
        assert!(!is_integral(f64::NAN));
    }
}
