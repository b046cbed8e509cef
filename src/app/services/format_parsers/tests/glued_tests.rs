//! Tests for glued digit splitting

use super::*;
use crate::app::models::CorrectionType;

#[test]
fn test_natural_split() {
    let (outcome, corrections) = parse_with_log(SourceFormat::Glued, "5047504077905", Field::X);
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, 504750.0, 1e-6);
    assert_close(y.value, 4077905.0, 1e-6);
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].correction_type, CorrectionType::CoordsSeparated);
}

#[test]
fn test_surplus_digits_become_fractions() {
    let (outcome, _) = parse_with_log(SourceFormat::Glued, "50475094077905", Field::X);
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, 504750.9, 1e-6);
    assert_close(y.value, 4077905.0, 1e-6);

    let (outcome, _) = parse_with_log(SourceFormat::Glued, "50475040779050", Field::X);
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, 504750.0, 1e-6);
    assert_close(y.value, 4077905.0, 1e-6);
}

#[test]
fn test_equally_good_splits_are_ambiguous() {
    // 50475|4077905 and 504754|077905 both need one repair
    let (outcome, corrections) = parse_with_log(SourceFormat::Glued, "504754077905", Field::X);
    assert!(outcome.is_rejected());
    assert!(corrections.is_empty());
}

#[test]
fn test_out_of_range_digits_rejected() {
    let (outcome, _) = parse_with_log(SourceFormat::Glued, "9999999999999", Field::X);
    assert!(outcome.is_rejected());
}
