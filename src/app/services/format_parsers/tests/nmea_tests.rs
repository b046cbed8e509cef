//! Tests for NMEA parsing

use super::*;
use crate::app::models::{CorrectionType, Hemisphere};

#[test]
fn test_bare_latitude_and_longitude() {
    let (outcome, corrections) = parse_with_log(SourceFormat::Nmea, "3723.4567N", Field::Y);
    let reading = expect_axis(&outcome);
    assert_close(reading.value, 37.390945, 1e-6);
    assert_eq!(reading.hemisphere, Some(Hemisphere::North));
    assert_eq!(corrections[0].correction_type, CorrectionType::NmeaConverted);

    let (outcome, _) = parse_with_log(SourceFormat::Nmea, "00412.3456W", Field::X);
    assert_close(expect_axis(&outcome).value, -4.205760, 1e-6);
}

#[test]
fn test_full_sentence_gives_a_pair() {
    let (outcome, corrections) = parse_with_log(
        SourceFormat::Nmea,
        "$GPGGA,123519,3723.4567,N,00412.3456,W,1,08,0.9,545.4,M,46.9,M,,*47",
        Field::X,
    );
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, -4.205760, 1e-6);
    assert_close(y.value, 37.390945, 1e-6);
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].field, Field::Both);
}

#[test]
fn test_width_must_match_hemisphere() {
    let (outcome, _) = parse_with_log(SourceFormat::Nmea, "3723.4567W", Field::X);
    assert!(outcome.is_rejected());

    let (outcome, _) = parse_with_log(SourceFormat::Nmea, "00412.3456N", Field::Y);
    assert!(outcome.is_rejected());
}

#[test]
fn test_minutes_over_sixty_rejected() {
    let (outcome, corrections) = parse_with_log(SourceFormat::Nmea, "3775.0000N", Field::Y);
    assert!(outcome.is_rejected());
    assert!(corrections.is_empty());
}
