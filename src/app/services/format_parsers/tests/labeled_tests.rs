//! Tests for labeled, cardinal, combined and narrative parsing

use super::*;
use crate::app::models::{CorrectionType, Hemisphere};

#[test]
fn test_labeled_pair_with_separators() {
    let (outcome, corrections) = parse_with_log(
        SourceFormat::Labeled,
        "X: 504 750,92 Y: 4 077 153,36",
        Field::X,
    );
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, 504750.92, 1e-6);
    assert_close(y.value, 4077153.36, 1e-6);

    // Two separator fixes plus the extraction itself
    assert_eq!(corrections.len(), 3);
    assert_eq!(
        corrections.last().map(|c| c.correction_type),
        Some(CorrectionType::NarrativeExtracted)
    );
}

#[test]
fn test_labeled_spanish_words() {
    let (outcome, _) = parse_with_log(
        SourceFormat::Labeled,
        "Este: 504750.5, Norte: 4077905.5",
        Field::X,
    );
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, 504750.5, 1e-6);
    assert_close(y.value, 4077905.5, 1e-6);
}

#[test]
fn test_labeled_geographic() {
    let (outcome, _) = parse_with_log(SourceFormat::Labeled, "lat: 37.5, lon: -4.2", Field::X);
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, -4.2, 1e-9);
    assert_close(y.value, 37.5, 1e-9);
}

#[test]
fn test_cardinal_planar_keeps_marker() {
    let (outcome, corrections) = parse_with_log(SourceFormat::Cardinal, "Norte 4077905", Field::X);
    let reading = expect_axis(&outcome);
    assert_close(reading.value, 4077905.0, 1e-6);
    assert_eq!(reading.hemisphere, Some(Hemisphere::North));
    assert!(!reading.angular);
    assert_eq!(corrections[0].correction_type, CorrectionType::CardinalExtracted);
}

#[test]
fn test_cardinal_degrees_take_sign() {
    let (outcome, _) = parse_with_log(SourceFormat::Cardinal, "4.2 O", Field::X);
    let reading = expect_axis(&outcome);
    assert_close(reading.value, -4.2, 1e-9);
    assert!(reading.angular);
}

#[test]
fn test_combined_pair_separators() {
    for raw in ["504750 4077905", "504750; 4077905", "504750,4077905", "504750 / 4077905"] {
        let (outcome, corrections) = parse_with_log(SourceFormat::CombinedPair, raw, Field::X);
        let (x, y) = expect_pair(&outcome);
        assert_close(x.value, 504750.0, 1e-6);
        assert_close(y.value, 4077905.0, 1e-6);
        assert_eq!(
            corrections.last().map(|c| c.correction_type),
            Some(CorrectionType::CoordsSeparated),
            "'{raw}'"
        );
    }
}

#[test]
fn test_narrative_single_and_pair() {
    let (outcome, _) = parse_with_log(
        SourceFormat::Narrative,
        "aprox. 504750 según plano de 1985",
        Field::X,
    );
    assert!(matches!(outcome, FieldParse::ParsedWithWarning(_, _)));
    assert_close(expect_axis(&outcome).value, 504750.0, 1e-6);

    let (outcome, _) = parse_with_log(
        SourceFormat::Narrative,
        "situado en 504750 y 4077905 junto a la carretera",
        Field::X,
    );
    let (x, y) = expect_pair(&outcome);
    assert_close(x.value, 504750.0, 1e-6);
    assert_close(y.value, 4077905.0, 1e-6);
}

#[test]
fn test_narrative_without_planar_numbers_rejected() {
    let (outcome, corrections) =
        parse_with_log(SourceFormat::Narrative, "ver anexo 3, plano 12", Field::X);
    assert!(outcome.is_rejected());
    assert!(corrections.is_empty());
}
