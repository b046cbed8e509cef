//! End-to-end tests of the single-input pipeline

use super::*;
use crate::app::models::{
    Confidence, CorrectionType, Field, FlagType, SourceCrs, SourceFormat,
};
use crate::app::services::encoding::{CorrectedText, EncodingCorrector};
use std::sync::Arc;

#[test]
fn test_canonical_pair_is_untouched() {
    let result = normalize_pair("521581.88", "4185653.05");

    assert_eq!(result.coordinates(), Some((521581.88, 4185653.05)));
    assert_eq!(result.score, 100);
    assert!(result.corrections.is_empty());
    assert!(result.flags.is_empty());
    assert!(result.is_valid);
    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(result.source_format, Some(SourceFormat::Decimal));
    assert_eq!(result.source_crs, Some(SourceCrs::Etrs89Utm30));
}

#[test]
fn test_swapped_pair_agrees_with_ordered_pair() {
    let normalizer = default_normalizer();
    let swapped = normalizer.normalize(&CoordinateInput::new(4077905.0, 504750.0));
    let ordered = normalizer.normalize(&CoordinateInput::new(504750.0, 4077905.0));

    assert_eq!(swapped.coordinates(), Some((504750.0, 4077905.0)));
    assert_eq!(swapped.coordinates(), ordered.coordinates());
    assert!(swapped.has_correction(CorrectionType::XYSwapped));
    assert!(!ordered.has_correction(CorrectionType::XYSwapped));

    // Swap costs 10, each integral axis 3
    assert_eq!(swapped.score, 84);
    assert_eq!(ordered.score, 94);
    assert!(swapped.has_flag(FlagType::MissingDecimals));
}

#[test]
fn test_grouping_variants_agree() {
    for raw in ["504.891", "504 891", "504,891"] {
        let result = normalize_pair(raw, "4077905.5");
        assert_eq!(result.x, Some(504891.0), "normalizing '{}'", raw);
        assert!(result.is_valid, "normalizing '{}'", raw);
    }

    let comma = normalize_pair("504,891", "4077905.5");
    assert!(comma.has_correction(CorrectionType::SeparatorFixed));
    assert!(comma.has_correction(CorrectionType::KmToMeters));
}

#[test]
fn test_truncated_y_gets_prefix() {
    let result = normalize_pair("504750.5", "77905");
    assert_eq!(result.y, Some(4077905.0));
    assert!(result.has_correction(CorrectionType::YTruncated));
    assert!(result.is_valid);

    let jaen = default_normalizer()
        .normalize(&CoordinateInput::new("504750.5", "77905").with_province("Jaén"));
    assert_eq!(jaen.y, Some(4277905.0));

    let sevilla = default_normalizer()
        .normalize(&CoordinateInput::new("504750.5", "85653").with_province("Sevilla"));
    assert_eq!(sevilla.y, Some(4185653.0));
    assert_eq!(sevilla.corrections[0].pattern, "PROVINCE_PREFIX_41");
}

#[test]
fn test_transcription_artifacts_end_to_end() {
    let result = normalize_pair("504 750´´92", "4 077 153´´36");

    assert_eq!(result.coordinates(), Some((504750.92, 4077153.36)));
    assert!(result.is_valid);
    assert_eq!(result.score, 90);
    assert_eq!(result.corrections.len(), 2);
    assert!(
        result
            .corrections
            .iter()
            .all(|c| c.correction_type == CorrectionType::SeparatorFixed)
    );
    assert_eq!(result.source_format, Some(SourceFormat::TildeDecimal));
}

#[test]
fn test_wkt_in_raw_text() {
    let result = default_normalizer()
        .normalize(&CoordinateInput::from_raw_text("POINT(504750.5 4077905.5)"));

    assert_eq!(result.coordinates(), Some((504750.5, 4077905.5)));
    assert!(result.has_correction(CorrectionType::WktParsed));
    // Cosmetic corrections carry no penalty
    assert_eq!(result.score, 100);
    assert_eq!(result.source_format, Some(SourceFormat::Wkt));
}

#[test]
fn test_pair_in_one_field() {
    let normalizer = default_normalizer();

    let glued = normalizer.normalize(&CoordinateInput::new("5047504077905", ""));
    assert_eq!(glued.coordinates(), Some((504750.0, 4077905.0)));
    assert!(glued.has_correction(CorrectionType::CoordsSeparated));
    assert_eq!(glued.source_format, Some(SourceFormat::Glued));

    let combined = normalizer.normalize(&CoordinateInput::new("504750.5; 4077905.5", ""));
    assert_eq!(combined.coordinates(), Some((504750.5, 4077905.5)));
    assert_eq!(combined.score, 95);
}

#[test]
fn test_geographic_pair_is_projected() {
    let result = normalize_pair("-3.0", "37.0");
    assert_close(result.x, 500000.0, 0.01);
    assert_close(result.y, 4094872.37, 0.05);
    assert_eq!(result.source_crs, Some(SourceCrs::Geographic));
    assert!(result.has_flag(FlagType::GeographicCoords));
    assert!(result.is_valid);

    let lat_first = normalize_pair("37.0", "-3.0");
    assert_eq!(lat_first.coordinates(), result.coordinates());
    assert!(lat_first.has_correction(CorrectionType::XYSwapped));
}

#[test]
fn test_hemisphere_routes_dms_axes() {
    let result = normalize_pair("37°00'00\"N", "3°00'00\"W");

    assert_close(result.x, 500000.0, 0.01);
    assert_close(result.y, 4094872.37, 0.05);
    let swap = result
        .corrections
        .iter()
        .find(|c| c.correction_type == CorrectionType::XYSwapped)
        .unwrap();
    assert_eq!(swap.pattern, "HEMISPHERE_ORDER");
    assert_eq!(swap.field, Field::Both);
    // Two DMS conversions, one swap, integral easting
    assert_eq!(result.score, 77);
}

#[test]
fn test_cardinal_planar_values_are_routed() {
    let result = normalize_pair("Norte 4077905.5", "Este 504750.5");
    assert_eq!(result.coordinates(), Some((504750.5, 4077905.5)));
    assert!(result.has_correction(CorrectionType::CardinalExtracted));
    assert!(result.has_correction(CorrectionType::XYSwapped));
}

#[test]
fn test_lambert_hint_is_reprojected() {
    let result = default_normalizer().normalize(
        &CoordinateInput::new("554730.754", "323771.253").with_crs_hint(SourceCrs::LambertSpain),
    );

    assert_close(result.x, 393801.88, 0.5);
    assert_close(result.y, 4150802.59, 0.5);
    assert_eq!(result.source_crs, Some(SourceCrs::LambertSpain));
    assert!(result.has_correction(CorrectionType::LambertTransformed));
    assert!(!result.has_correction(CorrectionType::MadridDatumTransformed));
}

#[test]
fn test_document_year_selects_datum() {
    let normalizer = default_normalizer();

    let ed50 = normalizer
        .normalize(&CoordinateInput::new("504750.5", "4077905.5").with_document_year(1990));
    assert_eq!(ed50.coordinates(), Some((504640.5, 4077697.5)));
    assert_eq!(ed50.source_crs, Some(SourceCrs::Ed50Utm30));
    assert!(ed50.has_flag(FlagType::Ed50Detected));
    assert_eq!(ed50.score, 97);

    let madrid = normalizer
        .normalize(&CoordinateInput::new("504750.5", "4077905.5").with_document_year(1960));
    assert_eq!(madrid.coordinates(), Some((504622.5, 4077690.5)));
    assert_eq!(madrid.source_crs, Some(SourceCrs::MadridDatum));

    let current = normalizer
        .normalize(&CoordinateInput::new("504750.5", "4077905.5").with_document_year(2015));
    assert_eq!(current.coordinates(), Some((504750.5, 4077905.5)));

    let disabled = CoordinateNormalizer::new(NormalizerConfig::default().without_datum_shift())
        .normalize(&CoordinateInput::new("504750.5", "4077905.5").with_document_year(1990));
    assert_eq!(disabled.coordinates(), Some((504750.5, 4077905.5)));
}

#[test]
fn test_skipped_datum_shift_is_flagged() {
    let result = default_normalizer()
        .normalize(&CoordinateInput::new("100050.5", "4077905.5").with_document_year(1990));

    assert_eq!(result.coordinates(), Some((100050.5, 4077905.5)));
    assert_eq!(result.source_crs, Some(SourceCrs::Etrs89Utm30));
    assert!(!result.has_correction(CorrectionType::Ed50Transformed));
    assert!(result.has_flag(FlagType::Ed50Detected));
    assert_eq!(result.score, 90);
}

#[test]
fn test_old_truncated_northing_prefers_structural_fix() {
    let result = default_normalizer()
        .normalize(&CoordinateInput::new("504750.5", "407790").with_document_year(1960));

    let fix = result
        .corrections
        .iter()
        .find(|c| c.correction_type == CorrectionType::YTruncated)
        .expect("truncation correction recorded");
    assert_eq!(fix.pattern, "MISSING_TRAILING_DIGIT");
    assert!(!result.has_correction(CorrectionType::LambertTransformed));

    // Repaired to 4077900, then moved by the Madrid offset
    assert_eq!(result.coordinates(), Some((504622.5, 4077685.0)));
    assert_eq!(result.source_crs, Some(SourceCrs::MadridDatum));
}

#[test]
fn test_heuristic_rescue_after_structural_failure() {
    let result = normalize_pair("50,4750", "4077905.5");

    assert_eq!(result.x, Some(504750.0));
    assert!(result.has_correction(CorrectionType::HeuristicRescue));
    assert!(result.has_flag(FlagType::HeuristicApplied));
    let info = result.heuristic_applied.as_ref().unwrap();
    assert_eq!(info.rule, "COMMA_AS_THOUSANDS");
    assert_eq!(info.field, Field::X);
    assert_eq!(info.base_confidence, 65);

    // Separator 5, rescue 10, warning 10, integral easting 3
    assert_eq!(result.score, 72);
    assert_eq!(result.confidence, Confidence::Medium);
    assert!(result.is_valid);
}

#[test]
fn test_structural_fix_blocks_rescue() {
    let result = normalize_pair("50475", "4077905.5");

    assert_eq!(result.x, Some(504750.0));
    assert!(result.has_correction(CorrectionType::XTruncated));
    assert!(!result.has_correction(CorrectionType::HeuristicRescue));
    assert!(result.heuristic_applied.is_none());
}

#[test]
fn test_rescue_can_be_disabled() {
    let result = CoordinateNormalizer::new(NormalizerConfig::default().without_heuristics())
        .normalize(&CoordinateInput::new("50,4750", "4077905.5"));

    assert_eq!(result.x, Some(50.475));
    assert!(result.has_flag(FlagType::OutOfRange));
    assert!(!result.is_valid);
    assert_eq!(result.score, 70);
}

#[test]
fn test_out_of_range_is_reported() {
    let result = normalize_pair("-5", "4077905.5");

    assert_eq!(result.x, Some(-5.0));
    assert!(result.has_flag(FlagType::OutOfRange));
    assert!(!result.is_valid);
}

#[test]
fn test_mojibake_is_repaired_before_parsing() {
    let result = normalize_pair("504750Â´92", "4077153.36");
    assert_eq!(result.coordinates(), Some((504750.92, 4077153.36)));
    assert!(result.is_valid);
}

struct FixedCorrector;

impl EncodingCorrector for FixedCorrector {
    fn correct(&self, _text: &str) -> CorrectedText {
        CorrectedText {
            corrected: "504750.25".to_string(),
            was_modified: true,
        }
    }
}

#[test]
fn test_external_encoding_corrector() {
    let normalizer = default_normalizer().with_encoding_corrector(Arc::new(FixedCorrector));

    let repaired = normalizer.normalize(&CoordinateInput::new("Ã garbled", "4077905.5"));
    assert_eq!(repaired.x, Some(504750.25));

    // Clean fields never reach the corrector
    let clean = normalizer.normalize(&CoordinateInput::new("504750.5", "4077905.5"));
    assert_eq!(clean.x, Some(504750.5));
}

#[test]
fn test_valid_results_are_in_range() {
    let normalizer = default_normalizer();
    for input in mixed_inputs(16) {
        let result = normalizer.normalize(&input);
        if result.is_valid {
            let (x, y) = result.coordinates().unwrap();
            assert!((100_000.0..=800_000.0).contains(&x));
            assert!((3_980_000.0..=4_320_000.0).contains(&y));
            assert!(result.score >= 50);
        }
    }
}
