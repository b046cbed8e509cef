//! Tests for legacy datum offsets

use super::*;
use crate::app::models::{CorrectionPriority, CorrectionType, FlagType, Severity};
use crate::app::services::crs_transform::{LegacyDatum, apply_datum_shift, legacy_datum};

#[test]
fn test_datum_selection_by_year() {
    let config = NormalizerConfig::default();
    assert_eq!(legacy_datum(&context(&config, Some(1960))), Some(LegacyDatum::Madrid));
    assert_eq!(legacy_datum(&context(&config, Some(1970))), Some(LegacyDatum::Ed50));
    assert_eq!(legacy_datum(&context(&config, Some(2006))), Some(LegacyDatum::Ed50));
    assert_eq!(legacy_datum(&context(&config, Some(2007))), None);
    assert_eq!(legacy_datum(&context(&config, None)), None);
}

#[test]
fn test_hint_overrides_year() {
    let config = NormalizerConfig::default();
    let ctx = TransformContext {
        document_year: Some(1985),
        crs_hint: Some(SourceCrs::Etrs89Utm30),
        config: &config,
    };
    assert_eq!(legacy_datum(&ctx), None);
    assert_eq!(
        legacy_datum(&hinted(&config, SourceCrs::Ed50Utm30)),
        Some(LegacyDatum::Ed50)
    );
}

#[test]
fn test_ed50_offset_applied() {
    let config = NormalizerConfig::default();
    let mut trail = empty_trail();

    let (x, y, crs) = apply_datum_shift(
        504_750.5,
        4_077_905.5,
        SourceCrs::Etrs89Utm30,
        &context(&config, Some(1985)),
        &mut trail,
    );

    assert_close(x, 504_640.5, 1e-6);
    assert_close(y, 4_077_697.5, 1e-6);
    assert_eq!(crs, SourceCrs::Ed50Utm30);
    assert_eq!(trail.corrections[0].correction_type, CorrectionType::Ed50Transformed);
    assert_eq!(trail.corrections[0].priority, CorrectionPriority::P2);
    assert_eq!(trail.flags[0].flag_type, FlagType::Ed50Detected);
}

#[test]
fn test_madrid_offset_applied() {
    let config = NormalizerConfig::default();
    let mut trail = empty_trail();

    let (x, y, crs) = apply_datum_shift(
        504_750.5,
        4_077_905.5,
        SourceCrs::Etrs89Utm30,
        &context(&config, Some(1960)),
        &mut trail,
    );

    assert_close(x, 504_622.5, 1e-6);
    assert_close(y, 4_077_690.5, 1e-6);
    assert_eq!(crs, SourceCrs::MadridDatum);
    assert!(trail.has_correction(CorrectionType::MadridDatumTransformed));
}

#[test]
fn test_offset_skipped_when_disabled_or_lambert() {
    let config = NormalizerConfig::default().without_datum_shift();
    let mut trail = empty_trail();
    let (x, _, _) = apply_datum_shift(
        504_750.5,
        4_077_905.5,
        SourceCrs::Etrs89Utm30,
        &context(&config, Some(1985)),
        &mut trail,
    );
    assert_eq!(x, 504_750.5);

    let config = NormalizerConfig::default();
    let (x, _, crs) = apply_datum_shift(
        504_750.5,
        4_077_905.5,
        SourceCrs::LambertSpain,
        &context(&config, Some(1960)),
        &mut trail,
    );
    assert_eq!(x, 504_750.5);
    assert_eq!(crs, SourceCrs::LambertSpain);
    assert!(trail.corrections.is_empty());
}

#[test]
fn test_offset_leaving_envelope_is_discarded() {
    let config = NormalizerConfig::default();
    let mut trail = empty_trail();

    let (x, y, crs) = apply_datum_shift(
        100_050.0,
        4_077_905.5,
        SourceCrs::Etrs89Utm30,
        &context(&config, Some(1985)),
        &mut trail,
    );

    assert_eq!((x, y), (100_050.0, 4_077_905.5));
    assert_eq!(crs, SourceCrs::Etrs89Utm30);
    assert!(trail.corrections.is_empty());

    // The skipped shift is still reported against the uncorrected pair
    assert_eq!(trail.flags.len(), 1);
    assert_eq!(trail.flags[0].flag_type, FlagType::Ed50Detected);
    assert_eq!(trail.flags[0].severity, Severity::Warning);
    assert!(trail.flags[0].message.contains("skipped"));
}

#[test]
fn test_madrid_offset_leaving_envelope_is_flagged() {
    let config = NormalizerConfig::default();
    let mut trail = empty_trail();

    let (x, y, _) = apply_datum_shift(
        504_750.5,
        3_980_100.0,
        SourceCrs::Etrs89Utm30,
        &context(&config, Some(1960)),
        &mut trail,
    );

    assert_eq!((x, y), (504_750.5, 3_980_100.0));
    assert!(trail.corrections.is_empty());
    assert_eq!(trail.flags[0].flag_type, FlagType::MadridDatumDetected);
}
