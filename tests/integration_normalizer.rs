//! Integration tests for the coordinate normalizer public API
//!
//! These tests drive the library only through its re-exported entry points
//! and check the properties every result must satisfy, whatever the input.

use ptel_coords::app::models::Field;
use ptel_coords::app::services::crs_transform::projection::{
    geographic_to_utm30, utm30_to_geographic,
};
use ptel_coords::{
    Confidence, CoordinateInput, CoordinateNormalizer, CorrectionType, FlagType,
    NormalizationResult, NormalizerConfig, get_batch_stats, normalize_coordinate,
    normalize_coordinate_batch, normalize_coordinate_batch_concurrent,
};
use std::io::Write;

/// Inputs covering every recognizer family plus a few hostile ones
fn corpus() -> Vec<CoordinateInput> {
    let pairs: &[(&str, &str)] = &[
        ("521581.88", "4185653.05"),
        ("4077905", "504750"),
        ("504.891", "4077905.5"),
        ("504 891", "4077905.5"),
        ("504,891", "4077905.5"),
        ("504750,5", "4077905,5"),
        ("504 750´´92", "4 077 153´´36"),
        ("504750.5", "77905"),
        ("50475", "4077905.5"),
        ("50,4750", "4077905.5"),
        ("-3.5", "37.2"),
        ("37°12'30\"N", "3°30'00\"W"),
        ("Indicar", "4077905.5"),
        ("504750.5", "Pendiente"),
        ("9872023VH5797S0001WX", ""),
        ("Cortijo El Romeral", ""),
        ("#?!", "@@"),
        ("5047504077905", ""),
        ("", ""),
        ("-5", "4077905.5"),
        ("1e308", "-1e308"),
        ("999999999999999999999", "0"),
    ];

    let mut inputs: Vec<CoordinateInput> = pairs
        .iter()
        .map(|(x, y)| CoordinateInput::new(*x, *y))
        .collect();
    inputs.push(CoordinateInput::from_raw_text("POINT(504750.5 4077905.5)"));
    inputs.push(CoordinateInput::from_raw_text(
        r#"{"type":"Point","coordinates":[504750.5,4077905.5]}"#,
    ));
    inputs.push(CoordinateInput::from_raw_text("X: 504750,5 Y: 4077905,5"));
    inputs.push(CoordinateInput::new(504750.5, 4077905.5).with_document_year(1985));
    inputs.push(CoordinateInput::new(f64::NAN, f64::INFINITY));
    inputs
}

fn structurally_fixed(result: &NormalizationResult, field: Field) -> bool {
    result.corrections.iter().any(|c| {
        c.field == field
            && matches!(
                c.correction_type,
                CorrectionType::XTruncated | CorrectionType::YTruncated
            )
    })
}

fn rescued(result: &NormalizationResult, field: Field) -> bool {
    result
        .corrections
        .iter()
        .any(|c| c.field == field && c.correction_type == CorrectionType::HeuristicRescue)
}

/// Test that a canonical pair passes through untouched
#[test]
fn test_canonical_pair_is_idempotent() {
    let result = normalize_coordinate(&CoordinateInput::new("521581.88", "4185653.05"));

    assert_eq!(result.coordinates(), Some((521581.88, 4185653.05)));
    assert_eq!(result.score, 100);
    assert!(result.corrections.is_empty());
    assert!(result.is_valid);

    // Feeding the output back in changes nothing
    let again = normalize_coordinate(&CoordinateInput::new(521581.88, 4185653.05));
    assert_eq!(again.coordinates(), result.coordinates());
    assert_eq!(again.score, 100);
}

/// Test that every valid result lies inside the target envelope
#[test]
fn test_valid_results_respect_envelope() {
    for result in normalize_coordinate_batch(&corpus(), None) {
        if result.is_valid {
            let (x, y) = result
                .coordinates()
                .expect("valid results carry coordinates");
            assert!((100_000.0..=800_000.0).contains(&x), "x {} out of range", x);
            assert!((3_980_000.0..=4_320_000.0).contains(&y), "y {} out of range", y);
        }
    }
}

/// Test that score and confidence always agree and stay within 0-100
#[test]
fn test_score_and_confidence_are_consistent() {
    for result in normalize_coordinate_batch(&corpus(), None) {
        assert!(result.score <= 100);
        assert_eq!(result.confidence, Confidence::from_score(result.score));
        if result.is_valid {
            assert!(result.score >= 50);
        }
    }
}

/// Test that swapped and ordered pairs agree
#[test]
fn test_swap_symmetry() {
    let swapped = normalize_coordinate(&CoordinateInput::new(4077905.0, 504750.0));
    let ordered = normalize_coordinate(&CoordinateInput::new(504750.0, 4077905.0));

    assert_eq!(swapped.coordinates(), Some((504750.0, 4077905.0)));
    assert_eq!(ordered.coordinates(), Some((504750.0, 4077905.0)));
    assert!(swapped.has_correction(CorrectionType::XYSwapped));
    assert!(!ordered.has_correction(CorrectionType::XYSwapped));
}

/// Test that the three grouping notations normalize to the same value
#[test]
fn test_separator_equivalence() {
    let values: Vec<_> = ["504.891", "504 891", "504,891"]
        .iter()
        .map(|x| normalize_coordinate(&CoordinateInput::new(*x, "4077905.5")).x)
        .collect();

    assert_eq!(values, vec![Some(504891.0); 3]);
}

/// Test that a five-digit northing gets the default prefix
#[test]
fn test_truncated_northing_is_repaired() {
    let result = normalize_coordinate(&CoordinateInput::new("504750.5", "77905"));

    assert_eq!(result.y, Some(4077905.0));
    let fix = result
        .corrections
        .iter()
        .find(|c| c.correction_type == CorrectionType::YTruncated)
        .expect("truncation correction recorded");
    assert_eq!(fix.field, Field::Y);
    assert_eq!(fix.pattern, "PROVINCE_PREFIX_40");
}

/// Test that placeholders short-circuit whatever the other field holds
#[test]
fn test_placeholder_short_circuit() {
    let inputs = [
        CoordinateInput::new("Indicar", "4077905.5"),
        CoordinateInput::new("504750.5", "Pendiente"),
        CoordinateInput::new("Pendiente", "77905"),
        CoordinateInput::new("INDICAR", "Indicar"),
    ];

    for input in &inputs {
        let result = normalize_coordinate(input);
        assert_eq!(result.x, None, "input {:?}", input);
        assert_eq!(result.y, None, "input {:?}", input);
        assert!(!result.is_valid);
        assert_eq!(result.score, 0);
        assert!(result.has_correction(CorrectionType::PlaceholderDetected));
    }
}

/// Test that structural fixes and heuristic rescues never share an axis
#[test]
fn test_heuristic_gating() {
    for result in normalize_coordinate_batch(&corpus(), None) {
        for field in [Field::X, Field::Y] {
            assert!(
                !(structurally_fixed(&result, field) && rescued(&result, field)),
                "both repairs on {:?} for {:?}",
                field,
                result.original
            );
        }
        if result.heuristic_applied.is_some() {
            assert!(result.has_flag(FlagType::HeuristicApplied));
        }
    }
}

/// Test the transcription-artifact example end to end
#[test]
fn test_transcription_example() {
    let result = normalize_coordinate(&CoordinateInput::new("504 750´´92", "4 077 153´´36"));

    assert_eq!(result.coordinates(), Some((504750.92, 4077153.36)));
    assert!(result.is_valid);
    assert!(result.score >= 90);
}

/// Test that no input makes the engine panic and every result is reported
#[test]
fn test_hostile_inputs_never_panic() {
    let inputs = corpus();
    let results = normalize_coordinate_batch(&inputs, None);
    assert_eq!(results.len(), inputs.len());

    for result in &results {
        if result.coordinates().is_none() {
            assert!(!result.is_valid);
        }
    }
}

/// Test that hand-offs leave coordinates empty and name what to geocode
#[test]
fn test_geocoding_hand_off() {
    let cadastral = normalize_coordinate(&CoordinateInput::new("9872023VH5797S0001WX", ""));
    assert!(cadastral.needs_geocoding());
    assert!(cadastral.cadastral_ref.is_some());
    assert!(cadastral.has_flag(FlagType::GeocodingNeeded));
    assert_eq!(cadastral.coordinates(), None);

    let toponym = normalize_coordinate(&CoordinateInput::new("Cortijo El Romeral", ""));
    assert_eq!(toponym.toponym.as_deref(), Some("Cortijo El Romeral"));
    assert!(!toponym.is_valid);
}

/// Test the batch API: order, progress and statistics
#[test]
fn test_batch_progress_and_stats() {
    let inputs = corpus();
    let mut calls = Vec::new();
    let mut on_progress = |done: usize, total: usize| calls.push((done, total));

    let results = normalize_coordinate_batch(&inputs, Some(&mut on_progress));

    assert_eq!(calls.len(), inputs.len());
    assert_eq!(calls.last(), Some(&(inputs.len(), inputs.len())));
    for (input, result) in inputs.iter().zip(&results) {
        assert_eq!(result, &normalize_coordinate(input));
    }

    let stats = get_batch_stats(&results);
    assert_eq!(stats.total, inputs.len());
    assert_eq!(stats.valid + stats.invalid, stats.total);
    let bucket_total: usize = stats.by_confidence.values().sum();
    assert_eq!(bucket_total, stats.total);
    assert!(stats.placeholders >= 2);
    assert_eq!(stats.needs_geocoding, 2);
}

/// Test that the concurrent batch returns the sequential results in order
#[tokio::test]
async fn test_concurrent_batch_matches_sequential() {
    let inputs: Vec<_> = corpus().into_iter().cycle().take(500).collect();

    let sequential = normalize_coordinate_batch(&inputs, None);
    let concurrent = normalize_coordinate_batch_concurrent(inputs)
        .await
        .expect("concurrent batch should succeed");

    assert_eq!(sequential, concurrent);
}

/// Test that results serialize to JSON with their audit trail
#[test]
fn test_result_serialization() {
    let result = normalize_coordinate(&CoordinateInput::new("4077905", "504750"));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["x"], 504750.0);
    assert_eq!(json["confidence"], "HIGH");
    assert_eq!(json["is_valid"], true);
    assert!(!json["corrections"].as_array().unwrap().is_empty());
    assert!(json.get("toponym").is_none());

    let back: NormalizationResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

/// Test that a configuration file changes the engine's thresholds
#[test]
fn test_configuration_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{ "min_valid_score": 95, "enable_datum_shift": false }}"#
    )
    .unwrap();

    let config = NormalizerConfig::from_file(file.path()).unwrap();
    let normalizer = CoordinateNormalizer::new(config);

    // Two integral axes cost 6 points, below the stricter threshold
    let result = normalizer.normalize(&CoordinateInput::new("504750", "4077905"));
    assert_eq!(result.score, 94);
    assert!(!result.is_valid);

    let old = normalizer
        .normalize(&CoordinateInput::new("504750.5", "4077905.5").with_document_year(1990));
    assert_eq!(old.coordinates(), Some((504750.5, 4077905.5)));
}

/// Test that the inverse projection undoes the forward projection
#[test]
fn test_projection_round_trip() {
    for (lon, lat) in [(-3.0, 37.0), (-6.3, 36.5), (-1.8, 38.4)] {
        let (x, y) = geographic_to_utm30(lon, lat);
        let (lon_back, lat_back) = utm30_to_geographic(x, y);
        assert!((lon - lon_back).abs() < 1e-6, "lon {} -> {}", lon, lon_back);
        assert!((lat - lat_back).abs() < 1e-6, "lat {} -> {}", lat, lat_back);
    }
}
