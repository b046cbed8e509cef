//! Single-input normalization pipeline
//!
//! Runs one [`CoordinateInput`] through every stage in order:
//!
//! 1. Trim fields and repair mojibake through the encoding corrector
//! 2. Short-circuit on placeholders, cadastral references and place names
//! 3. Recognise and parse each field (or a field/raw text holding both axes)
//! 4. Route hemisphere-marked readings to the right axis
//! 5. Project geographic and Lambert input, then repair structural defects
//! 6. Rescue axes still out of range, apply the legacy datum offset
//! 7. Validate, score and classify
//!
//! Short-circuited inputs skip the scorer and come back with score 0.

use crate::app::models::{
    AuditTrail, Correction, CorrectionType, CoordinateInput, Field, Flag, FlagType,
    HeuristicInfo, NormalizationResult, OriginalInput, SourceCrs, SourceFormat,
};
use crate::app::services::crs_transform::{self, TransformContext};
use crate::app::services::encoding::{self, EncodingCorrector};
use crate::app::services::format_parsers::{
    self, AxisReading, FieldParse, ParseContext, Reading,
};
use crate::app::services::rescue::{self, RescueCandidate};
use crate::app::services::structural::{self, round_mm};
use crate::app::services::{lexer, recognizer, scorer};
use crate::config::{NormalizerConfig, TargetBounds};
use tracing::{debug, warn};

/// Readings placed on their axes, ready for the numeric stages
#[derive(Debug)]
struct Located {
    x: AxisReading,
    y: AxisReading,
    /// Text each axis came from, used by the rescue rules
    x_origin: String,
    y_origin: String,
    format: SourceFormat,
}

impl Located {
    fn from_pair(x: AxisReading, y: AxisReading, format: SourceFormat) -> Self {
        Self {
            x_origin: x.text.clone(),
            y_origin: y.text.clone(),
            x,
            y,
            format,
        }
    }
}

/// Where field resolution ended
#[derive(Debug)]
enum Resolution {
    Located(Located),
    Placeholder { field: Field, text: String },
    HandOff { format: SourceFormat, text: String },
    Unreadable { format: SourceFormat, message: String },
}

/// Outcome of reading one field on its own
#[derive(Debug)]
enum AxisOutcome {
    Read(Reading, SourceFormat),
    HandOff(SourceFormat),
    Unreadable(SourceFormat),
}

/// Normalize one input
pub(crate) fn run(
    input: &CoordinateInput,
    config: &NormalizerConfig,
    corrector: &dyn EncodingCorrector,
) -> NormalizationResult {
    let original = OriginalInput::from_input(input);

    let x_raw = input.x.as_ref().filter(|v| !v.is_blank()).map(|v| v.as_text());
    let y_raw = input.y.as_ref().filter(|v| !v.is_blank()).map(|v| v.as_text());
    let x_text = prepare(x_raw.as_deref(), Field::X, corrector);
    let y_text = prepare(y_raw.as_deref(), Field::Y, corrector);
    let raw_text = prepare(input.raw_text.as_deref(), Field::Both, corrector);

    let mut trail = AuditTrail::new();
    let resolution = resolve(
        x_text.as_deref(),
        y_text.as_deref(),
        raw_text.as_deref(),
        &config.bounds,
        &mut trail,
    );

    match resolution {
        Resolution::Located(located) => finish(located, input, config, original, trail),
        Resolution::Placeholder { field, text } => {
            debug!("Placeholder in field {}: '{}'", field, text);
            let pattern = if text.is_empty() {
                "MISSING_VALUE"
            } else {
                "PLACEHOLDER_VALUE"
            };
            trail.correct(Correction::new(
                CorrectionType::PlaceholderDetected,
                field,
                text.clone(),
                "null",
                pattern,
            ));
            trail.flag(Flag::info(
                FlagType::ManualReview,
                format!("Field {} holds no coordinate ('{}')", field, text),
            ));
            short_circuit(original, trail, SourceFormat::Placeholder)
        }
        Resolution::HandOff { format, text } => hand_off(original, trail, format, &text),
        Resolution::Unreadable { format, message } => {
            debug!("Unreadable input ({:?}): {}", format, message);
            trail.flag(Flag::error(FlagType::ManualReview, message));
            short_circuit(original, trail, format)
        }
    }
}

/// Trim a field and run it through the encoding corrector when it carries mojibake
fn prepare(value: Option<&str>, field: Field, corrector: &dyn EncodingCorrector) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }

    if encoding::has_mojibake(trimmed) {
        let repaired = corrector.correct(trimmed);
        if repaired.was_modified {
            debug!(
                "Field {} re-encoded '{}' -> '{}'",
                field, trimmed, repaired.corrected
            );
            return Some(repaired.corrected.trim().to_string());
        }
    }

    Some(trimmed.to_string())
}

fn resolve(
    x: Option<&str>,
    y: Option<&str>,
    raw: Option<&str>,
    bounds: &TargetBounds,
    trail: &mut AuditTrail,
) -> Resolution {
    for (field, text) in [(Field::X, x), (Field::Y, y)] {
        if let Some(text) = text.filter(|t| lexer::is_placeholder(t)) {
            return Resolution::Placeholder {
                field,
                text: text.to_string(),
            };
        }
    }

    match (x, y) {
        (Some(x), Some(y)) => {
            if x == y {
                if let Some(located) = read_pair(x, bounds, trail) {
                    return Resolution::Located(located);
                }
            }
            resolve_fields(x, y, bounds, trail)
        }
        (Some(single), None) => resolve_single(single, Field::Y, raw, bounds, trail),
        (None, Some(single)) => resolve_single(single, Field::X, raw, bounds, trail),
        (None, None) => match raw {
            Some(raw) => resolve_raw(raw, bounds, trail),
            None => Resolution::Placeholder {
                field: Field::Both,
                text: String::new(),
            },
        },
    }
}

/// One field present: it may hold both axes, or the raw text may
fn resolve_single(
    text: &str,
    missing: Field,
    raw: Option<&str>,
    bounds: &TargetBounds,
    trail: &mut AuditTrail,
) -> Resolution {
    if let Some(located) = read_pair(text, bounds, trail) {
        return Resolution::Located(located);
    }

    let format = recognizer::classify(text);
    if is_hand_off(format) {
        return Resolution::HandOff {
            format,
            text: text.to_string(),
        };
    }

    if let Some(located) = raw.and_then(|raw| read_pair(raw, bounds, trail)) {
        return Resolution::Located(located);
    }

    if format == SourceFormat::Unknown {
        return Resolution::Unreadable {
            format,
            message: format!("Field '{}' is not a recognisable coordinate", text),
        };
    }

    Resolution::Placeholder {
        field: missing,
        text: String::new(),
    }
}

/// Neither field present: only the raw text is left
fn resolve_raw(raw: &str, bounds: &TargetBounds, trail: &mut AuditTrail) -> Resolution {
    if let Some(located) = read_pair(raw, bounds, trail) {
        return Resolution::Located(located);
    }

    match recognizer::classify(raw) {
        SourceFormat::Placeholder => Resolution::Placeholder {
            field: Field::Both,
            text: raw.to_string(),
        },
        format if is_hand_off(format) => Resolution::HandOff {
            format,
            text: raw.to_string(),
        },
        format => Resolution::Unreadable {
            format,
            message: format!("Raw text '{}' holds no coordinate pair", raw),
        },
    }
}

/// Both fields present and distinct
fn resolve_fields(x: &str, y: &str, bounds: &TargetBounds, trail: &mut AuditTrail) -> Resolution {
    for text in [x, y] {
        if format_parsers::is_pair_format(recognizer::classify(text)) {
            if let Some(located) = read_pair(text, bounds, trail) {
                return Resolution::Located(located);
            }
        }
    }

    let x_outcome = read_axis(x, Field::X, bounds, trail);
    let y_outcome = read_axis(y, Field::Y, bounds, trail);

    match (x_outcome, y_outcome) {
        (AxisOutcome::HandOff(format), _) => Resolution::HandOff {
            format,
            text: x.to_string(),
        },
        (_, AxisOutcome::HandOff(format)) => Resolution::HandOff {
            format,
            text: y.to_string(),
        },
        (AxisOutcome::Read(Reading::Pair { x, y }, format), _) => {
            Resolution::Located(Located::from_pair(x, y, format))
        }
        (_, AxisOutcome::Read(Reading::Pair { x, y }, format)) => {
            Resolution::Located(Located::from_pair(x, y, format))
        }
        (
            AxisOutcome::Read(Reading::Axis(x_reading), format),
            AxisOutcome::Read(Reading::Axis(y_reading), _),
        ) => Resolution::Located(Located {
            x: x_reading,
            y: y_reading,
            x_origin: x.to_string(),
            y_origin: y.to_string(),
            format,
        }),
        (AxisOutcome::Unreadable(format), _) => Resolution::Unreadable {
            format,
            message: format!("X field '{}' could not be read as {:?}", x, format),
        },
        (_, AxisOutcome::Unreadable(format)) => Resolution::Unreadable {
            format,
            message: format!("Y field '{}' could not be read as {:?}", y, format),
        },
    }
}

fn is_hand_off(format: SourceFormat) -> bool {
    matches!(format, SourceFormat::Cadastral | SourceFormat::Toponym)
}

/// Read a text that encodes both axes
///
/// Corrections are only kept when the text actually yields a pair.
fn read_pair(text: &str, bounds: &TargetBounds, trail: &mut AuditTrail) -> Option<Located> {
    let format = recognizer::classify(text);
    let may_hold_pair = format_parsers::is_pair_format(format)
        || matches!(format, SourceFormat::Nmea | SourceFormat::Narrative);
    if !may_hold_pair {
        return None;
    }

    let mut scratch = Vec::new();
    let outcome = {
        let mut ctx = ParseContext::new(Field::Both, bounds, &mut scratch);
        format_parsers::parse_field(format, text, &mut ctx)
    };

    let (reading, warning) = match outcome {
        FieldParse::Parsed(reading) => (reading, None),
        FieldParse::ParsedWithWarning(reading, warning) => (reading, Some(warning)),
        FieldParse::Rejected => return None,
    };
    let Reading::Pair { x, y } = reading else {
        return None;
    };

    debug!("Read {:?} pair ({}, {}) from '{}'", format, x.value, y.value, text);
    trail.corrections.extend(scratch);
    if let Some(warning) = warning {
        trail.flag(Flag::warning(FlagType::SuspiciousValue, warning));
    }
    Some(Located::from_pair(x, y, format))
}

fn read_axis(text: &str, field: Field, bounds: &TargetBounds, trail: &mut AuditTrail) -> AxisOutcome {
    let format = recognizer::classify(text);
    if is_hand_off(format) {
        return AxisOutcome::HandOff(format);
    }

    let outcome = {
        let mut ctx = ParseContext::new(field, bounds, &mut trail.corrections);
        format_parsers::parse_field(format, text, &mut ctx)
    };

    match outcome {
        FieldParse::Parsed(reading) => AxisOutcome::Read(reading, format),
        FieldParse::ParsedWithWarning(reading, warning) => {
            trail.flag(Flag::warning(
                FlagType::SuspiciousValue,
                format!("Field {}: {}", field, warning),
            ));
            AxisOutcome::Read(reading, format)
        }
        FieldParse::Rejected => {
            debug!("Field {} '{}' rejected by the {:?} parser", field, text, format);
            AxisOutcome::Unreadable(format)
        }
    }
}

/// Whether hemisphere markers say the readings sit on the wrong axes
fn needs_hemisphere_swap(x: &AxisReading, y: &AxisReading) -> bool {
    let is_lat = |r: &AxisReading| r.hemisphere.is_some_and(|h| h.is_latitude());
    let is_lon = |r: &AxisReading| r.hemisphere.is_some_and(|h| !h.is_latitude());

    (is_lat(x) && !is_lat(y)) || (is_lon(y) && !is_lon(x))
}

fn projected_reading(value: f64) -> AxisReading {
    let value = round_mm(value);
    AxisReading {
        value,
        text: format!("{:.3}", value),
        hemisphere: None,
        angular: false,
    }
}

/// Numeric stages for a located pair
fn finish(
    located: Located,
    input: &CoordinateInput,
    config: &NormalizerConfig,
    original: OriginalInput,
    mut trail: AuditTrail,
) -> NormalizationResult {
    let Located {
        mut x,
        mut y,
        mut x_origin,
        mut y_origin,
        format,
    } = located;
    let bounds = &config.bounds;

    if needs_hemisphere_swap(&x, &y) {
        trail.correct(Correction::new(
            CorrectionType::XYSwapped,
            Field::Both,
            format!("{}, {}", x.text, y.text),
            format!("{}, {}", y.text, x.text),
            "HEMISPHERE_ORDER",
        ));
        std::mem::swap(&mut x, &mut y);
        std::mem::swap(&mut x_origin, &mut y_origin);
    }

    let ctx = TransformContext {
        document_year: input.document_year,
        crs_hint: input.crs_hint,
        config,
    };

    let mut source_crs = SourceCrs::Etrs89Utm30;
    let projected = crs_transform::to_target_crs(&x, &y, &ctx, &mut trail);
    if let Some(projected) = projected {
        x = projected_reading(projected.x);
        y = projected_reading(projected.y);
        source_crs = projected.source_crs;
    }

    let structural_start = trail.corrections.len();
    let y_prefix = config.y_prefix_for(input.province.as_deref());
    let (mut fx, mut fy) = structural::correct(&x, &y, y_prefix, bounds, &mut trail);
    if trail.corrections[structural_start..]
        .iter()
        .any(|c| c.correction_type == CorrectionType::XYSwapped)
    {
        std::mem::swap(&mut x_origin, &mut y_origin);
    }

    // Projected and angular values are not transcriptions; no hypothesis applies
    let mut heuristic_applied = None;
    if config.enable_heuristics && projected.is_none() && !x.angular && !y.angular {
        for (field, value, origin) in [
            (Field::X, &mut fx, x_origin.as_str()),
            (Field::Y, &mut fy, y_origin.as_str()),
        ] {
            let in_range = match field {
                Field::X => bounds.x_in_range(*value),
                _ => bounds.y_in_range(*value),
            };
            if in_range {
                continue;
            }

            let candidate = RescueCandidate {
                field,
                value: *value,
                original: origin,
            };
            let Some(rescued) = rescue::rescue(&candidate, bounds) else {
                continue;
            };

            let rule = rescued.rule;
            trail.correct(Correction::new(
                CorrectionType::HeuristicRescue,
                field,
                value.to_string(),
                rescued.value.to_string(),
                rule.name,
            ));
            trail.flag(Flag::warning(
                FlagType::HeuristicApplied,
                format!("{} on {}: {}", rule.name, field, rule.hypothesis),
            ));
            heuristic_applied.get_or_insert_with(|| HeuristicInfo {
                rule: rule.name.to_string(),
                hypothesis: rule.hypothesis.to_string(),
                field,
                base_confidence: rule.base_confidence,
            });
            *value = rescued.value;
        }
    }

    let range_valid = bounds.contains(fx, fy);
    if range_valid {
        (fx, fy, source_crs) = crs_transform::apply_datum_shift(fx, fy, source_crs, &ctx, &mut trail);
    } else {
        warn!(
            "Coordinate ({}, {}) is outside the target envelope after every repair",
            fx, fy
        );
        trail.flag(Flag::error(
            FlagType::OutOfRange,
            format!(
                "({}, {}) outside X [{}, {}] / Y [{}, {}]",
                fx, fy, bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
            ),
        ));
    }

    if scorer::is_integral(fx) && scorer::is_integral(fy) {
        trail.flag(Flag::info(
            FlagType::MissingDecimals,
            "Neither axis carries decimals",
        ));
    }

    let score = scorer::score(&trail.corrections, &trail.flags, Some(fx), Some(fy));
    let is_valid = range_valid && score >= config.min_valid_score;
    debug!(
        "Normalized to ({}, {}) score {} valid {}",
        fx, fy, score, is_valid
    );

    NormalizationResult {
        x: Some(fx),
        y: Some(fy),
        original,
        corrections: trail.corrections,
        flags: trail.flags,
        score,
        confidence: scorer::confidence(score),
        is_valid,
        heuristic_applied,
        source_format: Some(format),
        source_crs: Some(source_crs),
        cadastral_ref: None,
        toponym: None,
    }
}

/// Result for an input that never reached the numeric stages
fn short_circuit(
    original: OriginalInput,
    trail: AuditTrail,
    format: SourceFormat,
) -> NormalizationResult {
    NormalizationResult {
        x: None,
        y: None,
        original,
        corrections: trail.corrections,
        flags: trail.flags,
        score: 0,
        confidence: scorer::confidence(0),
        is_valid: false,
        heuristic_applied: None,
        source_format: Some(format),
        source_crs: None,
        cadastral_ref: None,
        toponym: None,
    }
}

/// Result handing a cadastral reference or place name to a geocoder
fn hand_off(
    original: OriginalInput,
    mut trail: AuditTrail,
    format: SourceFormat,
    text: &str,
) -> NormalizationResult {
    let (flag_type, label) = if format == SourceFormat::Cadastral {
        (FlagType::CadastralReference, "Cadastral reference")
    } else {
        (FlagType::ToponymDetected, "Place name")
    };
    debug!("{} '{}' needs geocoding", label, text);

    trail.flag(Flag::info(flag_type, format!("{} '{}'", label, text)));
    trail.flag(Flag::warning(
        FlagType::GeocodingNeeded,
        format!("{} must be resolved by an external geocoder", label),
    ));

    let mut result = short_circuit(original, trail, format);
    if format == SourceFormat::Cadastral {
        result.cadastral_ref = Some(recognizer::cadastral_key(text));
    } else {
        result.toponym = Some(text.to_string());
    }
    result
}
