//! Parsers for values embedded in words
//!
//! Covers labeled pairs (`X: 504750 Y: 4077905`, `Este 504750 Norte 4077905`),
//! single values with a cardinal marker (`Norte 4077905`, `37.5N`), two numbers
//! sharing one cell, and free narrative text with coordinates buried in it.
//! Every number found is handed back to the lexer so the usual separator
//! repairs still apply.

use super::{AxisReading, FieldParse, ParseContext, Reading};
use crate::app::models::{Correction, CorrectionType, Field, Hemisphere};
use crate::app::services::lexer;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// A numeral with optional space grouping and any decimal mark
const VALUE: &str = r"[-+]?[0-9][0-9.,´'~]*(?:\s[0-9]{3})*(?:[.,´'~]+[0-9]+)?";

static X_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\b(?:utm[\s_-]*)?x\s*[:=]|\b(?:coord(?:enada)?[\s_-]*)x\b\s*[:=]?|\b(?:este|easting)\b\s*[:=]?|\be\s*[:=]|\blon(?:g(?:itud)?)?\b\s*[:=]?)\s*(?P<v>{})",
        VALUE
    ))
    .expect("valid X label regex")
});

static Y_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\b(?:utm[\s_-]*)?y\s*[:=]|\b(?:coord(?:enada)?[\s_-]*)y\b\s*[:=]?|\b(?:norte|northing)\b\s*[:=]?|\bn\s*[:=]|\blat(?:itud)?\b\s*[:=]?)\s*(?P<v>{})",
        VALUE
    ))
    .expect("valid Y label regex")
});

static CARDINAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?P<pre>norte|sur|este|oeste|[nsewo])\.?\s*[:=]?\s*)?(?P<v>[-+]?[0-9][0-9\s.,´'~]*[0-9]|[0-9])\s*(?P<post>norte|sur|este|oeste|[nsewo])?\.?$",
    )
    .expect("valid cardinal regex")
});

static COMBINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<a>[-+]?[0-9]+(?:[.,][0-9]+)?)\s*(?:[;/|\t]|,\s+|\s+)\s*(?P<b>[-+]?[0-9]+(?:[.,][0-9]+)?)\s*$",
    )
    .expect("valid combined pair regex")
});

// "504750,4077905": a bare comma only separates when both halves are planar-sized
static COMBINED_TIGHT_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<a>[0-9]{6,}(?:\.[0-9]+)?),(?P<b>[0-9]{6,}(?:\.[0-9]+)?)\s*$")
        .expect("valid combined pair regex")
});

static NARRATIVE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?[0-9]{1,3}(?:[ .][0-9]{3})+(?:,[0-9]+)?|[-+]?[0-9]+(?:[.,][0-9]+)?")
        .expect("valid narrative number regex")
});

static HAS_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").expect("valid regex"));

/// Integer digits a narrative number needs to count as a planar coordinate
const NARRATIVE_MIN_INTEGER_DIGITS: usize = 5;

/// Whether a field labels both axes
pub fn is_labeled(text: &str) -> bool {
    X_LABEL.is_match(text) && Y_LABEL.is_match(text)
}

/// Whether a field is one value with a cardinal marker before or after it
pub fn is_cardinal(text: &str) -> bool {
    CARDINAL
        .captures(text.trim())
        .is_some_and(|caps| caps.name("pre").is_some() || caps.name("post").is_some())
}

/// Whether a field holds two numbers
pub fn is_combined(text: &str) -> bool {
    COMBINED.is_match(text) || is_tight_comma_pair(text)
}

/// Whether a field is two planar-sized numbers joined by a bare comma
///
/// Must be checked before the comma-decimal reading claims the field.
pub fn is_tight_comma_pair(text: &str) -> bool {
    COMBINED_TIGHT_COMMA.is_match(text)
}

/// Whether a field is free text with digits in it
pub fn is_narrative(text: &str) -> bool {
    HAS_LETTER.is_match(text) && text.chars().filter(char::is_ascii_digit).count() >= 2
}

/// Whether a field has letters and no digits at all
pub fn is_wordy(text: &str) -> bool {
    HAS_LETTER.is_match(text) && !text.chars().any(|c| c.is_ascii_digit())
}

fn trim_value(raw: &str) -> &str {
    raw.trim().trim_end_matches(['.', ',', ';', ':'])
}

fn labeled_value(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)
        .map(|caps| trim_value(&caps["v"]).to_string())
}

/// Parse `X: ... Y: ...` style text into a pair
pub fn parse_labeled(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let (Some(x_text), Some(y_text)) = (
        labeled_value(&X_LABEL, value),
        labeled_value(&Y_LABEL, value),
    ) else {
        return FieldParse::Rejected;
    };

    let (Some(x), Some(y)) = (ctx.clean(&x_text, Field::X), ctx.clean(&y_text, Field::Y)) else {
        debug!("Labeled values in '{}' did not clean", value);
        return FieldParse::Rejected;
    };

    ctx.push(Correction::new(
        CorrectionType::NarrativeExtracted,
        Field::Both,
        value.trim(),
        format!("{}, {}", x.text, y.text),
        "LABELED_PAIR",
    ));
    FieldParse::Parsed(Reading::Pair {
        x: AxisReading::planar(x),
        y: AxisReading::planar(y),
    })
}

fn hemisphere_of(caps: &Captures) -> Option<Hemisphere> {
    caps.name("pre")
        .or_else(|| caps.name("post"))
        .and_then(|m| Hemisphere::from_marker(m.as_str()))
}

/// Parse one value carrying a cardinal word or letter
///
/// Small magnitudes are degrees and take the sign of the hemisphere; planar
/// values keep the marker only as a hint for axis routing.
pub fn parse_cardinal(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let trimmed = value.trim();
    let Some(caps) = CARDINAL.captures(trimmed) else {
        return FieldParse::Rejected;
    };

    let Some(hemisphere) = hemisphere_of(&caps) else {
        return FieldParse::Rejected;
    };
    if let (Some(pre), Some(post)) = (caps.name("pre"), caps.name("post")) {
        if Hemisphere::from_marker(pre.as_str()) != Hemisphere::from_marker(post.as_str()) {
            return FieldParse::Rejected;
        }
    }

    let field = ctx.field;
    let Some(cleaned) = ctx.clean(&caps["v"], field) else {
        return FieldParse::Rejected;
    };

    let reading = if cleaned.value.abs() <= 180.0 {
        AxisReading::angular(cleaned.value.abs() * hemisphere.sign(), Some(hemisphere))
    } else {
        AxisReading {
            hemisphere: Some(hemisphere),
            ..AxisReading::planar(cleaned)
        }
    };

    ctx.push(Correction::new(
        CorrectionType::CardinalExtracted,
        field,
        trimmed,
        reading.text.clone(),
        "CARDINAL_MARKER",
    ));
    FieldParse::Parsed(Reading::Axis(reading))
}

/// Split two numbers sharing one field
pub fn parse_combined(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let Some(caps) = COMBINED_TIGHT_COMMA
        .captures(value)
        .or_else(|| COMBINED.captures(value))
    else {
        return FieldParse::Rejected;
    };

    let (Some(x), Some(y)) = (ctx.clean(&caps["a"], Field::X), ctx.clean(&caps["b"], Field::Y)) else {
        return FieldParse::Rejected;
    };

    ctx.push(Correction::new(
        CorrectionType::CoordsSeparated,
        Field::Both,
        value.trim(),
        format!("{}, {}", x.text, y.text),
        "COMBINED_PAIR",
    ));
    FieldParse::Parsed(Reading::Pair {
        x: AxisReading::planar(x),
        y: AxisReading::planar(y),
    })
}

/// Pull planar-sized numbers out of free text
///
/// One number is a reading for the current field, two are read as X then Y
/// (the structural corrector still fixes a reversed order). Anything else is
/// ambiguous and rejected.
pub fn parse_narrative(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let field = ctx.field;
    // Candidates are cleaned into a scratch log so rejected tokens leave no trace
    let mut scratch = Vec::new();
    let numbers: Vec<AxisReading> = NARRATIVE_NUMBER
        .find_iter(value)
        .filter_map(|m| lexer::clean(m.as_str(), field, &mut scratch))
        .filter(|n| n.integer_digits().len() >= NARRATIVE_MIN_INTEGER_DIGITS)
        .map(AxisReading::planar)
        .collect();

    match numbers.as_slice() {
        [single] => {
            ctx.push(Correction::new(
                CorrectionType::NarrativeExtracted,
                field,
                value.trim(),
                single.text.clone(),
                "NARRATIVE_SINGLE",
            ));
            FieldParse::ParsedWithWarning(
                Reading::Axis(single.clone()),
                format!("Coordinate extracted from free text '{}'", value.trim()),
            )
        }
        [x, y] => {
            ctx.push(Correction::new(
                CorrectionType::NarrativeExtracted,
                Field::Both,
                value.trim(),
                format!("{}, {}", x.text, y.text),
                "NARRATIVE_PAIR",
            ));
            FieldParse::ParsedWithWarning(
                Reading::Pair {
                    x: x.clone(),
                    y: y.clone(),
                },
                format!("Coordinates extracted from free text '{}'", value.trim()),
            )
        }
        _ => {
            debug!(
                "Narrative '{}' has {} candidate numbers",
                value,
                numbers.len()
            );
            FieldParse::Rejected
        }
    }
}
