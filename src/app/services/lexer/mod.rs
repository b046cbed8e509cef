//! Numeric lexer and cleaner for raw coordinate fields
//!
//! Turns a transcribed numeral into a parseable one. Placeholders are
//! recognised first and yield `None`. Everything else runs through an ordered
//! table of whole-field separator rules, most specific first; the first rule
//! that matches rewrites the field and is logged as a `SeparatorFixed`
//! correction. Leftover multiple dots are collapsed into a single decimal point
//! before the final float parse.

use crate::app::models::{Correction, CorrectionType, Field, SourceFormat};
use crate::constants::PLACEHOLDER_WORDS;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

#[cfg(test)]
mod tests;

/// A cleaned numeral: its canonical text and parsed value
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedNumber {
    /// Canonical numeral (`[-]digits[.digits]`), leading zeros preserved
    pub text: String,
    pub value: f64,
}

impl CleanedNumber {
    fn parse(text: String) -> Option<Self> {
        let value = text.parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(Self { text, value })
    }

    /// Digits of the integer part, without sign
    pub fn integer_digits(&self) -> &str {
        let unsigned = self.text.trim_start_matches(['-', '+']);
        unsigned.split('.').next().unwrap_or("")
    }

    /// Whether the numeral carries a decimal point
    pub fn has_fraction(&self) -> bool {
        self.text.contains('.')
    }
}

/// One whole-field separator repair
struct SeparatorRule {
    name: &'static str,
    format: SourceFormat,
    regex: Regex,
    rewrite: fn(&Captures) -> String,
}

fn rule(
    name: &'static str,
    format: SourceFormat,
    pattern: &str,
    rewrite: fn(&Captures) -> String,
) -> SeparatorRule {
    SeparatorRule {
        name,
        format,
        regex: Regex::new(pattern).expect("separator rule pattern must compile"),
        rewrite,
    }
}

fn cap<'a>(caps: &'a Captures, index: usize) -> &'a str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn strip_grouping(digits: &str) -> String {
    digits
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
}

/// Sign, grouped integer part, optional fraction
fn join_grouped(caps: &Captures) -> String {
    let sign = if cap(caps, 1) == "-" { "-" } else { "" };
    let integer = strip_grouping(cap(caps, 2));
    match caps.get(3) {
        Some(fraction) => format!("{}{}.{}", sign, integer, fraction.as_str()),
        None => format!("{}{}", sign, integer),
    }
}

// Ordered most specific first; the first match wins.
static SEPARATOR_RULES: Lazy<Vec<SeparatorRule>> = Lazy::new(|| {
    vec![
        rule(
            "SPACE_GROUPED_DOUBLE_TILDE",
            SourceFormat::TildeDecimal,
            r#"^([-+]?)([0-9]{1,3}(?:\s[0-9]{3})+)\s*(?:~~|´´|''|’’|``|"|”)\s*([0-9]+)$"#,
            join_grouped,
        ),
        rule(
            "DOUBLE_TILDE_DECIMAL",
            SourceFormat::TildeDecimal,
            r#"^([-+]?)([0-9]+)\s*(?:~~|´´|''|’’|``|"|”)\s*([0-9]+)$"#,
            join_grouped,
        ),
        rule(
            "SPACE_GROUPED_TILDE",
            SourceFormat::TildeDecimal,
            r"^([-+]?)([0-9]{1,3}(?:\s[0-9]{3})+)\s*[~´’`']\s*([0-9]+)$",
            join_grouped,
        ),
        rule(
            "TILDE_DECIMAL",
            SourceFormat::TildeDecimal,
            r"^([-+]?)([0-9]+)\s*[~´’`']\s*([0-9]+)$",
            join_grouped,
        ),
        rule(
            "EUROPEAN_DOT_THOUSANDS_COMMA_DECIMAL",
            SourceFormat::EuropeanGrouped,
            r"^([-+]?)([0-9]{1,3}(?:\.[0-9]{3})+),([0-9]+)$",
            join_grouped,
        ),
        rule(
            "SPACE_THOUSANDS",
            SourceFormat::SpaceThousands,
            r"^([-+]?)([0-9]{1,3}(?:\s[0-9]{3})+)(?:[.,]([0-9]+))?$",
            join_grouped,
        ),
        rule(
            "DOT_THOUSANDS_3_LEVEL",
            SourceFormat::DotThousands,
            r"^([-+]?)([0-9]{1,3}\.[0-9]{3}\.[0-9]{3})$",
            join_grouped,
        ),
        rule(
            "DOT_THOUSANDS_2_LEVEL",
            SourceFormat::DotThousands,
            r"^([-+]?)([0-9]{3}\.[0-9]{3})$",
            join_grouped,
        ),
        rule(
            "COMMA_THOUSANDS_DOT_DECIMAL",
            SourceFormat::CommaThousands,
            r"^([-+]?)([0-9]{1,3}(?:,[0-9]{3})+)\.([0-9]+)$",
            join_grouped,
        ),
        rule(
            "COMMA_THOUSANDS",
            SourceFormat::CommaThousands,
            r"^([-+]?)([0-9]{1,3}(?:,[0-9]{3}){2,})$",
            join_grouped,
        ),
        rule(
            "COMMA_DECIMAL",
            SourceFormat::CommaDecimal,
            r"^([-+]?)([0-9]+),([0-9]+)$",
            join_grouped,
        ),
    ]
});

static PLAIN_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)$").expect("valid regex"));

static MULTIPLE_DOTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+){2,}$").expect("valid regex"));

static UNIT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:m|mts?|metros)\.?$").expect("valid regex"));

static DASH_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[-_x.\s/*]+$").expect("valid regex"));

static ALL_ZERO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?0+(?:[.,]0+)?$").expect("valid regex"));

static ALL_NINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^9{3,}(?:[.,]9+)?$").expect("valid regex"));

/// Placeholder phrases that may be followed by more text ("Indicar coordenadas")
const PLACEHOLDER_PREFIXES: &[&str] = &[
    "indicar",
    "pendiente",
    "sin dato",
    "sin coord",
    "no disponible",
    "no consta",
    "por determinar",
    "a determinar",
];

/// Whether a raw field is a placeholder rather than a value
pub fn is_placeholder(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }

    let lower = trimmed.to_lowercase();
    if PLACEHOLDER_WORDS.contains(&lower.as_str()) {
        return true;
    }
    if PLACEHOLDER_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }

    DASH_RUN.is_match(trimmed) || ALL_ZERO.is_match(trimmed) || ALL_NINE.is_match(trimmed)
}

/// Source format of the separator rule a field would trigger, if any
fn separator_format(raw: &str) -> Option<SourceFormat> {
    let text = strip_unit_suffix(raw.trim());
    SEPARATOR_RULES
        .iter()
        .find(|rule| rule.regex.is_match(text))
        .map(|rule| rule.format)
}

/// Numeric family of a field, if the lexer can read it as a single numeral
pub fn numeric_format(raw: &str) -> Option<SourceFormat> {
    let text = strip_unit_suffix(raw.trim());
    if let Some(format) = separator_format(text) {
        return Some(format);
    }
    if MULTIPLE_DOTS.is_match(text) {
        return Some(SourceFormat::DotThousands);
    }
    PLAIN_DECIMAL.is_match(text).then_some(SourceFormat::Decimal)
}

fn strip_unit_suffix(text: &str) -> &str {
    match UNIT_SUFFIX.find(text) {
        // Keep a bare "m" from swallowing the whole field
        Some(m) if m.start() > 0 => text[..m.start()].trim_end(),
        _ => text,
    }
}

/// Clean a raw numeric field
///
/// Returns `None` for placeholders and for anything that does not reduce to a
/// finite number. Every separator rewrite is appended to `corrections`.
///
/// # Arguments
///
/// * `raw` - Field text as transcribed
/// * `field` - Axis the field belongs to, recorded on the correction
/// * `corrections` - Audit trail to append to
pub fn clean(raw: &str, field: Field, corrections: &mut Vec<Correction>) -> Option<CleanedNumber> {
    if is_placeholder(raw) {
        debug!("Field {} '{}' is a placeholder", field, raw);
        return None;
    }

    let text = strip_unit_suffix(raw.trim());

    for rule in SEPARATOR_RULES.iter() {
        if let Some(caps) = rule.regex.captures(text) {
            let rewritten = (rule.rewrite)(&caps);
            let cleaned = CleanedNumber::parse(rewritten)?;
            debug!(
                "Field {} separator rule {} rewrote '{}' -> '{}'",
                field, rule.name, raw, cleaned.text
            );
            corrections.push(Correction::new(
                CorrectionType::SeparatorFixed,
                field,
                raw.trim(),
                cleaned.text.clone(),
                rule.name,
            ));
            return Some(cleaned);
        }
    }

    if MULTIPLE_DOTS.is_match(text) {
        let collapsed = collapse_dots(text);
        let cleaned = CleanedNumber::parse(collapsed)?;
        debug!(
            "Field {} collapsed multiple dots '{}' -> '{}'",
            field, raw, cleaned.text
        );
        corrections.push(Correction::new(
            CorrectionType::SeparatorFixed,
            field,
            raw.trim(),
            cleaned.text.clone(),
            "MULTIPLE_DOTS",
        ));
        return Some(cleaned);
    }

    if PLAIN_DECIMAL.is_match(text) {
        let canonical = text.trim_start_matches('+').to_string();
        return CleanedNumber::parse(canonical);
    }

    debug!("Field {} '{}' is not a numeral", field, raw);
    None
}

/// Treat every dot but the last as a thousands separator
fn collapse_dots(text: &str) -> String {
    let last = text.rfind('.').unwrap_or(text.len());
    let (integer, fraction) = text.split_at(last);
    let integer: String = integer.chars().filter(|c| *c != '.' && *c != '+').collect();
    format!("{}{}", integer, fraction)
}
