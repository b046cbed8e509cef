//! Degrees-minutes-seconds parser
//!
//! Handles the symbol soup found in transcribed angles: `º`/`˚` for degrees,
//! acute accents and primes for minutes, doubled apostrophes for seconds, and
//! decimal commas. Text is first folded onto `°`, `'` and `"` so that the
//! variant patterns only need to deal with one alphabet.

use super::{AxisReading, FieldParse, ParseContext, Reading};
use crate::app::models::{Correction, CorrectionType, Hemisphere, SourceFormat};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

const HEMISPHERE: &str = r"norte|sur|este|oeste|[nsewo]";

static SYMBOLS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)^(?:(?P<pre>{h})\s*)?(?P<sign>[-+])?\s*(?P<deg>[0-9]{{1,3}}(?:\.[0-9]+)?)\s*°\s*(?:(?P<min>[0-9]{{1,2}}(?:\.[0-9]+)?)\s*'?\s*(?:(?P<sec>[0-9]{{1,2}}(?:\.[0-9]+)?)\s*"?)?)?\s*(?P<post>{h})?$"#,
        h = HEMISPHERE
    ))
    .expect("valid DMS symbol regex")
});

static COLON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:(?P<pre>{h})\s*)?(?P<sign>[-+])?\s*(?P<deg>[0-9]{{1,3}}):(?P<min>[0-9]{{1,2}}(?:\.[0-9]+)?)(?::(?P<sec>[0-9]{{1,2}}(?:\.[0-9]+)?))?\s*(?P<post>{h})?$",
        h = HEMISPHERE
    ))
    .expect("valid DMS colon regex")
});

static SPACED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?:(?P<pre>{h})\s*)?(?P<sign>[-+])?\s*(?P<deg>[0-9]{{1,3}})\s+(?P<min>[0-9]{{1,2}}(?:\.[0-9]+)?)(?:\s+(?P<sec>[0-9]{{1,2}}(?:\.[0-9]+)?))?\s*(?P<post>{h})?$",
        h = HEMISPHERE
    ))
    .expect("valid DMS space regex")
});

/// Fold degree, minute and second marks onto `°`, `'` and `"`
pub fn normalize_symbols(text: &str) -> String {
    let folded: String = text
        .trim()
        .chars()
        .map(|c| match c {
            'º' | '˚' | '°' => '°',
            '´' | '`' | '′' | '’' | '‘' => '\'',
            '″' | '“' | '”' | '„' => '"',
            ',' => '.',
            other => other,
        })
        .collect();
    folded.replace("''", "\"")
}

/// DMS variant a field is written in, if any
pub fn classify(text: &str) -> Option<SourceFormat> {
    let normalized = normalize_symbols(text);

    if COLON.is_match(&normalized) {
        return Some(SourceFormat::DmsColon);
    }

    if let Some(caps) = SPACED.captures(&normalized) {
        // Bare "37 23 45" is too close to grouped digits without a hemisphere
        if caps.name("pre").is_some() || caps.name("post").is_some() {
            return Some(SourceFormat::DmsSpace);
        }
    }

    SYMBOLS.captures(&normalized).map(|caps| {
        if caps.name("pre").is_some() {
            SourceFormat::DmsCardinal
        } else if caps.name("sign").is_some() {
            SourceFormat::DmsSigned
        } else {
            SourceFormat::DmsSymbols
        }
    })
}

fn pattern_name(format: SourceFormat) -> &'static str {
    match format {
        SourceFormat::DmsColon => "DMS_COLON",
        SourceFormat::DmsSpace => "DMS_SPACE",
        SourceFormat::DmsCardinal => "DMS_CARDINAL",
        SourceFormat::DmsSigned => "DMS_SIGNED",
        _ => "DMS_SYMBOLS",
    }
}

fn number(caps: &Captures, name: &str) -> Option<f64> {
    match caps.name(name) {
        Some(m) => m.as_str().parse::<f64>().ok(),
        None => Some(0.0),
    }
}

fn hemisphere_of(caps: &Captures) -> Result<Option<Hemisphere>, ()> {
    let pre = caps.name("pre").and_then(|m| Hemisphere::from_marker(m.as_str()));
    let post = caps.name("post").and_then(|m| Hemisphere::from_marker(m.as_str()));
    match (pre, post) {
        (Some(a), Some(b)) if a != b => Err(()),
        (a, b) => Ok(a.or(b)),
    }
}

/// Parse a DMS field into decimal degrees
pub fn parse(value: &str, format: SourceFormat, ctx: &mut ParseContext) -> FieldParse {
    let normalized = normalize_symbols(value);
    let regex = match format {
        SourceFormat::DmsColon => &*COLON,
        SourceFormat::DmsSpace => &*SPACED,
        _ => &*SYMBOLS,
    };

    let Some(caps) = regex.captures(&normalized) else {
        debug!("DMS pattern {:?} did not match '{}'", format, value);
        return FieldParse::Rejected;
    };

    let (Some(degrees), Some(minutes), Some(seconds)) = (
        number(&caps, "deg"),
        number(&caps, "min"),
        number(&caps, "sec"),
    ) else {
        return FieldParse::Rejected;
    };

    if minutes >= 60.0 || seconds >= 60.0 || degrees > 180.0 {
        debug!("DMS components out of range in '{}'", value);
        return FieldParse::Rejected;
    }

    let Ok(hemisphere) = hemisphere_of(&caps) else {
        debug!("Conflicting hemisphere markers in '{}'", value);
        return FieldParse::Rejected;
    };

    if hemisphere.is_some_and(|h| h.is_latitude()) && degrees > 90.0 {
        return FieldParse::Rejected;
    }

    let negative_sign = caps.name("sign").is_some_and(|m| m.as_str() == "-");
    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;

    let signed = match hemisphere {
        Some(h) if negative_sign && h.sign() > 0.0 => return FieldParse::Rejected,
        Some(h) => magnitude * h.sign(),
        None if negative_sign => -magnitude,
        None => magnitude,
    };

    let reading = AxisReading::angular(signed, hemisphere);
    ctx.push(Correction::new(
        CorrectionType::DmsConverted,
        ctx.field,
        value.trim(),
        format!("{:.6}", signed),
        pattern_name(format),
    ));

    if hemisphere.is_none() && !negative_sign {
        FieldParse::ParsedWithWarning(
            Reading::Axis(reading),
            format!("DMS value '{}' has no hemisphere marker", value.trim()),
        )
    } else {
        FieldParse::Parsed(Reading::Axis(reading))
    }
}
