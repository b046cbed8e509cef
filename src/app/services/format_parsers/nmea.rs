//! NMEA 0183 position parser
//!
//! Accepts either a bare `ddmm.mmmm[NS]` / `dddmm.mmmm[EW]` field or a whole
//! GPS sentence (`$GPGGA`, `$GPRMC`, `$GPGLL`) pasted into a cell.

use super::{AxisReading, FieldParse, ParseContext, Reading};
use crate::app::models::{Correction, CorrectionType, Field, Hemisphere};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static BARE_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<int>[0-9]{4,5})(?P<frac>\.[0-9]+)\s*,?\s*(?P<hemi>[nsewo])$")
        .expect("valid NMEA field regex")
});

static SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\$G[PNL][A-Z]{3},").expect("valid NMEA sentence regex")
});

static SENTENCE_POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<lat>[0-9]{4}\.[0-9]+),(?P<lat_hemi>[NS]),(?P<lon>[0-9]{5}\.[0-9]+),(?P<lon_hemi>[EW])",
    )
    .expect("valid NMEA position regex")
});

/// Whether a field looks like NMEA
pub fn is_nmea(text: &str) -> bool {
    let trimmed = text.trim();
    SENTENCE.is_match(trimmed) || BARE_FIELD.is_match(trimmed)
}

/// Convert `[d]ddmm.mmmm` to decimal degrees
fn degrees_minutes(integer: &str, fraction: &str) -> Option<f64> {
    if integer.len() < 4 || !integer.is_ascii() {
        return None;
    }
    let (deg, min) = integer.split_at(integer.len() - 2);
    let degrees = deg.parse::<f64>().ok()?;
    let minutes = format!("{}{}", min, fraction).parse::<f64>().ok()?;
    if minutes >= 60.0 {
        return None;
    }
    Some(degrees + minutes / 60.0)
}

/// Parse an NMEA field or sentence
pub fn parse(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let trimmed = value.trim();

    if SENTENCE.is_match(trimmed) {
        return parse_sentence(trimmed, ctx);
    }

    let Some(caps) = BARE_FIELD.captures(trimmed) else {
        return FieldParse::Rejected;
    };

    let integer = &caps["int"];
    let Some(hemisphere) = Hemisphere::from_marker(&caps["hemi"]) else {
        return FieldParse::Rejected;
    };

    // Two degree digits belong to a latitude, three to a longitude
    let latitude_shape = integer.len() == 4;
    if latitude_shape != hemisphere.is_latitude() {
        debug!("NMEA field '{}' has a hemisphere that does not fit its width", value);
        return FieldParse::Rejected;
    }

    let Some(magnitude) = degrees_minutes(integer, &caps["frac"]) else {
        return FieldParse::Rejected;
    };

    let signed = magnitude * hemisphere.sign();
    ctx.push(Correction::new(
        CorrectionType::NmeaConverted,
        ctx.field,
        trimmed,
        format!("{:.6}", signed),
        "NMEA_FIELD",
    ));
    FieldParse::Parsed(Reading::Axis(AxisReading::angular(signed, Some(hemisphere))))
}

fn parse_sentence(sentence: &str, ctx: &mut ParseContext) -> FieldParse {
    let Some(caps) = SENTENCE_POSITION.captures(sentence) else {
        debug!("NMEA sentence without a position: '{}'", sentence);
        return FieldParse::Rejected;
    };

    let lat_int = &caps["lat"][..4];
    let lat_frac = &caps["lat"][4..];
    let lon_int = &caps["lon"][..5];
    let lon_frac = &caps["lon"][5..];

    let (Some(lat), Some(lon), Some(lat_hemi), Some(lon_hemi)) = (
        degrees_minutes(lat_int, lat_frac),
        degrees_minutes(lon_int, lon_frac),
        Hemisphere::from_marker(&caps["lat_hemi"]),
        Hemisphere::from_marker(&caps["lon_hemi"]),
    ) else {
        return FieldParse::Rejected;
    };

    let lat = lat * lat_hemi.sign();
    let lon = lon * lon_hemi.sign();

    ctx.push(Correction::new(
        CorrectionType::NmeaConverted,
        Field::Both,
        sentence,
        format!("{:.6}, {:.6}", lon, lat),
        "NMEA_SENTENCE",
    ));

    FieldParse::Parsed(Reading::Pair {
        x: AxisReading::angular(lon, Some(lon_hemi)),
        y: AxisReading::angular(lat, Some(lat_hemi)),
    })
}
