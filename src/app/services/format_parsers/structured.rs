//! WKT and GeoJSON point parsers

use super::{AxisReading, FieldParse, ParseContext, Reading};
use crate::app::models::{Correction, CorrectionType, Field};
use crate::app::services::lexer::CleanedNumber;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static WKT_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:SRID=[0-9]+\s*;\s*)?POINT\s*(?:Z|M|ZM)?\s*\(\s*(?P<x>[-+]?[0-9]+(?:[.,][0-9]+)?)\s+(?P<y>[-+]?[0-9]+(?:[.,][0-9]+)?)(?:\s+[-+]?[0-9]+(?:[.,][0-9]+)?){0,2}\s*\)\s*$",
    )
    .expect("valid WKT regex")
});

/// Whether a field is a WKT point
pub fn is_wkt(text: &str) -> bool {
    WKT_POINT.is_match(text)
}

/// Whether a field looks like a GeoJSON object
pub fn is_geojson(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('{') && trimmed.ends_with('}') && trimmed.contains("\"type\"")
}

fn planar(text: &str) -> Option<AxisReading> {
    let canonical = text.replace(',', ".");
    let value = canonical.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(AxisReading::planar(CleanedNumber {
        text: canonical.trim_start_matches('+').to_string(),
        value,
    }))
}

fn from_number(value: &Value) -> Option<AxisReading> {
    let number = value.as_f64().filter(|v| v.is_finite())?;
    Some(AxisReading::planar(CleanedNumber {
        text: number.to_string(),
        value: number,
    }))
}

/// Parse `POINT(x y)`, with optional SRID prefix and Z/M ordinates
pub fn parse_wkt(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let Some(caps) = WKT_POINT.captures(value) else {
        return FieldParse::Rejected;
    };

    let (Some(x), Some(y)) = (planar(&caps["x"]), planar(&caps["y"])) else {
        return FieldParse::Rejected;
    };

    ctx.push(Correction::new(
        CorrectionType::WktParsed,
        Field::Both,
        value.trim(),
        format!("{}, {}", x.text, y.text),
        "WKT_POINT",
    ));
    FieldParse::Parsed(Reading::Pair { x, y })
}

/// Point coordinates from a Point geometry or a Feature wrapping one
fn point_coordinates(document: &Value) -> Option<&Vec<Value>> {
    match document.get("type")?.as_str()? {
        "Point" => document.get("coordinates")?.as_array(),
        "Feature" => point_coordinates(document.get("geometry")?),
        _ => None,
    }
}

/// Parse a GeoJSON Point geometry or Feature
pub fn parse_geojson(value: &str, ctx: &mut ParseContext) -> FieldParse {
    let document: Value = match serde_json::from_str(value.trim()) {
        Ok(document) => document,
        Err(e) => {
            debug!("GeoJSON field is not valid JSON: {}", e);
            return FieldParse::Rejected;
        }
    };

    let Some(coordinates) = point_coordinates(&document) else {
        debug!("GeoJSON field is not a point geometry");
        return FieldParse::Rejected;
    };

    let (Some(x), Some(y)) = (
        coordinates.first().and_then(from_number),
        coordinates.get(1).and_then(from_number),
    ) else {
        return FieldParse::Rejected;
    };

    ctx.push(Correction::new(
        CorrectionType::GeojsonParsed,
        Field::Both,
        value.trim(),
        format!("{}, {}", x.text, y.text),
        "GEOJSON_POINT",
    ));
    FieldParse::Parsed(Reading::Pair { x, y })
}
