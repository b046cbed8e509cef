//! Reference system transformer
//!
//! Brings readings that are not already UTM30/ETRS89 meters into the target
//! frame. Three situations are handled:
//!
//! - geographic degrees (including lat/lon order and a dropped west sign),
//!   projected with the GRS80 Transverse Mercator
//! - the pre-1970 Spanish Lambert grid, inverted and re-projected, with a
//!   constant-offset fallback when the inverse does not converge or lands
//!   outside the target envelope
//! - legacy planar datums (ED50, Madrid) selected by document year or hint,
//!   corrected with a regional planar offset
//!
//! Every transform is logged to the audit trail. A datum offset that would
//! leave the target envelope is not applied, and that is flagged too.

pub mod projection;

#[cfg(test)]
mod tests;

pub use projection::{
    geographic_to_lambert_spain, geographic_to_utm30, lambert_spain_to_geographic,
    utm30_to_geographic,
};

use crate::app::models::{
    AuditTrail, Correction, CorrectionType, Field, Flag, FlagType, Hemisphere, SourceCrs,
};
use crate::app::services::format_parsers::AxisReading;
use crate::config::{NormalizerConfig, TargetBounds};
use crate::constants::{geographic, lambert_envelope, structural};
use tracing::debug;

/// Document context the transformer decides on
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub document_year: Option<i32>,
    pub crs_hint: Option<SourceCrs>,
    pub config: &'a NormalizerConfig,
}

/// A pair that was moved into the target frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub source_crs: SourceCrs,
}

/// A pair recognised as longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicPair {
    pub lon: f64,
    pub lat: f64,
    /// Latitude arrived in the X field
    pub swapped: bool,
    /// A positive longitude was read as west
    pub sign_restored: bool,
}

/// Legacy datum a planar pair is assumed to be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyDatum {
    Ed50,
    Madrid,
}

fn is_lon(value: f64) -> bool {
    (geographic::MIN_LON..=geographic::MAX_LON).contains(&value)
}

fn is_lat(value: f64) -> bool {
    (geographic::MIN_LAT..=geographic::MAX_LAT).contains(&value)
}

fn is_unsigned_lon(value: f64) -> bool {
    value > 0.0 && value <= geographic::MAX_UNSIGNED_LON
}

/// Recognise a longitude/latitude pair in either order
///
/// A positive longitude up to eight degrees is read as west unless the source
/// explicitly marked it east.
pub fn detect_geographic(x: f64, y: f64, marked_east: bool) -> Option<GeographicPair> {
    let pair = |lon: f64, lat: f64, swapped: bool, sign_restored: bool| GeographicPair {
        lon,
        lat,
        swapped,
        sign_restored,
    };

    if is_lon(x) && is_lat(y) {
        return Some(pair(x, y, false, false));
    }
    if is_lat(x) && is_lon(y) {
        return Some(pair(y, x, true, false));
    }
    if marked_east {
        return None;
    }
    if is_unsigned_lon(x) && is_lat(y) {
        return Some(pair(-x, y, false, true));
    }
    if is_lat(x) && is_unsigned_lon(y) {
        return Some(pair(-y, x, true, true));
    }
    None
}

/// Whether a planar pair should be read as Lambert grid coordinates
///
/// An explicit hint always wins. Without one, only pre-Madrid-cutoff documents
/// with values inside the Lambert envelope and outside the UTM envelope qualify,
/// and a UTM easting next to a northing missing its last digit stays UTM.
pub fn is_lambert_candidate(x: f64, y: f64, ctx: &TransformContext) -> bool {
    if ctx.crs_hint == Some(SourceCrs::LambertSpain) {
        return true;
    }
    let Some(year) = ctx.document_year else {
        return false;
    };

    let in_envelope = (lambert_envelope::MIN_X..=lambert_envelope::MAX_X).contains(&x)
        && (lambert_envelope::MIN_Y..=lambert_envelope::MAX_Y).contains(&y);

    year < ctx.config.datum.madrid_datum_before_year
        && in_envelope
        && !ctx.config.bounds.contains(x, y)
        && !is_truncated_utm(x, y, &ctx.config.bounds)
}

/// Easting in range and a six-digit northing starting with "4" that one more
/// digit brings into range
fn is_truncated_utm(x: f64, y: f64, bounds: &TargetBounds) -> bool {
    let six_digits_from_four = (400_000.0..500_000.0).contains(&y);
    bounds.x_in_range(x)
        && six_digits_from_four
        && bounds.y_in_range(y * structural::Y_MISSING_TRAILING_FACTOR)
}

/// Bring a pair of readings into UTM30
///
/// Returns `None` when the pair is already planar UTM (or unrecognisable) and
/// should pass through untouched.
pub fn to_target_crs(
    x: &AxisReading,
    y: &AxisReading,
    ctx: &TransformContext,
    trail: &mut AuditTrail,
) -> Option<Projected> {
    let marked_east = [x.hemisphere, y.hemisphere].contains(&Some(Hemisphere::East));

    let geographic = detect_geographic(x.value, y.value, marked_east).or_else(|| {
        (ctx.crs_hint == Some(SourceCrs::Geographic)
            && x.value.abs() <= 180.0
            && y.value.abs() <= 90.0)
            .then_some(GeographicPair {
                lon: x.value,
                lat: y.value,
                swapped: false,
                sign_restored: false,
            })
    });

    if let Some(pair) = geographic {
        return Some(project_geographic(pair, trail));
    }

    if is_lambert_candidate(x.value, y.value, ctx) {
        return Some(project_lambert(x.value, y.value, ctx, trail));
    }

    None
}

fn project_geographic(pair: GeographicPair, trail: &mut AuditTrail) -> Projected {
    if pair.swapped {
        trail.correct(Correction::new(
            CorrectionType::XYSwapped,
            Field::Both,
            format!("{}, {}", pair.lat, pair.lon),
            format!("{}, {}", pair.lon, pair.lat),
            "LAT_LON_ORDER",
        ));
    }
    if pair.sign_restored {
        trail.flag(Flag::warning(
            FlagType::SuspiciousValue,
            format!(
                "Positive longitude {} read as west ({})",
                pair.lon.abs(),
                pair.lon
            ),
        ));
    }

    let (x, y) = geographic_to_utm30(pair.lon, pair.lat);
    debug!(
        "Projected lon/lat ({:.6}, {:.6}) to UTM30 ({:.2}, {:.2})",
        pair.lon, pair.lat, x, y
    );
    trail.flag(Flag::info(
        FlagType::GeographicCoords,
        format!(
            "Geographic coordinates ({:.6}, {:.6}) projected to UTM30",
            pair.lon, pair.lat
        ),
    ));

    Projected {
        x,
        y,
        source_crs: SourceCrs::Geographic,
    }
}

fn project_lambert(x: f64, y: f64, ctx: &TransformContext, trail: &mut AuditTrail) -> Projected {
    reproject_lambert(x, y, lambert_spain_to_geographic(x, y), ctx, trail)
}

/// Finish a Lambert reading from the result of the grid inverse
///
/// The constant offset is used when the inverse gave nothing or when its
/// re-projection falls outside the target envelope.
pub(crate) fn reproject_lambert(
    x: f64,
    y: f64,
    inverse: Option<(f64, f64)>,
    ctx: &TransformContext,
    trail: &mut AuditTrail,
) -> Projected {
    let madrid = ctx.config.datum.madrid_offset;

    let reprojected = inverse
        .map(|(lon, lat)| {
            let (ux, uy) = geographic_to_utm30(lon, lat);
            (ux + madrid.dx, uy + madrid.dy)
        })
        .filter(|&(ux, uy)| {
            let inside = ctx.config.bounds.contains(ux, uy);
            if !inside {
                debug!(
                    "Lambert inverse of ({}, {}) landed outside the envelope at ({:.2}, {:.2})",
                    x, y, ux, uy
                );
            }
            inside
        });

    let (to, pattern, flag) = match reprojected {
        Some(to) => (
            to,
            "LAMBERT_INVERSE",
            Flag::info(
                FlagType::LambertDetected,
                format!("Lambert grid ({}, {}) re-projected to UTM30", x, y),
            ),
        ),
        None => {
            let offset = ctx.config.datum.lambert_fallback_offset;
            debug!("Lambert inverse unusable for ({}, {}); using constant offset", x, y);
            (
                (x + offset.dx, y + offset.dy),
                "LAMBERT_FALLBACK_OFFSET",
                Flag::warning(
                    FlagType::LambertDetected,
                    format!(
                        "Lambert grid ({}, {}) shifted by a constant offset; accuracy is low",
                        x, y
                    ),
                ),
            )
        }
    };

    trail.correct(Correction::new(
        CorrectionType::LambertTransformed,
        Field::Both,
        format!("{}, {}", x, y),
        format!("{:.2}, {:.2}", to.0, to.1),
        pattern,
    ));
    trail.flag(flag);

    Projected {
        x: to.0,
        y: to.1,
        source_crs: SourceCrs::LambertSpain,
    }
}

/// Legacy datum implied by an explicit hint or the document year
pub fn legacy_datum(ctx: &TransformContext) -> Option<LegacyDatum> {
    match ctx.crs_hint {
        Some(SourceCrs::Ed50Utm30) => return Some(LegacyDatum::Ed50),
        Some(SourceCrs::MadridDatum) => return Some(LegacyDatum::Madrid),
        Some(SourceCrs::Etrs89Utm30) | Some(SourceCrs::LambertSpain) => return None,
        Some(SourceCrs::Geographic) | None => {}
    }

    let year = ctx.document_year?;
    let datum = &ctx.config.datum;
    if year < datum.madrid_datum_before_year {
        Some(LegacyDatum::Madrid)
    } else if year < datum.ed50_before_year {
        Some(LegacyDatum::Ed50)
    } else {
        None
    }
}

/// Apply the planar offset of a legacy datum to an in-range pair
///
/// The offset is skipped when disabled, when the source was the Lambert grid
/// (already shifted) and when the shifted pair would leave the target envelope.
/// Only the last case is flagged, as a warning on the uncorrected pair.
pub fn apply_datum_shift(
    x: f64,
    y: f64,
    source_crs: SourceCrs,
    ctx: &TransformContext,
    trail: &mut AuditTrail,
) -> (f64, f64, SourceCrs) {
    if !ctx.config.enable_datum_shift || source_crs == SourceCrs::LambertSpain {
        return (x, y, source_crs);
    }
    let Some(datum) = legacy_datum(ctx) else {
        return (x, y, source_crs);
    };

    let (offset, correction_type, flag_type, pattern, datum_crs) = match datum {
        LegacyDatum::Ed50 => (
            ctx.config.datum.ed50_offset,
            CorrectionType::Ed50Transformed,
            FlagType::Ed50Detected,
            "ED50_PLANAR_OFFSET",
            SourceCrs::Ed50Utm30,
        ),
        LegacyDatum::Madrid => (
            ctx.config.datum.madrid_offset,
            CorrectionType::MadridDatumTransformed,
            FlagType::MadridDatumDetected,
            "MADRID_PLANAR_OFFSET",
            SourceCrs::MadridDatum,
        ),
    };

    let shifted_x = x + offset.dx;
    let shifted_y = y + offset.dy;
    if !ctx.config.bounds.contains(shifted_x, shifted_y) {
        debug!(
            "Discarded {:?} offset: ({}, {}) would leave the target envelope",
            datum, shifted_x, shifted_y
        );
        trail.flag(Flag::warning(
            flag_type,
            format!(
                "{:?} datum assumed from document context; planar offset ({}, {}) skipped \
                 because ({}, {}) would leave the target envelope",
                datum, offset.dx, offset.dy, shifted_x, shifted_y
            ),
        ));
        return (x, y, source_crs);
    }

    trail.correct(Correction::new(
        correction_type,
        Field::Both,
        format!("{}, {}", x, y),
        format!("{}, {}", shifted_x, shifted_y),
        pattern,
    ));
    trail.flag(Flag::info(
        flag_type,
        format!(
            "{:?} datum assumed from document context; planar offset ({}, {}) applied",
            datum, offset.dx, offset.dy
        ),
    ));

    let source_crs = if source_crs == SourceCrs::Etrs89Utm30 {
        datum_crs
    } else {
        source_crs
    };
    (shifted_x, shifted_y, source_crs)
}
