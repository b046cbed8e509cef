//! Map projection math
//!
//! Transverse Mercator (UTM zone 30N, GRS80) in both directions and the
//! Spanish Lambert Conformal Conic grid (Struve 1860, Madrid meridian). The
//! series expansions are the usual Snyder forms; they are accurate to well
//! below a millimeter inside a single UTM zone.

use crate::constants::{grs80, lambert_spain, utm30};
use std::f64::consts::FRAC_PI_2;
use std::f64::consts::FRAC_PI_4;

fn eccentricity_squared(inverse_flattening: f64) -> f64 {
    let f = 1.0 / inverse_flattening;
    f * (2.0 - f)
}

/// Distance along the meridian from the equator to latitude `phi`
fn meridian_arc(a: f64, e2: f64, phi: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Project longitude/latitude degrees onto UTM zone 30N (meters)
pub fn geographic_to_utm30(lon: f64, lat: f64) -> (f64, f64) {
    let a = grs80::SEMI_MAJOR_AXIS;
    let e2 = eccentricity_squared(grs80::INVERSE_FLATTENING);
    let ep2 = e2 / (1.0 - e2);
    let k0 = utm30::SCALE_FACTOR;

    let phi = lat.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let tan_phi = phi.tan();

    let n = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let big_a = (lon - utm30::CENTRAL_MERIDIAN_DEG).to_radians() * cos_phi;
    let m = meridian_arc(a, e2, phi);

    let x = utm30::FALSE_EASTING
        + k0 * n
            * (big_a
                + (1.0 - t + c) * big_a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0);

    let y = utm30::FALSE_NORTHING
        + k0 * (m
            + n * tan_phi
                * (big_a * big_a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                        / 720.0));

    (x, y)
}

/// Inverse UTM zone 30N: meters to longitude/latitude degrees
pub fn utm30_to_geographic(x: f64, y: f64) -> (f64, f64) {
    let a = grs80::SEMI_MAJOR_AXIS;
    let e2 = eccentricity_squared(grs80::INVERSE_FLATTENING);
    let ep2 = e2 / (1.0 - e2);
    let k0 = utm30::SCALE_FACTOR;

    let x = x - utm30::FALSE_EASTING;
    let m = (y - utm30::FALSE_NORTHING) / k0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());
    let j1 = 3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0;
    let j2 = 21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0;
    let j3 = 151.0 * e1.powi(3) / 96.0;
    let j4 = 1097.0 * e1.powi(4) / 512.0;

    // Footprint latitude
    let fp = mu
        + j1 * (2.0 * mu).sin()
        + j2 * (4.0 * mu).sin()
        + j3 * (6.0 * mu).sin()
        + j4 * (8.0 * mu).sin();

    let sin_fp = fp.sin();
    let c1 = ep2 * fp.cos().powi(2);
    let t1 = fp.tan().powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_fp * sin_fp).powf(1.5);
    let n1 = a / (1.0 - e2 * sin_fp * sin_fp).sqrt();
    let d = x / (n1 * k0);

    let lat = fp
        - (n1 * fp.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2
                    - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);

    let lon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
            * d.powi(5)
            / 120.0)
        / fp.cos();

    (utm30::CENTRAL_MERIDIAN_DEG + lon.to_degrees(), lat.to_degrees())
}

/// Constants of the Spanish Lambert cone
struct LambertCone {
    a: f64,
    e: f64,
    n: f64,
    f: f64,
    rho0: f64,
}

impl LambertCone {
    fn spain() -> Self {
        let a = lambert_spain::SEMI_MAJOR_AXIS;
        let e = eccentricity_squared(lambert_spain::INVERSE_FLATTENING).sqrt();
        let phi1 = lambert_spain::STANDARD_PARALLEL_DEG.to_radians();

        let m1 = Self::m(e, phi1);
        let t1 = Self::t(e, phi1);
        let n = phi1.sin();
        let f = m1 / (n * t1.powf(n));
        let rho0 = a * lambert_spain::SCALE_FACTOR * f * t1.powf(n);

        Self { a, e, n, f, rho0 }
    }

    fn m(e: f64, phi: f64) -> f64 {
        let sin_phi = phi.sin();
        phi.cos() / (1.0 - e * e * sin_phi * sin_phi).sqrt()
    }

    fn t(e: f64, phi: f64) -> f64 {
        let e_sin = e * phi.sin();
        (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - e_sin) / (1.0 + e_sin)).powf(e / 2.0)
    }

    fn rho(&self, t: f64) -> f64 {
        self.a * lambert_spain::SCALE_FACTOR * self.f * t.powf(self.n)
    }
}

/// Project longitude/latitude (Madrid 1870 datum) onto the Lambert grid
pub fn geographic_to_lambert_spain(lon: f64, lat: f64) -> (f64, f64) {
    let cone = LambertCone::spain();
    let rho = cone.rho(LambertCone::t(cone.e, lat.to_radians()));
    let theta = cone.n * (lon - lambert_spain::MADRID_MERIDIAN_DEG).to_radians();

    (
        lambert_spain::FALSE_EASTING + rho * theta.sin(),
        lambert_spain::FALSE_NORTHING + cone.rho0 - rho * theta.cos(),
    )
}

/// Inverse Lambert grid to longitude/latitude degrees
///
/// Returns `None` when the latitude iteration does not converge or the input
/// produces a non-finite result.
pub fn lambert_spain_to_geographic(x: f64, y: f64) -> Option<(f64, f64)> {
    let cone = LambertCone::spain();
    let dx = x - lambert_spain::FALSE_EASTING;
    let dy = cone.rho0 - (y - lambert_spain::FALSE_NORTHING);

    let rho = dx.hypot(dy);
    let theta = dx.atan2(dy);
    let t = (rho / (cone.a * lambert_spain::SCALE_FACTOR * cone.f)).powf(1.0 / cone.n);
    let lon = (theta / cone.n).to_degrees() + lambert_spain::MADRID_MERIDIAN_DEG;

    let mut phi = FRAC_PI_2 - 2.0 * t.atan();
    for _ in 0..lambert_spain::MAX_ITERATIONS {
        let e_sin = cone.e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - e_sin) / (1.0 + e_sin)).powf(cone.e / 2.0)).atan();
        if (next - phi).abs() < lambert_spain::CONVERGENCE_EPSILON {
            let lat = next.to_degrees();
            return (lat.is_finite() && lon.is_finite()).then_some((lon, lat));
        }
        phi = next;
    }

    None
}
