//! Sorts relative directions onto cube faces (skyboxes) or
//! hemispheres (sky maps) and computes their pixel positions.
//!
//! Angles come in as degrees. Radians only appear inside the
//! trigonometric calls of the polar projections.

use crate::constants::{FACE_SPAN, POLE_DEC, SIDE_DEC_HI, SIDE_DEC_LO};
use crate::data::{CubeFace, Hemisphere, Region};
use crate::math;

/// Maps (ra, dec) in degrees to a [0, 1] fraction of the face, (x, y).
pub type FaceMapping = fn(f64, f64) -> (f64, f64);

/// One row of the cube partition: a face is picked when the RA falls
/// in any of its half-open RA ranges and the DEC falls in its DEC range.
pub struct FaceBand {
    pub face: CubeFace,
    pub ra: &'static [(f64, f64)],
    pub dec: (f64, f64),
    // Upper DEC bound is included (only used to close the pole)
    pub dec_closed: bool,
    pub map: FaceMapping,
}

impl FaceBand {
    pub fn contains(&self, ra: f64, dec: f64) -> bool {
        let in_ra = self.ra.iter().any(|(lo, hi)| ra >= *lo && ra < *hi);
        let in_dec = dec >= self.dec.0
            && (dec < self.dec.1 || (self.dec_closed && dec == self.dec.1));
        in_ra && in_dec
    }
}

fn side(ra: f64, dec: f64, offset: f64) -> (f64, f64) {
    (
        math::wrap_degrees(ra - offset) / FACE_SPAN,
        (dec - SIDE_DEC_LO) / FACE_SPAN,
    )
}

fn front(ra: f64, dec: f64) -> (f64, f64) {
    side(ra, dec, -45.0)
}

fn right(ra: f64, dec: f64) -> (f64, f64) {
    side(ra, dec, 45.0)
}

fn back(ra: f64, dec: f64) -> (f64, f64) {
    side(ra, dec, 135.0)
}

fn left(ra: f64, dec: f64) -> (f64, f64) {
    side(ra, dec, 225.0)
}

/// Azimuthal equidistant projection centred on a pole. The face
/// edge (|dec| = 45) touches the inscribed circle of the square.
fn polar(colat: f64, angle: f64) -> (f64, f64) {
    let r = colat / (POLE_DEC - SIDE_DEC_HI);
    (0.5 + 0.5 * r * angle.cos(), 0.5 + 0.5 * r * angle.sin())
}

fn up(ra: f64, dec: f64) -> (f64, f64) {
    polar(POLE_DEC - dec, ra.to_radians())
}

fn down(ra: f64, dec: f64) -> (f64, f64) {
    polar(POLE_DEC + dec, -ra.to_radians())
}

const FULL_RA: &[(f64, f64)] = &[(0.0, 360.0)];

/// Evaluated top to bottom, first match wins. The side faces come
/// first because the polar bands span every RA.
pub const FACE_BANDS: [FaceBand; 6] = [
    FaceBand {
        face: CubeFace::Front,
        ra: &[(315.0, 360.0), (0.0, 45.0)],
        dec: (SIDE_DEC_LO, SIDE_DEC_HI),
        dec_closed: false,
        map: front,
    },
    FaceBand {
        face: CubeFace::Right,
        ra: &[(45.0, 135.0)],
        dec: (SIDE_DEC_LO, SIDE_DEC_HI),
        dec_closed: false,
        map: right,
    },
    FaceBand {
        face: CubeFace::Back,
        ra: &[(135.0, 225.0)],
        dec: (SIDE_DEC_LO, SIDE_DEC_HI),
        dec_closed: false,
        map: back,
    },
    FaceBand {
        face: CubeFace::Left,
        ra: &[(225.0, 315.0)],
        dec: (SIDE_DEC_LO, SIDE_DEC_HI),
        dec_closed: false,
        map: left,
    },
    FaceBand {
        face: CubeFace::Up,
        ra: FULL_RA,
        dec: (SIDE_DEC_HI, POLE_DEC),
        dec_closed: true,
        map: up,
    },
    FaceBand {
        face: CubeFace::Down,
        ra: FULL_RA,
        dec: (-POLE_DEC, SIDE_DEC_LO),
        dec_closed: false,
        map: down,
    },
];

/**
 * Converts a [0, 1] fraction to a pixel index. The closed
 * upper edge lands on the last pixel.
 **/
fn to_pixel(frac: f64, width: usize) -> i64 {
    let px = (frac * width as f64).floor() as i64;
    px.min(width as i64 - 1)
}

/**
 * Cube-face classification. Returns the region and the pixel
 * inside that face. Directions that match no band (NaN input)
 * come back unclassified at (0, 0).
 **/
pub fn classify_face(ra: f64, dec: f64, width: usize) -> (Region, i64, i64) {
    for band in FACE_BANDS.iter() {
        if band.contains(ra, dec) {
            let (fx, fy) = (band.map)(ra, dec);
            return (
                Region::Face(band.face),
                to_pixel(fx, width),
                to_pixel(fy, width),
            );
        }
    }
    (Region::Unclassified, 0, 0)
}

/**
 * Hemisphere classification with a polar azimuthal projection.
 * The result may fall outside the map, the rasterizer drops
 * those pixels.
 **/
pub fn classify_hemisphere(ra: f64, dec: f64, width: usize, scale: f64) -> (Region, i64, i64) {
    if !ra.is_finite() || !dec.is_finite() {
        return (Region::Unclassified, 0, 0);
    }
    let ra_rad = ra.to_radians();
    let (hemisphere, x, y) = if dec < 0.0 {
        let r = POLE_DEC + dec;
        (Hemisphere::South, r * (-ra_rad).cos(), r * (-ra_rad).sin())
    } else {
        let r = POLE_DEC - dec;
        (Hemisphere::North, r * ra_rad.cos(), r * ra_rad.sin())
    };
    let half = width as f64 / 2.0;
    (
        Region::Hemisphere(hemisphere),
        (x * scale + half).floor() as i64,
        (y * scale + half).floor() as i64,
    )
}
