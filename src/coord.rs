extern crate nalgebra as na;

use crate::data::CelestialBody;
use crate::util;

use na::{Matrix3, Rotation3, Vector3};

/**
 * Direction and distance of a source as seen from an observer.
 * Angles in degrees.
 **/
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spherical {
    pub ra: f64,
    pub dec: f64,
    pub distance: f64,
}

/**
 * Earth-anchored Cartesian frame. Earth sits at (0, 0, 0)
 * and its heliocentric motion is ignored. The frame may be
 * rotated about the pole so that a chosen RA lies on +x.
 **/
pub struct Coord {
    pub origin_ra: f64,
    pub eq_frame: Matrix3<f64>,
}

impl Coord {
    pub fn new(origin_ra: f64) -> Self {
        let rot = Rotation3::from_axis_angle(&Vector3::z_axis(), -origin_ra.to_radians());
        Coord {
            origin_ra,
            eq_frame: rot.into_inner(),
        }
    }

    /**
     * Position of a catalog body relative to Earth. RA and DEC
     * are converted from degrees here and nowhere else.
     **/
    pub fn to_cartesian(&self, body: &CelestialBody) -> Vector3<f64> {
        let pos = util::spherical_to_cartesian(body.ra.to_radians(), body.dec.to_radians(), body.dist);
        if self.origin_ra == 0.0 {
            pos
        } else {
            self.eq_frame * pos
        }
    }
}

/**
 * Spherical coordinates of `source` as seen from `observer`.
 * None when both points coincide.
 **/
pub fn relative_spherical(source: &Vector3<f64>, observer: &Vector3<f64>) -> Option<Spherical> {
    let d = source - observer;
    util::cartesian_to_spherical(&d).map(|(ra, dec, distance)| Spherical { ra, dec, distance })
}
