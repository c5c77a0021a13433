use crate::math;

use nalgebra::Vector3;

/**
 * Converts spherical coordinates (lon[rad], lat[rad], r) to
 * Cartesian coordinates in the same units as the radius.
 * The x axis points at lon=0, the z axis at the north pole.
 */
pub fn spherical_to_cartesian(lon: f64, lat: f64, r: f64) -> Vector3<f64> {
    let coslat = lat.cos();
    Vector3::new(r * lon.cos() * coslat, r * lon.sin() * coslat, r * lat.sin())
}

/**
 * Converts a Cartesian vector to (lon[deg], lat[deg], r).
 * Returns None for the zero vector, which has no direction.
 * Longitude is in [0, 360), latitude in [-90, 90].
 */
pub fn cartesian_to_spherical(v: &Vector3<f64>) -> Option<(f64, f64, f64)> {
    let r = v.norm();
    if !(r > 0.0) || !r.is_finite() {
        return None;
    }
    let mut lon = math::clamp_unit(v.x / r).acos().to_degrees();
    if v.y < 0.0 {
        lon = 360.0 - lon;
    }
    let lat = math::clamp_unit(v.z / r).asin().to_degrees();
    Some((math::wrap_degrees(lon), lat, r))
}
