/**
 * Clamp the input between min and max. NaN stays NaN
 * so callers can still detect it.
 **/
pub fn clamp(input: f64, min: f64, max: f64) -> f64 {
    if input < min {
        min
    } else if input > max {
        max
    } else {
        input
    }
}

/**
 * Cosine-domain clamp for acos/asin arguments that drifted
 * slightly out of [-1, 1]
 **/
pub fn clamp_unit(input: f64) -> f64 {
    clamp(input, -1.0, 1.0)
}

/**
 * Wraps an angle in degrees into [0, 360)
 **/
pub fn wrap_degrees(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if w >= 360.0 {
        0.0
    } else {
        w
    }
}
