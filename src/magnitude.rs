use crate::constants::{BRIGHT_CUT, BRIGHT_VALUE, FAINT_FLOOR, NEUTRAL_BRIGHTNESS};
use crate::data::Observation;

/**
 * Magnitude of a star as seen from an observer at the given
 * distance. This is the simplified `mag - 5 / log10(d)` form,
 * not the textbook distance modulus. Returns None when the
 * result is not finite (d == 1 or a missing magnitude).
 **/
pub fn relative_magnitude(mag: Option<f64>, distance: f64) -> Option<f64> {
    let mag = mag?;
    let mag_v = mag - 5.0 / distance.log10();
    if mag_v.is_finite() {
        Some(mag_v)
    } else {
        None
    }
}

/**
 * Brightest (min) and faintest (max) relative magnitude seen
 * from one observer. Built while scanning that observer's
 * stars, read-only afterwards.
 **/
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MagnitudeRange {
    pub min: f64,
    pub max: f64,
}

impl MagnitudeRange {
    pub fn empty() -> Self {
        MagnitudeRange {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn observe(&mut self, mag_v: f64) {
        if mag_v < self.min {
            self.min = mag_v;
        }
        if mag_v > self.max {
            self.max = mag_v;
        }
    }

    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut range = Self::empty();
        for mag_v in observations.iter().filter_map(|o| o.mag) {
            range.observe(mag_v);
        }
        range
    }

    /**
     * True when no spread is available to scale against:
     * no stars at all, or all stars equally bright.
     **/
    pub fn is_degenerate(&self) -> bool {
        !(self.max - self.min > 0.0)
    }

    /**
     * Display brightness in [FAINT_FLOOR, 1]. The brightest star
     * maps to 1, the faintest to the floor.
     **/
    pub fn relative(&self, mag_v: Option<f64>) -> f64 {
        let mag_v = match mag_v {
            Some(v) if !self.is_degenerate() => v,
            _ => return NEUTRAL_BRIGHTNESS,
        };
        let rel = ((mag_v - self.max) / (self.max - self.min)).abs();
        if rel > BRIGHT_CUT {
            BRIGHT_VALUE
        } else if rel < FAINT_FLOOR {
            FAINT_FLOOR
        } else {
            rel
        }
    }

    pub fn brightness(&self, mag_v: Option<f64>) -> u8 {
        (255.0 * self.relative(mag_v)).floor() as u8
    }
}
