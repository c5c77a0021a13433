use crate::constants;
use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::fmt;

/**
 * A star or an exoplanet as read from a catalog. Angles
 * are in degrees, the distance in parsecs. Exoplanets
 * carry no magnitude.
 **/
#[derive(Clone, Debug, PartialEq)]
pub struct CelestialBody {
    pub id: String,
    pub ra: f64,
    pub dec: f64,
    pub dist: f64,
    pub mag: Option<f64>,
}

impl CelestialBody {
    pub fn new(id: &str, ra: f64, dec: f64, dist: f64, mag: Option<f64>) -> Self {
        CelestialBody {
            id: id.to_string(),
            ra,
            dec,
            dist,
            mag,
        }
    }
}

/**
 * The six sides of a sky cube
 **/
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeFace {
    Front,
    Right,
    Back,
    Left,
    Up,
    Down,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Right,
        CubeFace::Back,
        CubeFace::Left,
        CubeFace::Up,
        CubeFace::Down,
    ];

    pub fn index(&self) -> usize {
        match self {
            CubeFace::Front => 0,
            CubeFace::Right => 1,
            CubeFace::Back => 2,
            CubeFace::Left => 3,
            CubeFace::Up => 4,
            CubeFace::Down => 5,
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            CubeFace::Front => "skybox_ft",
            CubeFace::Right => "skybox_rt",
            CubeFace::Back => "skybox_bk",
            CubeFace::Left => "skybox_lf",
            CubeFace::Up => "skybox_up",
            CubeFace::Down => "skybox_dn",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    pub const ALL: [Hemisphere; 2] = [Hemisphere::North, Hemisphere::South];

    pub fn index(&self) -> usize {
        match self {
            Hemisphere::North => 0,
            Hemisphere::South => 1,
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            Hemisphere::North => "skymap_n",
            Hemisphere::South => "skymap_s",
        }
    }
}

/**
 * Where a direction ended up after classification
 **/
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Face(CubeFace),
    Hemisphere(Hemisphere),
    Unclassified,
}

/**
 * Output flavour: six-sided cube maps or two polar maps
 **/
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Projection {
    Skybox,
    Skymap,
}

impl Projection {
    /**
     * Parses the --mode value. "all" expands to both projections.
     **/
    pub fn parse_mode(mode: &str) -> Result<Vec<Projection>> {
        match mode.trim().to_lowercase().as_str() {
            "skybox" | "skyboxes" | "box" => Ok(vec![Projection::Skybox]),
            "skymap" | "skymaps" | "map" => Ok(vec![Projection::Skymap]),
            "all" | "both" => Ok(vec![Projection::Skybox, Projection::Skymap]),
            _ => Err(Error::UnknownMode(mode.to_string())),
        }
    }

    pub fn json_name(&self) -> &'static str {
        match self {
            Projection::Skybox => constants::SKYBOX_JSON,
            Projection::Skymap => constants::SKYMAP_JSON,
        }
    }

    pub fn n_grids(&self) -> usize {
        match self {
            Projection::Skybox => CubeFace::ALL.len(),
            Projection::Skymap => Hemisphere::ALL.len(),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Projection::Skybox => write!(f, "skybox"),
            Projection::Skymap => write!(f, "skymap"),
        }
    }
}

/**
 * One star re-projected onto the sky of one target body.
 * This is the unit record of the intermediate JSON files.
 **/
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub source: String,
    pub observer: String,
    pub ra: f64,
    pub dec: f64,
    #[serde(rename = "L")]
    pub distance: f64,
    pub region: Region,
    pub x: i64,
    pub y: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag: Option<f64>,
}

/**
 * Counters collected while observing and rendering. They
 * never abort a run, they are reported at the end.
 **/
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Diagnostics {
    pub observed: u64,
    pub coincident: u64,
    pub unclassified: u64,
    pub dropped_pixels: u64,
    pub no_magnitude: u64,
    pub degenerate_ranges: u64,
}

impl Diagnostics {
    pub fn merge(&mut self, other: &Diagnostics) {
        self.observed += other.observed;
        self.coincident += other.coincident;
        self.unclassified += other.unclassified;
        self.dropped_pixels += other.dropped_pixels;
        self.no_magnitude += other.no_magnitude;
        self.degenerate_ranges += other.degenerate_ranges;
    }

    pub fn report(&self, projection: Projection) {
        log::info!("::: {} OBSERVATIONS: {}", projection, self.observed);
        log::info!(
            "   - Skipped, star and body coincide: {}",
            self.coincident
        );
        log::info!(
            "   - Unclassified directions (not rendered): {}",
            self.unclassified
        );
        log::info!(
            "   - Pixels dropped out of bounds: {}",
            self.dropped_pixels
        );
        if projection == Projection::Skymap {
            log::info!(
                "   - Stars without relative magnitude: {}",
                self.no_magnitude
            );
            log::info!(
                "   - Bodies with degenerate magnitude range: {}",
                self.degenerate_ranges
            );
        }
        if self.unclassified > 0 {
            log::warn!(
                "{} directions matched no {} region, check the input data",
                self.unclassified,
                projection
            );
        }
    }
}

/**
 * Holds the program configuration, which
 * corresponds roughly to the CLI arguments
 **/
pub struct Config {
    pub stars: String,
    pub planets: String,
    pub output: String,
    // skybox, skymap or all
    pub mode: String,
    // side of every output image in pixels
    pub width: usize,
    // sky map pixels per degree of polar distance
    pub map_scale: f64,
    // RA in degrees that is rotated onto the +x axis
    pub origin_ra: f64,
    // keep only the N brightest stars, negative for all
    pub max_stars: i64,
    // maximum number of files to load from a directory, negative for all
    pub max_files: i32,
    // worker threads, 0 lets rayon decide
    pub threads: usize,
    // reload the intermediate JSON instead of recomputing it
    pub render_only: bool,
    pub dry_run: bool,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stars: "".to_string(),
            planets: "".to_string(),
            output: "assets".to_string(),
            mode: "all".to_string(),
            width: constants::SKY_WIDTH,
            map_scale: constants::MAP_SCALE,
            origin_ra: 0.0,
            max_stars: -1,
            max_files: -1,
            threads: 0,
            render_only: false,
            dry_run: false,
            debug: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("stars", &self.stars)
            .field("planets", &self.planets)
            .field("output", &self.output)
            .field("mode", &self.mode)
            .field("width", &self.width)
            .field("map_scale", &self.map_scale)
            .field("origin_ra", &self.origin_ra)
            .field("max_stars", &self.max_stars)
            .field("max_files", &self.max_files)
            .field("threads", &self.threads)
            .field("render_only", &self.render_only)
            .field("dry_run", &self.dry_run)
            .field("debug", &self.debug)
            .finish()
    }
}
