use crate::coord::Coord;
use crate::data::{CelestialBody, Observation};
use crate::error::Result;
use crate::raster::Rendered;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Observer name to its ordered observations
pub type SkyTable = BTreeMap<String, Vec<Observation>>;

/**
 * Writes the intermediate observation table
 **/
pub fn write_observations(table: &SkyTable, file: &Path) -> Result<()> {
    log::info!(
        ":: Writing observations of {} bodies to {}",
        table.len(),
        file.display()
    );
    let mut w = BufWriter::new(File::create(file)?);
    serde_json::to_writer(&mut w, table)?;
    w.flush()?;
    Ok(())
}

/**
 * Reads an observation table written by `write_observations`
 **/
pub fn read_observations(file: &Path) -> Result<SkyTable> {
    let f = File::open(file)?;
    let table: SkyTable = serde_json::from_reader(BufReader::new(f))?;
    log::info!(
        ":: Loaded observations of {} bodies from {}",
        table.len(),
        file.display()
    );
    Ok(table)
}

/**
 * Body names become directory names. Path separators and
 * control characters are replaced, so "2MASS J0249-0557 c"
 * is fine but "HD 1/2 b" becomes "HD 1_2 b".
 **/
pub fn dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').to_string();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

/**
 * Writes every grid of one body as <output>/<body>/<stem>.png
 **/
pub fn write_images(rendered: &Rendered, body: &str, output_dir: &Path) -> Result<PathBuf> {
    let dir = output_dir.join(dir_name(body));
    std::fs::create_dir_all(&dir)?;
    for (stem, grid) in rendered.grids.iter() {
        let file_path = dir.join(format!("{}.png", stem));
        log::debug!(
            "{}: Writing {} lit pixels to {}",
            body,
            grid.lit(),
            file_path.display()
        );
        grid.to_image().save(&file_path)?;
    }
    Ok(dir)
}

#[derive(Serialize)]
struct PlanetEntry {
    ra: f64,
    dec: f64,
    dist: f64,
    x_earth: f64,
    y_earth: f64,
    z_earth: f64,
}

/**
 * Writes the planet index used by the viewer menu, keyed by
 * planet name, with Earth-frame Cartesian positions
 **/
pub fn write_planet_index(planets: &[CelestialBody], coord: &Coord, file: &Path) -> Result<()> {
    log::info!(
        ":: Writing index of {} planets to {}",
        planets.len(),
        file.display()
    );
    let index: BTreeMap<&str, PlanetEntry> = planets
        .iter()
        .map(|p| {
            let pos = coord.to_cartesian(p);
            (
                p.id.as_str(),
                PlanetEntry {
                    ra: p.ra,
                    dec: p.dec,
                    dist: p.dist,
                    x_earth: pos.x,
                    y_earth: pos.y,
                    z_earth: pos.z,
                },
            )
        })
        .collect();
    let mut w = BufWriter::new(File::create(file)?);
    serde_json::to_writer(&mut w, &index)?;
    w.flush()?;
    Ok(())
}
