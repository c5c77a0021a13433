use crate::constants::SKYBOX_STAR;
use crate::data::{CubeFace, Diagnostics, Hemisphere, Observation, Projection, Region};
use crate::magnitude::MagnitudeRange;

use image::{Rgb, RgbImage};

/**
 * Square grid of greyscale brightness values, row-major.
 * x is the row and y the column, matching the [x, y]
 * indexing of the images the viewer consumes.
 **/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    pub width: usize,
    pub data: Vec<u8>,
}

impl PixelGrid {
    pub fn new(width: usize) -> Self {
        PixelGrid {
            width,
            data: vec![0; width * width],
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let w = self.width as i64;
        if x < 0 || y < 0 || x >= w || y >= w {
            None
        } else {
            Some(x as usize * self.width + y as usize)
        }
    }

    #[cfg(test)]
    pub fn get(&self, x: i64, y: i64) -> Option<u8> {
        self.index(x, y).map(|i| self.data[i])
    }

    /**
     * Writes a pixel, keeping the brighter value when stars
     * overlap. Returns false if the pixel is off the grid.
     **/
    pub fn plot(&mut self, x: i64, y: i64, value: u8) -> bool {
        match self.index(x, y) {
            Some(i) => {
                if value > self.data[i] {
                    self.data[i] = value;
                }
                true
            }
            None => false,
        }
    }

    /**
     * Plots the centre pixel plus its four direct neighbours.
     * Neighbours off the grid are skipped. Returns false only if
     * the centre itself is off the grid, in which case nothing
     * is written.
     **/
    pub fn plot_cross(&mut self, x: i64, y: i64, value: u8) -> bool {
        if !self.plot(x, y, value) {
            return false;
        }
        self.plot(x - 1, y, value);
        self.plot(x + 1, y, value);
        self.plot(x, y - 1, value);
        self.plot(x, y + 1, value);
        true
    }

    pub fn lit(&self) -> usize {
        self.data.iter().filter(|v| **v > 0).count()
    }

    /**
     * Greyscale replicated across the three RGB channels
     **/
    pub fn to_image(&self) -> RgbImage {
        let w = self.width as u32;
        RgbImage::from_fn(w, w, |col, row| {
            let v = self.data[row as usize * self.width + col as usize];
            Rgb([v, v, v])
        })
    }
}

/**
 * The grids of one body, in face or hemisphere order,
 * each with the file stem it is written under.
 **/
pub struct Rendered {
    pub grids: Vec<(&'static str, PixelGrid)>,
    pub diagnostics: Diagnostics,
}

fn grid_index(projection: Projection, region: Region) -> Option<usize> {
    match (projection, region) {
        (Projection::Skybox, Region::Face(face)) => Some(face.index()),
        (Projection::Skymap, Region::Hemisphere(hemisphere)) => Some(hemisphere.index()),
        _ => None,
    }
}

fn stems(projection: Projection) -> Vec<&'static str> {
    match projection {
        Projection::Skybox => CubeFace::ALL.iter().map(|f| f.file_stem()).collect(),
        Projection::Skymap => Hemisphere::ALL.iter().map(|h| h.file_stem()).collect(),
    }
}

/**
 * Rasterizes the observations of one body. Skyboxes get binary
 * single-pixel stars, sky maps get crosses scaled against the
 * body's magnitude range.
 **/
pub fn render(
    projection: Projection,
    observations: &[Observation],
    range: &MagnitudeRange,
    width: usize,
) -> Rendered {
    let mut grids: Vec<PixelGrid> = (0..projection.n_grids()).map(|_| PixelGrid::new(width)).collect();
    let mut diagnostics = Diagnostics::default();
    if projection == Projection::Skymap && range.is_degenerate() && !observations.is_empty() {
        diagnostics.degenerate_ranges += 1;
    }

    for obs in observations {
        let idx = match grid_index(projection, obs.region) {
            Some(idx) => idx,
            None => {
                diagnostics.unclassified += 1;
                continue;
            }
        };
        let grid = &mut grids[idx];
        let written = match projection {
            Projection::Skybox => grid.plot(obs.x, obs.y, SKYBOX_STAR),
            Projection::Skymap => grid.plot_cross(obs.x, obs.y, range.brightness(obs.mag)),
        };
        if !written {
            diagnostics.dropped_pixels += 1;
        }
    }

    Rendered {
        grids: stems(projection).into_iter().zip(grids).collect(),
        diagnostics,
    }
}
