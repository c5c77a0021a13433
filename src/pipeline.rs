use crate::classify;
use crate::constants;
use crate::coord::{self, Coord};
use crate::data::{CelestialBody, Config, Diagnostics, Observation, Projection};
use crate::error::Result;
use crate::load::{CatalogKind, Loader};
use crate::magnitude::{self, MagnitudeRange};
use crate::mem;
use crate::raster;
use crate::write::{self, SkyTable};

use nalgebra::Vector3;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::path::Path;
use std::time::Instant;

/**
 * A catalog star with its Earth-frame position, computed
 * once per run and shared read-only by every observer
 **/
pub struct PlacedStar<'a> {
    pub body: &'a CelestialBody,
    pub pos: Vector3<f64>,
}

/**
 * Everything computed for one target body. Owned by the
 * worker that processes that body.
 **/
pub struct BodySky {
    pub observations: Vec<Observation>,
    pub range: MagnitudeRange,
    pub diagnostics: Diagnostics,
}

pub struct Pipeline<'a> {
    pub config: &'a Config,
    pub coord: Coord,
    pool: rayon::ThreadPool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;
        Ok(Pipeline {
            config,
            coord: Coord::new(config.origin_ra),
            pool,
        })
    }

    pub fn place<'b>(&self, stars: &'b [CelestialBody]) -> Vec<PlacedStar<'b>> {
        stars
            .iter()
            .map(|body| PlacedStar {
                body,
                pos: self.coord.to_cartesian(body),
            })
            .collect()
    }

    /**
     * Re-projects every star onto the sky of `observer`
     **/
    pub fn observe_body(
        &self,
        projection: Projection,
        stars: &[PlacedStar],
        observer: &CelestialBody,
    ) -> BodySky {
        let origin = self.coord.to_cartesian(observer);
        let mut range = MagnitudeRange::empty();
        let mut diagnostics = Diagnostics::default();
        let mut observations = Vec::with_capacity(stars.len());

        for star in stars {
            let sph = match coord::relative_spherical(&star.pos, &origin) {
                Some(sph) => sph,
                None => {
                    diagnostics.coincident += 1;
                    continue;
                }
            };
            let (region, x, y) = match projection {
                Projection::Skybox => classify::classify_face(sph.ra, sph.dec, self.config.width),
                Projection::Skymap => classify::classify_hemisphere(
                    sph.ra,
                    sph.dec,
                    self.config.width,
                    self.config.map_scale,
                ),
            };
            let mag = magnitude::relative_magnitude(star.body.mag, sph.distance);
            match mag {
                Some(mag_v) => range.observe(mag_v),
                None => diagnostics.no_magnitude += 1,
            }
            observations.push(Observation {
                source: star.body.id.clone(),
                observer: observer.id.clone(),
                ra: sph.ra,
                dec: sph.dec,
                distance: sph.distance,
                region,
                x,
                y,
                mag,
            });
        }
        diagnostics.observed = observations.len() as u64;

        BodySky {
            observations,
            range,
            diagnostics,
        }
    }

    /**
     * Observes all target bodies in parallel. Bodies share nothing
     * mutable, results are keyed by name so order is stable.
     **/
    pub fn observe_all(
        &self,
        projection: Projection,
        stars: &[PlacedStar],
        planets: &[CelestialBody],
    ) -> Vec<(String, BodySky)> {
        self.pool.install(|| {
            let mut skies: Vec<(String, BodySky)> = planets
                .par_iter()
                .map(|planet| (planet.id.clone(), self.observe_body(projection, stars, planet)))
                .collect();
            skies.sort_by(|a, b| a.0.cmp(&b.0));
            skies
        })
    }

    /**
     * Rasterizes every body and, unless this is a dry run,
     * writes its images. Returns the merged render diagnostics.
     **/
    pub fn render_all(
        &self,
        projection: Projection,
        bodies: &[(&str, &[Observation], MagnitudeRange)],
    ) -> Result<Diagnostics> {
        let output = Path::new(&self.config.output);
        let results: Vec<Result<Diagnostics>> = self.pool.install(|| {
            bodies
                .par_iter()
                .map(|(name, observations, range)| -> Result<Diagnostics> {
                    let rendered = raster::render(projection, observations, range, self.config.width);
                    if !self.config.dry_run {
                        write::write_images(&rendered, name, output)?;
                    }
                    Ok(rendered.diagnostics)
                })
                .collect()
        });
        let mut diagnostics = Diagnostics::default();
        for result in results {
            diagnostics.merge(&result?);
        }
        Ok(diagnostics)
    }

    /**
     * Reloads an intermediate JSON and renders it again
     **/
    pub fn render_from_json(&self, projection: Projection) -> Result<Diagnostics> {
        let file = Path::new(&self.config.output).join(projection.json_name());
        let table = write::read_observations(&file)?;
        let ranges: Vec<MagnitudeRange> = table
            .values()
            .map(|obs| MagnitudeRange::from_observations(obs))
            .collect();
        let bodies: Vec<(&str, &[Observation], MagnitudeRange)> = table
            .iter()
            .zip(ranges)
            .map(|((name, obs), range)| (name.as_str(), obs.as_slice(), range))
            .collect();
        let mut diagnostics = Diagnostics::default();
        diagnostics.observed = bodies.iter().map(|b| b.1.len() as u64).sum();
        diagnostics.merge(&self.render_all(projection, &bodies)?);
        Ok(diagnostics)
    }

    /**
     * Full run: load, observe, persist, render. Catalog problems
     * abort before anything is written.
     **/
    pub fn run(&self) -> Result<Vec<(Projection, Diagnostics)>> {
        let projections = Projection::parse_mode(&self.config.mode)?;
        let mut reports = Vec::new();

        if self.config.render_only {
            for projection in projections {
                let diagnostics = self.render_from_json(projection)?;
                diagnostics.report(projection);
                reports.push((projection, diagnostics));
            }
            return Ok(reports);
        }

        let start = Instant::now();
        let mut star_loader = Loader::new(CatalogKind::Stars, self.config.max_files);
        let mut stars = star_loader.load_dir(&self.config.stars)?;
        star_loader.report_rejected();
        let mut planet_loader = Loader::new(CatalogKind::Exoplanets, self.config.max_files);
        let planets = planet_loader.load_dir(&self.config.planets)?;
        planet_loader.report_rejected();
        if self.config.max_stars >= 0 {
            keep_brightest(&mut stars, self.config.max_stars as usize);
        }
        log::info!(
            "{} stars and {} target bodies loaded in {:?}",
            stars.len(),
            planets.len(),
            start.elapsed()
        );
        mem::log_mem("loading");

        let placed = self.place(&stars);
        let output = Path::new(&self.config.output);
        if !self.config.dry_run {
            std::fs::create_dir_all(output)?;
            write::write_planet_index(&planets, &self.coord, &output.join(constants::PLANET_INDEX_JSON))?;
        }

        for projection in projections {
            let start = Instant::now();
            let skies = self.observe_all(projection, &placed, &planets);
            let mut diagnostics = Diagnostics::default();
            let mut table = SkyTable::new();
            let mut ranges = Vec::with_capacity(skies.len());
            for (name, sky) in skies {
                diagnostics.merge(&sky.diagnostics);
                log::debug!(
                    "{}: {} observations, magnitude range [{:.3}, {:.3}]",
                    name,
                    sky.observations.len(),
                    sky.range.min,
                    sky.range.max
                );
                ranges.push(sky.range);
                table.insert(name, sky.observations);
            }
            log::info!(
                ":: {} observations computed for {} bodies in {:?}",
                projection,
                table.len(),
                start.elapsed()
            );
            mem::log_mem("observing");

            if !self.config.dry_run {
                write::write_observations(&table, &output.join(projection.json_name()))?;
            }

            // Both are ordered by body name
            let bodies: Vec<(&str, &[Observation], MagnitudeRange)> = table
                .iter()
                .zip(ranges)
                .map(|((name, obs), range)| (name.as_str(), obs.as_slice(), range))
                .collect();
            diagnostics.merge(&self.render_all(projection, &bodies)?);
            mem::log_mem("rendering");

            diagnostics.report(projection);
            reports.push((projection, diagnostics));
        }
        Ok(reports)
    }
}

/**
 * Keeps the n brightest stars. Stars without magnitude sort last.
 **/
pub fn keep_brightest(stars: &mut Vec<CelestialBody>, n: usize) {
    stars.sort_by(|a, b| match (a.mag, b.mag) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    stars.truncate(n);
}
