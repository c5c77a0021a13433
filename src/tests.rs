#[cfg(test)]
use crate::data::{CelestialBody, Config, CubeFace, Hemisphere, Observation, Projection, Region};
#[cfg(test)]
use crate::error::Error;
#[cfg(test)]
use crate::load::{CatalogKind, Loader};
#[cfg(test)]
use crate::magnitude::MagnitudeRange;
#[cfg(test)]
use crate::pipeline::{self, Pipeline};
#[cfg(test)]
use crate::raster;
#[cfg(test)]
use crate::write::{self, SkyTable};

#[cfg(test)]
use approx::assert_relative_eq;
#[cfg(test)]
use flate2::write::GzEncoder;
#[cfg(test)]
use flate2::Compression;
#[cfg(test)]
use std::fs;
#[cfg(test)]
use std::io::Write;
#[cfg(test)]
use std::path::Path;

#[cfg(test)]
const PLANETS_CSV: &str = "# This file was produced by the NASA Exoplanet Archive
# COLUMN pl_name:        Planet Name
# COLUMN sy_dist:        Distance [pc]
pl_name,hostname,ra,dec,sy_dist
|Kepler-22 b|,Kepler-22,289.2176,47.8845,195.0
Proxima Cen b,Proxima Cen,217.3934,-62.6761,1.30119
Nameless,Nowhere,10.0,10.0,
Proxima Cen b,Proxima Cen,217.3934,-62.6761,1.3012
";

#[cfg(test)]
const STARS_CSV: &str = "source_id,ra,dec,distance_gspphot,phot_g_mean_mag
1,10.0,20.0,100.0,5.0
2,200.0,-30.0,50.0,7.5
3,45.0,60.0,20.0,2.1
4,300.0,-75.0,300.0,9.9
5,120.0,5.0,12.0,
6,250.0,85.0,80.0,4.4
";

#[cfg(test)]
fn write_file(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

#[cfg(test)]
fn sample_config(dir: &Path) -> Config {
    let stars = dir.join("stars.csv");
    let planets = dir.join("planets.csv");
    write_file(&stars, STARS_CSV);
    write_file(&planets, PLANETS_CSV);
    Config {
        stars: stars.to_string_lossy().to_string(),
        planets: planets.to_string_lossy().to_string(),
        output: dir.join("out").to_string_lossy().to_string(),
        width: 90,
        map_scale: 0.5,
        threads: 2,
        ..Config::default()
    }
}

#[cfg(test)]
fn observe_table(pipeline: &Pipeline, projection: Projection, stars: &[CelestialBody], planets: &[CelestialBody]) -> SkyTable {
    let placed = pipeline.place(stars);
    pipeline
        .observe_all(projection, &placed, planets)
        .into_iter()
        .map(|(name, sky)| (name, sky.observations))
        .collect()
}

#[test]
fn test_observation_is_reproducible() {
    let config = Config {
        threads: 1,
        ..Config::default()
    };
    let pipeline = Pipeline::new(&config).unwrap();
    let stars = vec![CelestialBody::new("star", 90.0, 0.0, 10.0, Some(5.0))];
    let target = CelestialBody::new("target", 0.0, 0.0, 10.0, None);
    let placed = pipeline.place(&stars);

    let first = pipeline.observe_body(Projection::Skybox, &placed, &target);
    let second = pipeline.observe_body(Projection::Skybox, &placed, &target);
    assert_eq!(first.observations, second.observations);
    assert_eq!(1, first.observations.len());

    let obs = &first.observations[0];
    assert_relative_eq!(135.0, obs.ra, epsilon = 1e-9);
    assert_relative_eq!(0.0, obs.dec, epsilon = 1e-9);
    assert_relative_eq!(200f64.sqrt(), obs.distance, epsilon = 1e-9);
    // RA 135 opens the back face
    assert_eq!(Region::Face(CubeFace::Back), obs.region);
    assert_eq!((0, 540), (obs.x, obs.y));
    assert_eq!("star", obs.source);
    assert_eq!("target", obs.observer);
}

#[test]
fn test_coincident_star_is_skipped() {
    let config = Config::default();
    let pipeline = Pipeline::new(&config).unwrap();
    let stars = vec![
        CelestialBody::new("here", 10.0, 20.0, 100.0, Some(3.0)),
        CelestialBody::new("there", 11.0, 20.0, 100.0, Some(3.0)),
    ];
    let target = CelestialBody::new("b", 10.0, 20.0, 100.0, None);
    let placed = pipeline.place(&stars);
    let sky = pipeline.observe_body(Projection::Skymap, &placed, &target);
    assert_eq!(1, sky.observations.len());
    assert_eq!("there", sky.observations[0].source);
    assert_eq!(1, sky.diagnostics.coincident);
    assert_eq!(1, sky.diagnostics.observed);
}

#[test]
fn test_single_visible_star_renders_neutral() {
    let config = Config::default();
    let pipeline = Pipeline::new(&config).unwrap();
    let stars = vec![CelestialBody::new("only", 90.0, 0.0, 10.0, Some(5.0))];
    let target = CelestialBody::new("target", 0.0, 0.0, 10.0, None);
    let placed = pipeline.place(&stars);
    let sky = pipeline.observe_body(Projection::Skymap, &placed, &target);
    assert!(sky.range.is_degenerate());

    let obs = &sky.observations[0];
    assert_eq!(Region::Hemisphere(Hemisphere::North), obs.region);
    let rendered = raster::render(Projection::Skymap, &sky.observations, &sky.range, config.width);
    assert_eq!(Some(204), rendered.grids[0].1.get(obs.x, obs.y));
    assert_eq!(1, rendered.diagnostics.degenerate_ranges);
    assert_eq!(0, rendered.grids[1].1.lit());
}

#[test]
fn test_observations_survive_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        width: 128,
        map_scale: 0.7,
        ..Config::default()
    };
    let pipeline = Pipeline::new(&config).unwrap();
    let stars = vec![
        CelestialBody::new("a", 10.0, 20.0, 100.0, Some(5.0)),
        CelestialBody::new("b", 200.0, -30.0, 50.0, Some(7.5)),
        CelestialBody::new("c", 45.0, 60.0, 20.0, None),
        CelestialBody::new("d", 333.3, -89.0, 0.5, Some(-1.46)),
    ];
    let planets = vec![
        CelestialBody::new("p1", 100.0, 10.0, 30.0, None),
        CelestialBody::new("p2", 280.0, -40.0, 8.0, None),
    ];

    for projection in [Projection::Skybox, Projection::Skymap] {
        let table = observe_table(&pipeline, projection, &stars, &planets);
        let file = dir.path().join(projection.json_name());
        write::write_observations(&table, &file).unwrap();
        let reloaded = write::read_observations(&file).unwrap();
        assert_eq!(table, reloaded);

        for (name, observations) in table.iter() {
            let again = &reloaded[name];
            let a = raster::render(
                projection,
                observations,
                &MagnitudeRange::from_observations(observations),
                config.width,
            );
            let b = raster::render(projection, again, &MagnitudeRange::from_observations(again), config.width);
            for ((stem_a, grid_a), (stem_b, grid_b)) in a.grids.iter().zip(b.grids.iter()) {
                assert_eq!(stem_a, stem_b);
                assert_eq!(grid_a, grid_b);
            }
        }
    }
}

#[test]
fn test_load_exoplanet_archive_csv() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("planets.csv");
    write_file(&file, PLANETS_CSV);

    let mut loader = Loader::new(CatalogKind::Exoplanets, -1);
    let planets = loader.load_dir(&file.to_string_lossy()).unwrap();
    assert_eq!(2, planets.len());
    assert_eq!("Kepler-22 b", planets[0].id);
    assert_eq!("Proxima Cen b", planets[1].id);
    // later row wins
    assert_relative_eq!(1.3012, planets[1].dist);
    assert_eq!(None, planets[1].mag);
    assert_eq!(1, loader.rejected_dist);
    assert_eq!(1, loader.duplicates);
    assert_eq!(4, loader.total_processed);
}

#[test]
fn test_load_quoted_field_with_comma() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("planets.csv");
    write_file(
        &file,
        "# quoted facility names\npl_name,disc_facility,ra,dec,sy_dist\nX b,|Kepler, K2|,10.0,20.0,30.0\n|Y, c|,\"La Silla, ESO\",11.0,-21.0,31.0\n",
    );
    let mut loader = Loader::new(CatalogKind::Exoplanets, -1);
    let planets = loader.load_dir(&file.to_string_lossy()).unwrap();
    assert_eq!(2, planets.len());
    assert_eq!("X b", planets[0].id);
    assert_relative_eq!(10.0, planets[0].ra);
    assert_relative_eq!(20.0, planets[0].dec);
    assert_relative_eq!(30.0, planets[0].dist);
    assert_eq!("Y, c", planets[1].id);
    assert_relative_eq!(-21.0, planets[1].dec);
}

#[test]
fn test_load_gzipped_stars() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("stars.csv.gz");
    let mut enc = GzEncoder::new(fs::File::create(&file).unwrap(), Compression::default());
    enc.write_all(STARS_CSV.as_bytes()).unwrap();
    enc.finish().unwrap();

    let mut loader = Loader::new(CatalogKind::Stars, -1);
    let stars = loader.load_dir(&file.to_string_lossy()).unwrap();
    assert_eq!(6, stars.len());
    assert_eq!("3", stars[2].id);
    assert_eq!(Some(2.1), stars[2].mag);
    assert_eq!(None, stars[4].mag);
}

#[test]
fn test_load_json_catalogs() {
    let dir = tempfile::tempdir().unwrap();
    let keyed = dir.path().join("planets.json");
    write_file(
        &keyed,
        r#"{"A b": {"ra": 10.0, "dec": 5.0, "dist": 20.0, "x_earth": 1.0},
            "B c": {"ra": 100.0, "dec": -5.0, "dist": 30.0}}"#,
    );
    let mut loader = Loader::new(CatalogKind::Exoplanets, -1);
    let planets = loader.load_dir(&keyed.to_string_lossy()).unwrap();
    assert_eq!(vec!["A b", "B c"], planets.iter().map(|p| p.id.as_str()).collect::<Vec<_>>());

    let list = dir.path().join("stars.json");
    write_file(
        &list,
        r#"[{"ra": 1.0, "dec": 2.0, "dist": 3.0, "mag": 4.0},
            {"ra": 5.0, "dec": 6.0, "dist": null, "mag": 1.0}]"#,
    );
    let mut loader = Loader::new(CatalogKind::Stars, -1);
    let stars = loader.load_dir(&list.to_string_lossy()).unwrap();
    assert_eq!(1, stars.len());
    assert_eq!("star_0", stars[0].id);
    assert_eq!(1, loader.rejected_dist);
}

#[test]
fn test_load_directory_respects_max_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(&dir.path().join("a.csv"), "ra,dec,dist,mag\n1.0,2.0,3.0,4.0\n");
    write_file(&dir.path().join("b.csv"), "ra,dec,dist,mag\n5.0,6.0,7.0,8.0\n");
    write_file(&dir.path().join("notes.md"), "not a catalog\n");
    let path = dir.path().to_string_lossy().to_string();

    let mut loader = Loader::new(CatalogKind::Stars, -1);
    assert_eq!(2, loader.load_dir(&path).unwrap().len());

    let mut loader = Loader::new(CatalogKind::Stars, 1);
    let stars = loader.load_dir(&path).unwrap();
    assert_eq!(1, stars.len());
    assert_relative_eq!(1.0, stars[0].ra);
}

#[test]
fn test_load_rejects_bad_catalogs() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("nope.csv");
    let mut loader = Loader::new(CatalogKind::Stars, -1);
    assert!(matches!(
        loader.load_dir(&missing.to_string_lossy()),
        Err(Error::MissingCatalog(_))
    ));

    let empty = dir.path().join("empty.csv");
    write_file(&empty, "# only comments\nra,dec,dist,mag\n");
    let mut loader = Loader::new(CatalogKind::Stars, -1);
    assert!(matches!(
        loader.load_dir(&empty.to_string_lossy()),
        Err(Error::EmptyCatalog(_))
    ));

    let bad_number = dir.path().join("bad.csv");
    write_file(&bad_number, "ra,dec,dist,mag\n1.0,2.0,3.0,4.0\n1.0,north,3.0,4.0\n");
    let mut loader = Loader::new(CatalogKind::Stars, -1);
    match loader.load_dir(&bad_number.to_string_lossy()) {
        Err(Error::MalformedCatalog { line, .. }) => assert_eq!(3, line),
        _ => panic!("a non-numeric declination must be fatal"),
    }

    let no_dist = dir.path().join("nodist.csv");
    write_file(&no_dist, "pl_name,ra,dec\nx b,1.0,2.0\n");
    let mut loader = Loader::new(CatalogKind::Exoplanets, -1);
    assert!(matches!(
        loader.load_dir(&no_dist.to_string_lossy()),
        Err(Error::MalformedCatalog { .. })
    ));
}

#[test]
fn test_out_of_range_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("stars.csv");
    write_file(
        &file,
        "ra,dec,dist,mag\n400.0,0.0,1.0,1.0\n10.0,-91.0,1.0,1.0\n360.0,0.0,1.0,1.0\n10.0,0.0,-2.0,1.0\n",
    );
    let mut loader = Loader::new(CatalogKind::Stars, -1);
    let stars = loader.load_dir(&file.to_string_lossy()).unwrap();
    assert_eq!(1, stars.len());
    assert_eq!(0.0, stars[0].ra);
    assert_eq!(2, loader.rejected_range);
    assert_eq!(1, loader.rejected_dist);
}

#[test]
fn test_keep_brightest() {
    let mut stars = vec![
        CelestialBody::new("a", 0.0, 0.0, 1.0, Some(5.0)),
        CelestialBody::new("b", 0.0, 0.0, 1.0, None),
        CelestialBody::new("c", 0.0, 0.0, 1.0, Some(1.0)),
        CelestialBody::new("d", 0.0, 0.0, 1.0, Some(3.0)),
    ];
    pipeline::keep_brightest(&mut stars, 2);
    assert_eq!(vec!["c", "d"], stars.iter().map(|s| s.id.as_str()).collect::<Vec<_>>());

    pipeline::keep_brightest(&mut stars, 10);
    assert_eq!(2, stars.len());
}

#[test]
fn test_parse_mode() {
    assert_eq!(vec![Projection::Skybox], Projection::parse_mode("skybox").unwrap());
    assert_eq!(vec![Projection::Skymap], Projection::parse_mode(" SkyMap ").unwrap());
    assert_eq!(
        vec![Projection::Skybox, Projection::Skymap],
        Projection::parse_mode("all").unwrap()
    );
    assert!(matches!(Projection::parse_mode("fisheye"), Err(Error::UnknownMode(_))));
}

#[test]
fn test_full_run_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = sample_config(dir.path());
    let out = Path::new(&config.output).to_path_buf();

    let reports = Pipeline::new(&config).unwrap().run().unwrap();
    assert_eq!(2, reports.len());
    assert_eq!(Projection::Skybox, reports[0].0);
    // 6 stars, 2 planets, nothing coincides
    assert_eq!(12, reports[0].1.observed);
    assert_eq!(0, reports[0].1.unclassified);

    assert!(out.join("skyboxes.json").is_file());
    assert!(out.join("skymaps.json").is_file());
    let index: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("planets.json")).unwrap()).unwrap();
    assert!(index["Kepler-22 b"]["x_earth"].is_number());
    assert_relative_eq!(1.3012, index["Proxima Cen b"]["dist"].as_f64().unwrap());

    let table = write::read_observations(&out.join("skyboxes.json")).unwrap();
    assert_eq!(6, table["Proxima Cen b"].len());

    let stems = [
        "skybox_ft",
        "skybox_rt",
        "skybox_bk",
        "skybox_lf",
        "skybox_up",
        "skybox_dn",
        "skymap_n",
        "skymap_s",
    ];
    let mut before = Vec::new();
    for planet in ["Kepler-22 b", "Proxima Cen b"] {
        for stem in stems.iter() {
            let png = out.join(planet).join(format!("{}.png", stem));
            assert!(png.is_file(), "{} missing", png.display());
            let img = image::open(&png).unwrap();
            assert_eq!(90, img.width());
            before.push((png.clone(), fs::read(&png).unwrap()));
        }
    }

    // Rendering again from the JSON gives the same bytes
    let again = Config {
        render_only: true,
        ..sample_config(dir.path())
    };
    let reports = Pipeline::new(&again).unwrap().run().unwrap();
    assert_eq!(2, reports.len());
    assert_eq!(12, reports[1].1.observed);
    for (png, bytes) in before {
        assert_eq!(bytes, fs::read(&png).unwrap(), "{} changed", png.display());
    }
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        dry_run: true,
        mode: "skymap".to_string(),
        ..sample_config(dir.path())
    };
    let reports = Pipeline::new(&config).unwrap().run().unwrap();
    assert_eq!(1, reports.len());
    assert_eq!(Projection::Skymap, reports[0].0);
    assert!(!Path::new(&config.output).exists());
}

#[test]
fn test_bad_catalog_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        stars: dir.path().join("missing.csv").to_string_lossy().to_string(),
        ..sample_config(dir.path())
    };
    let result = Pipeline::new(&config).and_then(|p| p.run());
    assert!(matches!(result, Err(Error::MissingCatalog(_))));
    assert!(!Path::new(&config.output).exists());

    let config = Config {
        mode: "fisheye".to_string(),
        ..sample_config(dir.path())
    };
    let result = Pipeline::new(&config).and_then(|p| p.run());
    assert!(matches!(result, Err(Error::UnknownMode(_))));
}

#[test]
fn test_observation_json_layout() {
    let obs = Observation {
        source: "s".to_string(),
        observer: "o".to_string(),
        ra: 1.5,
        dec: -2.0,
        distance: 3.0,
        region: Region::Face(CubeFace::Up),
        x: 4,
        y: 5,
        mag: None,
    };
    let json = serde_json::to_value(&obs).unwrap();
    assert_eq!(3.0, json["L"].as_f64().unwrap());
    assert_eq!("up", json["region"]["face"].as_str().unwrap());
    assert!(json.get("mag").is_none());
}
