mod classify;
mod constants;
mod coord;
mod data;
mod error;
mod load;
mod magnitude;
mod math;
mod mem;
mod parse;
mod pipeline;
mod raster;
mod util;
mod write;

#[cfg(test)]
mod tests;

extern crate argparse;

use data::Config;
use error::Error;

use argparse::{ArgumentParser, Store, StoreTrue};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

fn init_logging(debug: bool) -> error::Result<()> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {m}{n}",
        )))
        .build();
    let config = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| Error::Logging(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| Error::Logging(e.to_string()))?;
    Ok(())
}

fn main() {
    // Arguments
    let mut args: Config = Config::default();
    // Parse
    {
        // this block limits scope of borrows by ap.refer() method
        let mut ap = ArgumentParser::new();
        ap.set_description(
            "Re-project star catalogs onto the skies of exoplanets and render skyboxes and sky maps.",
        );
        ap.add_option(
            &["-v", "--version"],
            argparse::Print(env!("CARGO_PKG_VERSION").to_string()),
            "Print version information",
        );
        ap.refer(&mut args.stars).add_option(
            &["-s", "--stars"],
            Store,
            "Star catalog: csv, csv.gz or json file, or a directory of them (ra, dec, dist, mag)",
        );
        ap.refer(&mut args.planets).add_option(
            &["-p", "--planets"],
            Store,
            "Exoplanet catalog: NASA Exoplanet Archive csv or json (pl_name, ra, dec, sy_dist)",
        );
        ap.refer(&mut args.output).add_option(
            &["-o", "--output"],
            Store,
            "Output folder for the intermediate JSON and the per-planet images. Defaults to 'assets'",
        );
        ap.refer(&mut args.mode).add_option(
            &["-m", "--mode"],
            Store,
            "What to generate: skybox, skymap or all. Defaults to all",
        );
        ap.refer(&mut args.width).add_option(
            &["--width"],
            Store,
            "Side of each output image in pixels. Defaults to 1080",
        );
        ap.refer(&mut args.map_scale).add_option(
            &["--mapscale"],
            Store,
            "Sky map pixels per degree of polar distance. Defaults to 6",
        );
        ap.refer(&mut args.origin_ra).add_option(
            &["--originra"],
            Store,
            "Right ascension in degrees placed on the +x axis of the Earth frame. Defaults to 0",
        );
        ap.refer(&mut args.max_stars).add_option(
            &["--maxstars"],
            Store,
            "Keep only the N brightest stars. Negative keeps all",
        );
        ap.refer(&mut args.max_files).add_option(
            &["--maxfiles"],
            Store,
            "Maximum number of catalog files to load from a directory. Negative loads all",
        );
        ap.refer(&mut args.threads).add_option(
            &["--threads"],
            Store,
            "Number of worker threads. 0 uses one per core",
        );
        ap.refer(&mut args.render_only).add_option(
            &["-r", "--renderonly"],
            StoreTrue,
            "Skip the catalogs and render again from the JSON files in the output folder",
        );
        ap.refer(&mut args.dry_run).add_option(
            &["--dryrun"],
            StoreTrue,
            "Compute everything but write no files",
        );
        ap.refer(&mut args.debug).add_option(
            &["-d", "--debug"],
            StoreTrue,
            "Debug logging",
        );
        ap.parse_args_or_exit();
    }

    if let Err(e) = init_logging(args.debug) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    log::debug!("{:?}", args);

    if !args.render_only && (args.stars.is_empty() || args.planets.is_empty()) {
        log::error!("Star and exoplanet catalogs must be specified (--stars, --planets)");
        std::process::exit(1);
    }

    let result = pipeline::Pipeline::new(&args).and_then(|p| p.run());
    match result {
        Ok(reports) => {
            log::info!("Done: {} projection(s) generated in {}", reports.len(), args.output);
            std::process::exit(0);
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
