//! Command line entry point

use crate::analysis::{synthesize, TagMap};
use crate::arch::z80::Z80;
use crate::cli::common::{address_arg, load_image, resolve_range};
use crate::codemap::CodeMapFormat;
use crate::project::Config;
use clap::{App, Arg};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::{fs, io};

/// Options shared by every image classified in one run.
struct Options<'a> {
    org: Option<u32>,
    start: Option<u32>,
    end: Option<u32>,
    code_map: Option<&'a Path>,
}

pub fn configure_app<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.arg(
        Arg::with_name("images")
            .value_name("game.bin")
            .multiple(true)
            .required(true)
            .index(1)
            .help("The memory image(s) to classify; raw binaries or 48K .sna snapshots"),
    )
    .arg(
        Arg::with_name("org")
            .long("org")
            .value_name("$8000")
            .takes_value(true)
            .help("The address a raw binary is loaded at"),
    )
    .arg(
        Arg::with_name("start")
            .long("start")
            .value_name("$8000")
            .takes_value(true)
            .help("The first address to classify"),
    )
    .arg(
        Arg::with_name("end")
            .long("end")
            .value_name("65536")
            .takes_value(true)
            .help("The address to stop classifying at (exclusive)"),
    )
    .arg(
        Arg::with_name("map")
            .long("map")
            .value_name("game.map")
            .takes_value(true)
            .help("An execution trace (code map) recorded by an emulator"),
    )
    .arg(
        Arg::with_name("map_format")
            .long("map-format")
            .value_name("fuse")
            .takes_value(true)
            .help("The code map's format, if it cannot be detected"),
    )
    .arg(
        Arg::with_name("config")
            .long("config")
            .value_name("zxmap.json")
            .takes_value(true)
            .help("The configuration file to load"),
    )
}

fn classify(
    name: &str,
    options: &Options<'_>,
    config: &Config,
    decoder: &Z80,
) -> io::Result<TagMap> {
    let path = Path::new(name);
    let data = fs::read(path)?;
    let (image, image_range) = load_image(path, &data, options.org)?;
    let range = resolve_range(image_range, options.start, options.end)?;

    log::info!("Loaded {} ({} bytes)", name, data.len());

    Ok(synthesize(
        &image,
        decoder,
        config,
        range.start,
        range.end,
        options.code_map,
    )?)
}

pub fn main() -> io::Result<()> {
    let matches = configure_app(app_from_crate!()).get_matches();

    let options = Options {
        org: address_arg("org", matches.value_of("org"))?,
        start: address_arg("start", matches.value_of("start"))?,
        end: address_arg("end", matches.value_of("end"))?,
        code_map: matches.value_of("map").map(Path::new),
    };

    let mut config = match matches.value_of("config") {
        Some(filename) => Config::read(Path::new(filename))?,
        None => Config::default(),
    };

    if let Some(format) = matches.value_of("map_format") {
        let format = CodeMapFormat::from_str(format).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Unknown code map format {}", format),
            )
        })?;

        config = config.with_code_map_format(format);
    }

    let decoder = Z80::new(config.repeat_ceilings());
    let images: Vec<&str> = matches
        .values_of("images")
        .map(|values| values.collect())
        .unwrap_or_default();

    let maps: Vec<io::Result<(&str, TagMap)>> = images
        .par_iter()
        .map(|name| classify(name, &options, &config, &decoder).map(|map| (*name, map)))
        .collect();

    let mut output = BTreeMap::new();
    for result in maps {
        let (name, map) = result?;
        output.insert(name, map);
    }

    let stdout = io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &output)?;
    println!();

    Ok(())
}
