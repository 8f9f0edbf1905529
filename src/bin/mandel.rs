// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;
extern crate mandelbrot;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use mandelbrot::escape::DETAIL;
use mandelbrot::output::write_png;
use mandelbrot::{Renderer, View, WriteStrategy};
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_strategy(s: &str) -> Option<WriteStrategy> {
    match s {
        "partitioned" => Some(WriteStrategy::Partitioned),
        "locked" => Some(WriteStrategy::Locked),
        _ => None,
    }
}

fn validate_size(s: &str) -> Result<(), String> {
    match parse_pair::<u16>(s, 'x') {
        Some((w, h)) if w > 0 && h > 0 => Ok(()),
        _ => Err("Could not parse image size; expected WIDTHxHEIGHT".to_string()),
    }
}

fn validate_float(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(f) if f.is_finite() => Ok(()),
        _ => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const ZOOM: &str = "zoom";
const XOFFSET: &str = "x-offset";
const YOFFSET: &str = "y-offset";
const THREADS: &str = "threads";
const DETAILS: &str = "detail";
const STRATEGY: &str = "write-strategy";

fn args<'a>(default_threads: &'a str, default_detail: &'a str) -> ArgMatches<'a> {
    App::new("mandel")
        .version("0.1.0")
        .about("Parallel escape-time Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("result.png")
                .help("Output file; overwritten if it exists"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("2560x1440")
                .validator(|s| validate_size(&s))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .long(ZOOM)
                .allow_hyphen_values(true)
                .short("z")
                .takes_value(true)
                .default_value("0.002")
                .validator(|s| match f64::from_str(&s) {
                    Ok(z) if z.is_finite() && z != 0.0 => Ok(()),
                    _ => Err("Zoom must be a finite, non-zero number".to_string()),
                })
                .help("Zoom level, in plane units per pixel"),
        )
        .arg(
            Arg::with_name(XOFFSET)
                .long(XOFFSET)
                .allow_hyphen_values(true)
                .short("x")
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_float(&s, "Could not parse x offset"))
                .help("x offset from the middle"),
        )
        .arg(
            Arg::with_name(YOFFSET)
                .long(YOFFSET)
                .allow_hyphen_values(true)
                .short("y")
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_float(&s, "Could not parse y offset"))
                .help("y offset from the middle"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value(default_threads)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1024,
                        "Could not parse thread count",
                        "Thread count must be between 1 and 1024",
                    )
                })
                .help("Number of worker threads"),
        )
        .arg(
            Arg::with_name(DETAILS)
                .long(DETAILS)
                .short("d")
                .takes_value(true)
                .default_value(default_detail)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1000,
                        "Could not parse detail level",
                        "Detail must be between 1 and 1000",
                    )
                })
                .help("Render quality; the iteration ceiling is 255 times this"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .long(STRATEGY)
                .short("w")
                .takes_value(true)
                .possible_values(&["partitioned", "locked"])
                .default_value("partitioned")
                .help("How workers write into the canvas"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    let raw = matches.value_of(name).unwrap_or_default();
    T::from_str(raw).map_err(|_| failure::err_msg(format!("Could not parse {} {:?}", name, raw)))
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let size = matches.value_of(SIZE).unwrap_or_default();
    let (width, height) = parse_pair::<usize>(size, 'x')
        .ok_or_else(|| failure::err_msg(format!("Could not parse image size {:?}", size)))?;
    let view = View::new(
        value(matches, XOFFSET)?,
        value(matches, YOFFSET)?,
        value(matches, ZOOM)?,
    )?;
    let strategy = parse_strategy(matches.value_of(STRATEGY).unwrap_or_default())
        .unwrap_or_default();
    let threads: usize = value(matches, THREADS)?;
    let detail: usize = value(matches, DETAILS)?;
    let output = matches.value_of(OUTPUT).unwrap_or("result.png");

    let renderer = Renderer::new(view, width, height, detail)?.with_strategy(strategy);
    let canvas = renderer.render(threads)?;
    write_png(output, &canvas)?;
    info!("wrote {}", output);
    Ok(())
}

fn main() {
    env_logger::init();
    let default_threads = num_cpus::get().max(1).min(1024).to_string();
    let default_detail = DETAIL.to_string();
    let matches = args(&default_threads, &default_detail);

    if let Err(e) = run(&matches) {
        error!("{}", e);
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
