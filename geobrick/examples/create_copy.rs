use std::path::PathBuf;

use geobrick::{GeoTransform, MemRaster};
use structopt::StructOpt;

const WGS84: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#;

/// Write a georeferenced test pattern as PDF.
#[derive(StructOpt, Debug)]
#[structopt(name = "create_copy")]
struct Opt {
    /// Output file
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    /// Raster width in pixels
    #[structopt(long, default_value = "512")]
    width: usize,

    /// Raster height in pixels
    #[structopt(long, default_value = "256")]
    height: usize,

    /// Add an alpha band with a transparent border
    #[structopt(long)]
    alpha: bool,

    /// Creation option as NAME=VALUE, may be repeated
    #[structopt(long = "co")]
    creation_options: Vec<String>,
}

fn pattern(width: usize, height: usize, alpha: bool) -> MemRaster {
    let mut raster = MemRaster::new(width, height, if alpha { 4 } else { 3 });
    for band in 1..=3 {
        if let Some(plane) = raster.band_mut(band) {
            for (i, v) in plane.iter_mut().enumerate() {
                let (x, y) = (i % width, i / width);
                *v = match band {
                    1 => (x * 255 / width.max(1)) as u8,
                    2 => (y * 255 / height.max(1)) as u8,
                    _ => ((x ^ y) & 0xff) as u8,
                };
            }
        }
    }
    if let Some(plane) = raster.band_mut(4) {
        for (i, v) in plane.iter_mut().enumerate() {
            let (x, y) = (i % width, i / width);
            let border = x < 8 || y < 8 || x + 8 >= width || y + 8 >= height;
            *v = if border { 0 } else { 255 };
        }
    }
    // one degree wide, centered on Europe
    let pixel = 1.0 / width.max(1) as f64;
    raster.with_geo_transform(GeoTransform([5.0, pixel, 0.0, 50.0, 0.0, -pixel]), WGS84)
}

pub fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    let options: Vec<(String, String)> = opt
        .creation_options
        .iter()
        .filter_map(|kv| match kv.split_once('=') {
            Some((k, v)) => Some((k.to_owned(), v.to_owned())),
            None => {
                log::warn!("ignoring creation option {:?} without '='", kv);
                None
            }
        })
        .collect();

    let raster = pattern(opt.width, opt.height, opt.alpha);
    let mut last = -1;
    let mut progress = |complete: f64| {
        let percent = (complete * 100.0) as i32;
        if percent / 10 != last / 10 {
            log::info!("{}%", percent);
            last = percent;
        }
        true
    };

    log::debug!("Write PDF file");
    if let Err(e) = geobrick::create_copy(&opt.output, &raster, false, options, &mut progress) {
        log::error!("Error while writing: {}", e);
    }
}
