//! Demo: index a directory, then query it by color and by image.
//!
//! ```text
//! chromaseek <image-dir> [color] [--config chromaseek.yaml] [--save catalog.bin]
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to tune them and
//! `CHROMASEEK_LOG_FORMAT=json` for structured output.

use std::error::Error;
use std::path::PathBuf;

use chromaseek::{ChromaConfig, ColorInput, Recommender, RecommenderConfig};
use tracing_subscriber::EnvFilter;

struct Args {
    dir: PathBuf,
    color: ColorInput,
    config: Option<PathBuf>,
    save: Option<PathBuf>,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut save = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = args.next().map(PathBuf::from),
            "--save" => save = args.next().map(PathBuf::from),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let dir = positional
        .next()
        .map(PathBuf::from)
        .ok_or("usage: chromaseek <image-dir> [color] [--config file] [--save file]")?;
    let color = match positional.next() {
        Some(text) => text.parse()?,
        None => ColorInput::hex("#FF0000"),
    };
    Ok(Args {
        dir,
        color,
        config,
        save,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if std::env::var("CHROMASEEK_LOG_FORMAT").is_ok_and(|v| v == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = parse_args()?;

    let cfg = match &args.config {
        Some(path) => ChromaConfig::from_file(path)?.to_recommender_config(),
        None => RecommenderConfig::default(),
    };
    let recursive = cfg.recursive;
    let recommender = Recommender::new(cfg)?;

    let stats = recommender.build_from_directory(&args.dir, recursive)?;
    println!(
        "Indexed {} images ({} failed) in {:?}",
        stats.indexed, stats.failed, stats.duration
    );
    for failure in &stats.failures {
        println!("  skipped {}: {}", failure.path.display(), failure.reason);
    }

    println!("\nClosest to {}:", args.color);
    for hit in recommender.recommend_by_color(&args.color, None)? {
        if let Some(record) = recommender.record(hit.id)? {
            println!("  {:.3}  {}", hit.score, record.path.display());
        }
    }

    if let Some(first) = recommender.record(0)? {
        let colors = recommender.get_image_colors(&first.path)?;
        println!(
            "\nPalette of {}: {}",
            first.path.display(),
            colors.hex_colors.join(" ")
        );
        println!("Similar images:");
        for hit in recommender.recommend_by_image(&first.path, Some(5), true)? {
            if let Some(record) = recommender.record(hit.id)? {
                println!("  {:.3}  {}", hit.score, record.path.display());
            }
        }
    }

    if let Some(path) = &args.save {
        recommender.save_snapshot(path)?;
        println!("\nSaved catalog to {}", path.display());
    }

    Ok(())
}
