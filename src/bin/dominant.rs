use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dominant_color::{Accuracy, ClusterCount, DominantColorOptions, dominant_swatches};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Print the dominant colors of one or more images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Pixel budget; larger images are downscaled to fit
    #[arg(short = 'n', long, default_value_t = 1000)]
    max_pixels: usize,

    /// Grouping accuracy: low (CIE76), medium (CIE94) or high (CIE2000)
    #[arg(short, long, default_value = "medium")]
    accuracy: Accuracy,

    /// Seed for centroid initialization
    #[arg(short, long, default_value_t = 3571)]
    seed: u64,

    /// Cache RGB to LAB conversions (helps on flat-color images)
    #[arg(short, long)]
    memoize: bool,

    /// Derive the cluster count from the sample size instead of using 16
    #[arg(long)]
    sqrt_k: bool,

    /// Emit JSON instead of one hex color per line
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut options = DominantColorOptions::default()
        .with_max_sampled_pixels(args.max_pixels)
        .with_accuracy(args.accuracy)
        .with_seed(args.seed)
        .with_memoized_conversions(args.memoize);
    if args.sqrt_k {
        options = options.with_cluster_count(ClusterCount::SquareRoot);
    }

    let mut report = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let img = image::open(input)
            .with_context(|| format!("failed to open {}", input.display()))?;
        let swatches = dominant_swatches(&img, &options)
            .with_context(|| format!("dominant color extraction failed for {}", input.display()))?;

        if args.json {
            let colors: Vec<_> = swatches
                .iter()
                .map(|s| json!({ "hex": s.to_hex(), "fraction": s.fraction, "population": s.population }))
                .collect();
            report.push(json!({ "path": input.display().to_string(), "colors": colors }));
        } else {
            println!("{}", input.display());
            for swatch in &swatches {
                println!("  {}  {:>5.1}%", swatch.to_hex(), swatch.fraction * 100.0);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
