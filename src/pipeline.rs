use palette::{Lab, Srgb};
use tracing::debug;

use crate::conversion::lab_to_rgb;
use crate::difference::ColorDifference;
use crate::error::Result;
use crate::kmeans::{KMeansConfig, kmeans};
use crate::options::DominantColorOptions;
use crate::sampler::{RasterSource, sample_image};

/// One dominant color and how much of the sampled image it covers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Swatch {
    /// Centroid converted back to RGB, clamped to `[0, 1]`.
    pub color: Srgb,
    /// Centroid in LAB, as clustered.
    pub lab: Lab,
    /// Number of sampled pixels assigned to this color.
    pub population: usize,
    /// `population` over the total number of opaque samples.
    pub fraction: f32,
}

impl Swatch {
    /// `#RRGGBB`, channels rounded to 8 bits.
    pub fn to_hex(&self) -> String {
        let c: Srgb<u8> = self.color.into_format();
        format!("#{:02X}{:02X}{:02X}", c.red, c.green, c.blue)
    }
}

/// Compute the dominant colors of `image`, most dominant first.
///
/// Steps performed:
/// 1. Downscale to fit `max_sampled_pixels` and rasterize to RGBA8.
/// 2. Convert every fully opaque pixel to LAB.
/// 3. Run seeded k-means with the metric selected by `accuracy`.
/// 4. Sort clusters by member count (stable, so equal counts keep their
///    selection order), drop empty ones, and convert centroids back to RGB.
///
/// The result is fully determined by the image and `options`. Runs
/// synchronously; call it off any latency-sensitive thread for big budgets.
pub fn dominant_swatches<S>(image: &S, options: &DominantColorOptions) -> Result<Vec<Swatch>>
where
    S: RasterSource + ?Sized,
{
    options.validate()?;

    // ----------------------
    // 1. Sample
    // ----------------------
    let samples = sample_image(image, options.max_sampled_pixels, options.memoize_conversions)?;

    // ----------------------
    // 2. Cluster
    // ----------------------
    let k = options.cluster_count.resolve(samples.len());
    let metric = ColorDifference::from(options.accuracy);
    debug!(
        k,
        samples = samples.len(),
        accuracy = %options.accuracy,
        seed = options.seed,
        "clustering samples"
    );

    let config = KMeansConfig {
        convergence: options.convergence,
        max_iterations: options.max_iterations,
    };
    let mut clusters = kmeans(
        &samples,
        k,
        options.seed,
        |a: &Lab, b: &Lab| metric.squared(a, b),
        &config,
    )?;

    // ----------------------
    // 3. Rank
    // ----------------------
    clusters.sort_by(|a, b| b.size.cmp(&a.size));

    let total = samples.len() as f32;
    let swatches = clusters
        .into_iter()
        .filter(|cluster| cluster.size > 0)
        .map(|cluster| {
            let rgb = lab_to_rgb(cluster.centroid);
            Swatch {
                color: Srgb::new(
                    rgb.red.clamp(0.0, 1.0),
                    rgb.green.clamp(0.0, 1.0),
                    rgb.blue.clamp(0.0, 1.0),
                ),
                lab: cluster.centroid,
                population: cluster.size,
                fraction: cluster.size as f32 / total,
            }
        })
        .collect();
    Ok(swatches)
}

/// Dominant colors of `image`, most dominant first.
///
/// Fails with [`crate::Error::TooFewPoints`] when the image has fewer opaque
/// samples than clusters, including a fully transparent image.
pub fn dominant_colors<S>(image: &S, options: &DominantColorOptions) -> Result<Vec<Srgb>>
where
    S: RasterSource + ?Sized,
{
    Ok(dominant_swatches(image, options)?
        .into_iter()
        .map(|swatch| swatch.color)
        .collect())
}
