//! Perceptual dominant-color extraction.
//!
//! An image is downscaled to a pixel budget, its opaque pixels are converted
//! to CIELAB, and a seeded k-means groups them under a CIE76, CIE94 or
//! CIE2000 metric. Cluster centroids come back as RGB, most prevalent first.
//!
//! ```no_run
//! use dominant_color::{Accuracy, DominantColorOptions, dominant_colors};
//!
//! let img = image::open("photo.jpg").unwrap();
//! let options = DominantColorOptions::default().with_accuracy(Accuracy::High);
//! for color in dominant_colors(&img, &options).unwrap() {
//!     println!("{color:?}");
//! }
//! ```

pub mod conversion;
pub mod difference;
pub mod error;
pub mod kmeans;
pub mod options;
pub mod pipeline;
pub mod sampler;
mod wasm;

pub use conversion::{lab_to_rgb, rgb_to_lab};
pub use difference::{Cie94, Cie2000, ColorDifference, cie76_squared};
pub use error::{Error, Result};
pub use kmeans::{Cluster, Clusterable, KMeansConfig, kmeans};
pub use options::{Accuracy, ClusterCount, Convergence, DominantColorOptions};
pub use pipeline::{Swatch, dominant_colors, dominant_swatches};
pub use sampler::{ConversionCache, RasterSource, scaled_dimensions};
pub use wasm::dominant_colors_js;
