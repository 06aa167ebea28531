use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The source image has no pixels at all.
    #[error("Image has no pixels: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// Downscaling to the pixel budget collapsed one axis to zero.
    #[error("Sampling {width}x{height} collapses under a budget of {max_sampled_pixels} pixels")]
    DegenerateSampling {
        width: u32,
        height: u32,
        max_sampled_pixels: usize,
    },

    /// Clustering was asked for more clusters than there are points.
    #[error("Cannot form {k} clusters from {points} opaque samples")]
    TooFewPoints { k: usize, points: usize },

    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
    },

    #[error("Rasterization failed: {0}")]
    Raster(#[from] image::ImageError),
}

impl Error {
    pub(crate) fn invalid(parameter: &'static str, value: impl ToString) -> Self {
        Error::InvalidParameter {
            parameter,
            value: value.to_string(),
        }
    }
}
