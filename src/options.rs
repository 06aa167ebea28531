use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// How closely similar colors are grouped. Selects the distance metric
/// only; clustering always happens in CIELAB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Accuracy {
    /// CIE76: Euclidean distance.
    Low,
    /// CIE94: perceptual non-uniformity corrections.
    #[default]
    Medium,
    /// CIE2000: additional corrections for neutrals, lightness, chroma and hue.
    High,
}

impl FromStr for Accuracy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "cie76" => Ok(Accuracy::Low),
            "medium" | "cie94" => Ok(Accuracy::Medium),
            "high" | "cie2000" => Ok(Accuracy::High),
            _ => Err(Error::invalid("accuracy", s)),
        }
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Accuracy::Low => "low",
            Accuracy::Medium => "medium",
            Accuracy::High => "high",
        };
        f.write_str(name)
    }
}

/// Policy for the number of clusters `k`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterCount {
    /// Always use this many clusters, independent of the sample size.
    Fixed(usize),
    /// `max(1, floor(sqrt(n / 2)))` for `n` samples.
    SquareRoot,
}

impl Default for ClusterCount {
    fn default() -> Self {
        ClusterCount::Fixed(DEFAULT_CLUSTER_COUNT)
    }
}

impl ClusterCount {
    pub fn resolve(self, samples: usize) -> usize {
        match self {
            ClusterCount::Fixed(k) => k,
            ClusterCount::SquareRoot => ((samples as f64 / 2.0).sqrt() as usize).max(1),
        }
    }
}

/// Stopping rule for k-means.
///
/// `reassigned` below is the number of points whose cluster changed in the
/// last iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Convergence {
    /// Stop once `reassigned / n <= threshold`.
    ReassignedFraction(f32),
    /// Stop once `|reassigned - previous reassigned| <= threshold`. This
    /// can settle on an oscillation where the count is large but stable.
    ReassignmentDelta(f32),
}

impl Default for Convergence {
    fn default() -> Self {
        Convergence::ReassignedFraction(DEFAULT_THRESHOLD)
    }
}

impl Convergence {
    pub fn threshold(self) -> f32 {
        match self {
            Convergence::ReassignedFraction(t) | Convergence::ReassignmentDelta(t) => t,
        }
    }
}

pub const DEFAULT_MAX_SAMPLED_PIXELS: usize = 1000;
pub const DEFAULT_SEED: u64 = 3571;
pub const DEFAULT_CLUSTER_COUNT: usize = 16;
pub const DEFAULT_THRESHOLD: f32 = 0.0001;
pub const DEFAULT_MAX_ITERATIONS: usize = 500;

/// Parameters for [`crate::dominant_colors`].
#[derive(Clone, Debug, PartialEq)]
pub struct DominantColorOptions {
    /// Pixel budget. Larger images are downscaled to fit.
    pub max_sampled_pixels: usize,
    pub accuracy: Accuracy,
    /// Seed for centroid initialization. Same seed, same colors.
    pub seed: u64,
    /// Cache RGB → LAB conversions per distinct pixel value. Only pays off
    /// for images made mostly of flat colors.
    pub memoize_conversions: bool,
    pub cluster_count: ClusterCount,
    pub convergence: Convergence,
    /// Hard cap on k-means iterations. `None` runs until convergence.
    pub max_iterations: Option<usize>,
}

impl Default for DominantColorOptions {
    fn default() -> Self {
        Self {
            max_sampled_pixels: DEFAULT_MAX_SAMPLED_PIXELS,
            accuracy: Accuracy::default(),
            seed: DEFAULT_SEED,
            memoize_conversions: false,
            cluster_count: ClusterCount::default(),
            convergence: Convergence::default(),
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
        }
    }
}

impl DominantColorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_sampled_pixels(mut self, max_sampled_pixels: usize) -> Self {
        self.max_sampled_pixels = max_sampled_pixels;
        self
    }

    pub fn with_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_memoized_conversions(mut self, memoize: bool) -> Self {
        self.memoize_conversions = memoize;
        self
    }

    pub fn with_cluster_count(mut self, cluster_count: ClusterCount) -> Self {
        self.cluster_count = cluster_count;
        self
    }

    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_sampled_pixels == 0 {
            return Err(Error::invalid("max_sampled_pixels", 0));
        }
        if self.cluster_count == ClusterCount::Fixed(0) {
            return Err(Error::invalid("cluster_count", 0));
        }
        let threshold = self.convergence.threshold();
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::invalid("convergence_threshold", threshold));
        }
        if self.max_iterations == Some(0) {
            return Err(Error::invalid("max_iterations", 0));
        }
        Ok(())
    }
}
