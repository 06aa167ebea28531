//! Seeded k-means clustering over any averageable element type.
//!
//! Algorithm after W. Liao's reference implementation
//! (http://users.eecs.northwestern.edu/~wkliao/Kmeans/): assign every point
//! to its nearest centroid, move each centroid to the mean of its members,
//! repeat until the stopping rule in [`Convergence`] is met.

use palette::{Lab, Srgb};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::options::{Convergence, DEFAULT_MAX_ITERATIONS};

/// An element k-means can average.
pub trait Clusterable: Copy {
    /// Value such that `x.add(identity()) == x`.
    fn identity() -> Self;
    fn add(self, other: Self) -> Self;
    /// Divide by a member count.
    fn scale_down(self, count: usize) -> Self;
}

impl Clusterable for Lab {
    #[inline]
    fn identity() -> Self {
        Lab::new(0.0, 0.0, 0.0)
    }

    #[inline]
    fn add(self, other: Self) -> Self {
        Lab::new(self.l + other.l, self.a + other.a, self.b + other.b)
    }

    #[inline]
    fn scale_down(self, count: usize) -> Self {
        let n = count as f32;
        Lab::new(self.l / n, self.a / n, self.b / n)
    }
}

impl Clusterable for Srgb {
    #[inline]
    fn identity() -> Self {
        Srgb::new(0.0, 0.0, 0.0)
    }

    #[inline]
    fn add(self, other: Self) -> Self {
        Srgb::new(
            self.red + other.red,
            self.green + other.green,
            self.blue + other.blue,
        )
    }

    #[inline]
    fn scale_down(self, count: usize) -> Self {
        let n = count as f32;
        Srgb::new(self.red / n, self.green / n, self.blue / n)
    }
}

/// A centroid and the number of points assigned to it in the final iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster<T> {
    pub centroid: T,
    pub size: usize,
}

/// Stopping behaviour for [`kmeans`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KMeansConfig {
    pub convergence: Convergence,
    pub max_iterations: Option<usize>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            convergence: Convergence::default(),
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
        }
    }
}

/// Cluster `points` into exactly `k` groups.
///
/// Initial centroids are `k` distinct points drawn without replacement
/// using a generator seeded with `seed`; the same seed and point order
/// always give the same result. Clusters come back in that selection order,
/// unsorted. A centroid that attracts no points keeps its previous value,
/// so some clusters may have `size == 0`.
///
/// Fails with [`Error::TooFewPoints`] when `k > points.len()`.
pub fn kmeans<T, D>(
    points: &[T],
    k: usize,
    seed: u64,
    distance: D,
    config: &KMeansConfig,
) -> Result<Vec<Cluster<T>>>
where
    T: Clusterable,
    D: Fn(&T, &T) -> f32,
{
    run(points, k, seed, distance, config).map(|(clusters, _)| clusters)
}

fn run<T, D>(
    points: &[T],
    k: usize,
    seed: u64,
    distance: D,
    config: &KMeansConfig,
) -> Result<(Vec<Cluster<T>>, usize)>
where
    T: Clusterable,
    D: Fn(&T, &T) -> f32,
{
    let n = points.len();
    if k == 0 {
        return Err(Error::invalid("k", 0));
    }
    if k > n {
        return Err(Error::TooFewPoints { k, points: n });
    }

    let mut centroids = initial_centroids(points, k, seed);
    let mut memberships: Vec<Option<usize>> = vec![None; n];
    let mut sizes: Vec<usize>;
    let mut previous: Option<usize> = None;
    let mut iteration = 0usize;

    loop {
        iteration += 1;
        let mut reassigned = 0usize;
        let mut sums = vec![T::identity(); k];
        let mut new_sizes = vec![0usize; k];

        for (point, membership) in points.iter().zip(memberships.iter_mut()) {
            let nearest = nearest_centroid(point, &centroids, &distance);
            if *membership != Some(nearest) {
                reassigned += 1;
                *membership = Some(nearest);
            }
            new_sizes[nearest] += 1;
            sums[nearest] = T::add(sums[nearest], *point);
        }

        for ((centroid, sum), &size) in centroids.iter_mut().zip(sums).zip(&new_sizes) {
            if size > 0 {
                *centroid = sum.scale_down(size);
            }
        }
        sizes = new_sizes;

        trace!(iteration, reassigned, "k-means pass");

        let converged = match config.convergence {
            Convergence::ReassignedFraction(threshold) => {
                reassigned as f32 / n as f32 <= threshold
            }
            Convergence::ReassignmentDelta(threshold) => previous
                .is_some_and(|p| (reassigned as f32 - p as f32).abs() <= threshold),
        };
        if converged {
            debug!(iterations = iteration, k, points = n, "k-means converged");
            break;
        }
        if config.max_iterations.is_some_and(|cap| iteration >= cap) {
            warn!(
                iterations = iteration,
                reassigned, "k-means stopped at iteration cap"
            );
            break;
        }
        previous = Some(reassigned);
    }

    let clusters = centroids
        .into_iter()
        .zip(sizes)
        .map(|(centroid, size)| Cluster { centroid, size })
        .collect();
    Ok((clusters, iteration))
}

/// Sample `k` distinct indices in a reproducible order.
fn initial_centroids<T: Copy>(points: &[T], k: usize, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    rand::seq::index::sample(&mut rng, points.len(), k)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Index of the closest centroid; ties go to the lowest index.
#[inline]
fn nearest_centroid<T, D>(point: &T, centroids: &[T], distance: &D) -> usize
where
    D: Fn(&T, &T) -> f32,
{
    let mut min_distance = f32::INFINITY;
    let mut index = 0;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = distance(point, centroid);
        if d < min_distance {
            min_distance = d;
            index = i;
        }
    }
    index
}
