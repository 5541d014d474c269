#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! K-means clustering over geographic coordinates.
//!
//! Partitions crash coordinates into K clusters by iterative centroid
//! relaxation (Lloyd's algorithm) in raw degree-space. Euclidean distance
//! on (latitude, longitude) degrees is an accepted approximation: all
//! inputs lie within one metropolitan area, where degree-distance
//! distortion is negligible.
//!
//! Initialization samples K distinct input points with a seeded
//! multiplicative-congruential generator, so runs are reproducible for a
//! fixed seed. Multiple restarts are run and the lowest-inertia result is
//! kept.

/// Errors from the clustering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    /// Fewer input points than requested clusters; clustering cannot
    /// proceed and nothing is produced.
    #[error("not enough points ({points}) for {clusters} clusters")]
    InsufficientData {
        /// Number of input points supplied.
        points: usize,
        /// Number of clusters requested.
        clusters: usize,
    },
}

/// Configuration for one clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMeansConfig {
    /// Target number of clusters (K).
    pub clusters: usize,
    /// Independent restarts; the lowest-inertia result wins.
    pub restarts: usize,
    /// Iteration cap per restart.
    pub max_iterations: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
}

impl KMeansConfig {
    /// Default number of restarts.
    pub const DEFAULT_RESTARTS: usize = 10;
    /// Default per-restart iteration cap.
    pub const DEFAULT_MAX_ITERATIONS: usize = 300;
    /// Default initialization seed.
    pub const DEFAULT_SEED: u64 = 42;

    /// Creates a config for `clusters` clusters with default restarts,
    /// iteration cap, and seed.
    #[must_use]
    pub const fn new(clusters: usize) -> Self {
        Self {
            clusters,
            restarts: Self::DEFAULT_RESTARTS,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            seed: Self::DEFAULT_SEED,
        }
    }
}

/// Result of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster label (`0..K`) for each input point, in input order.
    pub labels: Vec<usize>,
    /// Final centroid for each label as `[latitude, longitude]`.
    pub centroids: Vec<[f64; 2]>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
}

impl KMeansResult {
    /// Groups point indices by cluster label.
    ///
    /// Returns one `Vec` of input indices per label; clusters that ended
    /// up empty produce an empty `Vec` at their label position.
    #[must_use]
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.centroids.len()];
        for (index, &label) in self.labels.iter().enumerate() {
            members[label].push(index);
        }
        members
    }
}

/// Partitions `points` (as `[latitude, longitude]` degree pairs) into
/// `config.clusters` clusters.
///
/// Every point is assigned to exactly one cluster; labels are dense
/// integers `0..K`. A cluster may end up empty or below any useful size —
/// reconciling that is the caller's concern.
///
/// # Errors
///
/// Returns [`ClusterError::InsufficientData`] when there are fewer points
/// than requested clusters.
///
/// # Panics
///
/// Panics if `config.clusters` is zero.
pub fn cluster(points: &[[f64; 2]], config: &KMeansConfig) -> Result<KMeansResult, ClusterError> {
    assert!(config.clusters > 0, "cluster count must be positive");

    if points.len() < config.clusters {
        return Err(ClusterError::InsufficientData {
            points: points.len(),
            clusters: config.clusters,
        });
    }

    let restarts = config.restarts.max(1);
    let mut best: Option<KMeansResult> = None;

    for restart in 0..restarts {
        let seed = config
            .seed
            .wrapping_add((restart as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let result = lloyd(points, config.clusters, config.max_iterations, seed);

        log::debug!(
            "k-means restart {}/{}: inertia {:.6}",
            restart + 1,
            restarts,
            result.inertia
        );

        match &best {
            Some(current) if current.inertia <= result.inertia => {}
            _ => best = Some(result),
        }
    }

    // restarts >= 1, so at least one result exists.
    Ok(best.unwrap_or_else(|| unreachable!()))
}

/// One Lloyd's-algorithm run from a seeded initialization.
fn lloyd(points: &[[f64; 2]], k: usize, max_iterations: usize, seed: u64) -> KMeansResult {
    let mut centroids = initial_centroids(points, k, seed);
    // Sentinel labels force at least one update pass; a fresh assignment
    // identical to the initial zeros must not read as convergence.
    let mut labels = vec![usize::MAX; points.len()];

    for _ in 0..max_iterations {
        let mut changed = false;

        for (i, point) in points.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if labels[i] != nearest {
                labels[i] = nearest;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        // Recompute centroids as member means; empty clusters keep their
        // previous centroid.
        let mut sums = vec![[0.0f64; 2]; k];
        let mut counts = vec![0usize; k];
        for (i, point) in points.iter().enumerate() {
            let label = labels[i];
            sums[label][0] += point[0];
            sums[label][1] += point[1];
            counts[label] += 1;
        }
        for (label, centroid) in centroids.iter_mut().enumerate() {
            if counts[label] > 0 {
                #[allow(clippy::cast_precision_loss)]
                let n = counts[label] as f64;
                centroid[0] = sums[label][0] / n;
                centroid[1] = sums[label][1] / n;
            }
        }
    }

    // Final assignment pass so labels match the returned centroids.
    let mut inertia = 0.0;
    for (i, point) in points.iter().enumerate() {
        let nearest = nearest_centroid(point, &centroids);
        labels[i] = nearest;
        inertia += squared_distance(point, &centroids[nearest]);
    }

    KMeansResult {
        labels,
        centroids,
        inertia,
    }
}

/// Samples `k` distinct input points as starting centroids via a partial
/// Fisher-Yates shuffle driven by a seeded congruential generator.
fn initial_centroids(points: &[[f64; 2]], k: usize, seed: u64) -> Vec<[f64; 2]> {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    let mut state = seed;

    for i in 0..k {
        state = next_state(state);
        #[allow(clippy::cast_possible_truncation)]
        let offset = (state >> 33) as usize % (points.len() - i);
        indices.swap(i, i + offset);
    }

    indices[..k].iter().map(|&i| points[i]).collect()
}

/// Advances the congruential generator state.
const fn next_state(state: u64) -> u64 {
    state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407)
}

fn nearest_centroid(point: &[f64; 2], centroids: &[[f64; 2]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (label, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = label;
        }
    }
    best
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let dlat = a[0] - b[0];
    let dlon = a[1] - b[1];
    dlat.mul_add(dlat, dlon * dlon)
}
