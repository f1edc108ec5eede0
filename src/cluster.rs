//! Clustering of projected samples.
//!
//! A [`Clusterer`] assigns one integer label per 2-D point. Labels only need
//! to be consistent within one call; the resampler groups rows by label and
//! treats every distinct label, including DBSCAN's noise label `-1`, as one
//! cluster.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::error::{BoxError, Error, Result};

/// Assigns cluster labels to projected points.
pub trait Clusterer: Send + Sync {
    /// Returns one label per point.
    ///
    /// # Errors
    ///
    /// Any error aborts the round.
    fn cluster(&self, points: &[[f64; 2]]) -> core::result::Result<Vec<i64>, BoxError>;
}

fn dist_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Puts every point in cluster `0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleClusterer;

impl Clusterer for SingleClusterer {
    fn cluster(&self, points: &[[f64; 2]]) -> core::result::Result<Vec<i64>, BoxError> {
        Ok(vec![0; points.len()])
    }
}

/// Lloyd's k-means with k-means++ seeding.
///
/// When there are no more points than clusters, every point gets its own
/// label. The generator is held behind a mutex so that a seeded clusterer
/// gives reproducible labels across calls in a single-threaded run.
///
/// # Examples
///
/// ```
/// use mobo::cluster::{Clusterer, KMeansClusterer};
///
/// let points = [[0.0, 0.0], [0.1, 0.0], [10.0, 10.0], [10.1, 10.0]];
/// let labels = KMeansClusterer::with_seed(2, 42).unwrap().cluster(&points).unwrap();
/// assert_eq!(labels[0], labels[1]);
/// assert_eq!(labels[2], labels[3]);
/// assert_ne!(labels[0], labels[2]);
/// ```
#[derive(Debug)]
pub struct KMeansClusterer {
    k: usize,
    max_iter: usize,
    rng: Mutex<fastrand::Rng>,
}

impl KMeansClusterer {
    /// Creates a clusterer for `k` clusters with a random seed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidClusterer` if `k` is zero.
    pub fn new(k: usize) -> Result<Self> {
        Self::build(k, fastrand::Rng::new())
    }

    /// Creates a clusterer for `k` clusters with a fixed seed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidClusterer` if `k` is zero.
    pub fn with_seed(k: usize, seed: u64) -> Result<Self> {
        Self::build(k, fastrand::Rng::with_seed(seed))
    }

    fn build(k: usize, rng: fastrand::Rng) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidClusterer("k-means needs at least one cluster"));
        }
        Ok(Self {
            k,
            max_iter: 300,
            rng: Mutex::new(rng),
        })
    }

    /// Sets the maximum number of Lloyd iterations (default 300).
    #[must_use]
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    fn seed_centroids(&self, points: &[[f64; 2]], k: usize) -> Vec<[f64; 2]> {
        let mut rng = self.rng.lock();
        let mut centroids = vec![points[rng.usize(0..points.len())]];
        let mut nearest: Vec<f64> = points.iter().map(|&p| dist_sq(p, centroids[0])).collect();

        while centroids.len() < k {
            let total: f64 = nearest.iter().sum();
            let next = if total > 0.0 {
                let mut target = rng.f64() * total;
                nearest
                    .iter()
                    .position(|&d| {
                        target -= d;
                        target <= 0.0
                    })
                    .unwrap_or(points.len() - 1)
            } else {
                rng.usize(0..points.len())
            };
            let c = points[next];
            for (d, &p) in nearest.iter_mut().zip(points) {
                *d = d.min(dist_sq(p, c));
            }
            centroids.push(c);
        }
        centroids
    }
}

impl Clusterer for KMeansClusterer {
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    fn cluster(&self, points: &[[f64; 2]]) -> core::result::Result<Vec<i64>, BoxError> {
        let n = points.len();
        if n <= self.k {
            return Ok((0..n as i64).collect());
        }

        let mut centroids = self.seed_centroids(points, self.k);
        let mut labels = vec![0usize; n];

        for iter in 0..self.max_iter {
            let mut changed = iter == 0;
            for (label, &p) in labels.iter_mut().zip(points) {
                let best = centroids
                    .iter()
                    .enumerate()
                    .map(|(c, &m)| (c, dist_sq(p, m)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map_or(0, |(c, _)| c);
                if best != *label {
                    *label = best;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            let mut sums = vec![[0.0, 0.0]; self.k];
            let mut counts = vec![0usize; self.k];
            for (&label, &p) in labels.iter().zip(points) {
                sums[label][0] += p[0];
                sums[label][1] += p[1];
                counts[label] += 1;
            }
            for c in 0..self.k {
                if counts[c] > 0 {
                    centroids[c] = [sums[c][0] / counts[c] as f64, sums[c][1] / counts[c] as f64];
                } else {
                    // re-seed an empty cluster on the point farthest from its centroid
                    let far = (0..n)
                        .max_by(|&a, &b| {
                            dist_sq(points[a], centroids[labels[a]])
                                .total_cmp(&dist_sq(points[b], centroids[labels[b]]))
                        })
                        .unwrap_or(0);
                    centroids[c] = points[far];
                }
            }
        }

        Ok(labels.into_iter().map(|l| l as i64).collect())
    }
}

/// Density-based clustering; points in sparse regions are labelled `-1`.
///
/// A point is a core point when at least `min_samples` points (itself
/// included) lie within distance `eps`.
#[derive(Clone, Copy, Debug)]
pub struct DbscanClusterer {
    eps: f64,
    min_samples: usize,
}

impl DbscanClusterer {
    /// Label used for noise points.
    pub const NOISE: i64 = -1;

    /// Creates a DBSCAN clusterer.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidClusterer` if `eps` is not positive and finite
    /// or `min_samples` is zero.
    pub fn new(eps: f64, min_samples: usize) -> Result<Self> {
        if !(eps.is_finite() && eps > 0.0) {
            return Err(Error::InvalidClusterer("DBSCAN radius must be positive"));
        }
        if min_samples == 0 {
            return Err(Error::InvalidClusterer("DBSCAN min_samples must be positive"));
        }
        Ok(Self { eps, min_samples })
    }

    fn neighbours(&self, points: &[[f64; 2]], i: usize) -> Vec<usize> {
        let eps_sq = self.eps * self.eps;
        (0..points.len())
            .filter(|&j| dist_sq(points[i], points[j]) <= eps_sq)
            .collect()
    }
}

impl Clusterer for DbscanClusterer {
    fn cluster(&self, points: &[[f64; 2]]) -> core::result::Result<Vec<i64>, BoxError> {
        let n = points.len();
        let mut labels: Vec<Option<i64>> = vec![None; n];
        let mut next = 0_i64;

        for i in 0..n {
            if labels[i].is_some() {
                continue;
            }
            let seeds = self.neighbours(points, i);
            if seeds.len() < self.min_samples {
                labels[i] = Some(Self::NOISE);
                continue;
            }

            let id = next;
            next += 1;
            labels[i] = Some(id);
            let mut queue: VecDeque<usize> = seeds.into_iter().filter(|&j| j != i).collect();
            while let Some(j) = queue.pop_front() {
                match labels[j] {
                    // border point previously marked as noise
                    Some(Self::NOISE) => labels[j] = Some(id),
                    Some(_) => {}
                    None => {
                        labels[j] = Some(id);
                        let reach = self.neighbours(points, j);
                        if reach.len() >= self.min_samples {
                            queue.extend(reach.into_iter().filter(|&m| labels[m].is_none_or(|l| l == Self::NOISE)));
                        }
                    }
                }
            }
        }

        Ok(labels.into_iter().map(|l| l.unwrap_or(Self::NOISE)).collect())
    }
}
