//! Candidate generators.
//!
//! The first round draws from [`UniformSampler`] over the parameter bounds.
//! Every later round is seeded by [`resample_clusters`], which fits one
//! [`KdeSampler`] per cluster of the previous round's survivors and
//! splits the sample budget evenly between them.

mod kde;
mod resample;
mod uniform;

pub use kde::KdeSampler;
pub use resample::{ClusterDraw, ClusterOutcome, Resampled, SmallClusterPolicy, resample_clusters};
pub use uniform::UniformSampler;

/// Draws parameter vectors.
///
/// Samplers own no randomness; the caller passes its generator so that a
/// seeded run is reproducible end to end.
pub trait Sampler: Send + Sync {
    /// Draws `n` parameter vectors.
    fn draw(&self, n: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>>;
}
