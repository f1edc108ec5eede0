//! Per-cluster resampling between rounds.
//!
//! Survivors of round `i` are grouped by cluster label. The sample budget
//! `n` of round `i + 1` is split evenly: every cluster gets
//! `quota = n / k` draws from its own kernel density estimate, and the
//! remainder `n mod k` is dropped. A cluster that cannot support a
//! full-covariance estimate is handled according to [`SmallClusterPolicy`].

use super::{KdeSampler, Sampler};
use crate::error::{Error, Result};
use crate::kde::KdeBandwidth;
use crate::log::Logger;
use crate::parameter::Parameter;
use crate::population::Population;

/// What to do with a cluster too small or too flat for a full-covariance
/// density estimate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SmallClusterPolicy {
    /// Draw nothing for the cluster and log a warning.
    #[default]
    Skip,
    /// Draw the cluster's quota from independent Gaussian kernels centred
    /// on its members, with standard deviation `scale × (upper − lower)`
    /// per parameter.
    Perturb(f64),
}

impl SmallClusterPolicy {
    /// Checks that a perturbation scale is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBandwidth` otherwise.
    pub fn validate(self) -> Result<Self> {
        match self {
            Self::Perturb(s) if !(s.is_finite() && s > 0.0) => Err(Error::InvalidBandwidth(s)),
            _ => Ok(self),
        }
    }
}

/// How a cluster contributed to the next round.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClusterOutcome {
    /// A full-covariance estimate was fitted with this bandwidth factor.
    Fitted {
        /// Covariance scaling factor.
        bandwidth_factor: f64,
    },
    /// The cluster was degenerate and its members were perturbed.
    Perturbed,
    /// The cluster was degenerate and contributed nothing.
    Skipped,
}

/// Resampling summary for one cluster.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterDraw {
    /// Cluster label.
    pub cluster_id: i64,
    /// Number of surviving members.
    pub members: usize,
    /// Number of points drawn.
    pub drawn: usize,
    /// How the draws were produced.
    pub outcome: ClusterOutcome,
}

/// Result of [`resample_clusters`].
#[derive(Clone, Debug, Default)]
pub struct Resampled {
    /// Drawn parameter rows, cluster by cluster in ascending label order.
    pub draws: Vec<Vec<f64>>,
    /// One entry per cluster, in ascending label order.
    pub clusters: Vec<ClusterDraw>,
    /// Per-cluster quota.
    pub quota: usize,
    /// Budget dropped by the integer split.
    pub remainder: usize,
}

/// Draws the next round's candidates from the clusters of `population`.
///
/// Only rows carrying a cluster label take part. Draws are not clipped to
/// the parameter bounds.
///
/// # Errors
///
/// Returns `Error::InvalidBandwidth` for an invalid bandwidth factor or
/// perturbation scale. Degenerate clusters are not errors; they are logged
/// and handled by `policy`.
pub fn resample_clusters(
    population: &Population,
    n: usize,
    parameters: &[Parameter],
    bandwidth: KdeBandwidth,
    policy: SmallClusterPolicy,
    rng: &mut fastrand::Rng,
    logger: &dyn Logger,
) -> Result<Resampled> {
    let bandwidth = bandwidth.validate()?;
    let policy = policy.validate()?;

    let groups = population.cluster_groups();
    let k = groups.len();
    if k == 0 {
        return Ok(Resampled::default());
    }
    let quota = n / k;
    let remainder = n % k;
    if remainder > 0 {
        logger.info(&format!(
            "splitting {n} samples over {k} clusters: {quota} each, {remainder} dropped"
        ));
    }

    let mut out = Resampled {
        draws: Vec::with_capacity(quota * k),
        clusters: Vec::with_capacity(k),
        quota,
        remainder,
    };

    for (cluster_id, members) in groups {
        let n_members = members.len();
        let (sampler, outcome) = match KdeSampler::fit(members.clone(), bandwidth) {
            Ok(sampler) => {
                let bandwidth_factor = sampler.kde().factor();
                (Some(sampler), ClusterOutcome::Fitted { bandwidth_factor })
            }
            Err(e @ (Error::InsufficientSamples { .. } | Error::DegenerateCovariance { .. })) => {
                match policy {
                    SmallClusterPolicy::Skip => {
                        logger.warn(&format!("cluster {cluster_id} skipped: {e}"));
                        (None, ClusterOutcome::Skipped)
                    }
                    SmallClusterPolicy::Perturb(scale) => {
                        logger.warn(&format!(
                            "cluster {cluster_id}: {e}; perturbing its {n_members} members"
                        ));
                        let sampler = KdeSampler::perturb(members, parameters, scale)?;
                        (Some(sampler), ClusterOutcome::Perturbed)
                    }
                }
            }
            Err(e) => return Err(e),
        };

        let drawn = match sampler {
            Some(sampler) => {
                let rows = sampler.draw(quota, rng);
                let drawn = rows.len();
                out.draws.extend(rows);
                drawn
            }
            None => 0,
        };
        trace_debug!(cluster_id, members = n_members, drawn, "cluster resampled");
        out.clusters.push(ClusterDraw {
            cluster_id,
            members: n_members,
            drawn,
            outcome,
        });
    }

    Ok(out)
}
