use super::Sampler;
use crate::error::{Error, Result};
use crate::kde::{GaussianKde, KdeBandwidth};
use crate::parameter::Parameter;

/// Draws from a Gaussian kernel density estimate of one cluster.
#[derive(Clone, Debug)]
pub struct KdeSampler {
    kde: GaussianKde,
}

impl KdeSampler {
    /// Fits a full-covariance estimate to `members`.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`GaussianKde::new`], notably
    /// `Error::InsufficientSamples` and `Error::DegenerateCovariance` for
    /// clusters that cannot support a density.
    pub fn fit(members: Vec<Vec<f64>>, bandwidth: KdeBandwidth) -> Result<Self> {
        Ok(Self {
            kde: GaussianKde::new(members, bandwidth)?,
        })
    }

    /// Builds a diagonal estimate around `members` whose bandwidth in each
    /// dimension is `scale` times the parameter's width.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBandwidth` if `scale` is not positive and
    /// finite, and propagates [`GaussianKde::diagonal`] errors.
    pub fn perturb(members: Vec<Vec<f64>>, parameters: &[Parameter], scale: f64) -> Result<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::InvalidBandwidth(scale));
        }
        let bandwidths: Vec<f64> = parameters.iter().map(|p| scale * p.width()).collect();
        Ok(Self {
            kde: GaussianKde::diagonal(members, &bandwidths)?,
        })
    }

    /// Returns the underlying estimate.
    #[must_use]
    pub fn kde(&self) -> &GaussianKde {
        &self.kde
    }
}

impl Sampler for KdeSampler {
    fn draw(&self, n: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
        self.kde.sample_n(n, rng)
    }
}
