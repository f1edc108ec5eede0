use nalgebra::{Cholesky, DMatrix};

use crate::error::{Error, Result};
use crate::rng_util::standard_normal;

/// Smallest accepted ratio between the smallest and largest eigen-scale of
/// the kernel covariance, measured on the Cholesky diagonal.
const MIN_PIVOT_RATIO: f64 = 1e-12;

/// Rule for the factor that scales the sample covariance into the kernel
/// covariance.
///
/// For `n` samples in `d` dimensions:
///
/// | Rule | Factor |
/// |------|--------|
/// | `Scott` | `n^(-1/(d+4))` |
/// | `Silverman` | `(n·(d+2)/4)^(-1/(d+4))` |
/// | `Factor(f)` | `f` |
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KdeBandwidth {
    /// Scott's rule of thumb.
    #[default]
    Scott,
    /// Silverman's rule of thumb.
    Silverman,
    /// A fixed factor.
    Factor(f64),
}

impl KdeBandwidth {
    /// Checks that a fixed factor is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBandwidth` for a non-positive or non-finite
    /// `Factor`.
    pub fn validate(self) -> Result<Self> {
        match self {
            Self::Factor(f) if !(f.is_finite() && f > 0.0) => Err(Error::InvalidBandwidth(f)),
            _ => Ok(self),
        }
    }

    /// Returns the covariance scaling factor for `n` samples in `d` dimensions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn factor(self, n: usize, d: usize) -> f64 {
        let n = n as f64;
        let d = d as f64;
        let exponent = -1.0 / (d + 4.0);
        match self {
            Self::Scott => n.powf(exponent),
            Self::Silverman => (n * (d + 2.0) / 4.0).powf(exponent),
            Self::Factor(f) => f,
        }
    }
}

/// A Gaussian kernel density estimate with a shared kernel covariance.
///
/// Every sample point carries the same kernel `N(0, H)`. For the fitted
/// constructor `H = factor² · Σ`, where `Σ` is the unbiased sample
/// covariance, so correlations between parameters carry over into the
/// draws. [`GaussianKde::diagonal`] builds an estimate with independent
/// per-dimension bandwidths instead.
///
/// # Examples
///
/// ```
/// use mobo::kde::{GaussianKde, KdeBandwidth};
///
/// let samples = vec![
///     vec![0.0, 0.1],
///     vec![1.0, 0.9],
///     vec![2.0, 2.2],
///     vec![0.5, 0.3],
/// ];
/// let kde = GaussianKde::new(samples, KdeBandwidth::Scott).unwrap();
/// assert_eq!(kde.n_dims(), 2);
///
/// let mut rng = fastrand::Rng::with_seed(0);
/// let draws = kde.sample_n(10, &mut rng);
/// assert_eq!(draws.len(), 10);
/// ```
#[derive(Clone, Debug)]
pub struct GaussianKde {
    samples: Vec<Vec<f64>>,
    /// Lower Cholesky factor of the kernel covariance `H`.
    chol: DMatrix<f64>,
    factor: f64,
    n_dims: usize,
}

impl GaussianKde {
    /// Fits an estimate to `samples` with a full kernel covariance.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptySamples` if `samples` is empty,
    /// `Error::ZeroDimensions` if samples have zero dimensions,
    /// `Error::DimensionMismatch` if samples have inconsistent dimensions,
    /// `Error::InvalidBandwidth` for an invalid fixed factor,
    /// `Error::InsufficientSamples` if there are fewer samples than
    /// dimensions (or fewer than two), and `Error::DegenerateCovariance`
    /// if the kernel covariance is not numerically positive definite.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(samples: Vec<Vec<f64>>, bandwidth: KdeBandwidth) -> Result<Self> {
        let n_dims = check_shape(&samples)?;
        let bandwidth = bandwidth.validate()?;
        let n = samples.len();
        if n < n_dims.max(2) {
            return Err(Error::InsufficientSamples {
                n_samples: n,
                n_dims,
            });
        }

        let factor = bandwidth.factor(n, n_dims);
        let mean: Vec<f64> = (0..n_dims)
            .map(|j| samples.iter().map(|s| s[j]).sum::<f64>() / n as f64)
            .collect();
        let scale = factor * factor / (n - 1) as f64;
        let cov = DMatrix::from_fn(n_dims, n_dims, |r, c| {
            samples
                .iter()
                .map(|s| (s[r] - mean[r]) * (s[c] - mean[c]))
                .sum::<f64>()
                * scale
        });

        let degenerate = Error::DegenerateCovariance {
            n_samples: n,
            n_dims,
        };
        let Some(chol) = Cholesky::new(cov) else {
            return Err(degenerate);
        };
        let chol = chol.l();

        let pivots: Vec<f64> = chol.diagonal().iter().map(|v| v * v).collect();
        let max = pivots.iter().copied().fold(0.0, f64::max);
        let min = pivots.iter().copied().fold(f64::INFINITY, f64::min);
        if !(max > 0.0 && min / max >= MIN_PIVOT_RATIO) {
            return Err(degenerate);
        }

        Ok(Self {
            samples,
            chol,
            factor,
            n_dims,
        })
    }

    /// Builds an estimate with independent Gaussian kernels of standard
    /// deviation `bandwidths[j]` in dimension `j`.
    ///
    /// Unlike [`GaussianKde::new`] this accepts any number of samples,
    /// including a single one.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptySamples`, `Error::ZeroDimensions` or
    /// `Error::DimensionMismatch` for malformed samples, and
    /// `Error::InvalidBandwidth` if a bandwidth is not positive and finite
    /// or the number of bandwidths differs from the dimension count.
    pub fn diagonal(samples: Vec<Vec<f64>>, bandwidths: &[f64]) -> Result<Self> {
        let n_dims = check_shape(&samples)?;
        if bandwidths.len() != n_dims {
            return Err(Error::DimensionMismatch {
                expected: n_dims,
                got: bandwidths.len(),
                sample_index: 0,
            });
        }
        if let Some(&bw) = bandwidths.iter().find(|bw| !(bw.is_finite() && **bw > 0.0)) {
            return Err(Error::InvalidBandwidth(bw));
        }
        let chol = DMatrix::from_fn(n_dims, n_dims, |r, c| if r == c { bandwidths[r] } else { 0.0 });
        Ok(Self {
            samples,
            chol,
            factor: 1.0,
            n_dims,
        })
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    /// Returns the number of kernel centers.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns the covariance scaling factor (1.0 for diagonal estimates).
    #[must_use]
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Returns the kernel covariance `H` as a dense row-major matrix.
    #[must_use]
    pub fn kernel_covariance(&self) -> Vec<Vec<f64>> {
        let h = &self.chol * self.chol.transpose();
        (0..self.n_dims)
            .map(|r| (0..self.n_dims).map(|c| h[(r, c)]).collect())
            .collect()
    }

    /// Returns the log density at `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != self.n_dims()`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn log_pdf(&self, x: &[f64]) -> f64 {
        assert_eq!(
            x.len(),
            self.n_dims,
            "Point dimension {} doesn't match KDE dimension {}",
            x.len(),
            self.n_dims
        );

        let d = self.n_dims as f64;
        let log_det_half: f64 = self.chol.diagonal().iter().map(|v| v.ln()).sum();
        let log_norm = -0.5 * d * (2.0 * core::f64::consts::PI).ln() - log_det_half;

        let log_kernels: Vec<f64> = self
            .samples
            .iter()
            .map(|s| {
                let diff: Vec<f64> = x.iter().zip(s).map(|(a, b)| a - b).collect();
                log_norm - 0.5 * self.mahalanobis_sq(&diff)
            })
            .collect();

        // log-sum-exp
        let max = log_kernels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max.is_infinite() && max < 0.0 {
            return f64::NEG_INFINITY;
        }
        let sum: f64 = log_kernels.iter().map(|lk| (lk - max).exp()).sum();
        max + sum.ln() - (self.samples.len() as f64).ln()
    }

    /// Returns the density at `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != self.n_dims()`.
    #[must_use]
    pub fn pdf(&self, x: &[f64]) -> f64 {
        self.log_pdf(x).exp()
    }

    /// Draws one point: a uniformly chosen center plus `L·z` with `z`
    /// standard normal.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Vec<f64> {
        let center = &self.samples[rng.usize(0..self.samples.len())];
        let z: Vec<f64> = (0..self.n_dims).map(|_| standard_normal(rng)).collect();
        center
            .iter()
            .enumerate()
            .map(|(r, &c)| c + (0..=r).map(|k| self.chol[(r, k)] * z[k]).sum::<f64>())
            .collect()
    }

    /// Draws `n` points.
    pub fn sample_n(&self, n: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// `|L⁻¹ v|²` by forward substitution.
    fn mahalanobis_sq(&self, v: &[f64]) -> f64 {
        let mut y = vec![0.0; self.n_dims];
        for (r, &vr) in v.iter().enumerate() {
            let partial: f64 = (0..r).map(|k| self.chol[(r, k)] * y[k]).sum();
            y[r] = (vr - partial) / self.chol[(r, r)];
        }
        y.iter().map(|v| v * v).sum()
    }
}

fn check_shape(samples: &[Vec<f64>]) -> Result<usize> {
    let Some(first) = samples.first() else {
        return Err(Error::EmptySamples);
    };
    let n_dims = first.len();
    if n_dims == 0 {
        return Err(Error::ZeroDimensions);
    }
    for (i, sample) in samples.iter().enumerate() {
        if sample.len() != n_dims {
            return Err(Error::DimensionMismatch {
                expected: n_dims,
                got: sample.len(),
                sample_index: i,
            });
        }
    }
    Ok(n_dims)
}
