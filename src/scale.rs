//! Column-wise scaling of error matrices.
//!
//! Scalers bring QoI error columns of different magnitude onto a common
//! scale before they are reduced to a score (see
//! [`ScaledSum`](crate::filter::ScaledSum)). Statistics are computed from
//! the finite entries of each column only; non-finite entries pass through
//! as NaN so the filters can reject their rows.
//!
//! | Scaler | Transform per column |
//! |--------|----------------------|
//! | [`StandardScaler`] | `(x - mean) / std` |
//! | [`RobustScaler`] | `(x - median) / (q_upper - q_lower)` |
//!
//! A column with zero spread is centred but not divided.

use crate::error::{Error, Result};

/// Rescales an error matrix column by column, keeping its shape.
pub trait Scaler: Send + Sync {
    /// Returns the scaled copy of `data`.
    fn scale(&self, data: &[Vec<f64>]) -> Vec<Vec<f64>>;
}

/// Removes the mean and divides by the population standard deviation.
///
/// # Examples
///
/// ```
/// use mobo::scale::{Scaler, StandardScaler};
///
/// let scaled = StandardScaler.scale(&[vec![1.0], vec![3.0]]);
/// assert_eq!(scaled, vec![vec![-1.0], vec![1.0]]);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardScaler;

impl Scaler for StandardScaler {
    #[allow(clippy::cast_precision_loss)]
    fn scale(&self, data: &[Vec<f64>]) -> Vec<Vec<f64>> {
        scale_columns(data, |column| {
            let n = column.len() as f64;
            let mean = column.iter().sum::<f64>() / n;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            (mean, var.sqrt())
        })
    }
}

/// Removes the median and divides by an inter-quantile range, which keeps
/// a few extreme errors from dominating the scale.
#[derive(Clone, Copy, Debug)]
pub struct RobustScaler {
    lower: f64,
    upper: f64,
}

impl RobustScaler {
    /// Creates a scaler using the `[lower, upper]` percentile range.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPercentile` if either bound lies outside
    /// `[0, 100]` or `lower >= upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        for p in [lower, upper] {
            if !(0.0..=100.0).contains(&p) {
                return Err(Error::InvalidPercentile(p));
            }
        }
        if lower >= upper {
            return Err(Error::InvalidPercentile(lower));
        }
        Ok(Self { lower, upper })
    }

    /// Returns the percentile range.
    #[must_use]
    pub fn quantile_range(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

impl Default for RobustScaler {
    /// The interquartile range, `[25, 75]`.
    fn default() -> Self {
        Self {
            lower: 25.0,
            upper: 75.0,
        }
    }
}

impl Scaler for RobustScaler {
    fn scale(&self, data: &[Vec<f64>]) -> Vec<Vec<f64>> {
        scale_columns(data, |column| {
            let at = |p: f64| quantile(column, p / 100.0).unwrap_or(0.0);
            (at(50.0), at(self.upper) - at(self.lower))
        })
    }
}

/// Applies `(x - center) / spread` per column, where `stats` maps the
/// finite entries of a column to `(center, spread)`.
fn scale_columns(data: &[Vec<f64>], stats: impl Fn(&[f64]) -> (f64, f64)) -> Vec<Vec<f64>> {
    let width = data.iter().map(Vec::len).max().unwrap_or(0);
    let params: Vec<(f64, f64)> = (0..width)
        .map(|col| {
            let finite: Vec<f64> = data
                .iter()
                .filter_map(|row| row.get(col).copied())
                .filter(|v| v.is_finite())
                .collect();
            if finite.is_empty() {
                return (0.0, 1.0);
            }
            let (center, spread) = stats(&finite);
            (center, if spread > f64::EPSILON { spread } else { 1.0 })
        })
        .collect();

    data.iter()
        .map(|row| {
            row.iter()
                .zip(&params)
                .map(|(&v, &(center, spread))| {
                    if v.is_finite() { (v - center) / spread } else { f64::NAN }
                })
                .collect()
        })
        .collect()
}

/// Linearly interpolated quantile `q ∈ [0, 1]` of the finite entries of
/// `values`. `None` when no entry is finite.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_unstable_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (finite.len() - 1) as f64;
    let below = pos.floor() as usize;
    let above = pos.ceil() as usize;
    let weight = pos - below as f64;
    Some(finite[below] + (finite[above] - finite[below]) * weight)
}
