//! Reduction of error rows to scalar scores.
//!
//! The percentile and z-score filters rank rows by a score computed from
//! the whole error matrix by a [`Scorer`]. Lower scores are better. A
//! non-finite score marks a row that cannot be ranked; the shipped filters
//! never keep such rows.
//!
//! | Scorer | Score of a row |
//! |--------|----------------|
//! | [`AbsSum`] (default) | Sum of absolute errors, optionally divided by each column's spread |
//! | [`ScaledSum`] | Sum of absolute errors after a column-wise [`Scaler`] |
//! | any `Fn(&[Vec<f64>]) -> Vec<f64>` | Whatever the closure returns, one value per row |

use crate::scale::Scaler;

/// Maps an error matrix to one score per row.
///
/// Implementations must return exactly one score per input row.
///
/// # Examples
///
/// ```
/// use mobo::filter::{Filter, PercentileFilter};
///
/// // Rank rows by their worst error instead of the sum.
/// let worst = |errors: &[Vec<f64>]| -> Vec<f64> {
///     errors
///         .iter()
///         .map(|row| row.iter().fold(0.0_f64, |m, e| m.max(e.abs())))
///         .collect()
/// };
/// let filter = PercentileFilter::new(50.0).unwrap().with_scorer(worst);
/// let mask = filter.mask(&[vec![0.1, 0.9], vec![0.5, 0.5], vec![0.3, 0.2]]);
/// assert_eq!(mask, vec![false, true, true]);
/// ```
pub trait Scorer: Send + Sync {
    /// Returns the score of every row of `errors`.
    fn scores(&self, errors: &[Vec<f64>]) -> Vec<f64>;
}

impl<F> Scorer for F
where
    F: Fn(&[Vec<f64>]) -> Vec<f64> + Send + Sync,
{
    fn scores(&self, errors: &[Vec<f64>]) -> Vec<f64> {
        self(errors)
    }
}

/// Sum of absolute errors per row.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbsSum {
    normalize: bool,
}

impl AbsSum {
    /// Plain sum of magnitudes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Divide each column's magnitudes by their standard deviation first.
    #[must_use]
    pub fn normalized() -> Self {
        Self { normalize: true }
    }
}

impl Scorer for AbsSum {
    fn scores(&self, errors: &[Vec<f64>]) -> Vec<f64> {
        row_scores(errors, self.normalize)
    }
}

/// Sum of absolute errors after rescaling each column with `S`.
///
/// ```
/// use mobo::filter::{Filter, PercentileFilter, ScaledSum};
/// use mobo::scale::RobustScaler;
///
/// let filter = PercentileFilter::new(50.0)
///     .unwrap()
///     .with_scorer(ScaledSum::new(RobustScaler::default()));
/// let errors = vec![vec![1.0, 100.0], vec![2.0, 300.0], vec![3.0, 200.0]];
/// assert_eq!(filter.mask(&errors).len(), 3);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ScaledSum<S> {
    scaler: S,
}

impl<S: Scaler> ScaledSum<S> {
    /// Wraps `scaler`.
    #[must_use]
    pub fn new(scaler: S) -> Self {
        Self { scaler }
    }
}

impl<S: Scaler> Scorer for ScaledSum<S> {
    fn scores(&self, errors: &[Vec<f64>]) -> Vec<f64> {
        let magnitudes: Vec<Vec<f64>> = errors
            .iter()
            .map(|row| row.iter().map(|e| e.abs()).collect())
            .collect();
        let width = errors.first().map_or(0, Vec::len);
        self.scaler
            .scale(&magnitudes)
            .into_iter()
            .map(|row| if row.len() == width { row.iter().sum() } else { f64::NAN })
            .collect()
    }
}

/// Reduces each error row to one scalar: the sum of absolute values.
///
/// With `normalize`, each column's magnitudes are first divided by that
/// column's (population) standard deviation over its finite entries so
/// that QoIs on different scales contribute comparably. Columns with zero
/// deviation are left unscaled.
///
/// The first row fixes the column count. A row of any other length scores
/// NaN, as does a row containing a non-finite error.
///
/// # Examples
///
/// ```
/// use mobo::filter::row_scores;
///
/// let scores = row_scores(&[vec![1.0, -2.0], vec![0.5, 0.5]], false);
/// assert_eq!(scores, vec![3.0, 1.0]);
///
/// let ragged = row_scores(&[vec![1.0, 1.0], vec![1.0]], false);
/// assert!(ragged[1].is_nan());
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn row_scores(errors: &[Vec<f64>], normalize: bool) -> Vec<f64> {
    let Some(first) = errors.first() else {
        return Vec::new();
    };
    let width = first.len();

    let scales: Vec<f64> = if normalize {
        (0..width)
            .map(|col| {
                let column: Vec<f64> = errors
                    .iter()
                    .filter(|r| r.len() == width)
                    .map(|r| r[col].abs())
                    .filter(|v| v.is_finite())
                    .collect();
                if column.is_empty() {
                    return 1.0;
                }
                let n = column.len() as f64;
                let mean = column.iter().sum::<f64>() / n;
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect()
    } else {
        vec![1.0; width]
    };

    errors
        .iter()
        .map(|row| {
            if row.len() != width {
                return f64::NAN;
            }
            let score: f64 = row.iter().zip(&scales).map(|(e, s)| e.abs() / s).sum();
            if score.is_finite() { score } else { f64::NAN }
        })
        .collect()
}
