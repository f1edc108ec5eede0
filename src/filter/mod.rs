//! Filter trait and implementations for discarding poor candidates.
//!
//! A filter looks at the error matrix of the current population (one row
//! per sample, one column per QoI error) and returns a boolean mask with
//! one entry per row: `true` keeps the sample. Filters are stateless; every
//! statistic they use is computed from the matrix they are given.
//!
//! The percentile and z-score filters rank rows by a [`Scorer`]; by default
//! the sum of absolute errors. Every shipped filter rejects rows it cannot
//! rank: a non-finite error or score, or a row whose length differs from
//! the first row's.
//!
//! | Filter | Keeps |
//! |--------|-------|
//! | [`ParetoFilter`] | Rows retained by [`pareto_mask`](crate::pareto::pareto_mask) |
//! | [`PercentileFilter`] | Rows whose score is at or below the given percentile |
//! | [`ZScoreFilter`] | Rows whose score z-score is at or below a threshold |
//! | [`FilterChain`] | Intersection or sequential composition of other filters |

mod chain;
mod pareto;
mod percentile;
mod score;
mod zscore;

pub use chain::{ChainMode, FilterChain};
pub use pareto::ParetoFilter;
pub use percentile::PercentileFilter;
pub use score::{AbsSum, ScaledSum, Scorer, row_scores};
pub use zscore::ZScoreFilter;

/// Trait for pluggable population filters.
///
/// The returned mask must have exactly one entry per input row; the
/// optimizer rejects masks of any other length.
///
/// # Implementing a custom filter
///
/// ```
/// use mobo::filter::Filter;
///
/// /// Keep rows whose every error is below a fixed tolerance.
/// struct Tolerance(f64);
///
/// impl Filter for Tolerance {
///     fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
///         errors
///             .iter()
///             .map(|row| row.iter().all(|e| e.abs() <= self.0))
///             .collect()
///     }
/// }
///
/// let m = Tolerance(0.5).mask(&[vec![0.1, 0.2], vec![0.1, 0.9]]);
/// assert_eq!(m, vec![true, false]);
/// ```
pub trait Filter: Send + Sync {
    /// Returns the keep-mask for `errors`.
    fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool>;
}
