use core::fmt;
use std::sync::Arc;

use super::Filter;
use super::score::{AbsSum, Scorer};
use crate::error::{Error, Result};

/// Rejects outliers: rows whose score lies more than `threshold` standard
/// deviations above the population mean.
///
/// Scores come from a [`Scorer`] ([`AbsSum`] by default). Mean and
/// deviation are taken over the finite scores of the population handed to
/// the filter; rows with a non-finite score are always rejected. When every
/// finite score is equal the deviation is zero and all finite rows are
/// kept.
///
/// # Examples
///
/// ```
/// use mobo::filter::{Filter, ZScoreFilter};
///
/// let errors = vec![vec![1.0], vec![1.1], vec![0.9], vec![1.0], vec![25.0]];
/// let mask = ZScoreFilter::new(1.5).unwrap().mask(&errors);
/// assert_eq!(mask, vec![true, true, true, true, false]);
/// ```
#[derive(Clone)]
pub struct ZScoreFilter {
    threshold: f64,
    scorer: Arc<dyn Scorer>,
}

impl ZScoreFilter {
    /// Creates a filter keeping rows with `z <= threshold`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidThreshold` if `threshold` is not finite.
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(Error::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            scorer: Arc::new(AbsSum::new()),
        })
    }

    /// Divide each error column by its standard deviation before scoring.
    #[must_use]
    pub fn normalized(self) -> Self {
        self.with_scorer(AbsSum::normalized())
    }

    /// Score rows with `scorer` instead of the default sum of magnitudes.
    #[must_use]
    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    /// Returns the configured threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl fmt::Debug for ZScoreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZScoreFilter")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Filter for ZScoreFilter {
    #[allow(clippy::cast_precision_loss)]
    fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
        let scores = self.scorer.scores(errors);
        let finite: Vec<f64> = scores.iter().copied().filter(|s| s.is_finite()).collect();
        if finite.is_empty() {
            return vec![false; scores.len()];
        }

        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let std = (finite.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        scores
            .iter()
            .map(|&s| s.is_finite() && (std <= f64::EPSILON || (s - mean) / std <= self.threshold))
            .collect()
    }
}
