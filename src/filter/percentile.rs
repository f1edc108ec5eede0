//! Percentile filter: keep the best N% of the current population.
//!
//! Each error row is reduced to a score by a [`Scorer`] ([`AbsSum`] unless
//! another one is set); rows whose score is at or below the requested
//! percentile of the finite scores are kept. Rows with a non-finite score
//! are never kept and do not move the threshold. The percentile is
//! recomputed from the population handed to the filter, so no history
//! carries over between rounds.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `percentile` | *(required)* | Keep rows at or below this percentile, range `[0, 100]` |
//! | `normalized` | off | Scale each error column by its standard deviation before summing |
//! | `with_scorer` | [`AbsSum`] | Any [`Scorer`], including closures over the error matrix |
//!
//! # Example
//!
//! ```
//! use mobo::filter::{Filter, PercentileFilter};
//!
//! // Keep the best quarter of the population
//! let filter = PercentileFilter::new(25.0).unwrap();
//! let errors: Vec<Vec<f64>> = (0..8).map(|i| vec![f64::from(i)]).collect();
//! let kept = filter.mask(&errors).iter().filter(|&&k| k).count();
//! assert_eq!(kept, 2);
//! ```

use core::fmt;
use std::sync::Arc;

use super::Filter;
use super::score::{AbsSum, Scorer};
use crate::error::{Error, Result};
use crate::scale::quantile;

/// Keep rows whose score is within the lowest `percentile`% of the
/// population (inclusive).
///
/// A population whose finite scores are all equal is kept in full, apart
/// from rows with non-finite scores.
#[derive(Clone)]
pub struct PercentileFilter {
    /// Keep rows at or below this percentile. Range: [0.0, 100.0].
    percentile: f64,
    scorer: Arc<dyn Scorer>,
}

impl PercentileFilter {
    /// Create a new `PercentileFilter` scoring rows with [`AbsSum`].
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPercentile` if `percentile` is not in
    /// `[0.0, 100.0]`.
    pub fn new(percentile: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&percentile) {
            return Err(Error::InvalidPercentile(percentile));
        }
        Ok(Self {
            percentile,
            scorer: Arc::new(AbsSum::new()),
        })
    }

    /// Divide each error column by its standard deviation before scoring.
    #[must_use]
    pub fn normalized(self) -> Self {
        self.with_scorer(AbsSum::normalized())
    }

    /// Rank rows with `scorer` instead of the default sum of magnitudes.
    #[must_use]
    pub fn with_scorer(mut self, scorer: impl Scorer + 'static) -> Self {
        self.scorer = Arc::new(scorer);
        self
    }

    /// Returns the configured percentile.
    #[must_use]
    pub fn percentile(&self) -> f64 {
        self.percentile
    }
}

impl fmt::Debug for PercentileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PercentileFilter")
            .field("percentile", &self.percentile)
            .finish_non_exhaustive()
    }
}

impl Filter for PercentileFilter {
    fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
        let scores = self.scorer.scores(errors);
        let Some(threshold) = quantile(&scores, self.percentile / 100.0) else {
            return vec![false; scores.len()];
        };
        scores.iter().map(|&s| s.is_finite() && s <= threshold).collect()
    }
}
