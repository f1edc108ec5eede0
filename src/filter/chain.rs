use core::fmt;
use std::sync::Arc;

use super::Filter;

/// How a [`FilterChain`] combines its filters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChainMode {
    /// Every filter sees the full error matrix; the masks are AND-ed.
    #[default]
    Intersectional,
    /// Each filter sees only the rows kept by the filter before it.
    Sequential,
}

/// An ordered composition of filters, itself a [`Filter`].
///
/// An empty chain keeps every row in either mode. Chains nest: a chain can
/// be pushed into another chain like any other filter.
///
/// # Examples
///
/// ```
/// use mobo::filter::{Filter, FilterChain, ParetoFilter, PercentileFilter};
///
/// let chain = FilterChain::sequential()
///     .with(PercentileFilter::new(50.0).unwrap())
///     .with(ParetoFilter::new());
///
/// let errors = vec![vec![1.0, 4.0], vec![4.0, 1.0], vec![9.0, 9.0], vec![2.0, 2.0]];
/// // Row 2 fails the percentile cut; no survivor dominates another.
/// assert_eq!(chain.mask(&errors), vec![true, true, false, true]);
/// ```
#[derive(Clone, Default)]
pub struct FilterChain {
    mode: ChainMode,
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty chain whose filters all see the original matrix.
    #[must_use]
    pub fn intersectional() -> Self {
        Self::new(ChainMode::Intersectional, Vec::new())
    }

    /// Creates an empty chain whose filters see the survivors of the
    /// previous filter.
    #[must_use]
    pub fn sequential() -> Self {
        Self::new(ChainMode::Sequential, Vec::new())
    }

    /// Creates a chain from already shared filters.
    #[must_use]
    pub fn new(mode: ChainMode, filters: Vec<Arc<dyn Filter>>) -> Self {
        Self { mode, filters }
    }

    /// Appends a filter.
    #[must_use]
    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Appends a shared filter.
    #[must_use]
    pub fn with_shared(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Returns the combination mode.
    #[must_use]
    pub fn mode(&self) -> ChainMode {
        self.mode
    }

    /// Returns the number of filters in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the chain has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn intersect(&self, errors: &[Vec<f64>]) -> Vec<bool> {
        let mut keep = vec![true; errors.len()];
        for filter in &self.filters {
            let mask = filter.mask(errors);
            if mask.len() != keep.len() {
                return mask;
            }
            for (k, m) in keep.iter_mut().zip(mask) {
                *k &= m;
            }
        }
        keep
    }

    fn chain(&self, errors: &[Vec<f64>]) -> Vec<bool> {
        let n = errors.len();
        // indices into `errors` of the rows still alive
        let mut alive: Vec<usize> = (0..n).collect();
        for filter in &self.filters {
            let subset: Vec<Vec<f64>> = alive.iter().map(|&i| errors[i].clone()).collect();
            let mask = filter.mask(&subset);
            if mask.len() != subset.len() {
                // keep the length error visible to the caller
                return vec![false; n - subset.len() + mask.len()];
            }
            alive = alive
                .into_iter()
                .zip(mask)
                .filter_map(|(i, k)| k.then_some(i))
                .collect();
        }
        let mut keep = vec![false; n];
        for i in alive {
            keep[i] = true;
        }
        keep
    }
}

impl Filter for FilterChain {
    /// A nested filter that returns a mask of the wrong length makes the
    /// chain's mask wrong by the same amount.
    fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
        match self.mode {
            ChainMode::Intersectional => self.intersect(errors),
            ChainMode::Sequential => self.chain(errors),
        }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("mode", &self.mode)
            .field("filters", &self.filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ParetoFilter, PercentileFilter};

    /// Keeps rows whose first error is below a cut.
    struct Below(f64);

    impl Filter for Below {
        fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
            errors.iter().map(|r| r[0] < self.0).collect()
        }
    }

    /// Keeps only the first row it is shown.
    struct FirstOnly;

    impl Filter for FirstOnly {
        fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
            (0..errors.len()).map(|i| i == 0).collect()
        }
    }

    struct Broken;

    impl Filter for Broken {
        fn mask(&self, _: &[Vec<f64>]) -> Vec<bool> {
            vec![true]
        }
    }

    fn errors() -> Vec<Vec<f64>> {
        vec![vec![3.0], vec![1.0], vec![2.0], vec![0.5]]
    }

    #[test]
    fn empty_chains_keep_everything() {
        assert_eq!(FilterChain::intersectional().mask(&errors()), vec![true; 4]);
        assert_eq!(FilterChain::sequential().mask(&errors()), vec![true; 4]);
        assert!(FilterChain::default().is_empty());
    }

    #[test]
    fn intersectional_ands_masks_over_full_matrix() {
        let chain = FilterChain::intersectional()
            .with(Below(2.5))
            .with(FirstOnly);
        // FirstOnly sees all four rows and keeps row 0, which Below rejects.
        assert_eq!(chain.mask(&errors()), vec![false; 4]);
    }

    #[test]
    fn sequential_maps_subset_back_to_original_rows() {
        let chain = FilterChain::sequential().with(Below(2.5)).with(FirstOnly);
        // Below keeps rows 1, 2, 3; FirstOnly keeps the first of those.
        assert_eq!(chain.mask(&errors()), vec![false, true, false, false]);
        assert_eq!(chain.mode(), ChainMode::Sequential);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn sequential_percentile_is_relative_to_survivors() {
        let errors: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i)]).collect();
        let chain = FilterChain::sequential()
            .with(PercentileFilter::new(50.0).unwrap())
            .with(PercentileFilter::new(50.0).unwrap());
        // 0..=4 survive the first pass, 0..=2 the second.
        let kept: Vec<usize> = chain
            .mask(&errors)
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        assert_eq!(kept, vec![0, 1, 2]);
    }

    #[test]
    fn chains_nest() {
        let inner = FilterChain::intersectional().with(ParetoFilter::new());
        let outer = FilterChain::sequential().with(Below(2.5)).with(inner);
        assert_eq!(outer.mask(&errors()), vec![false, false, false, true]);
    }

    #[test]
    fn wrong_length_from_nested_filter_surfaces() {
        let chain = FilterChain::intersectional().with(Broken);
        assert_ne!(chain.mask(&errors()).len(), 4);
        let chain = FilterChain::sequential().with(Below(2.5)).with(Broken);
        assert_ne!(chain.mask(&errors()).len(), 4);
    }
}
