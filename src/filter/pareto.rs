use super::Filter;
use crate::pareto::pareto_mask;

/// Keeps the Pareto-efficient rows of the error matrix.
///
/// All error columns are minimized. See [`pareto_mask`] for the exact
/// retention rule. Rows holding a non-finite error, or a different number
/// of errors than the first row, are rejected before the front is computed;
/// a NaN pivot would otherwise discard every row after it.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParetoFilter;

impl ParetoFilter {
    /// Creates a new Pareto filter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Filter for ParetoFilter {
    fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
        let width = errors.first().map_or(0, Vec::len);
        let comparable: Vec<usize> = errors
            .iter()
            .enumerate()
            .filter(|(_, row)| row.len() == width && row.iter().all(|e| e.is_finite()))
            .map(|(i, _)| i)
            .collect();
        if comparable.len() == errors.len() {
            return pareto_mask(errors);
        }

        let subset: Vec<Vec<f64>> = comparable.iter().map(|&i| errors[i].clone()).collect();
        let mut mask = vec![false; errors.len()];
        for (&i, keep) in comparable.iter().zip(pareto_mask(&subset)) {
            mask[i] = keep;
        }
        mask
    }
}
