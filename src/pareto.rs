//! Pareto-efficiency masks over cost matrices.
//!
//! Costs are laid out one row per candidate and one column per QoI error;
//! lower is better in every column.
//!
//! [`pareto_mask`] is the filter used between rounds. It walks the rows in
//! their original order and, for every row `i` that is still marked
//! efficient, keeps only those efficient rows that are strictly lower than
//! row `i` in **at least one** column, then restores row `i` itself.
//!
//! A row is therefore discarded exactly when some pivot is lower than or
//! equal to it in every column. On data without exact duplicates this is the
//! textbook non-dominated set ([`dominates`]); rows with identical cost
//! vectors collapse to the first one visited.
//!
//! # Example
//!
//! ```
//! use mobo::pareto::pareto_mask;
//!
//! let costs = vec![
//!     vec![3.0, 3.0],
//!     vec![1.0, 1.0], // lower than every other row in every column
//!     vec![2.0, 4.0],
//! ];
//! assert_eq!(pareto_mask(&costs), vec![false, true, false]);
//! ```

/// Returns `true` if cost vector `a` dominates `b` in the textbook sense:
/// no column worse and at least one column strictly better.
#[must_use]
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len());

    let mut strictly_better = false;
    for (&av, &bv) in a.iter().zip(b) {
        if av > bv {
            return false;
        }
        if av < bv {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Computes the efficiency mask of `costs` (one `true` per retained row).
///
/// Complexity: O(n² · m) for `n` rows and `m` columns. No ordering beyond
/// the original row order is involved. Comparisons with NaN are false: a
/// NaN cost is never "lower", and a pivot carrying NaN keeps only rows that
/// are lower in one of its finite columns.
#[must_use]
pub fn pareto_mask(costs: &[Vec<f64>]) -> Vec<bool> {
    let n = costs.len();
    let mut efficient = vec![true; n];

    for i in 0..n {
        if !efficient[i] {
            continue;
        }
        let pivot = &costs[i];
        for j in 0..n {
            if efficient[j] {
                // keep rows lower than the pivot in any column
                efficient[j] = costs[j].iter().zip(pivot).any(|(&c, &p)| c < p);
            }
        }
        efficient[i] = true;
    }

    efficient
}

/// Returns the indices of rows retained by [`pareto_mask`], ascending.
#[must_use]
pub fn pareto_indices(costs: &[Vec<f64>]) -> Vec<usize> {
    pareto_mask(costs)
        .into_iter()
        .enumerate()
        .filter_map(|(i, keep)| keep.then_some(i))
        .collect()
}
