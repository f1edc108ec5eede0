use mobo::filter::{Filter, ParetoFilter};
use mobo::pareto::{dominates, pareto_indices, pareto_mask};

use crate::random_costs;

#[test]
fn mask_has_one_entry_per_row() {
    for n in [0, 1, 2, 17, 250] {
        assert_eq!(pareto_mask(&random_costs(n, 3, 1)).len(), n);
    }
}

#[test]
fn globally_dominant_row_is_the_only_survivor() {
    let mut costs = random_costs(60, 4, 2);
    costs.insert(23, vec![-1.0; 4]);
    assert_eq!(pareto_indices(&costs), vec![23]);
}

#[test]
fn mask_is_the_non_dominated_set_on_random_data() {
    for seed in 0..5 {
        let costs = random_costs(120, 3, seed);
        let mask = ParetoFilter::new().mask(&costs);
        for (i, row) in costs.iter().enumerate() {
            let dominated = costs.iter().any(|other| dominates(other, row));
            assert_eq!(mask[i], !dominated, "seed {seed}, row {i}");
        }
    }
}

#[test]
fn order_of_rows_only_matters_for_duplicates() {
    let costs = random_costs(80, 2, 9);
    let reversed: Vec<Vec<f64>> = costs.iter().rev().cloned().collect();
    let mut forward = pareto_indices(&costs);
    let mut backward: Vec<usize> = pareto_indices(&reversed)
        .into_iter()
        .map(|i| costs.len() - 1 - i)
        .collect();
    forward.sort_unstable();
    backward.sort_unstable();
    assert_eq!(forward, backward);
}

#[test]
fn surviving_front_is_not_empty() {
    for seed in 10..20 {
        let costs = random_costs(50, 5, seed);
        assert!(pareto_mask(&costs).iter().any(|&k| k));
    }
}
