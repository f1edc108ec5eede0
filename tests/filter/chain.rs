use mobo::filter::{ChainMode, Filter, FilterChain, ParetoFilter, PercentileFilter, ZScoreFilter};

use crate::random_costs;

#[test]
fn empty_chains_are_no_ops() {
    let costs = random_costs(40, 3, 1);
    for chain in [FilterChain::intersectional(), FilterChain::sequential()] {
        assert!(chain.mask(&costs).iter().all(|&k| k));
    }
}

#[test]
fn single_filter_chain_matches_the_filter() {
    let costs = random_costs(100, 2, 2);
    let filter = PercentileFilter::new(30.0).unwrap();
    let expected = filter.mask(&costs);
    for mode in [ChainMode::Intersectional, ChainMode::Sequential] {
        let chain = FilterChain::new(mode, Vec::new()).with(filter.clone());
        assert_eq!(chain.mask(&costs), expected, "{mode:?}");
    }
}

#[test]
fn sequential_is_never_looser_than_its_first_filter() {
    let costs = random_costs(200, 3, 3);
    let first = PercentileFilter::new(40.0).unwrap();
    let chain = FilterChain::sequential()
        .with(first.clone())
        .with(ParetoFilter::new())
        .with(ZScoreFilter::new(1.0).unwrap());
    let first_mask = first.mask(&costs);
    for (c, f) in chain.mask(&costs).iter().zip(&first_mask) {
        assert!(!c || *f);
    }
}

#[test]
fn intersectional_is_the_conjunction() {
    let costs = random_costs(150, 2, 4);
    let a = PercentileFilter::new(60.0).unwrap();
    let b = ParetoFilter::new();
    let chain = FilterChain::intersectional().with(a.clone()).with(b);
    let expected: Vec<bool> = a
        .mask(&costs)
        .iter()
        .zip(b.mask(&costs))
        .map(|(x, y)| *x && y)
        .collect();
    assert_eq!(chain.mask(&costs), expected);
}

#[test]
fn non_finite_rows_never_survive_a_chain() {
    let mut costs = random_costs(120, 2, 5);
    costs[0] = vec![f64::NAN, 0.0];
    costs[40][1] = f64::INFINITY;
    costs[80] = vec![f64::NEG_INFINITY, f64::NEG_INFINITY];
    let poisoned = [0, 40, 80];

    for mode in [ChainMode::Intersectional, ChainMode::Sequential] {
        let keep_all = FilterChain::new(mode, Vec::new()).with(PercentileFilter::new(100.0).unwrap());
        let mask = keep_all.mask(&costs);
        assert_eq!(mask.iter().filter(|&&k| k).count(), 117, "{mode:?}");

        let chain = FilterChain::new(mode, Vec::new())
            .with(ZScoreFilter::new(2.0).unwrap())
            .with(ParetoFilter::new())
            .with(PercentileFilter::new(90.0).unwrap());
        let mask = chain.mask(&costs);
        assert!(mask.iter().any(|&k| k), "{mode:?}");
        for i in poisoned {
            assert!(!mask[i], "{mode:?} kept row {i}");
        }
    }
}
