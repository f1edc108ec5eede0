use mobo::filter::{Filter, PercentileFilter, ScaledSum, ZScoreFilter};
use mobo::scale::RobustScaler;

use crate::random_costs;

fn kept(mask: &[bool]) -> usize {
    mask.iter().filter(|&&k| k).count()
}

#[test]
fn raising_the_percentile_never_keeps_fewer_rows() {
    let costs = random_costs(300, 3, 4);
    let mut previous = 0;
    for p in (0..=100).step_by(5) {
        let n = kept(&PercentileFilter::new(f64::from(p)).unwrap().mask(&costs));
        assert!(n >= previous, "percentile {p} kept {n} < {previous}");
        previous = n;
    }
    assert_eq!(previous, 300);
}

#[test]
fn normalized_scores_keep_the_same_count() {
    let mut costs = random_costs(100, 2, 6);
    for row in &mut costs {
        row[1] *= 1000.0;
    }
    let plain = PercentileFilter::new(10.0).unwrap().mask(&costs);
    let normalized = PercentileFilter::new(10.0).unwrap().normalized().mask(&costs);
    assert_eq!(kept(&plain), 10);
    assert_eq!(kept(&normalized), 10);
    assert_ne!(plain, normalized);
}

#[test]
fn zscore_drops_only_outliers() {
    let mut costs = random_costs(200, 2, 8);
    costs.push(vec![50.0, 50.0]);
    let mask = ZScoreFilter::new(3.0).unwrap().mask(&costs);
    assert!(!mask[200]);
    assert_eq!(kept(&mask), 200);
}

#[test]
fn nan_rows_neither_survive_nor_shift_the_threshold() {
    let mut costs = random_costs(300, 3, 4);
    for row in costs.iter_mut().step_by(10) {
        row[1] = f64::NAN;
    }
    let mut previous = 0;
    for p in (0..=100).step_by(5) {
        let mask = PercentileFilter::new(f64::from(p)).unwrap().mask(&costs);
        assert!(mask.iter().step_by(10).all(|&k| !k), "percentile {p} kept a NaN row");
        let n = kept(&mask);
        assert!(n >= previous, "percentile {p} kept {n} < {previous}");
        previous = n;
    }
    assert_eq!(previous, 270);
}

#[test]
fn infinite_costs_are_rejected_at_every_percentile() {
    let mut costs = random_costs(50, 2, 9);
    costs[3][0] = f64::INFINITY;
    costs[7][1] = f64::NEG_INFINITY;
    for p in [0.0, 50.0, 100.0] {
        let mask = PercentileFilter::new(p).unwrap().normalized().mask(&costs);
        assert!(!mask[3] && !mask[7]);
    }
    assert_eq!(kept(&PercentileFilter::new(100.0).unwrap().mask(&costs)), 48);
}

#[test]
fn zscore_ignores_nan_rows_when_finding_outliers() {
    let mut costs = random_costs(200, 2, 8);
    costs.push(vec![50.0, 50.0]);
    costs.push(vec![f64::NAN, 0.1]);
    let mask = ZScoreFilter::new(3.0).unwrap().mask(&costs);
    assert!(!mask[200]);
    assert!(!mask[201]);
    assert_eq!(kept(&mask), 200);
}

#[test]
fn robust_scaled_scores_keep_the_same_count() {
    let mut costs = random_costs(100, 2, 6);
    for row in &mut costs {
        row[1] *= 1000.0;
    }
    let plain = PercentileFilter::new(10.0).unwrap().mask(&costs);
    let robust = PercentileFilter::new(10.0)
        .unwrap()
        .with_scorer(ScaledSum::new(RobustScaler::default()))
        .mask(&costs);
    assert_eq!(kept(&robust), 10);
    assert_ne!(plain, robust);
}

#[test]
fn closure_scorers_rank_rows() {
    let costs = random_costs(40, 2, 12);
    // rank on the first column only
    let first = |errors: &[Vec<f64>]| -> Vec<f64> { errors.iter().map(|r| r[0]).collect() };
    let mask = PercentileFilter::new(50.0).unwrap().with_scorer(first).mask(&costs);
    let worst_kept = costs
        .iter()
        .zip(&mask)
        .filter(|(_, k)| **k)
        .map(|(r, _)| r[0])
        .fold(f64::NEG_INFINITY, f64::max);
    let best_dropped = costs
        .iter()
        .zip(&mask)
        .filter(|(_, k)| !**k)
        .map(|(r, _)| r[0])
        .fold(f64::INFINITY, f64::min);
    assert_eq!(kept(&mask), 20);
    assert!(worst_kept < best_dropped);
}
