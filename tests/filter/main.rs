mod chain;
mod pareto;
mod percentile;

/// `n` rows of `m` uniform costs in `[0, 1)`.
pub(crate) fn random_costs(n: usize, m: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..n).map(|_| (0..m).map(|_| rng.f64()).collect()).collect()
}
