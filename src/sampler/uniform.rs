use super::Sampler;
use crate::parameter::Parameter;
use crate::rng_util;

/// Draws each parameter independently and uniformly from `[lower, upper)`.
///
/// # Examples
///
/// ```
/// use mobo::parameter::Parameter;
/// use mobo::sampler::{Sampler, UniformSampler};
///
/// let params = [Parameter::new("x", -1.0, 1.0).unwrap()];
/// let sampler = UniformSampler::new(&params);
/// let mut rng = fastrand::Rng::with_seed(42);
/// let rows = sampler.draw(5, &mut rng);
/// assert!(rows.iter().all(|r| (-1.0..1.0).contains(&r[0])));
/// ```
#[derive(Clone, Debug)]
pub struct UniformSampler {
    bounds: Vec<(f64, f64)>,
}

impl UniformSampler {
    /// Creates a sampler over the bounds of `parameters`, in order.
    #[must_use]
    pub fn new(parameters: &[Parameter]) -> Self {
        Self {
            bounds: parameters
                .iter()
                .map(|p| (p.lower_bound(), p.upper_bound()))
                .collect(),
        }
    }
}

impl Sampler for UniformSampler {
    fn draw(&self, n: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
        (0..n)
            .map(|_| {
                self.bounds
                    .iter()
                    .map(|&(low, high)| rng_util::f64_range(rng, low, high))
                    .collect()
            })
            .collect()
    }
}
