//! Error calculators: reduce `(predicted, target)` pairs to costs.
//!
//! Every calculator is elementwise and stateless. Lower cost is better for
//! all downstream filters.
//!
//! | Calculator | Cost |
//! |---|---|
//! | [`AbsoluteError`] | `|actual - target|` |
//! | [`SquaredError`] | `(actual - target)²` |
//! | [`LogCoshError`] | `ln(cosh(actual - target))` |
//! | [`RawError`] | `actual - target` |

/// Maps predicted values and their targets to per-QoI costs.
pub trait ErrorCalculator: Send + Sync {
    /// Returns one cost per QoI. `actual` and `target` have equal length.
    fn calculate(&self, actual: &[f64], target: &[f64]) -> Vec<f64>;
}

fn elementwise(actual: &[f64], target: &[f64], f: impl Fn(f64) -> f64) -> Vec<f64> {
    debug_assert_eq!(actual.len(), target.len());
    actual.iter().zip(target).map(|(&a, &t)| f(a - t)).collect()
}

/// Absolute error.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbsoluteError;

impl ErrorCalculator for AbsoluteError {
    fn calculate(&self, actual: &[f64], target: &[f64]) -> Vec<f64> {
        elementwise(actual, target, f64::abs)
    }
}

/// Squared error.
#[derive(Clone, Copy, Debug, Default)]
pub struct SquaredError;

impl ErrorCalculator for SquaredError {
    fn calculate(&self, actual: &[f64], target: &[f64]) -> Vec<f64> {
        elementwise(actual, target, |d| d * d)
    }
}

/// Log-cosh error: quadratic near zero, linear for large residuals.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCoshError;

impl ErrorCalculator for LogCoshError {
    fn calculate(&self, actual: &[f64], target: &[f64]) -> Vec<f64> {
        // ln(cosh(d)) = |d| + ln(1 + e^(-2|d|)) - ln 2, stable for large |d|
        elementwise(actual, target, |d| {
            let a = d.abs();
            a + (-2.0 * a).exp().ln_1p() - core::f64::consts::LN_2
        })
    }
}

/// Signed residual.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawError;

impl ErrorCalculator for RawError {
    fn calculate(&self, actual: &[f64], target: &[f64]) -> Vec<f64> {
        elementwise(actual, target, |d| d)
    }
}
