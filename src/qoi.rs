//! Quantities of interest and their evaluators.
//!
//! A [`QoI`] pairs a target value with an [`Evaluator`] that predicts the
//! quantity from a [`Parameterization`]. Plain closures returning `f64` are
//! evaluators thanks to a blanket impl; implement the trait directly when
//! the prediction can fail.
//!
//! ```
//! use mobo::parameter::Parameterization;
//! use mobo::qoi::QoI;
//!
//! let qoi = QoI::new("pt0", -0.062, |p: &Parameterization<'_>| {
//!     let x = -0.1_f64;
//!     p["a"] * x.powi(3) + p["b"] * x.powi(2) + p["c"] * x
//! })
//! .unwrap();
//! assert_eq!(qoi.name(), "pt0");
//! ```

use core::fmt;
use std::sync::Arc;

use crate::error::{BoxError, Error, Result};
use crate::parameter::Parameterization;

/// Predicts a scalar quantity from one parameterization.
///
/// Evaluators must be deterministic functions of their input. They are
/// `Send + Sync` so that per-sample evaluation can be fanned out when the
/// `parallel` feature is enabled.
pub trait Evaluator: Send + Sync {
    /// Predicts the quantity for `parameterization`.
    ///
    /// # Errors
    ///
    /// Any error aborts the current round and the run.
    fn evaluate(&self, parameterization: &Parameterization<'_>) -> core::result::Result<f64, BoxError>;
}

impl<F> Evaluator for F
where
    F: Fn(&Parameterization<'_>) -> f64 + Send + Sync,
{
    fn evaluate(&self, parameterization: &Parameterization<'_>) -> core::result::Result<f64, BoxError> {
        Ok(self(parameterization))
    }
}

/// A named target value plus the evaluator that predicts it.
#[derive(Clone)]
pub struct QoI {
    name: String,
    target: f64,
    evaluator: Arc<dyn Evaluator>,
}

impl QoI {
    /// Creates a new quantity of interest.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyName` if `name` is empty and
    /// `Error::InvalidTarget` if `target` is not finite.
    pub fn new(name: impl Into<String>, target: f64, evaluator: impl Evaluator + 'static) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if !target.is_finite() {
            return Err(Error::InvalidTarget { name, target });
        }
        Ok(Self {
            name,
            target,
            evaluator: Arc::new(evaluator),
        })
    }

    /// Returns the QoI name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the target value.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Returns the error column header for this QoI (`<name>_error`).
    #[must_use]
    pub fn error_name(&self) -> String {
        format!("{}_error", self.name)
    }

    /// Runs the evaluator.
    ///
    /// # Errors
    ///
    /// Propagates the evaluator's error unchanged.
    pub fn evaluate(&self, parameterization: &Parameterization<'_>) -> core::result::Result<f64, BoxError> {
        self.evaluator.evaluate(parameterization)
    }
}

impl fmt::Debug for QoI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QoI")
            .field("name", &self.name)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
