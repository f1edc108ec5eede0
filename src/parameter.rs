//! Bounded continuous parameters and per-sample parameter views.
//!
//! A [`Parameter`] names one continuous dimension of the search space
//! together with its inclusive bounds. The first round draws uniformly
//! inside these bounds; later rounds resample from kernel density
//! estimates and may step outside them.
//!
//! A [`Parameterization`] is a borrowed name → value view of one sample,
//! handed to every [`Evaluator`](crate::qoi::Evaluator).
//!
//! # Example
//!
//! ```
//! use mobo::parameter::{Parameter, Parameterization};
//!
//! let params = vec![
//!     Parameter::new("a", -1.0, 1.0).unwrap(),
//!     Parameter::new("b", -2.0, 0.0).unwrap(),
//! ];
//! let values = [0.5, -1.5];
//! let p = Parameterization::new(&params, &values).unwrap();
//! assert_eq!(p.get("b"), Some(-1.5));
//! assert!((p["a"] - 0.5).abs() < f64::EPSILON);
//! ```

use core::ops::Index;
use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};

/// A named continuous variable with inclusive bounds.
///
/// Immutable once constructed: `lower_bound < upper_bound` holds for the
/// lifetime of the value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    name: String,
    lower_bound: f64,
    upper_bound: f64,
}

impl Parameter {
    /// Creates a new parameter.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyName` if `name` is empty.
    /// Returns `Error::InvalidBounds` if either bound is not finite or
    /// `lower_bound >= upper_bound`.
    pub fn new(name: impl Into<String>, lower_bound: f64, upper_bound: f64) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if !lower_bound.is_finite() || !upper_bound.is_finite() || lower_bound >= upper_bound {
            return Err(Error::InvalidBounds {
                name,
                lower: lower_bound,
                upper: upper_bound,
            });
        }
        Ok(Self {
            name,
            lower_bound,
            upper_bound,
        })
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Returns the inclusive upper bound.
    #[must_use]
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Returns `upper_bound - lower_bound`.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    /// Returns `true` if `value` lies inside the inclusive bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.lower_bound..=self.upper_bound).contains(&value)
    }
}

/// Rejects duplicate names.
pub(crate) fn validate_unique<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::DuplicateName(name.to_owned()));
        }
    }
    Ok(())
}

/// A borrowed mapping from parameter name to value for a single sample.
#[derive(Clone, Copy, Debug)]
pub struct Parameterization<'a> {
    parameters: &'a [Parameter],
    values: &'a [f64],
}

impl<'a> Parameterization<'a> {
    /// Pairs `parameters` with one row of `values`, positionally.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParameterCountMismatch` if the slices have different
    /// lengths.
    pub fn new(parameters: &'a [Parameter], values: &'a [f64]) -> Result<Self> {
        if parameters.len() != values.len() {
            return Err(Error::ParameterCountMismatch {
                expected: parameters.len(),
                got: values.len(),
            });
        }
        Ok(Self { parameters, values })
    }

    /// Returns the value of the parameter called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .position(|p| p.name == name)
            .map(|i| self.values[i])
    }

    /// Returns the raw values in parameter order.
    #[must_use]
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// Iterates over `(name, value)` pairs in parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.parameters
            .iter()
            .zip(self.values.iter())
            .map(|(p, &v)| (p.name.as_str(), v))
    }

    /// Copies the view into an owned, name-ordered map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<&str> for Parameterization<'_> {
    type Output = f64;

    fn index(&self, name: &str) -> &f64 {
        let i = self
            .parameters
            .iter()
            .position(|p| p.name == name)
            .unwrap_or_else(|| panic!("unknown parameter '{name}'"));
        &self.values[i]
    }
}
