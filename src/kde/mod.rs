//! Gaussian kernel density estimation over parameter vectors.
//!
//! [`GaussianKde`] places one Gaussian kernel on every member of a cluster.
//! The kernel covariance is the members' sample covariance scaled by a
//! bandwidth factor chosen with [`KdeBandwidth`]; drawing from the estimate
//! picks a member uniformly and adds correlated Gaussian noise.

mod gaussian;

pub use gaussian::{GaussianKde, KdeBandwidth};
