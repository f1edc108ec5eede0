//! Two-dimensional projections of the parameter matrix.
//!
//! The projection feeds the clusterer and the exported `projection_0` /
//! `projection_1` columns. Any [`Projector`] may be plugged in; two are
//! shipped:
//!
//! - [`PcaProjector`] - the two leading principal components
//! - [`ColumnProjector`] - two raw parameter columns

use nalgebra::DMatrix;

use crate::error::BoxError;

/// Maps a parameter matrix to one 2-D point per row.
pub trait Projector: Send + Sync {
    /// Projects `parameters` (one row per sample).
    ///
    /// # Errors
    ///
    /// Any error aborts the round.
    fn project(&self, parameters: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, BoxError>;
}

/// Principal component analysis onto the two leading components.
///
/// Rows are centred on the column means before projecting. Each component
/// is sign-normalized so that its largest-magnitude loading is positive,
/// which makes the output deterministic. With a single parameter the
/// second coordinate is zero.
///
/// # Examples
///
/// ```
/// use mobo::projection::{PcaProjector, Projector};
///
/// let rows = vec![vec![0.0, 0.0, 1.0], vec![1.0, 1.0, 1.0], vec![2.0, 2.0, 1.0]];
/// let points = PcaProjector::new().project(&rows).unwrap();
/// assert_eq!(points.len(), 3);
/// // all variance lies on the first component
/// assert!(points.iter().all(|p| p[1].abs() < 1e-9));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PcaProjector;

impl PcaProjector {
    /// Creates a PCA projector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Projector for PcaProjector {
    #[allow(clippy::cast_precision_loss)]
    fn project(&self, parameters: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, BoxError> {
        let Some(first) = parameters.first() else {
            return Ok(Vec::new());
        };
        let n = parameters.len();
        let d = first.len();
        if d == 0 {
            return Err("cannot project zero-dimensional rows".into());
        }
        if let Some(bad) = parameters.iter().position(|r| r.len() != d) {
            return Err(format!("row {bad} has {} columns, expected {d}", parameters[bad].len()).into());
        }

        let means: Vec<f64> = (0..d)
            .map(|j| parameters.iter().map(|r| r[j]).sum::<f64>() / n as f64)
            .collect();
        let centred = DMatrix::from_fn(n, d, |i, j| parameters[i][j] - means[j]);
        let cov = centred.transpose() * &centred;

        let eigen = cov.symmetric_eigen();
        let mut order: Vec<usize> = (0..d).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let components: Vec<Vec<f64>> = order
            .iter()
            .take(2)
            .map(|&k| {
                let v: Vec<f64> = eigen.eigenvectors.column(k).iter().copied().collect();
                let pivot = v.iter().copied().fold(0.0_f64, |m, x| if x.abs() > m.abs() { x } else { m });
                if pivot < 0.0 { v.iter().map(|x| -x).collect() } else { v }
            })
            .collect();

        Ok((0..n)
            .map(|i| {
                let coord = |c: Option<&Vec<f64>>| {
                    c.map_or(0.0, |v| (0..d).map(|j| centred[(i, j)] * v[j]).sum())
                };
                [coord(components.first()), coord(components.get(1))]
            })
            .collect())
    }
}

/// Projects onto two chosen parameter columns.
#[derive(Clone, Copy, Debug)]
pub struct ColumnProjector {
    columns: [usize; 2],
}

impl ColumnProjector {
    /// Uses parameter columns `x` and `y` as the two coordinates.
    #[must_use]
    pub fn new(x: usize, y: usize) -> Self {
        Self { columns: [x, y] }
    }
}

impl Default for ColumnProjector {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

impl Projector for ColumnProjector {
    fn project(&self, parameters: &[Vec<f64>]) -> Result<Vec<[f64; 2]>, BoxError> {
        let [x, y] = self.columns;
        parameters
            .iter()
            .enumerate()
            .map(|(i, row)| match (row.get(x), row.get(y)) {
                (Some(&a), Some(&b)) => Ok([a, b]),
                _ => Err(format!("row {i} has no columns {x} and {y}").into()),
            })
            .collect()
    }
}
