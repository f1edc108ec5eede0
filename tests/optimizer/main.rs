#![allow(clippy::cast_precision_loss, clippy::float_cmp)]

mod failures;
mod polynomial;
mod seed;

use std::path::Path;
use std::sync::Arc;

use mobo::prelude::*;

/// `a·x³ + b·x² + c·x` at `x = -0.1`.
pub(crate) fn polynomial(p: &Parameterization<'_>) -> f64 {
    let x = -0.1_f64;
    p["a"] * x.powi(3) + p["b"] * x.powi(2) + p["c"] * x
}

pub(crate) const TARGET: f64 = -0.062;

pub(crate) fn parameters() -> Vec<Parameter> {
    vec![
        Parameter::new("a", -1.0, 1.0).unwrap(),
        Parameter::new("b", -2.0, 0.0).unwrap(),
        Parameter::new("c", 0.0, 1.0).unwrap(),
    ]
}

/// Three rounds of 1000 samples, squared error, Pareto filter only.
pub(crate) fn polynomial_config(
    policy: SmallClusterPolicy,
    logger: Arc<dyn Logger>,
) -> GlobalConfiguration {
    let round = LocalConfiguration::builder(1000)
        .error_calculator(SquaredError)
        .filters(FilterChain::intersectional().with(ParetoFilter::new()))
        .small_clusters(policy)
        .build()
        .unwrap();
    GlobalConfiguration::builder()
        .n_samples(1000)
        .n_rounds(3)
        .parameters(parameters())
        .qoi(QoI::new("pt0", TARGET, polynomial).unwrap())
        .rounds(vec![round; 3])
        .shared_logger(logger)
        .seed(2024)
        .build()
        .unwrap()
}

/// One exported row: id, named numeric cells and the raw record.
pub(crate) struct Row {
    pub(crate) id: String,
    pub(crate) cells: Vec<(String, String)>,
}

impl Row {
    pub(crate) fn get(&self, column: &str) -> f64 {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.parse().unwrap())
            .unwrap_or_else(|| panic!("no column {column}"))
    }
}

pub(crate) fn read_artifact(path: &Path) -> (Vec<String>, Vec<Row>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
    let rows = rdr
        .records()
        .map(|r| {
            let r = r.unwrap();
            Row {
                id: r[0].to_owned(),
                cells: header
                    .iter()
                    .cloned()
                    .zip(r.iter().map(str::to_owned))
                    .collect(),
            }
        })
        .collect();
    (header, rows)
}
