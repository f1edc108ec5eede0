#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Iterative, simulation-based multi-objective calibration. Given bounded
//! continuous parameters and target-valued quantities of interest computed
//! by arbitrary evaluators, `mobo` refines a population of candidate
//! parameterizations over a fixed number of rounds. Each round evaluates,
//! filters, projects, clusters and exports its population, then resamples
//! the next round from per-cluster kernel density estimates.
//!
//! # Getting Started
//!
//! ```
//! use mobo::prelude::*;
//! use mobo::storage::MemoryStorage;
//!
//! let round = LocalConfiguration::builder(300)
//!     .error_calculator(SquaredError)
//!     .filters(FilterChain::intersectional().with(PercentileFilter::new(20.0).unwrap()))
//!     .build()
//!     .unwrap();
//!
//! let config = GlobalConfiguration::builder()
//!     .n_samples(300)
//!     .parameter(Parameter::new("a", -1.0, 1.0).unwrap())
//!     .parameter(Parameter::new("b", -1.0, 1.0).unwrap())
//!     .qoi(QoI::new("f", 0.3, |p: &Parameterization<'_>| p["a"] - 0.5 * p["b"]).unwrap())
//!     .rounds(vec![round; 3])
//!     .logger(MemoryLogger::new())
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let storage = MemoryStorage::new();
//! let report = Optimizer::builder(config).storage(storage.clone()).build().run().unwrap();
//! assert_eq!(report.rounds.len(), 3);
//!
//! // every survivor of the last round is close to the target
//! let last = storage.round(2).unwrap();
//! assert!(last.iter().all(|s| s.errors[0] < 0.1));
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Parameter`](parameter::Parameter) | A named continuous dimension with inclusive bounds. |
//! | [`QoI`](qoi::QoI) | A target value plus the [`Evaluator`](qoi::Evaluator) that predicts it. |
//! | [`ErrorCalculator`](metric::ErrorCalculator) | Turns predictions and targets into per-QoI costs. |
//! | [`Filter`](filter::Filter) | Drops poor candidates; composed with [`FilterChain`](filter::FilterChain). |
//! | [`Scorer`](filter::Scorer) | Reduces error rows to the scalar the percentile and z-score filters rank by. |
//! | [`Projector`](projection::Projector) | Maps parameter rows to 2-D points. |
//! | [`Clusterer`](cluster::Clusterer) | Labels the projected points. |
//! | [`Storage`](storage::Storage) | Receives each round's population. |
//! | [`Optimizer`] | Runs the rounds described by a [`GlobalConfiguration`](config::GlobalConfiguration). |
//!
//! # Shipped implementations
//!
//! | Contract | Implementations |
//! |----------|-----------------|
//! | `ErrorCalculator` | [`AbsoluteError`](metric::AbsoluteError), [`SquaredError`](metric::SquaredError), [`LogCoshError`](metric::LogCoshError), [`RawError`](metric::RawError) |
//! | `Filter` | [`ParetoFilter`](filter::ParetoFilter), [`PercentileFilter`](filter::PercentileFilter), [`ZScoreFilter`](filter::ZScoreFilter), [`FilterChain`](filter::FilterChain) |
//! | `Scorer` | [`AbsSum`](filter::AbsSum), [`ScaledSum`](filter::ScaledSum), any `Fn(&[Vec<f64>]) -> Vec<f64>` |
//! | `Scaler` | [`StandardScaler`](scale::StandardScaler), [`RobustScaler`](scale::RobustScaler) |
//! | `Projector` | [`PcaProjector`](projection::PcaProjector), [`ColumnProjector`](projection::ColumnProjector) |
//! | `Clusterer` | [`KMeansClusterer`](cluster::KMeansClusterer), [`DbscanClusterer`](cluster::DbscanClusterer), [`SingleClusterer`](cluster::SingleClusterer) |
//! | `Storage` | [`CsvStorage`](storage::CsvStorage), [`MemoryStorage`](storage::MemoryStorage) |
//! | `Logger` | [`ConsoleLogger`](log::ConsoleLogger), [`MemoryLogger`](log::MemoryLogger), `TracingLogger` |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) and `log::TracingLogger` | on |
//! | `parallel` | Per-row evaluation on the `rayon` thread pool | off |
//! | `serde` | `Serialize`/`Deserialize` on plain data types and [`RunReport::export_json`] | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod cluster;
pub mod config;
mod error;
pub mod filter;
pub mod kde;
pub mod log;
pub mod metric;
mod optimizer;
pub mod parameter;
pub mod pareto;
pub mod population;
pub mod projection;
pub mod qoi;
mod rng_util;
pub mod sampler;
pub mod scale;
pub mod storage;

pub use error::{BoxError, Error, Result};
pub use optimizer::{Optimizer, OptimizerBuilder, RoundReport, RoundStage, RunReport};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use mobo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cluster::{Clusterer, DbscanClusterer, KMeansClusterer, SingleClusterer};
    pub use crate::config::{GlobalConfiguration, LocalConfiguration};
    pub use crate::error::{Error, Result};
    pub use crate::filter::{
        AbsSum, Filter, FilterChain, ParetoFilter, PercentileFilter, ScaledSum, Scorer, ZScoreFilter,
    };
    pub use crate::kde::KdeBandwidth;
    #[cfg(feature = "tracing")]
    pub use crate::log::TracingLogger;
    pub use crate::log::{ConsoleLogger, Logger, MemoryLogger};
    pub use crate::metric::{AbsoluteError, ErrorCalculator, LogCoshError, RawError, SquaredError};
    pub use crate::optimizer::{Optimizer, RunReport};
    pub use crate::parameter::{Parameter, Parameterization};
    pub use crate::projection::{ColumnProjector, PcaProjector, Projector};
    pub use crate::qoi::{Evaluator, QoI};
    pub use crate::sampler::SmallClusterPolicy;
    pub use crate::scale::{RobustScaler, Scaler, StandardScaler};
    pub use crate::storage::{CsvStorage, Storage};
}
