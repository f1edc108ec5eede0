//! Calibrate a cubic through the origin against one observed point.
//!
//! `f(x) = a·x³ + b·x² + c·x` is evaluated at `x = -0.1` and compared to the
//! target `-0.062`. Each round's survivors are written to
//! `mobo_iteration_<round>.csv` in the output directory (default: a fresh
//! `mobo-polynomial` directory under the system temp dir).
//!
//! Run with: `cargo run --example polynomial [output-dir]`
//! Set `RUST_LOG=mobo=debug` for per-cluster detail.

use std::path::PathBuf;

use mobo::prelude::*;
use tracing_subscriber::EnvFilter;

const X: f64 = -0.1;
const TARGET: f64 = -0.062;

fn main() -> mobo::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let out: PathBuf = std::env::args_os()
        .nth(1)
        .map_or_else(|| std::env::temp_dir().join("mobo-polynomial"), PathBuf::from);

    let round = LocalConfiguration::builder(1000)
        .error_calculator(SquaredError)
        .filters(
            FilterChain::sequential()
                .with(PercentileFilter::new(10.0)?)
                .with(ParetoFilter::new()),
        )
        .small_clusters(SmallClusterPolicy::Perturb(0.05))
        .build()?;

    let config = GlobalConfiguration::builder()
        .n_samples(1000)
        .parameter(Parameter::new("a", -1.0, 1.0)?)
        .parameter(Parameter::new("b", -2.0, 0.0)?)
        .parameter(Parameter::new("c", 0.0, 1.0)?)
        .qoi(QoI::new("pt0", TARGET, |p: &Parameterization<'_>| {
            p["a"] * X.powi(3) + p["b"] * X.powi(2) + p["c"] * X
        })?)
        .rounds(vec![round; 3])
        .logger(TracingLogger)
        .seed(2024)
        .build()?;

    let report = Optimizer::builder(config)
        .storage(CsvStorage::new(&out))
        .build()
        .run()?;

    println!("Finished {} rounds in {:.3} s:", report.rounds.len(), report.total_duration().as_secs_f64());
    for r in &report.rounds {
        println!(
            "  round {}: {} evaluated, {} kept, {} clusters, {} resampled",
            r.round, r.evaluated, r.kept, r.clusters, r.resampled
        );
    }
    println!("Artifacts written to {}", out.display());

    Ok(())
}
