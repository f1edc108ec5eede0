use std::io::Write;

use mobo::log::MemoryLogger;
use mobo::prelude::*;
use mobo::storage::MemoryStorage;
use mobo::{Error, Optimizer};

fn config(path: &std::path::Path, rounds: usize) -> GlobalConfiguration {
    let round = LocalConfiguration::builder(50).build().unwrap();
    GlobalConfiguration::builder()
        .n_samples(1000)
        .parameters(crate::parameters())
        .qoi(QoI::new("pt0", crate::TARGET, crate::polynomial).unwrap())
        .rounds(vec![round; rounds])
        .initial_population(path)
        .logger(MemoryLogger::new())
        .seed(5)
        .build()
        .unwrap()
}

#[test]
fn seed_file_replaces_uniform_draws() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "note,c,b,a").unwrap();
    for i in 0..12 {
        let t = f64::from(i) / 12.0;
        writeln!(file, "row{i},{t},{},{}", -2.0 * t, 2.0 * t - 1.0).unwrap();
    }
    file.flush().unwrap();

    let storage = MemoryStorage::new();
    let report = Optimizer::builder(config(file.path(), 1))
        .storage(storage.clone())
        .build()
        .run()
        .unwrap();

    assert_eq!(report.rounds[0].evaluated, 12);
    let population = storage.round(0).unwrap();
    assert_eq!(population.len(), 12);
    let first = &population.samples()[0];
    assert_eq!(first.id.to_string(), "0_0");
    assert_eq!(first.parameters, vec![-1.0, 0.0, 0.0]);
}

#[test]
fn previous_artifact_is_a_valid_seed() {
    let dir = tempfile::tempdir().unwrap();
    let round = LocalConfiguration::builder(100)
        .filters(FilterChain::intersectional().with(PercentileFilter::new(50.0).unwrap()))
        .build()
        .unwrap();
    let first = GlobalConfiguration::builder()
        .n_samples(100)
        .parameters(crate::parameters())
        .qoi(QoI::new("pt0", crate::TARGET, crate::polynomial).unwrap())
        .round(round)
        .logger(MemoryLogger::new())
        .seed(8)
        .build()
        .unwrap();
    Optimizer::builder(first)
        .storage(CsvStorage::new(dir.path()))
        .build()
        .run()
        .unwrap();

    let artifact = dir.path().join("mobo_iteration_0.csv");
    let (_, rows) = crate::read_artifact(&artifact);
    let storage = MemoryStorage::new();
    Optimizer::builder(config(&artifact, 1))
        .storage(storage.clone())
        .build()
        .run()
        .unwrap();
    assert_eq!(storage.round(0).unwrap().len(), rows.len());
}

#[test]
fn seed_file_missing_column() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "a,b\n0.1,-0.5").unwrap();
    file.flush().unwrap();
    let err = Optimizer::builder(config(file.path(), 1))
        .storage(MemoryStorage::new())
        .build()
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "c"));
}

#[test]
fn missing_seed_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Optimizer::builder(config(&dir.path().join("absent.csv"), 1))
        .storage(MemoryStorage::new())
        .build()
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn parameter_named_like_an_artifact_column_is_rejected() {
    let round = LocalConfiguration::builder(50).build().unwrap();
    let err = GlobalConfiguration::builder()
        .n_samples(50)
        .parameter(Parameter::new("id", 0.0, 1.0).unwrap())
        .qoi(QoI::new("pt0", 0.5, |p: &Parameterization<'_>| p["id"]).unwrap())
        .round(round)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::ReservedName(ref n) if n == "id"));
}
