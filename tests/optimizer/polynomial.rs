use std::collections::HashSet;
use std::sync::Arc;

use mobo::log::MemoryLogger;
use mobo::prelude::*;
use mobo::{Error, Optimizer};

use crate::{TARGET, polynomial_config, read_artifact};

#[test]
fn three_rounds_write_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let logger = Arc::new(MemoryLogger::new());
    let config = polynomial_config(SmallClusterPolicy::Perturb(0.05), logger.clone());

    let report = Optimizer::builder(config)
        .storage(CsvStorage::new(dir.path()))
        .build()
        .run()
        .unwrap();

    assert_eq!(report.rounds.len(), 3);
    for round in 0..3 {
        let path = dir.path().join(format!("mobo_iteration_{round}.csv"));
        assert!(path.exists(), "missing artifact for round {round}");
        let (header, rows) = read_artifact(&path);
        assert_eq!(
            header,
            ["id", "a", "b", "c", "pt0", "pt0_error", "projection_0", "projection_1", "cluster_id"]
        );
        assert!(!rows.is_empty());
        assert!(rows.len() <= 1000);
        for row in &rows {
            let predicted = row.get("pt0");
            let expected = (predicted - TARGET).powi(2);
            assert!((row.get("pt0_error") - expected).abs() < 1e-9);
            assert!(row.id.starts_with(&format!("{round}_")));
        }
    }
    assert_eq!(dir.path().read_dir().unwrap().count(), 3);

    // Pareto on a single QoI keeps exactly the best row.
    assert!(report.rounds.iter().all(|r| r.kept == 1));
    assert_eq!(report.rounds[0].evaluated, 1000);
    assert_eq!(report.rounds[1].evaluated, 1000);
    assert_eq!(report.rounds[2].resampled, 0);
}

#[test]
fn best_error_stays_small() {
    let dir = tempfile::tempdir().unwrap();
    let config = polynomial_config(
        SmallClusterPolicy::Perturb(0.05),
        Arc::new(MemoryLogger::new()),
    );
    Optimizer::builder(config)
        .storage(CsvStorage::new(dir.path()))
        .build()
        .run()
        .unwrap();

    let best = |round: usize| {
        let (_, rows) = read_artifact(&dir.path().join(format!("mobo_iteration_{round}.csv")));
        rows.iter().map(|r| r.get("pt0_error")).fold(f64::INFINITY, f64::min)
    };
    assert!(best(0) < 1e-3);
    assert!(best(2) < 1e-3);
}

#[test]
fn ids_are_unique_across_the_run() {
    let storage = mobo::storage::MemoryStorage::new();
    let round = LocalConfiguration::builder(400)
        .filters(FilterChain::intersectional().with(PercentileFilter::new(25.0).unwrap()))
        .clusterer(KMeansClusterer::with_seed(2, 5).unwrap())
        .build()
        .unwrap();
    let config = GlobalConfiguration::builder()
        .n_samples(400)
        .parameters(crate::parameters())
        .qoi(QoI::new("pt0", TARGET, crate::polynomial).unwrap())
        .rounds(vec![round; 4])
        .logger(MemoryLogger::new())
        .seed(3)
        .build()
        .unwrap();
    Optimizer::builder(config)
        .storage(storage.clone())
        .build()
        .run()
        .unwrap();

    let mut seen = HashSet::new();
    let mut total = 0;
    for round in 0..4 {
        let population = storage.round(round).unwrap();
        for sample in &population {
            total += 1;
            assert!(seen.insert(sample.id), "duplicate id {}", sample.id);
            assert_eq!(sample.id.iteration, round);
        }
    }
    assert_eq!(seen.len(), total);
}

#[test]
fn every_stage_logs_one_line() {
    let logger = Arc::new(MemoryLogger::new());
    let config = polynomial_config(SmallClusterPolicy::Perturb(0.05), logger.clone());
    Optimizer::builder(config)
        .storage(mobo::storage::MemoryStorage::new())
        .build()
        .run()
        .unwrap();

    let lines = logger.lines();
    for stage in ["evaluating", "filtering", "projecting", "clustering", "exporting"] {
        let count = lines
            .iter()
            .filter(|l| l.starts_with("round 1:") && l.contains(stage))
            .count();
        assert_eq!(count, 1, "stage {stage}");
    }
    assert!(lines.iter().any(|l| l.starts_with("round 1: resampling")));
    assert!(!lines.iter().any(|l| l.starts_with("round 2: resampling")));
    // one degenerate single-member cluster per resampled round
    assert_eq!(logger.warnings().len(), 2);
}

#[test]
fn same_seed_reproduces_the_run() {
    let run = || {
        let storage = mobo::storage::MemoryStorage::new();
        let config = polynomial_config(
            SmallClusterPolicy::Perturb(0.05),
            Arc::new(MemoryLogger::new()),
        );
        Optimizer::builder(config)
            .storage(storage.clone())
            .build()
            .run()
            .unwrap();
        storage.round(2).unwrap().parameter_matrix()
    };
    assert_eq!(run(), run());
}

#[test]
fn single_survivor_without_perturbation_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = polynomial_config(SmallClusterPolicy::Skip, Arc::new(MemoryLogger::new()));
    let err = Optimizer::builder(config)
        .storage(CsvStorage::new(dir.path()))
        .build()
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::NoUsableClusters { round: 0 }));
    // the completed export stays on disk
    assert!(dir.path().join("mobo_iteration_0.csv").exists());
    assert!(!dir.path().join("mobo_iteration_1.csv").exists());
}
