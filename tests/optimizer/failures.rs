use std::sync::Arc;

use mobo::log::MemoryLogger;
use mobo::prelude::*;
use mobo::storage::MemoryStorage;
use mobo::{BoxError, Error, Optimizer, RoundStage};

struct BrokenProjector;

impl Projector for BrokenProjector {
    fn project(&self, _: &[Vec<f64>]) -> std::result::Result<Vec<[f64; 2]>, BoxError> {
        Err("manifold did not converge".into())
    }
}

struct ShortProjector;

impl Projector for ShortProjector {
    fn project(&self, parameters: &[Vec<f64>]) -> std::result::Result<Vec<[f64; 2]>, BoxError> {
        Ok(vec![[0.0, 0.0]; parameters.len().saturating_sub(1)])
    }
}

struct ConstantLabels(usize);

impl Clusterer for ConstantLabels {
    fn cluster(&self, _: &[[f64; 2]]) -> std::result::Result<Vec<i64>, BoxError> {
        Ok(vec![0; self.0])
    }
}

struct RejectAll;

impl Filter for RejectAll {
    fn mask(&self, errors: &[Vec<f64>]) -> Vec<bool> {
        vec![false; errors.len()]
    }
}

struct ShortMask;

impl Filter for ShortMask {
    fn mask(&self, _: &[Vec<f64>]) -> Vec<bool> {
        vec![true]
    }
}

struct TooManyErrors;

impl ErrorCalculator for TooManyErrors {
    fn calculate(&self, actual: &[f64], _: &[f64]) -> Vec<f64> {
        vec![0.0; actual.len() + 1]
    }
}

struct DivergesForLargeA;

impl Evaluator for DivergesForLargeA {
    fn evaluate(&self, p: &Parameterization<'_>) -> std::result::Result<f64, BoxError> {
        if p["a"] > 0.9 {
            Err("solver diverged".into())
        } else {
            Ok(crate::polynomial(p))
        }
    }
}

fn run(round: LocalConfiguration, qoi: QoI) -> mobo::Result<RunReport> {
    let config = GlobalConfiguration::builder()
        .n_samples(200)
        .parameters(crate::parameters())
        .qoi(qoi)
        .rounds(vec![round; 2])
        .logger(MemoryLogger::new())
        .seed(11)
        .build()
        .unwrap();
    Optimizer::builder(config)
        .storage(MemoryStorage::new())
        .build()
        .run()
}

fn qoi() -> QoI {
    QoI::new("pt0", crate::TARGET, crate::polynomial).unwrap()
}

#[test]
fn evaluator_failure_names_qoi_and_sample() {
    let round = LocalConfiguration::builder(200).build().unwrap();
    let err = run(round, QoI::new("pt0", 0.0, DivergesForLargeA).unwrap()).unwrap_err();
    match err {
        Error::Evaluation { qoi, sample, source } => {
            assert_eq!(qoi, "pt0");
            assert!(sample.starts_with("0_"));
            assert_eq!(source.to_string(), "solver diverged");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn projector_failure_is_a_collaborator_error() {
    let round = LocalConfiguration::builder(200)
        .projector(BrokenProjector)
        .build()
        .unwrap();
    let err = run(round, qoi()).unwrap_err();
    assert!(matches!(
        err,
        Error::Collaborator {
            round: 0,
            stage: RoundStage::Project,
            ..
        }
    ));
    assert!(err.to_string().contains("manifold did not converge"));
}

#[test]
fn projection_count_is_checked() {
    let round = LocalConfiguration::builder(200)
        .projector(ShortProjector)
        .build()
        .unwrap();
    assert!(matches!(
        run(round, qoi()),
        Err(Error::ProjectionCountMismatch { .. })
    ));
}

#[test]
fn label_count_is_checked() {
    let round = LocalConfiguration::builder(200)
        .clusterer(ConstantLabels(3))
        .build()
        .unwrap();
    assert!(matches!(
        run(round, qoi()),
        Err(Error::LabelCountMismatch { got: 3, .. })
    ));
}

#[test]
fn rejecting_everything_empties_the_population() {
    let round = LocalConfiguration::builder(200)
        .filters(FilterChain::intersectional().with(RejectAll))
        .build()
        .unwrap();
    assert!(matches!(
        run(round, qoi()),
        Err(Error::EmptyPopulation { round: 0 })
    ));
}

#[test]
fn wrong_mask_length_is_rejected() {
    let round = LocalConfiguration::builder(200)
        .filters(FilterChain::sequential().with(ShortMask))
        .build()
        .unwrap();
    assert!(matches!(
        run(round, qoi()),
        Err(Error::MaskLengthMismatch {
            expected: 200,
            got: 1
        })
    ));
}

#[test]
fn error_calculator_length_is_checked() {
    let round = LocalConfiguration::builder(200)
        .error_calculator(TooManyErrors)
        .build()
        .unwrap();
    assert!(matches!(
        run(round, qoi()),
        Err(Error::ErrorCountMismatch {
            expected: 1,
            got: 2
        })
    ));
}

#[test]
fn failed_round_keeps_earlier_exports() {
    // round 0 succeeds; round 1 rejects everything
    let ok = LocalConfiguration::builder(200).build().unwrap();
    let bad = LocalConfiguration::builder(200)
        .filters(FilterChain::intersectional().with(RejectAll))
        .build()
        .unwrap();
    let storage = MemoryStorage::new();
    let config = GlobalConfiguration::builder()
        .n_samples(200)
        .parameters(crate::parameters())
        .qoi(qoi())
        .round(ok)
        .round(bad)
        .shared_logger(Arc::new(MemoryLogger::new()))
        .seed(1)
        .build()
        .unwrap();
    let err = Optimizer::builder(config)
        .storage(storage.clone())
        .build()
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::EmptyPopulation { round: 1 }));
    assert_eq!(storage.len(), 1);
    assert_eq!(storage.round(0).map(|p| p.len()), Some(200));
}

#[test]
fn nan_predictions_are_filtered_out_of_every_export() {
    let undefined_for_large_a = |p: &Parameterization<'_>| {
        if p["a"] > 0.5 { f64::NAN } else { crate::polynomial(p) }
    };
    let round = LocalConfiguration::builder(200)
        .filters(FilterChain::intersectional().with(PercentileFilter::new(50.0).unwrap()))
        .build()
        .unwrap();
    let storage = MemoryStorage::new();
    let config = GlobalConfiguration::builder()
        .n_samples(200)
        .parameters(crate::parameters())
        .qoi(QoI::new("pt0", crate::TARGET, undefined_for_large_a).unwrap())
        .rounds(vec![round; 2])
        .logger(MemoryLogger::new())
        .seed(5)
        .build()
        .unwrap();
    Optimizer::builder(config)
        .storage(storage.clone())
        .build()
        .run()
        .unwrap();

    for round in 0..2 {
        let population = storage.round(round).unwrap();
        assert!(!population.is_empty());
        for sample in population.iter() {
            assert!(sample.errors.iter().all(|e| e.is_finite()), "round {round}");
            assert!(sample.parameters[0] <= 0.5);
        }
    }
}
