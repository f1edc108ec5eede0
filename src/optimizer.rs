//! The round loop.
//!
//! ```text
//! Init -> { Evaluate -> Filter -> Project -> Cluster -> Export -> Resample } x R -> Done
//! ```
//!
//! The first round starts from a uniform population (or a seed file). Each
//! later round starts from the draws of the previous round's resampling
//! stage; rows are never carried forward. The final round does not
//! resample. Every stage transition writes one line to the configured
//! [`Logger`](crate::log::Logger).

use core::fmt;
use core::time::Duration;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{GlobalConfiguration, LocalConfiguration};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::log::Logger;
use crate::parameter::Parameterization;
use crate::population::{Population, Sample, Schema};
use crate::sampler::{Sampler, UniformSampler, resample_clusters};
use crate::storage::{CsvStorage, Storage};

/// A stage of one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundStage {
    /// Evaluators and the error calculator run on every row.
    Evaluate,
    /// The filter chain drops rejected rows.
    Filter,
    /// Parameters are projected to two dimensions.
    Project,
    /// Projected rows are labelled.
    Cluster,
    /// The population is handed to the storage sink.
    Export,
    /// The next round's population is drawn from the clusters.
    Resample,
}

impl fmt::Display for RoundStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Evaluate => "evaluate",
            Self::Filter => "filter",
            Self::Project => "project",
            Self::Cluster => "cluster",
            Self::Export => "export",
            Self::Resample => "resample",
        })
    }
}

/// Counters for one completed round.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundReport {
    /// Round index.
    pub round: usize,
    /// Rows evaluated.
    pub evaluated: usize,
    /// Rows kept by the filter chain (and exported).
    pub kept: usize,
    /// Distinct cluster labels among the kept rows.
    pub clusters: usize,
    /// Rows drawn for the next round; zero after the final round.
    pub resampled: usize,
    /// Wall-clock time spent in the round.
    pub duration: Duration,
}

/// Summary of a completed run.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    /// One entry per round, in order.
    pub rounds: Vec<RoundReport>,
}

impl RunReport {
    /// Returns the total wall-clock time of all rounds.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.rounds.iter().map(|r| r.duration).sum()
    }

    /// Returns the report of the last round, if any.
    #[must_use]
    pub fn last(&self) -> Option<&RoundReport> {
        self.rounds.last()
    }

    /// Writes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if serialization or writing fails.
    #[cfg(feature = "serde")]
    pub fn export_json(&self, writer: impl std::io::Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).map_err(|e| Error::Io(e.into()))
    }
}

/// Drives the round loop for one [`GlobalConfiguration`].
///
/// # Examples
///
/// ```
/// use mobo::prelude::*;
/// use mobo::storage::MemoryStorage;
///
/// let round = LocalConfiguration::builder(200)
///     .filters(FilterChain::intersectional().with(PercentileFilter::new(50.0).unwrap()))
///     .build()
///     .unwrap();
/// let config = GlobalConfiguration::builder()
///     .n_samples(200)
///     .parameter(Parameter::new("x", -1.0, 1.0).unwrap())
///     .parameter(Parameter::new("y", -1.0, 1.0).unwrap())
///     .qoi(QoI::new("sum", 0.5, |p: &Parameterization<'_>| p["x"] + p["y"]).unwrap())
///     .rounds(vec![round; 2])
///     .logger(MemoryLogger::new())
///     .seed(1)
///     .build()
///     .unwrap();
///
/// let storage = MemoryStorage::new();
/// let report = Optimizer::builder(config)
///     .storage(storage.clone())
///     .build()
///     .run()
///     .unwrap();
///
/// assert_eq!(report.rounds.len(), 2);
/// assert_eq!(storage.len(), 2);
/// ```
pub struct Optimizer {
    config: GlobalConfiguration,
    schema: Arc<Schema>,
    storage: Arc<dyn Storage>,
}

impl Optimizer {
    /// Creates an optimizer that exports CSV files to the working directory.
    #[must_use]
    pub fn new(config: GlobalConfiguration) -> Self {
        Self::builder(config).build()
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder(config: GlobalConfiguration) -> OptimizerBuilder {
        OptimizerBuilder {
            config,
            storage: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GlobalConfiguration {
        &self.config
    }

    /// Returns the column schema shared by every round's population.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Runs every configured round.
    ///
    /// Artifacts of completed rounds stay exported when a later round
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage: seed-file errors,
    /// `Error::Evaluation` and shape mismatches, `Error::Collaborator` for
    /// failing projectors or clusterers, `Error::EmptyPopulation` when the
    /// filters reject every row, storage errors, and
    /// `Error::NoUsableClusters` when no cluster can seed the next round.
    pub fn run(&self) -> Result<RunReport> {
        let locals = self.config.local_configurations();
        let n_rounds = locals.len();

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "optimize",
            n_rounds,
            n_parameters = self.config.parameters().len(),
            n_qois = self.config.qois().len()
        )
        .entered();

        let mut rng = self
            .config
            .seed()
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

        self.log(&format!(
            "starting optimization: {n_rounds} rounds, {} parameters, {} quantities of interest",
            self.config.parameters().len(),
            self.config.qois().len()
        ));
        let mut population = self.initial_population(&mut rng)?;
        let mut report = RunReport::default();

        for (round, local) in locals.iter().enumerate() {
            let started = Instant::now();
            let evaluated = population.len();

            self.log(&format!("round {round}: evaluating {evaluated} samples"));
            self.evaluate(&mut population, local)?;

            self.log(&format!("round {round}: filtering {evaluated} samples"));
            self.filter(&mut population, round, local)?;
            let kept = population.len();

            self.log(&format!(
                "round {round}: {kept} of {evaluated} samples kept, projecting to 2-D"
            ));
            let projections = local
                .projector()
                .project(&population.parameter_matrix())
                .map_err(|source| Error::Collaborator {
                    round,
                    stage: RoundStage::Project,
                    source,
                })?;
            population.set_projections(projections)?;

            self.log(&format!("round {round}: clustering {kept} samples"));
            let points = population.projections();
            let labels = local
                .clusterer()
                .cluster(&points)
                .map_err(|source| Error::Collaborator {
                    round,
                    stage: RoundStage::Cluster,
                    source,
                })?;
            population.set_clusters(labels)?;
            let clusters = population.cluster_groups().len();

            self.log(&format!(
                "round {round}: exporting {kept} samples in {clusters} clusters"
            ));
            self.storage.export(round, &population)?;

            let mut resampled = 0;
            if let Some(next) = locals.get(round + 1) {
                let n = next.n_samples();
                self.log(&format!(
                    "round {round}: resampling {n} samples for round {}",
                    round + 1
                ));
                let out = resample_clusters(
                    &population,
                    n,
                    self.config.parameters(),
                    local.bandwidth(),
                    local.small_clusters(),
                    &mut rng,
                    self.logger(),
                )?;
                for c in &out.clusters {
                    self.log(&format!(
                        "round {round}: cluster {} ({} members) drew {}",
                        c.cluster_id, c.members, c.drawn
                    ));
                }
                if out.draws.is_empty() {
                    return Err(Error::NoUsableClusters { round });
                }
                resampled = out.draws.len();
                population = Population::from_rows(Arc::clone(&self.schema), round + 1, out.draws)?;
            }

            let duration = started.elapsed();
            self.log(&format!(
                "round {round}: completed in {:.3} s",
                duration.as_secs_f64()
            ));
            trace_info!(round, evaluated, kept, clusters, resampled, "round completed");
            report.rounds.push(RoundReport {
                round,
                evaluated,
                kept,
                clusters,
                resampled,
                duration,
            });
        }

        self.log("optimization finished");
        Ok(report)
    }

    fn logger(&self) -> &dyn Logger {
        self.config.logger().as_ref()
    }

    fn log(&self, message: &str) {
        self.logger().info(message);
    }

    fn initial_population(&self, rng: &mut fastrand::Rng) -> Result<Population> {
        if let Some(path) = self.config.initial_population() {
            self.log(&format!("reading initial population from {}", path.display()));
            let population = Population::import_csv(Arc::clone(&self.schema), path)?;
            trace_debug!(rows = population.len(), "seed population loaded");
            return Ok(population);
        }
        let n = self.config.n_samples();
        self.log(&format!("drawing {n} uniform samples"));
        let rows = UniformSampler::new(self.config.parameters()).draw(n, rng);
        Population::from_rows(Arc::clone(&self.schema), 0, rows)
    }

    fn evaluate(&self, population: &mut Population, local: &LocalConfiguration) -> Result<()> {
        let targets: Vec<f64> = self.config.qois().iter().map(crate::qoi::QoI::target).collect();

        #[cfg(feature = "parallel")]
        let results = {
            use rayon::prelude::*;
            population
                .samples()
                .par_iter()
                .map(|s| self.evaluate_sample(s, local, &targets))
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let results = population
            .iter()
            .map(|s| self.evaluate_sample(s, local, &targets))
            .collect::<Result<Vec<_>>>()?;

        population.set_evaluations(results)
    }

    fn evaluate_sample(
        &self,
        sample: &Sample,
        local: &LocalConfiguration,
        targets: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>)> {
        let parameterization = Parameterization::new(self.config.parameters(), &sample.parameters)?;
        let values = self
            .config
            .qois()
            .iter()
            .map(|qoi| {
                qoi.evaluate(&parameterization)
                    .map_err(|source| Error::Evaluation {
                        qoi: qoi.name().to_owned(),
                        sample: sample.id.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        let errors = local.error_calculator().calculate(&values, targets);
        if errors.len() != values.len() {
            return Err(Error::ErrorCountMismatch {
                expected: values.len(),
                got: errors.len(),
            });
        }
        Ok((values, errors))
    }

    fn filter(&self, population: &mut Population, round: usize, local: &LocalConfiguration) -> Result<()> {
        let mask = local.filters().mask(&population.error_matrix());
        population.retain_mask(&mask)?;
        if population.is_empty() {
            return Err(Error::EmptyPopulation { round });
        }
        Ok(())
    }
}

impl fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Optimizer`].
///
/// # Defaults
///
/// - Storage: [`CsvStorage`] writing to the working directory
pub struct OptimizerBuilder {
    config: GlobalConfiguration,
    storage: Option<Arc<dyn Storage>>,
}

impl OptimizerBuilder {
    /// Set the export sink.
    #[must_use]
    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Build the [`Optimizer`].
    #[must_use]
    pub fn build(self) -> Optimizer {
        let schema = Arc::new(Schema::from_definitions(
            self.config.parameters(),
            self.config.qois(),
        ));
        Optimizer {
            config: self.config,
            schema,
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(CsvStorage::default())),
        }
    }
}
