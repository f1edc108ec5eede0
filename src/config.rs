//! Run configuration.
//!
//! A run is described by one [`GlobalConfiguration`] holding the search
//! space, the quantities of interest and one [`LocalConfiguration`] per
//! round. Both are built with fluent builders and validated eagerly at
//! `build()`, so an [`Optimizer`](crate::Optimizer) never starts from an
//! inconsistent configuration.
//!
//! # Example
//!
//! ```
//! use mobo::prelude::*;
//!
//! let round = LocalConfiguration::builder(500)
//!     .error_calculator(SquaredError)
//!     .filters(FilterChain::intersectional().with(ParetoFilter::new()))
//!     .build()
//!     .unwrap();
//!
//! let config = GlobalConfiguration::builder()
//!     .n_samples(500)
//!     .parameter(Parameter::new("x", -1.0, 1.0).unwrap())
//!     .qoi(QoI::new("square", 0.25, |p: &Parameterization<'_>| p["x"] * p["x"]).unwrap())
//!     .rounds(vec![round; 3])
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.n_rounds(), 3);
//! ```

use core::fmt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cluster::{Clusterer, SingleClusterer};
use crate::error::{Error, Result};
use crate::filter::FilterChain;
use crate::kde::KdeBandwidth;
use crate::log::{ConsoleLogger, Logger};
use crate::metric::{ErrorCalculator, SquaredError};
use crate::parameter::{Parameter, validate_unique};
use crate::population::{ID_COLUMN, TRAILING_COLUMNS, error_column};
use crate::projection::{PcaProjector, Projector};
use crate::qoi::QoI;
use crate::sampler::SmallClusterPolicy;

/// Settings for one round.
///
/// Cheap to clone: collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct LocalConfiguration {
    n_samples: usize,
    error_calculator: Arc<dyn ErrorCalculator>,
    filters: FilterChain,
    projector: Arc<dyn Projector>,
    clusterer: Arc<dyn Clusterer>,
    bandwidth: KdeBandwidth,
    small_clusters: SmallClusterPolicy,
}

impl LocalConfiguration {
    /// Starts a builder for a round of `n_samples` candidates.
    ///
    /// `n_samples` sizes the round's population when it is resampled from
    /// the previous round. The first round is sized by
    /// [`GlobalConfiguration::n_samples`] instead.
    #[must_use]
    pub fn builder(n_samples: usize) -> LocalConfigurationBuilder {
        LocalConfigurationBuilder::new(n_samples)
    }

    /// Returns the sample budget of this round.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Returns the error calculator.
    #[must_use]
    pub fn error_calculator(&self) -> &dyn ErrorCalculator {
        self.error_calculator.as_ref()
    }

    /// Returns the filter chain.
    #[must_use]
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Returns the projector.
    #[must_use]
    pub fn projector(&self) -> &dyn Projector {
        self.projector.as_ref()
    }

    /// Returns the clusterer.
    #[must_use]
    pub fn clusterer(&self) -> &dyn Clusterer {
        self.clusterer.as_ref()
    }

    /// Returns the KDE bandwidth rule used when this round is resampled.
    #[must_use]
    pub fn bandwidth(&self) -> KdeBandwidth {
        self.bandwidth
    }

    /// Returns the policy for clusters that cannot support a density.
    #[must_use]
    pub fn small_clusters(&self) -> SmallClusterPolicy {
        self.small_clusters
    }
}

impl fmt::Debug for LocalConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalConfiguration")
            .field("n_samples", &self.n_samples)
            .field("filters", &self.filters)
            .field("bandwidth", &self.bandwidth)
            .field("small_clusters", &self.small_clusters)
            .finish_non_exhaustive()
    }
}

/// Builder for [`LocalConfiguration`].
///
/// # Defaults
///
/// - Error calculator: [`SquaredError`]
/// - Filters: empty intersectional chain (keeps everything)
/// - Projector: [`PcaProjector`]
/// - Clusterer: [`SingleClusterer`]
/// - Bandwidth: [`KdeBandwidth::Scott`]
/// - Small clusters: [`SmallClusterPolicy::Skip`]
pub struct LocalConfigurationBuilder {
    n_samples: usize,
    error_calculator: Option<Arc<dyn ErrorCalculator>>,
    filters: FilterChain,
    projector: Option<Arc<dyn Projector>>,
    clusterer: Option<Arc<dyn Clusterer>>,
    bandwidth: KdeBandwidth,
    small_clusters: SmallClusterPolicy,
}

impl LocalConfigurationBuilder {
    fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            error_calculator: None,
            filters: FilterChain::default(),
            projector: None,
            clusterer: None,
            bandwidth: KdeBandwidth::default(),
            small_clusters: SmallClusterPolicy::default(),
        }
    }

    /// Set the error calculator.
    #[must_use]
    pub fn error_calculator(mut self, calculator: impl ErrorCalculator + 'static) -> Self {
        self.error_calculator = Some(Arc::new(calculator));
        self
    }

    /// Set the filter chain.
    #[must_use]
    pub fn filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Set the projector.
    #[must_use]
    pub fn projector(mut self, projector: impl Projector + 'static) -> Self {
        self.projector = Some(Arc::new(projector));
        self
    }

    /// Set the clusterer.
    #[must_use]
    pub fn clusterer(mut self, clusterer: impl Clusterer + 'static) -> Self {
        self.clusterer = Some(Arc::new(clusterer));
        self
    }

    /// Set the KDE bandwidth rule.
    #[must_use]
    pub fn bandwidth(mut self, bandwidth: KdeBandwidth) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Set the policy for clusters that cannot support a density.
    #[must_use]
    pub fn small_clusters(mut self, policy: SmallClusterPolicy) -> Self {
        self.small_clusters = policy;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::ZeroSamples` for a zero sample budget and
    /// `Error::InvalidBandwidth` for an invalid bandwidth factor or
    /// perturbation scale.
    pub fn build(self) -> Result<LocalConfiguration> {
        if self.n_samples == 0 {
            return Err(Error::ZeroSamples);
        }
        Ok(LocalConfiguration {
            n_samples: self.n_samples,
            error_calculator: self
                .error_calculator
                .unwrap_or_else(|| Arc::new(SquaredError)),
            filters: self.filters,
            projector: self.projector.unwrap_or_else(|| Arc::new(PcaProjector)),
            clusterer: self.clusterer.unwrap_or_else(|| Arc::new(SingleClusterer)),
            bandwidth: self.bandwidth.validate()?,
            small_clusters: self.small_clusters.validate()?,
        })
    }
}

/// Settings for a whole run.
#[derive(Clone)]
pub struct GlobalConfiguration {
    n_samples: usize,
    local_configurations: Vec<LocalConfiguration>,
    parameters: Vec<Parameter>,
    qois: Vec<QoI>,
    initial_population: Option<PathBuf>,
    logger: Arc<dyn Logger>,
    seed: Option<u64>,
}

impl GlobalConfiguration {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> GlobalConfigurationBuilder {
        GlobalConfigurationBuilder::default()
    }

    /// Returns the size of the first round's uniform population.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Returns the per-round settings, in round order.
    #[must_use]
    pub fn local_configurations(&self) -> &[LocalConfiguration] {
        &self.local_configurations
    }

    /// Returns the number of rounds.
    #[must_use]
    pub fn n_rounds(&self) -> usize {
        self.local_configurations.len()
    }

    /// Returns the parameters, in column order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the quantities of interest, in column order.
    #[must_use]
    pub fn qois(&self) -> &[QoI] {
        &self.qois
    }

    /// Returns the seed population file, if one was configured.
    #[must_use]
    pub fn initial_population(&self) -> Option<&Path> {
        self.initial_population.as_deref()
    }

    /// Returns the progress logger ([`ConsoleLogger`] unless one was set).
    #[must_use]
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Returns the random seed, if one was set.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl fmt::Debug for GlobalConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalConfiguration")
            .field("n_samples", &self.n_samples)
            .field("local_configurations", &self.local_configurations)
            .field("parameters", &self.parameters)
            .field("qois", &self.qois)
            .field("initial_population", &self.initial_population)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// Builder for [`GlobalConfiguration`].
#[derive(Default)]
pub struct GlobalConfigurationBuilder {
    n_samples: usize,
    n_rounds: Option<usize>,
    local_configurations: Vec<LocalConfiguration>,
    parameters: Vec<Parameter>,
    qois: Vec<QoI>,
    initial_population: Option<PathBuf>,
    logger: Option<Arc<dyn Logger>>,
    seed: Option<u64>,
}

impl GlobalConfigurationBuilder {
    /// Set the size of the first round's uniform population.
    #[must_use]
    pub fn n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Declare the number of rounds; checked against the number of local
    /// configurations at build time.
    #[must_use]
    pub fn n_rounds(mut self, n_rounds: usize) -> Self {
        self.n_rounds = Some(n_rounds);
        self
    }

    /// Append one round.
    #[must_use]
    pub fn round(mut self, local: LocalConfiguration) -> Self {
        self.local_configurations.push(local);
        self
    }

    /// Append several rounds.
    #[must_use]
    pub fn rounds(mut self, locals: impl IntoIterator<Item = LocalConfiguration>) -> Self {
        self.local_configurations.extend(locals);
        self
    }

    /// Append a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Append several parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    /// Append a quantity of interest.
    #[must_use]
    pub fn qoi(mut self, qoi: QoI) -> Self {
        self.qois.push(qoi);
        self
    }

    /// Append several quantities of interest.
    #[must_use]
    pub fn qois(mut self, qois: impl IntoIterator<Item = QoI>) -> Self {
        self.qois.extend(qois);
        self
    }

    /// Seed the first round from a CSV file instead of uniform draws.
    #[must_use]
    pub fn initial_population(mut self, path: impl Into<PathBuf>) -> Self {
        self.initial_population = Some(path.into());
        self
    }

    /// Set the progress logger.
    #[must_use]
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Set a shared progress logger, e.g. a [`MemoryLogger`](crate::log::MemoryLogger)
    /// the caller keeps a handle to.
    #[must_use]
    pub fn shared_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Fix the random seed for reproducible runs.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Artifact headers must stay unique, so no name may shadow the id,
    /// projection or label columns or another QoI's error column.
    fn check_reserved_names(&self) -> Result<()> {
        let error_columns: HashSet<String> =
            self.qois.iter().map(|q| error_column(q.name())).collect();
        let names = self
            .parameters
            .iter()
            .map(Parameter::name)
            .chain(self.qois.iter().map(QoI::name));
        for name in names {
            if name == ID_COLUMN || TRAILING_COLUMNS.contains(&name) || error_columns.contains(name) {
                return Err(Error::ReservedName(name.to_owned()));
            }
        }
        Ok(())
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoParameters`, `Error::NoQois` or `Error::NoRounds`
    /// for an empty list, `Error::ZeroSamples` for a zero first-round
    /// budget, `Error::DuplicateName` if a name is used twice across
    /// parameters and QoIs, `Error::ReservedName` if a name collides with
    /// an artifact column, and `Error::RoundCountMismatch` if a declared
    /// round count disagrees with the local configurations.
    pub fn build(self) -> Result<GlobalConfiguration> {
        if self.parameters.is_empty() {
            return Err(Error::NoParameters);
        }
        if self.qois.is_empty() {
            return Err(Error::NoQois);
        }
        if self.local_configurations.is_empty() {
            return Err(Error::NoRounds);
        }
        if let Some(expected) = self.n_rounds {
            if expected != self.local_configurations.len() {
                return Err(Error::RoundCountMismatch {
                    expected,
                    got: self.local_configurations.len(),
                });
            }
        }
        if self.n_samples == 0 {
            return Err(Error::ZeroSamples);
        }
        validate_unique(
            self.parameters
                .iter()
                .map(Parameter::name)
                .chain(self.qois.iter().map(QoI::name)),
        )?;
        self.check_reserved_names()?;

        Ok(GlobalConfiguration {
            n_samples: self.n_samples,
            local_configurations: self.local_configurations,
            parameters: self.parameters,
            qois: self.qois,
            initial_population: self.initial_population,
            logger: self.logger.unwrap_or_else(|| Arc::new(ConsoleLogger)),
            seed: self.seed,
        })
    }
}
