use crate::optimizer::RoundStage;

/// Boxed error returned by user-supplied collaborators (evaluators,
/// projectors, clusterers).
pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

/// Errors returned by configuration, the round loop and artifact I/O.
///
/// Configuration variants are raised eagerly by constructors and builders.
/// The remaining variants end a run; artifacts of rounds that completed
/// before the failure stay exported.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a parameter or QoI is created with an empty name.
    #[error("names must not be empty")]
    EmptyName,

    /// Returned when the lower bound is not strictly less than the upper bound.
    #[error(
        "invalid bounds for '{name}': lower ({lower}) must be finite and strictly less than upper ({upper})"
    )]
    InvalidBounds {
        /// The parameter name.
        name: String,
        /// The lower bound value.
        lower: f64,
        /// The upper bound value.
        upper: f64,
    },

    /// Returned when two parameters or two QoIs share a name.
    #[error("duplicate name '{0}'")]
    DuplicateName(String),

    /// Returned when a parameter or QoI name collides with a column the
    /// CSV artifact reserves (`id`, `projection_0`, `projection_1`,
    /// `cluster_id`) or with a generated `<qoi>_error` column.
    #[error("name '{0}' collides with a reserved artifact column")]
    ReservedName(String),

    /// Returned when a QoI target is NaN or infinite.
    #[error("target for '{name}' must be finite, got {target}")]
    InvalidTarget {
        /// The QoI name.
        name: String,
        /// The rejected target.
        target: f64,
    },

    /// Returned when the configuration declares no parameters.
    #[error("at least one parameter is required")]
    NoParameters,

    /// Returned when the configuration declares no quantities of interest.
    #[error("at least one quantity of interest is required")]
    NoQois,

    /// Returned when the configuration declares no rounds.
    #[error("at least one local configuration (round) is required")]
    NoRounds,

    /// Returned when a sample count is zero.
    #[error("sample count must be positive")]
    ZeroSamples,

    /// Returned when the declared round count disagrees with the number of
    /// local configurations.
    #[error("round count mismatch: {expected} rounds declared but {got} local configurations given")]
    RoundCountMismatch {
        /// The declared number of rounds.
        expected: usize,
        /// The number of local configurations.
        got: usize,
    },

    /// Returned when a percentile lies outside `[0, 100]`.
    #[error("invalid percentile: {0} must be in [0.0, 100.0]")]
    InvalidPercentile(f64),

    /// Returned when a z-score threshold is not finite.
    #[error("invalid z-score threshold: {0} must be finite")]
    InvalidThreshold(f64),

    /// Returned when a bandwidth factor or kernel scale is not positive.
    #[error("invalid bandwidth: {0} must be positive and finite")]
    InvalidBandwidth(f64),

    /// Returned when a clusterer is configured with zero clusters or a
    /// non-positive radius.
    #[error("invalid clusterer configuration: {0}")]
    InvalidClusterer(&'static str),

    /// Returned when KDE is created with empty samples.
    #[error("KDE requires at least one sample")]
    EmptySamples,

    /// Returned when KDE samples have zero dimensions.
    #[error("KDE samples must have at least one dimension")]
    ZeroDimensions,

    /// Returned when KDE samples have inconsistent dimensions.
    #[error(
        "dimension mismatch: expected {expected} dimensions but sample {sample_index} has {got}"
    )]
    DimensionMismatch {
        /// The expected number of dimensions.
        expected: usize,
        /// The actual number of dimensions in the sample.
        got: usize,
        /// The index of the sample with mismatched dimensions.
        sample_index: usize,
    },

    /// Returned when a full-covariance KDE has fewer samples than dimensions.
    #[error("{n_samples} samples are too few to estimate a density in {n_dims} dimensions")]
    InsufficientSamples {
        /// Number of samples supplied.
        n_samples: usize,
        /// Number of dimensions.
        n_dims: usize,
    },

    /// Returned when the sample covariance is not positive definite.
    #[error("sample covariance of {n_samples} points in {n_dims} dimensions is singular")]
    DegenerateCovariance {
        /// Number of samples supplied.
        n_samples: usize,
        /// Number of dimensions.
        n_dims: usize,
    },

    /// Returned when a population row has the wrong number of parameter
    /// values.
    #[error("row {row} has {got} values for {expected} parameters")]
    RowLengthMismatch {
        /// Zero-based row index.
        row: usize,
        /// Number of parameters in the schema.
        expected: usize,
        /// Number of values in the row.
        got: usize,
    },

    /// Returned when a parameterization pairs a different number of values
    /// and parameters.
    #[error("parameterization has {got} values for {expected} parameters")]
    ParameterCountMismatch {
        /// Number of parameters.
        expected: usize,
        /// Number of values.
        got: usize,
    },

    /// Returned when a filter mask does not cover every row.
    #[error("mask length mismatch: expected {expected} entries, got {got}")]
    MaskLengthMismatch {
        /// Number of rows in the population.
        expected: usize,
        /// Length of the mask.
        got: usize,
    },

    /// Returned when an evaluator fails for a sample.
    #[error("evaluator for '{qoi}' failed on sample {sample}: {source}")]
    Evaluation {
        /// The QoI whose evaluator failed.
        qoi: String,
        /// The id of the sample being evaluated.
        sample: String,
        /// The evaluator's error.
        #[source]
        source: BoxError,
    },

    /// Returned when an error calculator returns the wrong number of values.
    #[error("error calculator returned {got} values for {expected} quantities of interest")]
    ErrorCountMismatch {
        /// Number of QoIs.
        expected: usize,
        /// Number of values returned.
        got: usize,
    },

    /// Returned when a projector returns the wrong number of rows.
    #[error("projector returned {got} rows for {expected} samples")]
    ProjectionCountMismatch {
        /// Number of samples projected.
        expected: usize,
        /// Number of rows returned.
        got: usize,
    },

    /// Returned when a clusterer returns the wrong number of labels.
    #[error("clusterer returned {got} labels for {expected} samples")]
    LabelCountMismatch {
        /// Number of samples clustered.
        expected: usize,
        /// Number of labels returned.
        got: usize,
    },

    /// Returned when a projector or clusterer fails.
    #[error("round {round}: {stage} stage failed: {source}")]
    Collaborator {
        /// The round in which the failure happened.
        round: usize,
        /// The stage that failed.
        stage: RoundStage,
        /// The collaborator's error.
        #[source]
        source: BoxError,
    },

    /// Returned when a round's filter chain rejects every sample.
    #[error("round {round}: every sample was rejected by the filter chain")]
    EmptyPopulation {
        /// The round whose population became empty.
        round: usize,
    },

    /// Returned when no cluster can seed the next round.
    #[error("round {round}: no cluster could be resampled, next round has no seed population")]
    NoUsableClusters {
        /// The round whose resampling produced nothing.
        round: usize,
    },

    /// Returned when a seed file lacks a parameter column.
    #[error("seed population is missing column '{0}'")]
    MissingColumn(String),

    /// Returned when a seed file cell cannot be parsed as a number.
    #[error("invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        /// The column name.
        column: String,
        /// The zero-based data row.
        row: usize,
        /// The raw cell content.
        value: String,
    },

    /// Returned when reading or writing a CSV artifact fails.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Returned when a filesystem operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
