//! Error types for triangle loading, model fitting and resampling
//!
//! Fit failures are fatal and stop a run before any resampling happens.
//! Iteration failures are collected per iteration and never abort a run.

use thiserror::Error;

/// Structural problems with a triangle's shape or values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriangleError {
    #[error("triangle has no origin periods")]
    Empty,

    #[error("expected {expected} origin labels, found {found}")]
    OriginLabelMismatch { expected: usize, found: usize },

    #[error("origin {origin} has {cells} cells but only {developments} development labels")]
    RowTooLong {
        origin: usize,
        cells: usize,
        developments: usize,
    },

    #[error("origin {origin} has no populated cells")]
    EmptyRow { origin: usize },

    #[error("origin {origin} has a gap before development {development}")]
    NonContiguousRow { origin: usize, development: usize },

    #[error("cell ({origin}, {development}) is given more than once")]
    DuplicateCell { origin: usize, development: usize },

    #[error("cell ({origin}, {development}) is out of range")]
    OutOfRange { origin: usize, development: usize },

    #[error("cell ({origin}, {development}) is not finite: {value}")]
    NonFinite {
        origin: usize,
        development: usize,
        value: f64,
    },
}

/// Errors raised while reading triangles from CSV or by sample name
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("invalid triangle: {0}")]
    Triangle(#[from] TriangleError),

    #[error("unknown sample dataset: {0}")]
    UnknownDataset(String),
}

impl LoadError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Chain-ladder projection failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("at least 2 development periods are required, found {found}")]
    InsufficientDevelopment { found: usize },

    #[error("development {development} has non-positive volume {volume}")]
    NonPositiveVolume { development: usize, volume: f64 },

    #[error("projected reserve is not finite")]
    NonFiniteReserve,
}

/// Fatal failures of the base model fit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("base projection failed: {0}")]
    Projection(#[from] ProjectionError),

    #[error("cumulative value at ({origin}, {development}) is negative: {value}")]
    NegativeValue {
        origin: usize,
        development: usize,
        value: f64,
    },

    #[error("fitted value at ({origin}, {development}) is not positive: {value}")]
    NonPositiveFitted {
        origin: usize,
        development: usize,
        value: f64,
    },

    #[error("{cells} residuals cannot support {parameters} estimated factors")]
    InsufficientData { cells: usize, parameters: usize },
}

/// Failure of a single resampling iteration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IterationError {
    #[error("iteration {iteration}: {count} reconstructed cells are negative")]
    NegativeCells { iteration: usize, count: usize },

    #[error("iteration {iteration}: projection failed: {source}")]
    Projection {
        iteration: usize,
        #[source]
        source: ProjectionError,
    },

    #[error("iteration {iteration}: replayed {found} draws, triangle has {expected} cells")]
    DrawCountMismatch {
        iteration: usize,
        expected: usize,
        found: usize,
    },

    #[error("iteration {iteration}: draw targets unpopulated cell ({origin}, {development})")]
    UnknownCell {
        iteration: usize,
        origin: usize,
        development: usize,
    },

    #[error("iteration {iteration}: cell ({origin}, {development}) is drawn more than once")]
    DuplicateCell {
        iteration: usize,
        origin: usize,
        development: usize,
    },

    #[error("iteration {iteration}: fitted {found} at ({origin}, {development}) != {expected}")]
    FittedMismatch {
        iteration: usize,
        origin: usize,
        development: usize,
        expected: f64,
        found: f64,
    },
}

impl IterationError {
    /// Index of the iteration that failed
    pub fn iteration(&self) -> usize {
        match self {
            Self::NegativeCells { iteration, .. }
            | Self::Projection { iteration, .. }
            | Self::DrawCountMismatch { iteration, .. }
            | Self::UnknownCell { iteration, .. }
            | Self::DuplicateCell { iteration, .. }
            | Self::FittedMismatch { iteration, .. } => *iteration,
        }
    }
}

/// Invalid run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("iterations must be between 1 and {max}, got {found}")]
    Iterations { found: usize, max: usize },

    #[error("histogram_bins must be at least 1")]
    HistogramBins,

    #[error("IO error reading {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures setting up a bootstrap run
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("model fit failed: {0}")]
    Fit(#[from] FitError),
}

/// Failures reading or writing run outputs
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
