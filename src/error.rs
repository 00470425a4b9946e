//! Errors returned by the loading, graph construction and fitting operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is fatal for the operation that produced it, no partial result is returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A column selector doesn't name a column of the table.
    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("table has no rows")]
    EmptyTable,

    /// A field that must hold a finite, non-negative number doesn't.
    #[error("invalid value {value:?} in column `{column}` at row {row}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    /// A reporter or partner identifier is blank.
    #[error("empty identifier in column `{column}` at row {row}")]
    MissingIdentifier { column: String, row: usize },

    /// A file doesn't carry the same set of columns as the first file of the batch.
    #[error("columns of {} don't match the first file", .path.display())]
    HeaderMismatch { path: PathBuf },

    #[error("percentile threshold {0} is outside (0, 1]")]
    InvalidThreshold(f64),

    #[error("values of `{0}` sum to zero")]
    ZeroTotal(String),

    #[error("at least {required} distinct observations are required, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("observation {0} is not strictly positive")]
    NonPositiveObservation(f64),

    #[error("fit did not converge within {evaluations} evaluations")]
    FitDidNotConverge { evaluations: usize },

    #[error("fit diverged to non-finite parameters")]
    FitDiverged,
}
