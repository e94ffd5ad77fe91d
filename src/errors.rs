//! Errors
//!
//! Custom error types used throughout the `uplift-roi` crate.
use thiserror::Error;

/// Errors that can occur while preparing data, fitting the uplift models,
/// or evaluating them.
#[derive(Debug, Error)]
pub enum UpliftError {
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Input slices that must be index aligned have different lengths.
    #[error("Length mismatch for {0}: expected {1} values, but {2} were provided.")]
    LengthMismatch(String, usize, usize),
    /// No rows were provided.
    #[error("No rows were provided, at least one row is required.")]
    EmptyInput,
    /// One of the two arms has no members.
    #[error("The {0} arm has no rows, both treatment and control are required.")]
    EmptyArm(String),
    /// A binary column contained something other than 0 or 1.
    #[error("Column {0} must only contain 0 or 1, but the value {1} was found.")]
    InvalidLabel(String, f64),
    /// Column is absent from the dataset.
    #[error("Column {0} was not found in the dataset.")]
    ColumnNotFound(String),
    /// Column exists, but is not stored as the requested kind.
    #[error("Column {0} is not a {1} column.")]
    ColumnType(String, String),
    /// Transform or predict was called before fit.
    #[error("The model has not been fitted yet.")]
    NotFitted,
    /// Unable to read data from a file.
    #[error("Unable to read data from a file {0}")]
    UnableToRead(String),
    /// Unable to write to a file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
}
