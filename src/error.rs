//! Error types for the SOM lattice.

use thiserror::Error;

/// The main error type for lattice operations.
#[derive(Error, Debug)]
pub enum SomError {
    /// Lattice dimension must be at least one.
    #[error("Invalid lattice dimension: {0} (must be > 0)")]
    InvalidDimension(usize),

    /// Empty input.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Teacher rows do not share one length.
    #[error("Ragged teacher set: row {row} has length {found}, expected {expected}")]
    RaggedTeachers {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },

    /// A teacher value is NaN or infinite.
    #[error("Non-finite teacher value at row {row}, column {col}")]
    NonFiniteTeacher {
        /// Row of the offending value.
        row: usize,
        /// Column of the offending value.
        col: usize,
    },

    /// Input vector length differs from the prototype length.
    #[error("Input dimension {found} does not match weight dimension {expected}")]
    DimensionMismatch {
        /// Prototype length.
        expected: usize,
        /// Input length.
        found: usize,
    },

    /// Other invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The random initial node table cannot be rescaled.
    #[error("Degenerate initialization: initial node mean is {mean}")]
    DegenerateInitialization {
        /// Mean of the initial node table.
        mean: f64,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error.
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SomError {
    /// Returns true for errors caused by malformed teachers or query vectors.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SomError::InvalidDimension(_)
                | SomError::EmptyInput(_)
                | SomError::RaggedTeachers { .. }
                | SomError::NonFiniteTeacher { .. }
                | SomError::DimensionMismatch { .. }
                | SomError::InvalidInput(_)
        )
    }
}

/// Result type alias for lattice operations.
pub type Result<T> = std::result::Result<T, SomError>;

impl From<image::ImageError> for SomError {
    fn from(err: image::ImageError) -> Self {
        SomError::Image(err.to_string())
    }
}

impl From<serde_json::Error> for SomError {
    fn from(err: serde_json::Error) -> Self {
        SomError::Config(err.to_string())
    }
}
