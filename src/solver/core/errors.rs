use super::{SettingsError, SolverStage};
use crate::algebra::{MatrixConcatenationError, SparseFormatError};
use crate::qdldl::QDLDLError;
use thiserror::Error;

/// Error type for all fallible stages of the solver pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Problem data of inconsistent sizes
    #[error("Dimension mismatch: {0}")]
    Dimension(String),

    /// A stage was requested before one it depends on completed
    #[error("Stage {requested} requires stage {missing} to be completed first")]
    Ordering {
        requested: SolverStage,
        missing: SolverStage,
    },

    /// The KKT system could not be factored
    #[error("KKT factorization failed: {0}")]
    Numerical(#[from] QDLDLError),

    /// The chordal decomposition could not be built from the problem data
    #[error("Chordal decomposition failed: {0}")]
    Decomposition(String),

    /// Invalid solver settings
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),
}

impl From<SparseFormatError> for SolverError {
    fn from(e: SparseFormatError) -> Self {
        SolverError::Dimension(e.to_string())
    }
}

impl From<MatrixConcatenationError> for SolverError {
    fn from(e: MatrixConcatenationError) -> Self {
        SolverError::Decomposition(e.to_string())
    }
}
