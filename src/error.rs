use crate::solver::HighsStatus;
use thiserror::Error;

/// Errors raised while reading inputs and building the robust model.
///
/// Solver infeasibility is not an error: it is reported through
/// [`crate::aro::SolveStatus`].
#[derive(Debug, Error)]
pub enum AroError {
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    #[error("Shape mismatch for {name}: expected {expected}, found {found}")]
    Shape {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("The model has no solved policy")]
    NotSolved,

    #[error("Solver error: {0}")]
    Solver(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<HighsStatus> for AroError {
    fn from(status: HighsStatus) -> Self {
        AroError::Solver(format!("HiGHS call failed: {}", status.0))
    }
}

/// Checks that a series has the expected length, naming the owner on failure.
pub fn check_len(
    name: &str,
    expected: usize,
    found: usize,
) -> Result<(), AroError> {
    if expected != found {
        return Err(AroError::Shape {
            name: name.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
