use std::error::Error as StdError;

use thiserror::Error;

/// Errors that can occur during a Newton solve.
#[derive(Debug, Error)]
pub enum Error {
    #[error("residual has {residuals} entries for {unknowns} unknowns")]
    ShapeMismatch { unknowns: usize, residuals: usize },

    #[error("problem error: {0}")]
    Problem(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn problem<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Problem(Box::new(err))
    }
}
