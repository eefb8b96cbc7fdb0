use std::error::Error as StdError;

use thiserror::Error;

use crate::equation::newton;

/// Errors that can occur during time integration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid output times: {0}")]
    InvalidTimes(&'static str),

    #[error("initial state has {found} entries, problem has {expected}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("step solve failed: {0}")]
    Newton(#[from] newton::Error),

    #[error("problem error: {0}")]
    Problem(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn problem<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Problem(Box::new(err))
    }
}
