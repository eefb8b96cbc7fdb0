use thiserror::Error;

use crate::Domain;

/// Errors raised while building or evaluating expressions.
///
/// These signal misuse of the expression tree and are always propagated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("domain mismatch in {operation}: {left} vs {right}")]
    DomainMismatch {
        operation: &'static str,
        left: Domain,
        right: Domain,
    },

    #[error("undefined symbol `{0}`")]
    UndefinedSymbol(String),

    #[error("cannot differentiate {0}")]
    NotDifferentiable(String),

    #[error("{0} requires discretization before it can be evaluated")]
    RequiresDiscretization(&'static str),

    #[error("shape mismatch: {left} vs {right} entries")]
    ShapeMismatch { left: usize, right: usize },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
}
