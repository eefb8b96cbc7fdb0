use thiserror::Error;

use crate::{Domain, ExprError, Side, Variable};

/// Errors raised while assembling a model or checking that it is well posed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("variable `{variable}` has more than one governing equation")]
    DuplicateEquation { variable: Variable },

    #[error("well-posedness (a): variable `{variable}` has no governing equation")]
    MissingEquation { variable: Variable },

    #[error("well-posedness (b): variable `{variable}` has no boundary condition on the {side} edge")]
    MissingBoundaryCondition { variable: Variable, side: Side },

    #[error("well-posedness (b): boundary conditions attach to variables, found gradient of `{expression}`")]
    GradientOfExpression { expression: String },

    #[error(
        "well-posedness (c): equation for `{variable}` is on {found}, but the variable is on {expected}"
    )]
    DomainMismatch {
        variable: Variable,
        expected: Domain,
        found: Domain,
    },

    #[error("well-posedness (c): variable `{variable}` has no initial condition")]
    MissingInitialCondition { variable: Variable },

    #[error("well-posedness (c): condition given for `{variable}`, which is not a state")]
    ExtraneousCondition { variable: Variable },

    #[error(
        "well-posedness (d): algebraic equations are structurally singular, `{variable}` cannot be determined"
    )]
    StructurallySingular { variable: Variable },

    #[error("circular coupling between sub-models: {0}")]
    CircularDependency(String),

    #[error("coupling variable `{name}` required by {submodel} is not provided")]
    MissingCoupling { name: String, submodel: String },

    #[error(transparent)]
    Expr(#[from] ExprError),
}
