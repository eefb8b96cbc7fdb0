use ninterp::error::{InterpolateError, ValidateError};
use thiserror::Error;
use voltaic_core::{ExprError, ModelError};
use voltaic_discretize::{DiscretizationError, MeshError};
use voltaic_models::BuildError;
use voltaic_solvers::{equation::newton, transient};

use crate::ConfigError;

/// The algebraic initial state does not satisfy the algebraic equations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error(
    "inconsistent initial conditions: algebraic residual {residual_norm:e} exceeds tolerance {tolerance:e}"
)]
pub struct InitialConditionError {
    pub residual_norm: f64,
    pub tolerance: f64,
}

/// Errors raised while setting up or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parameter(#[from] ExprError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Discretization(#[from] DiscretizationError),

    #[error(transparent)]
    InitialCondition(#[from] InitialConditionError),

    #[error("initialization failed: {0}")]
    Newton(#[from] newton::Error),

    #[error("solver failed: {0}")]
    Solver(#[from] transient::Error),

    #[error(transparent)]
    Solution(#[from] SolutionError),
}

/// Errors raised while querying a solution.
#[derive(Debug, Error)]
pub enum SolutionError {
    #[error("no output variable named `{0}`")]
    UnknownVariable(String),

    #[error("`{name}` has {len} entries, not a single value per time")]
    NotScalar { name: String, len: usize },

    #[error("`{name}` has {secondary} profiles; pick one with a secondary index")]
    SecondaryProfiles { name: String, secondary: usize },

    #[error("{quantity} {value} is outside the solution range [{min}, {max}]")]
    OutOfRange {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("cannot compare {found} values with {expected} reference values")]
    ShapeMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Evaluation(#[from] DiscretizationError),

    #[error(transparent)]
    Validation(#[from] ValidateError),

    #[error(transparent)]
    Interpolation(#[from] InterpolateError),
}
