use thiserror::Error;
use voltaic_core::{ExprError, NotImplementedError, Side, SubDomain, Variable};

/// Errors raised while building geometry or meshes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("invalid number of points for `{name}`: {count} (at least 1 is required)")]
    InvalidPoints { name: String, count: usize },

    #[error("no points given for `{0}`")]
    MissingPoints(String),

    #[error("unknown spatial variable `{0}`")]
    UnknownSpatialVariable(String),

    #[error("sub-domain {0} has no extent in the geometry")]
    MissingExtent(SubDomain),

    #[error("sub-domain {sub} has an empty or inverted extent [{start}, {end}]")]
    InvalidExtent { sub: SubDomain, start: f64, end: f64 },

    #[error("cannot combine sub-meshes: gap between {left} and {right}")]
    Gap { left: SubDomain, right: SubDomain },

    #[error("sub-domain {0} has no mesh")]
    MissingSubMesh(SubDomain),

    #[error("cannot combine a two-dimensional sub-mesh ({0})")]
    TwoDimensional(SubDomain),

    #[error(transparent)]
    Parameter(#[from] ExprError),
}

/// Errors raised while discretizing a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscretizationError {
    #[error("parameter `{0}` must be processed before discretization")]
    UnprocessedParameter(String),

    #[error("variable `{0}` is referenced but is not a state of the model")]
    UnknownVariable(Variable),

    #[error("variable `{variable}` has no boundary condition on the {side} edge")]
    MissingBoundaryCondition { variable: Variable, side: Side },

    #[error("gradients are only defined for variables, found `{0}`")]
    GradientOfExpression(String),

    #[error("{operation} needs a quantity on {expected}, found one on {found}")]
    Location {
        operation: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("robin coefficient for `{variable}` must reduce to a constant")]
    NonConstantCoefficient { variable: Variable },

    #[error("degenerate robin condition for `{variable}` on the {side} edge")]
    DegenerateBoundary { variable: Variable, side: Side },

    #[error("initial condition for `{0}` depends on the state")]
    InitialConditionDependsOnState(Variable),

    #[error("shape mismatch in {context}: expected {expected} entries, found {found}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid sparse operator: {0}")]
    Sparse(String),

    #[error(transparent)]
    NotImplemented(#[from] NotImplementedError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Expr(#[from] ExprError),
}
