use crate::Symbol;

/// How a boundary condition constrains its variable.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryKind {
    /// Fixes the value at the edge.
    Dirichlet,
    /// Fixes the gradient `du/dx` at the edge, taken along increasing `x` at
    /// both ends.
    Neumann,
    /// Blends both: `alpha * u + beta * du/dx = value`.
    ///
    /// The coefficients must reduce to constants once parameters are processed.
    Robin { alpha: Symbol, beta: Symbol },
}

/// A boundary condition on one edge of a variable's domain.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCondition {
    pub value: Symbol,
    pub kind: BoundaryKind,
}

impl BoundaryCondition {
    #[must_use]
    pub fn dirichlet(value: Symbol) -> Self {
        Self {
            value,
            kind: BoundaryKind::Dirichlet,
        }
    }

    #[must_use]
    pub fn neumann(value: Symbol) -> Self {
        Self {
            value,
            kind: BoundaryKind::Neumann,
        }
    }

    #[must_use]
    pub fn robin(alpha: Symbol, beta: Symbol, value: Symbol) -> Self {
        Self {
            value,
            kind: BoundaryKind::Robin { alpha, beta },
        }
    }

    /// A zero-flux condition.
    #[must_use]
    pub fn no_flux() -> Self {
        Self::neumann(Symbol::constant(0.0))
    }
}
