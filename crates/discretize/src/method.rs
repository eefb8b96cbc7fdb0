//! Spatial methods turn continuous operators into sparse matrices.

mod finite_volume;

use nalgebra::DVector;
use nalgebra_sparse::csr::CsrMatrix;
use voltaic_core::{Side, Variable};

pub use finite_volume::FiniteVolume;

use crate::{DiscretizationError, mesh::SubMesh1D};

/// How node values are carried onto faces in products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    #[default]
    Arithmetic,
    /// Reciprocal of the interpolated reciprocals, suited to conductivities.
    Harmonic,
}

/// Coefficients of `alpha * u + beta * du/dx = value` on one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCondition {
    pub alpha: f64,
    pub beta: f64,
}

impl EdgeCondition {
    pub const DIRICHLET: Self = Self {
        alpha: 1.0,
        beta: 0.0,
    };
    pub const NEUMANN: Self = Self {
        alpha: 0.0,
        beta: 1.0,
    };
}

/// A discrete gradient on every face, boundary faces included.
///
/// Face values are `matrix * u`, plus `left` times the left boundary value
/// on the first face and `right` times the right boundary value on the last.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStencil {
    pub matrix: CsrMatrix<f64>,
    pub left: f64,
    pub right: f64,
}

/// A boundary value reconstructed from the edge node and a known edge gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxReconstruction {
    /// Selects the node next to the edge.
    pub node: CsrMatrix<f64>,
    /// Multiplies the edge gradient.
    pub gradient: f64,
}

/// A way of discretizing spatial operators on one-dimensional sub-meshes.
pub trait SpatialMethod {
    fn name(&self) -> &'static str;

    fn interpolation(&self) -> Interpolation;

    /// Builds the gradient with the given edge conditions.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::DegenerateBoundary`] if an edge
    /// condition cannot be solved for the edge gradient.
    fn gradient(
        &self,
        variable: &Variable,
        mesh: &SubMesh1D,
        left: EdgeCondition,
        right: EdgeCondition,
    ) -> Result<GradientStencil, DiscretizationError>;

    /// Builds the divergence of face fluxes, giving node values.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::Sparse`] if assembly fails.
    fn divergence(&self, mesh: &SubMesh1D) -> Result<CsrMatrix<f64>, DiscretizationError>;

    /// Quadrature weights of each node.
    fn integral_weights(&self, mesh: &SubMesh1D) -> DVector<f64>;

    /// Extrapolates node values to one edge.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::Sparse`] if assembly fails.
    fn boundary_value(
        &self,
        mesh: &SubMesh1D,
        side: Side,
    ) -> Result<CsrMatrix<f64>, DiscretizationError>;

    /// Reconstructs an edge value from a known edge gradient.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::Sparse`] if assembly fails.
    fn boundary_value_from_flux(
        &self,
        mesh: &SubMesh1D,
        side: Side,
    ) -> Result<FluxReconstruction, DiscretizationError>;

    /// Interpolates node values onto faces.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::Sparse`] if assembly fails.
    fn node_to_face(&self, mesh: &SubMesh1D) -> Result<CsrMatrix<f64>, DiscretizationError>;

    /// Averages face values onto nodes.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::Sparse`] if assembly fails.
    fn face_to_node(&self, mesh: &SubMesh1D) -> Result<CsrMatrix<f64>, DiscretizationError>;
}
