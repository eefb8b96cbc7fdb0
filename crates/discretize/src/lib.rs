//! Meshes and spatial discretization of voltaic models.
//!
//! A processed [`voltaic_core::Model`] is discretized on a [`Mesh`] with a
//! [`SpatialMethod`], giving a [`DiscretizedSystem`] that solvers integrate
//! through [`voltaic_core::DaeProblem`].

mod discrete;
mod discretization;
mod error;
pub mod geometry;
pub mod mesh;
pub mod method;
mod sparse;
mod system;

pub use discrete::DiscreteExpr;
pub use discretization::discretize;
pub use error::{DiscretizationError, MeshError};
pub use geometry::{CollectorGeometry, Extent, Geometry};
pub use mesh::{CoordSys, Mesh, PointKey, Points, SubMesh, SubMesh1D, SubMesh2D};
pub use method::{FiniteVolume, Interpolation, SpatialMethod};
pub use system::{DiscretizedSystem, DiscretizedVariable, Location, StateLayout, StateSlot};
