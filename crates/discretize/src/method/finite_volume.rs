use std::f64::consts::PI;

use nalgebra::DVector;
use nalgebra_sparse::csr::CsrMatrix;
use voltaic_core::{Side, Variable};

use crate::{
    DiscretizationError,
    mesh::{CoordSys, SubMesh1D},
    sparse::TripletMatrix,
};

use super::{EdgeCondition, FluxReconstruction, GradientStencil, Interpolation, SpatialMethod};

/// Cell-centred finite volumes on one-dimensional sub-meshes.
///
/// Gradients live on faces; boundary faces are closed with a half-cell
/// ghost built from the edge condition. The divergence of face fluxes
/// telescopes, so the integral of a divergence equals the net boundary flux
/// to rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiniteVolume {
    interpolation: Interpolation,
}

impl FiniteVolume {
    #[must_use]
    pub fn new(interpolation: Interpolation) -> Self {
        Self { interpolation }
    }
}

/// Distances from each edge to its nearest node.
fn half_cells(mesh: &SubMesh1D) -> (f64, f64) {
    let n = mesh.npts();
    let edges = mesh.edges();
    let nodes = mesh.nodes();
    (nodes[0] - edges[0], edges[n] - nodes[n - 1])
}

/// Face areas, up to a constant factor.
fn areas(mesh: &SubMesh1D) -> DVector<f64> {
    match mesh.coord() {
        CoordSys::Cartesian => DVector::from_element(mesh.edges().len(), 1.0),
        CoordSys::Spherical => mesh.edges().map(|r| r * r),
    }
}

/// Cell volumes, with the same factor as [`areas`].
fn volumes(mesh: &SubMesh1D) -> DVector<f64> {
    let edges = mesh.edges();
    match mesh.coord() {
        CoordSys::Cartesian => mesh.widths(),
        CoordSys::Spherical => DVector::from_fn(mesh.npts(), |i, _| {
            (edges[i + 1].powi(3) - edges[i].powi(3)) / 3.0
        }),
    }
}

impl SpatialMethod for FiniteVolume {
    fn name(&self) -> &'static str {
        "finite volume"
    }

    fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    fn gradient(
        &self,
        variable: &Variable,
        mesh: &SubMesh1D,
        left: EdgeCondition,
        right: EdgeCondition,
    ) -> Result<GradientStencil, DiscretizationError> {
        let n = mesh.npts();
        let nodes = mesh.nodes();
        let (h_left, h_right) = half_cells(mesh);
        let mut g = TripletMatrix::new(n + 1, n);

        for k in 1..n {
            let dx = nodes[k] - nodes[k - 1];
            g.add(k, k - 1, -1.0 / dx);
            g.add(k, k, 1.0 / dx);
        }

        // alpha (u0 - h g) + beta g = value
        let denominator = left.beta - left.alpha * h_left;
        if denominator.abs() < f64::EPSILON {
            return Err(DiscretizationError::DegenerateBoundary {
                variable: variable.clone(),
                side: Side::Left,
            });
        }
        g.add(0, 0, -left.alpha / denominator);
        let left_coefficient = 1.0 / denominator;

        // alpha (u_n + h g) + beta g = value
        let denominator = right.alpha * h_right + right.beta;
        if denominator.abs() < f64::EPSILON {
            return Err(DiscretizationError::DegenerateBoundary {
                variable: variable.clone(),
                side: Side::Right,
            });
        }
        g.add(n, n - 1, -right.alpha / denominator);
        let right_coefficient = 1.0 / denominator;

        Ok(GradientStencil {
            matrix: g.to_csr()?,
            left: left_coefficient,
            right: right_coefficient,
        })
    }

    fn divergence(&self, mesh: &SubMesh1D) -> Result<CsrMatrix<f64>, DiscretizationError> {
        let n = mesh.npts();
        let areas = areas(mesh);
        let volumes = volumes(mesh);
        let mut d = TripletMatrix::new(n, n + 1);
        for i in 0..n {
            d.add(i, i, -areas[i] / volumes[i]);
            d.add(i, i + 1, areas[i + 1] / volumes[i]);
        }
        d.to_csr()
    }

    fn integral_weights(&self, mesh: &SubMesh1D) -> DVector<f64> {
        match mesh.coord() {
            CoordSys::Cartesian => mesh.widths(),
            CoordSys::Spherical => volumes(mesh) * (4.0 * PI),
        }
    }

    fn boundary_value(
        &self,
        mesh: &SubMesh1D,
        side: Side,
    ) -> Result<CsrMatrix<f64>, DiscretizationError> {
        let n = mesh.npts();
        let nodes = mesh.nodes();
        let (h_left, h_right) = half_cells(mesh);
        let mut row = TripletMatrix::new(1, n);
        if n == 1 {
            row.add(0, 0, 1.0);
            return row.to_csr();
        }
        match side {
            Side::Left => {
                let ratio = h_left / (nodes[1] - nodes[0]);
                row.add(0, 0, 1.0 + ratio);
                row.add(0, 1, -ratio);
            }
            Side::Right => {
                let ratio = h_right / (nodes[n - 1] - nodes[n - 2]);
                row.add(0, n - 1, 1.0 + ratio);
                row.add(0, n - 2, -ratio);
            }
        }
        row.to_csr()
    }

    fn boundary_value_from_flux(
        &self,
        mesh: &SubMesh1D,
        side: Side,
    ) -> Result<FluxReconstruction, DiscretizationError> {
        let n = mesh.npts();
        let (h_left, h_right) = half_cells(mesh);
        let mut row = TripletMatrix::new(1, n);
        let gradient = match side {
            Side::Left => {
                row.add(0, 0, 1.0);
                -h_left
            }
            Side::Right => {
                row.add(0, n - 1, 1.0);
                h_right
            }
        };
        Ok(FluxReconstruction {
            node: row.to_csr()?,
            gradient,
        })
    }

    fn node_to_face(&self, mesh: &SubMesh1D) -> Result<CsrMatrix<f64>, DiscretizationError> {
        let n = mesh.npts();
        let nodes = mesh.nodes();
        let edges = mesh.edges();
        let mut m = TripletMatrix::new(n + 1, n);
        m.add(0, 0, 1.0);
        for k in 1..n {
            let w = (edges[k] - nodes[k - 1]) / (nodes[k] - nodes[k - 1]);
            m.add(k, k - 1, 1.0 - w);
            m.add(k, k, w);
        }
        m.add(n, n - 1, 1.0);
        m.to_csr()
    }

    fn face_to_node(&self, mesh: &SubMesh1D) -> Result<CsrMatrix<f64>, DiscretizationError> {
        let n = mesh.npts();
        let mut m = TripletMatrix::new(n, n + 1);
        for i in 0..n {
            m.add(i, i, 0.5);
            m.add(i, i + 1, 0.5);
        }
        m.to_csr()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use voltaic_core::Domain;

    use super::*;
    use crate::sparse::matvec;

    fn variable() -> Variable {
        Variable::new("u", Domain::scalar())
    }

    #[test]
    fn gradient_of_linear_profile_is_exact() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 5, CoordSys::Cartesian);
        let fv = FiniteVolume::default();
        let stencil = fv
            .gradient(
                &variable(),
                &mesh,
                EdgeCondition::DIRICHLET,
                EdgeCondition::NEUMANN,
            )
            .unwrap();
        let u = mesh.nodes().map(|x| 2.0 * x + 1.0);
        let mut g = matvec(&stencil.matrix, &u);
        g[0] += stencil.left * 1.0;
        g[5] += stencil.right * 2.0;
        for value in g.iter() {
            assert_relative_eq!(*value, 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn robin_edge_matches_condition() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 4, CoordSys::Cartesian);
        let fv = FiniteVolume::default();
        let robin = EdgeCondition {
            alpha: 2.0,
            beta: 0.5,
        };
        let stencil = fv
            .gradient(&variable(), &mesh, robin, EdgeCondition::NEUMANN)
            .unwrap();
        // u = 3 - x satisfies 2 u + 0.5 u' = 5.5 at x = 0.
        let u = mesh.nodes().map(|x| 3.0 - x);
        let g = matvec(&stencil.matrix, &u)[0] + stencil.left * 5.5;
        assert_relative_eq!(g, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_robin_is_rejected() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 2, CoordSys::Cartesian);
        let fv = FiniteVolume::default();
        let h = 0.25;
        let edge = EdgeCondition {
            alpha: 1.0,
            beta: h,
        };
        let err = fv
            .gradient(&variable(), &mesh, edge, EdgeCondition::NEUMANN)
            .unwrap_err();
        assert!(matches!(
            err,
            DiscretizationError::DegenerateBoundary {
                side: Side::Left,
                ..
            }
        ));
    }

    #[test]
    fn spherical_divergence_conserves() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 6, CoordSys::Spherical);
        let fv = FiniteVolume::default();
        let div = fv.divergence(&mesh).unwrap();
        let flux = DVector::from_fn(7, |i, _| (i as f64).sin());
        let total = fv.integral_weights(&mesh).dot(&matvec(&div, &flux));
        // Net outflow through the unit sphere.
        assert_relative_eq!(total, 4.0 * PI * flux[6], epsilon = 1e-12);
    }

    #[test]
    fn spherical_volume_integral() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 8, CoordSys::Spherical);
        let weights = FiniteVolume::default().integral_weights(&mesh);
        assert_relative_eq!(weights.sum(), 4.0 / 3.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn extrapolation_is_exact_for_linear_profiles() {
        let mesh = SubMesh1D::uniform(0.0, 2.0, 4, CoordSys::Cartesian);
        let fv = FiniteVolume::default();
        let u = mesh.nodes().map(|x| 1.0 + 3.0 * x);
        let left = matvec(&fv.boundary_value(&mesh, Side::Left).unwrap(), &u);
        let right = matvec(&fv.boundary_value(&mesh, Side::Right).unwrap(), &u);
        assert_relative_eq!(left[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(right[0], 7.0, epsilon = 1e-12);
    }

    #[test]
    fn interpolation_and_averaging_shapes() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 3, CoordSys::Cartesian);
        let fv = FiniteVolume::default();
        let to_face = fv.node_to_face(&mesh).unwrap();
        let to_node = fv.face_to_node(&mesh).unwrap();
        assert_eq!((to_face.nrows(), to_face.ncols()), (4, 3));
        assert_eq!((to_node.nrows(), to_node.ncols()), (3, 4));

        let u = DVector::from_vec(vec![1.0, 2.0, 4.0]);
        let faces = matvec(&to_face, &u);
        assert_relative_eq!(faces[1], 1.5);
        assert_relative_eq!(faces[3], 4.0);
    }
}
