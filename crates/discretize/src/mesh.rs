//! Cell-centred meshes over the sub-domains of a [`Geometry`].

use std::{collections::BTreeMap, fmt, str::FromStr};

use log::info;
use nalgebra::DVector;
use voltaic_core::SubDomain;

use crate::{
    MeshError,
    geometry::{CollectorGeometry, Geometry},
};

/// Names a direction in which points are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointKey {
    Xn,
    Xs,
    Xp,
    Rn,
    Rp,
    Y,
    Z,
}

impl PointKey {
    pub const ALL: [PointKey; 7] = [
        Self::Xn,
        Self::Xs,
        Self::Xp,
        Self::Rn,
        Self::Rp,
        Self::Y,
        Self::Z,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Xn => "x_n",
            Self::Xs => "x_s",
            Self::Xp => "x_p",
            Self::Rn => "r_n",
            Self::Rp => "r_p",
            Self::Y => "y",
            Self::Z => "z",
        }
    }

    /// The key that counts points across a one-dimensional sub-domain.
    #[must_use]
    pub fn for_sub_domain(sub: SubDomain) -> PointKey {
        match sub {
            SubDomain::NegativeElectrode => Self::Xn,
            SubDomain::Separator => Self::Xs,
            SubDomain::PositiveElectrode => Self::Xp,
            SubDomain::NegativeParticle => Self::Rn,
            SubDomain::PositiveParticle => Self::Rp,
            SubDomain::CurrentCollector => Self::Z,
        }
    }
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PointKey {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| MeshError::UnknownSpatialVariable(s.to_owned()))
    }
}

/// The number of cells in each direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Points {
    counts: BTreeMap<PointKey, usize>,
}

impl Points {
    /// The same number of cells in every direction.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidPoints`] if `count` is zero.
    pub fn uniform(count: usize) -> Result<Self, MeshError> {
        PointKey::ALL
            .into_iter()
            .try_fold(Self::empty(), |points, key| points.with(key, count))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Sets the count for one direction.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidPoints`] if `count` is zero.
    pub fn with(mut self, key: PointKey, count: usize) -> Result<Self, MeshError> {
        if count == 0 {
            return Err(MeshError::InvalidPoints {
                name: key.name().to_owned(),
                count,
            });
        }
        self.counts.insert(key, count);
        Ok(self)
    }

    /// Builds points from `(name, count)` pairs such as `("x_n", 20)`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownSpatialVariable`] for unknown names and
    /// [`MeshError::InvalidPoints`] for zero counts.
    pub fn from_named<'a>(
        pairs: impl IntoIterator<Item = (&'a str, usize)>,
    ) -> Result<Self, MeshError> {
        pairs
            .into_iter()
            .try_fold(Self::empty(), |points, (name, count)| {
                points.with(name.parse()?, count)
            })
    }

    #[must_use]
    pub fn get(&self, key: PointKey) -> Option<usize> {
        self.counts.get(&key).copied()
    }

    fn require(&self, key: PointKey) -> Result<usize, MeshError> {
        self.get(key)
            .ok_or_else(|| MeshError::MissingPoints(key.name().to_owned()))
    }
}

/// The coordinate system of a one-dimensional sub-mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSys {
    Cartesian,
    /// Radial coordinate of a sphere, with `r^2` face areas.
    Spherical,
}

/// A uniform cell-centred one-dimensional mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh1D {
    edges: DVector<f64>,
    nodes: DVector<f64>,
    coord: CoordSys,
}

impl SubMesh1D {
    /// Splits `[start, end]` into `cells` equal cells.
    #[must_use]
    pub fn uniform(start: f64, end: f64, cells: usize, coord: CoordSys) -> Self {
        let width = (end - start) / cells as f64;
        let edges = DVector::from_fn(cells + 1, |i, _| start + width * i as f64);
        Self::from_edges(edges, coord)
    }

    fn from_edges(edges: DVector<f64>, coord: CoordSys) -> Self {
        let nodes = DVector::from_fn(edges.len() - 1, |i, _| 0.5 * (edges[i] + edges[i + 1]));
        Self {
            edges,
            nodes,
            coord,
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn npts(&self) -> usize {
        self.nodes.len()
    }

    /// Cell faces, one more than the number of cells.
    #[must_use]
    pub fn edges(&self) -> &DVector<f64> {
        &self.edges
    }

    /// Cell centres.
    #[must_use]
    pub fn nodes(&self) -> &DVector<f64> {
        &self.nodes
    }

    #[must_use]
    pub fn coord(&self) -> CoordSys {
        self.coord
    }

    /// Width of each cell.
    #[must_use]
    pub fn widths(&self) -> DVector<f64> {
        DVector::from_fn(self.npts(), |i, _| self.edges[i + 1] - self.edges[i])
    }
}

/// A tensor-product mesh of a plane, `y` varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh2D {
    pub y: SubMesh1D,
    pub z: SubMesh1D,
}

impl SubMesh2D {
    #[must_use]
    pub fn npts(&self) -> usize {
        self.y.npts() * self.z.npts()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubMesh {
    OneD(SubMesh1D),
    TwoD(SubMesh2D),
}

impl SubMesh {
    #[must_use]
    pub fn npts(&self) -> usize {
        match self {
            Self::OneD(mesh) => mesh.npts(),
            Self::TwoD(mesh) => mesh.npts(),
        }
    }
}

/// Sub-meshes for every sub-domain of a geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    submeshes: BTreeMap<SubDomain, SubMesh>,
}

impl Mesh {
    /// Meshes every sub-domain of `geometry` with uniform cells.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::MissingPoints`] if a sub-domain has no count.
    pub fn new(geometry: &Geometry, points: &Points) -> Result<Self, MeshError> {
        let mut submeshes = BTreeMap::new();
        for sub in geometry.sub_domains() {
            let extent = geometry
                .extent(sub)
                .ok_or(MeshError::MissingExtent(sub))?;
            let submesh = match (sub, geometry.collector()) {
                (SubDomain::CurrentCollector, CollectorGeometry::Plane { width, .. }) => {
                    SubMesh::TwoD(SubMesh2D {
                        y: SubMesh1D::uniform(
                            0.0,
                            width,
                            points.require(PointKey::Y)?,
                            CoordSys::Cartesian,
                        ),
                        z: SubMesh1D::uniform(
                            extent.start,
                            extent.end,
                            points.require(PointKey::Z)?,
                            CoordSys::Cartesian,
                        ),
                    })
                }
                _ => {
                    let coord = if sub.spatial_variable().is_radial() {
                        CoordSys::Spherical
                    } else {
                        CoordSys::Cartesian
                    };
                    let cells = points.require(PointKey::for_sub_domain(sub))?;
                    SubMesh::OneD(SubMesh1D::uniform(extent.start, extent.end, cells, coord))
                }
            };
            submeshes.insert(sub, submesh);
        }
        let mesh = Self { submeshes };
        info!(
            "built mesh with {} sub-meshes and {} points",
            mesh.submeshes.len(),
            mesh.submeshes.values().map(SubMesh::npts).sum::<usize>()
        );
        Ok(mesh)
    }

    /// Returns the sub-mesh of one sub-domain.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::MissingSubMesh`] if the sub-domain is not meshed.
    pub fn submesh(&self, sub: SubDomain) -> Result<&SubMesh, MeshError> {
        self.submeshes
            .get(&sub)
            .ok_or(MeshError::MissingSubMesh(sub))
    }

    /// Total number of points across `subs`; an empty list is one point.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::MissingSubMesh`] if a sub-domain is not meshed.
    pub fn npts(&self, subs: &[SubDomain]) -> Result<usize, MeshError> {
        if subs.is_empty() {
            return Ok(1);
        }
        subs.iter()
            .map(|sub| self.submesh(*sub).map(SubMesh::npts))
            .sum()
    }

    /// Joins the one-dimensional sub-meshes of adjacent sub-domains.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Gap`] if consecutive sub-meshes do not share an
    /// edge, or [`MeshError::TwoDimensional`] for a planar sub-mesh.
    pub fn combine(&self, subs: &[SubDomain]) -> Result<SubMesh1D, MeshError> {
        let mut edges: Vec<f64> = Vec::new();
        let mut coord = CoordSys::Cartesian;
        let mut previous: Option<SubDomain> = None;
        for &sub in subs {
            let SubMesh::OneD(mesh) = self.submesh(sub)? else {
                return Err(MeshError::TwoDimensional(sub));
            };
            match (previous, edges.last()) {
                (Some(left), Some(&last)) => {
                    if (mesh.edges[0] - last).abs() > 1e-12 {
                        return Err(MeshError::Gap { left, right: sub });
                    }
                    edges.extend(mesh.edges.iter().skip(1));
                }
                _ => edges.extend(mesh.edges.iter()),
            }
            coord = mesh.coord;
            previous = Some(sub);
        }
        if edges.len() < 2 {
            return Err(MeshError::MissingPoints("empty domain".to_owned()));
        }
        Ok(SubMesh1D::from_edges(DVector::from_vec(edges), coord))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn geometry() -> Geometry {
        Geometry::new()
            .with_extent(SubDomain::NegativeElectrode, 0.0, 0.4)
            .unwrap()
            .with_extent(SubDomain::Separator, 0.4, 0.6)
            .unwrap()
            .with_extent(SubDomain::PositiveElectrode, 0.6, 1.0)
            .unwrap()
            .with_extent(SubDomain::NegativeParticle, 0.0, 1.0)
            .unwrap()
    }

    #[test]
    fn uniform_submesh_has_centred_nodes() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 4, CoordSys::Cartesian);
        assert_eq!(mesh.npts(), 4);
        assert_eq!(mesh.edges().len(), 5);
        assert_relative_eq!(mesh.nodes()[0], 0.125);
        assert_relative_eq!(mesh.widths().sum(), 1.0);
    }

    #[test]
    fn combine_shares_interface_edges() {
        let points = Points::uniform(3).unwrap().with(PointKey::Xs, 2).unwrap();
        let mesh = Mesh::new(&geometry(), &points).unwrap();
        let combined = mesh.combine(&SubDomain::THROUGH_CELL).unwrap();
        assert_eq!(combined.npts(), 8);
        assert_eq!(combined.edges().len(), 9);
        assert_relative_eq!(combined.edges()[3], 0.4);
        assert_relative_eq!(combined.edges()[8], 1.0);
        assert_eq!(mesh.npts(&SubDomain::THROUGH_CELL).unwrap(), 8);
        assert_eq!(mesh.npts(&[]).unwrap(), 1);

        let particle = mesh.submesh(SubDomain::NegativeParticle).unwrap();
        assert!(matches!(particle, SubMesh::OneD(m) if m.coord() == CoordSys::Spherical));
    }

    #[test]
    fn combine_rejects_gaps() {
        let points = Points::uniform(2).unwrap();
        let mesh = Mesh::new(&geometry(), &points).unwrap();
        let err = mesh
            .combine(&[SubDomain::NegativeElectrode, SubDomain::PositiveElectrode])
            .unwrap_err();
        assert!(matches!(err, MeshError::Gap { .. }));
    }

    #[test]
    fn points_validate_counts_and_names() {
        assert!(matches!(
            Points::uniform(0),
            Err(MeshError::InvalidPoints { count: 0, .. })
        ));
        let points = Points::from_named([("x_n", 4), ("r_p", 6)]).unwrap();
        assert_eq!(points.get(PointKey::Xn), Some(4));
        assert_eq!(points.get(PointKey::Rp), Some(6));
        assert!(matches!(
            Points::from_named([("q", 3)]),
            Err(MeshError::UnknownSpatialVariable(_))
        ));
    }

    #[test]
    fn missing_points_are_reported() {
        let points = Points::empty().with(PointKey::Xn, 2).unwrap();
        let err = Mesh::new(&geometry(), &points).unwrap_err();
        assert!(matches!(err, MeshError::MissingPoints(_)));
    }
}
