use std::collections::BTreeMap;

use voltaic_core::{ParameterValues, SubDomain};

use crate::MeshError;

/// Parameter names read by [`Geometry::battery`].
pub mod names {
    pub const NEGATIVE_ELECTRODE_THICKNESS: &str = "Negative electrode thickness";
    pub const SEPARATOR_THICKNESS: &str = "Separator thickness";
    pub const POSITIVE_ELECTRODE_THICKNESS: &str = "Positive electrode thickness";
    pub const ELECTRODE_WIDTH: &str = "Electrode width";
    pub const ELECTRODE_HEIGHT: &str = "Electrode height";
}

/// The interval spanned by a one-dimensional sub-domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub start: f64,
    pub end: f64,
}

impl Extent {
    #[must_use]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// The shape of the current collectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectorGeometry {
    /// No current-collector dimension.
    Lumped,
    /// A line `0 <= z <= height`.
    Line { height: f64 },
    /// A plane `0 <= y <= width`, `0 <= z <= height`.
    Plane { width: f64, height: f64 },
}

/// Named sub-domain extents of a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    extents: BTreeMap<SubDomain, Extent>,
    collector: CollectorGeometry,
}

impl Geometry {
    /// Creates a geometry with no sub-domains and a lumped current collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extents: BTreeMap::new(),
            collector: CollectorGeometry::Lumped,
        }
    }

    /// Builds the through-cell and particle geometry of a battery.
    ///
    /// Electrode and separator thicknesses are read from `parameters` and laid
    /// out left to right from zero. Particle radii span `[0, 1]`. A collector
    /// dimensionality of 1 or 2 adds the current collector.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Parameter`] if a thickness is missing, or
    /// [`MeshError::InvalidExtent`] if one is not positive.
    pub fn battery(parameters: &ParameterValues, dimensionality: usize) -> Result<Self, MeshError> {
        let l_n = parameters.scalar(names::NEGATIVE_ELECTRODE_THICKNESS)?;
        let l_s = parameters.scalar(names::SEPARATOR_THICKNESS)?;
        let l_p = parameters.scalar(names::POSITIVE_ELECTRODE_THICKNESS)?;

        let mut geometry = Self::new()
            .with_extent(SubDomain::NegativeElectrode, 0.0, l_n)?
            .with_extent(SubDomain::Separator, l_n, l_n + l_s)?
            .with_extent(SubDomain::PositiveElectrode, l_n + l_s, l_n + l_s + l_p)?
            .with_extent(SubDomain::NegativeParticle, 0.0, 1.0)?
            .with_extent(SubDomain::PositiveParticle, 0.0, 1.0)?;

        geometry.collector = match dimensionality {
            0 => CollectorGeometry::Lumped,
            1 => CollectorGeometry::Line {
                height: parameters.scalar(names::ELECTRODE_HEIGHT)?,
            },
            _ => CollectorGeometry::Plane {
                width: parameters.scalar(names::ELECTRODE_WIDTH)?,
                height: parameters.scalar(names::ELECTRODE_HEIGHT)?,
            },
        };
        if let CollectorGeometry::Line { height } | CollectorGeometry::Plane { height, .. } =
            geometry.collector
        {
            geometry = geometry.with_extent(SubDomain::CurrentCollector, 0.0, height)?;
        }
        Ok(geometry)
    }

    /// Adds or replaces the extent of a one-dimensional sub-domain.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidExtent`] unless `start < end`.
    pub fn with_extent(mut self, sub: SubDomain, start: f64, end: f64) -> Result<Self, MeshError> {
        if start.is_nan() || end.is_nan() || start >= end {
            return Err(MeshError::InvalidExtent { sub, start, end });
        }
        self.extents.insert(sub, Extent { start, end });
        Ok(self)
    }

    #[must_use]
    pub fn with_collector(mut self, collector: CollectorGeometry) -> Self {
        self.collector = collector;
        self
    }

    #[must_use]
    pub fn extent(&self, sub: SubDomain) -> Option<Extent> {
        self.extents.get(&sub).copied()
    }

    #[must_use]
    pub fn collector(&self) -> CollectorGeometry {
        self.collector
    }

    pub fn sub_domains(&self) -> impl Iterator<Item = SubDomain> + '_ {
        self.extents.keys().copied()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn parameters() -> ParameterValues {
        let mut values = ParameterValues::new();
        values
            .insert(names::NEGATIVE_ELECTRODE_THICKNESS, 0.4)
            .insert(names::SEPARATOR_THICKNESS, 0.2)
            .insert(names::POSITIVE_ELECTRODE_THICKNESS, 0.4)
            .insert(names::ELECTRODE_HEIGHT, 1.0)
            .insert(names::ELECTRODE_WIDTH, 2.0);
        values
    }

    #[test]
    fn through_cell_extents_are_contiguous() {
        let geometry = Geometry::battery(&parameters(), 0).unwrap();
        let n = geometry.extent(SubDomain::NegativeElectrode).unwrap();
        let s = geometry.extent(SubDomain::Separator).unwrap();
        let p = geometry.extent(SubDomain::PositiveElectrode).unwrap();
        assert_relative_eq!(n.end, s.start);
        assert_relative_eq!(s.end, p.start);
        assert_relative_eq!(p.end, 1.0);
        assert!(geometry.extent(SubDomain::CurrentCollector).is_none());
        assert_eq!(geometry.collector(), CollectorGeometry::Lumped);
    }

    #[test]
    fn collector_dimension_adds_extent() {
        let geometry = Geometry::battery(&parameters(), 2).unwrap();
        assert_eq!(
            geometry.collector(),
            CollectorGeometry::Plane {
                width: 2.0,
                height: 1.0
            }
        );
        assert!(geometry.extent(SubDomain::CurrentCollector).is_some());
    }

    #[test]
    fn rejects_inverted_extent() {
        let err = Geometry::new()
            .with_extent(SubDomain::Separator, 1.0, 0.5)
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidExtent { .. }));
    }
}
