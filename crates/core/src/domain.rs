use std::fmt;

/// A named spatial region of the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubDomain {
    NegativeElectrode,
    Separator,
    PositiveElectrode,
    NegativeParticle,
    PositiveParticle,
    CurrentCollector,
}

impl SubDomain {
    /// Through-cell sub-domains in left-to-right order.
    pub const THROUGH_CELL: [SubDomain; 3] = [
        SubDomain::NegativeElectrode,
        SubDomain::Separator,
        SubDomain::PositiveElectrode,
    ];

    /// Returns the human-readable name of the sub-domain.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NegativeElectrode => "negative electrode",
            Self::Separator => "separator",
            Self::PositiveElectrode => "positive electrode",
            Self::NegativeParticle => "negative particle",
            Self::PositiveParticle => "positive particle",
            Self::CurrentCollector => "current collector",
        }
    }

    /// Returns the spatial variable that spans this sub-domain.
    ///
    /// A two-dimensional current collector is additionally spanned by
    /// [`SpatialVariable::Y`].
    #[must_use]
    pub fn spatial_variable(self) -> SpatialVariable {
        match self {
            Self::NegativeElectrode | Self::Separator | Self::PositiveElectrode => {
                SpatialVariable::X
            }
            Self::NegativeParticle => SpatialVariable::Rn,
            Self::PositiveParticle => SpatialVariable::Rp,
            Self::CurrentCollector => SpatialVariable::Z,
        }
    }
}

impl fmt::Display for SubDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A coordinate direction used to lay out meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpatialVariable {
    X,
    Rn,
    Rp,
    Y,
    Z,
}

impl SpatialVariable {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Rn => "r_n",
            Self::Rp => "r_p",
            Self::Y => "y",
            Self::Z => "z",
        }
    }

    /// Returns `true` for particle radii, which use spherical geometry.
    #[must_use]
    pub fn is_radial(self) -> bool {
        matches!(self, Self::Rn | Self::Rp)
    }
}

impl fmt::Display for SpatialVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The domain tag carried by every symbol.
///
/// A domain has a primary list of contiguous sub-domains and an optional
/// secondary list. Particle quantities in a full electrode model live on a
/// particle primary domain with an electrode secondary domain, so each point
/// in the electrode owns its own particle.
///
/// An empty primary list marks a scalar, which is compatible with every
/// other domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain {
    primary: Vec<SubDomain>,
    secondary: Vec<SubDomain>,
}

impl Domain {
    /// The domain of scalar quantities.
    #[must_use]
    pub fn scalar() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(primary: impl Into<Vec<SubDomain>>) -> Self {
        Self {
            primary: primary.into(),
            secondary: Vec::new(),
        }
    }

    /// Returns a domain over a single sub-domain.
    #[must_use]
    pub fn single(sub: SubDomain) -> Self {
        Self::new(vec![sub])
    }

    /// The full electrolyte domain: negative electrode, separator, positive electrode.
    #[must_use]
    pub fn through_cell() -> Self {
        Self::new(SubDomain::THROUGH_CELL.to_vec())
    }

    #[must_use]
    pub fn with_secondary(mut self, secondary: impl Into<Vec<SubDomain>>) -> Self {
        self.secondary = secondary.into();
        self
    }

    #[must_use]
    pub fn primary(&self) -> &[SubDomain] {
        &self.primary
    }

    #[must_use]
    pub fn secondary(&self) -> &[SubDomain] {
        &self.secondary
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.primary.is_empty()
    }

    /// Returns `true` if two symbols on these domains may be combined pointwise.
    #[must_use]
    pub fn is_compatible(&self, other: &Domain) -> bool {
        self == other || self.is_scalar() || other.is_scalar()
    }

    /// Returns the domain obtained by collapsing the primary dimension.
    ///
    /// Integrating or taking a boundary value of a particle quantity yields a
    /// quantity on the electrode that hosted the particles.
    #[must_use]
    pub fn collapsed(&self) -> Domain {
        Domain::new(self.secondary.clone())
    }

    /// Returns `true` if the sub-domains form a contiguous left-to-right run.
    #[must_use]
    pub fn is_contiguous(subs: &[SubDomain]) -> bool {
        match subs {
            [] => false,
            [_] => true,
            _ => {
                let positions: Option<Vec<usize>> = subs
                    .iter()
                    .map(|s| SubDomain::THROUGH_CELL.iter().position(|t| t == s))
                    .collect();
                positions.is_some_and(|p| p.windows(2).all(|w| w[1] == w[0] + 1))
            }
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_scalar() {
            return f.write_str("scalar");
        }
        write_list(f, &self.primary)?;
        if !self.secondary.is_empty() {
            f.write_str(" over ")?;
            write_list(f, &self.secondary)?;
        }
        Ok(())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, subs: &[SubDomain]) -> fmt::Result {
    f.write_str("[")?;
    for (i, sub) in subs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(sub.name())?;
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_is_compatible_with_everything() {
        let electrolyte = Domain::through_cell();
        assert!(Domain::scalar().is_compatible(&electrolyte));
        assert!(electrolyte.is_compatible(&Domain::scalar()));
        assert!(!electrolyte.is_compatible(&Domain::single(SubDomain::Separator)));
    }

    #[test]
    fn contiguity_follows_cell_order() {
        use SubDomain::*;
        assert!(Domain::is_contiguous(&[NegativeElectrode, Separator]));
        assert!(Domain::is_contiguous(&[PositiveParticle]));
        assert!(!Domain::is_contiguous(&[NegativeElectrode, PositiveElectrode]));
        assert!(!Domain::is_contiguous(&[Separator, NegativeElectrode]));
        assert!(!Domain::is_contiguous(&[]));
    }

    #[test]
    fn display_lists_secondary() {
        let domain = Domain::single(SubDomain::NegativeParticle)
            .with_secondary(vec![SubDomain::NegativeElectrode]);
        assert_eq!(
            domain.to_string(),
            "[negative particle] over [negative electrode]"
        );
        assert_eq!(Domain::scalar().to_string(), "scalar");
    }
}
