use voltaic_core::{Domain, SubDomain, Symbol};

/// One of the two porous electrodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Electrode {
    Negative,
    Positive,
}

impl Electrode {
    pub const BOTH: [Electrode; 2] = [Electrode::Negative, Electrode::Positive];

    /// Capitalized name, as used at the start of variable and parameter names.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Positive => "Positive",
        }
    }

    #[must_use]
    pub fn lower(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Positive => "positive",
        }
    }

    #[must_use]
    pub fn is_negative(self) -> bool {
        self == Self::Negative
    }

    /// Sign of the interfacial current density during discharge.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Self::Negative => 1.0,
            Self::Positive => -1.0,
        }
    }

    #[must_use]
    pub fn sub_domain(self) -> SubDomain {
        match self {
            Self::Negative => SubDomain::NegativeElectrode,
            Self::Positive => SubDomain::PositiveElectrode,
        }
    }

    #[must_use]
    pub fn particle(self) -> SubDomain {
        match self {
            Self::Negative => SubDomain::NegativeParticle,
            Self::Positive => SubDomain::PositiveParticle,
        }
    }

    #[must_use]
    pub fn domain(self) -> Domain {
        Domain::single(self.sub_domain())
    }

    /// `"Negative electrode porosity"` from `"electrode porosity"`.
    #[must_use]
    pub fn name(self, quantity: &str) -> String {
        format!("{} {quantity}", self.prefix())
    }

    /// `"X-averaged negative electrode porosity"` from `"electrode porosity"`.
    #[must_use]
    pub fn averaged(self, quantity: &str) -> String {
        format!("X-averaged {} {quantity}", self.lower())
    }

    /// A per-electrode parameter, such as `"electrode conductivity"`.
    #[must_use]
    pub fn parameter(self, quantity: &str) -> Symbol {
        Symbol::parameter(&self.name(quantity))
    }

    /// Electrode thickness as a parameter symbol.
    #[must_use]
    pub fn thickness(self) -> Symbol {
        self.parameter("electrode thickness")
    }
}

/// Whether electrode quantities vary through the electrode or are x-averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Full models: quantities live on the electrode's x domain.
    Distributed,
    /// Single particle models: quantities are scalars.
    Averaged,
}

impl Scope {
    /// The coupling name of an electrode quantity in this scope.
    #[must_use]
    pub fn name(self, electrode: Electrode, quantity: &str) -> String {
        match self {
            Self::Distributed => electrode.name(quantity),
            Self::Averaged => electrode.averaged(quantity),
        }
    }

    /// The domain of an electrode quantity in this scope.
    #[must_use]
    pub fn domain(self, electrode: Electrode) -> Domain {
        match self {
            Self::Distributed => electrode.domain(),
            Self::Averaged => Domain::scalar(),
        }
    }

    /// The domain of a particle quantity in this scope.
    #[must_use]
    pub fn particle_domain(self, electrode: Electrode) -> Domain {
        let particle = Domain::single(electrode.particle());
        match self {
            Self::Distributed => particle.with_secondary(vec![electrode.sub_domain()]),
            Self::Averaged => particle,
        }
    }
}
