use voltaic_core::{ModelBuilder, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    options::ParticleShape,
    parameters::{electrode, names},
    variables::quantities,
};

use super::on;

/// Active material volume fraction and the surface area it exposes.
///
/// With loss of active material the fraction decays under tensile surface
/// stress; otherwise it stays at one.
#[derive(Debug, Clone, Copy)]
pub struct ActiveMaterial {
    electrode: Electrode,
    scope: Scope,
    shape: ParticleShape,
    loss: bool,
}

impl ActiveMaterial {
    #[must_use]
    pub fn new(electrode: Electrode, scope: Scope, shape: ParticleShape, loss: bool) -> Self {
        Self {
            electrode,
            scope,
            shape,
            loss,
        }
    }

    fn fraction(&self) -> Variable {
        Variable::new(
            &self.scope.name(self.electrode, quantities::ACTIVE_MATERIAL),
            self.scope.domain(self.electrode),
        )
    }

    /// Surface area per unit volume of a fully active electrode.
    fn reference_area(&self) -> Symbol {
        match self.shape {
            ParticleShape::Spherical => Symbol::constant(3.0),
            ParticleShape::User => self.electrode.parameter(electrode::SURFACE_AREA),
        }
    }
}

impl SubModel for ActiveMaterial {
    fn name(&self) -> &'static str {
        match self.electrode {
            Electrode::Negative => "negative active material",
            Electrode::Positive => "positive active material",
        }
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let k = self.electrode;
        let fraction = if self.loss {
            self.fraction().symbol()
        } else {
            Symbol::constant(1.0)
        };
        let area = self.reference_area().times(&fraction)?;
        let area = match self.scope {
            Scope::Distributed => on(k.sub_domain(), area)?,
            Scope::Averaged => area,
        };
        vars.insert(self.scope.name(k, quantities::ACTIVE_MATERIAL), fraction);
        vars.insert(self.scope.name(k, quantities::SURFACE_AREA), area);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let k = self.electrode;
        if self.loss {
            let fraction = self.fraction();
            let stress = vars.get(&self.scope.name(k, quantities::STRESS))?;
            let exponent = Symbol::parameter(names::LAM_EXPONENT);
            let rate = k
                .parameter(electrode::LAM_RATE)
                .times(&stress.positive_part().pow(&exponent)?)?;
            builder
                .rhs(&fraction, -rate)?
                .initial_condition(&fraction, Symbol::constant(1.0));
        }
        for quantity in [quantities::ACTIVE_MATERIAL, quantities::SURFACE_AREA] {
            let name = self.scope.name(k, quantity);
            builder.variable(&name, vars.get(&name)?);
        }
        Ok(())
    }
}
