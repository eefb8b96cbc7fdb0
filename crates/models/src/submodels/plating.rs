use voltaic_core::{ModelBuilder, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    options::LithiumPlating,
    parameters::names as parameter_names,
    variables::quantities,
};

/// Lithium plating on the negative particles, optionally reversible.
#[derive(Debug, Clone, Copy)]
pub struct Plating {
    mode: LithiumPlating,
    scope: Scope,
}

impl Plating {
    #[must_use]
    pub fn new(mode: LithiumPlating, scope: Scope) -> Self {
        Self { mode, scope }
    }

    fn name(&self, quantity: &str) -> String {
        self.scope.name(Electrode::Negative, quantity)
    }

    fn plated(&self) -> Variable {
        Variable::new(
            &self.name(quantities::PLATED_LITHIUM),
            self.scope.domain(Electrode::Negative),
        )
    }
}

impl SubModel for Plating {
    fn name(&self) -> &'static str {
        "lithium plating"
    }

    fn provides(&self) -> Vec<String> {
        vec![self.name(quantities::PLATING_CURRENT)]
    }

    fn requires(&self) -> Vec<String> {
        vec![
            self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE),
            self.name(quantities::FILM_OVERPOTENTIAL),
        ]
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let plated = self.plated();
        vars.insert(plated.name(), plated.symbol());
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let delta_phi = vars.get(&self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE))?;
        let film = vars.get(&self.name(quantities::FILM_OVERPOTENTIAL))?;
        let temperature = vars.get(&self.name(quantities::TEMPERATURE))?;
        let c_e = vars.get(&self.name(quantities::ELECTROLYTE_CONCENTRATION))?;

        let half = delta_phi.minus(&film)?.over(&(2.0 * temperature))?;
        let plating = Symbol::parameter(parameter_names::PLATING_RATE)
            .times(&c_e)?
            .times(&(-half.clone()).exp())?;
        let current = match self.mode {
            LithiumPlating::None => Symbol::constant(0.0),
            LithiumPlating::Irreversible => -plating,
            LithiumPlating::Reversible => Symbol::parameter(parameter_names::STRIPPING_RATE)
                .times(&self.plated().symbol())?
                .times(&half.exp())?
                .minus(&plating)?,
        };
        vars.insert(self.name(quantities::PLATING_CURRENT), current);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let plated = self.plated();
        let current = vars.get(&self.name(quantities::PLATING_CURRENT))?;
        let capacity = Symbol::parameter(parameter_names::PLATED_CAPACITY);
        builder
            .rhs(&plated, -current.over(&capacity)?)?
            .initial_condition(&plated, Symbol::constant(0.0))
            .variable(plated.name(), plated.symbol())
            .variable(&self.name(quantities::PLATING_CURRENT), current);
        Ok(())
    }
}
