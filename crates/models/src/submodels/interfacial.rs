use voltaic_core::{ModelBuilder, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables, variables::names, variables::quantities,
};

use super::{averaged_flux, x_average};

/// Sums the intercalation and side-reaction currents at an interface.
///
/// With a distributed film resistance the total is an algebraic state, since
/// the film overpotential depends on it. In x-averaged models the total is
/// fixed by the applied current.
#[derive(Debug, Clone, Copy)]
pub struct InterfacialCurrent {
    electrode: Electrode,
    scope: Scope,
    sei: bool,
    plating: bool,
    film_state: bool,
    inverse: bool,
}

impl InterfacialCurrent {
    #[must_use]
    pub fn new(electrode: Electrode, scope: Scope) -> Self {
        Self {
            electrode,
            scope,
            sei: false,
            plating: false,
            film_state: false,
            inverse: false,
        }
    }

    /// Includes the SEI and plating side reactions in the total.
    #[must_use]
    pub fn with_side_reactions(mut self, sei: bool, plating: bool) -> Self {
        self.sei = sei;
        self.plating = plating;
        self
    }

    /// Makes the total an algebraic state.
    #[must_use]
    pub fn with_film_state(mut self, film_state: bool) -> Self {
        self.film_state = film_state;
        self
    }

    /// Publishes the intercalation current too, for inverse kinetics.
    #[must_use]
    pub fn with_inverse_kinetics(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    fn name(&self, quantity: &str) -> String {
        self.scope.name(self.electrode, quantity)
    }

    fn total(&self) -> Variable {
        Variable::new(
            &self.name(quantities::TOTAL_CURRENT),
            self.scope.domain(self.electrode),
        )
    }

    fn is_state(&self) -> bool {
        self.film_state && self.scope == Scope::Distributed
    }

    fn side_reactions(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.sei {
            names.push(self.name(quantities::SEI_CURRENT));
        }
        if self.plating {
            names.push(self.name(quantities::PLATING_CURRENT));
        }
        names
    }

    fn sum(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let mut total = vars.get(&self.name(quantities::INTERFACIAL_CURRENT))?;
        for name in self.side_reactions() {
            total = total.plus(&vars.get(&name)?)?;
        }
        Ok(total)
    }

    fn applied(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let current = vars.get(names::CURRENT)?;
        let area = vars.get(&self.name(quantities::SURFACE_AREA))?;
        Ok(averaged_flux(self.electrode, &current, &area)?)
    }
}

impl SubModel for InterfacialCurrent {
    fn name(&self) -> &'static str {
        match self.electrode {
            Electrode::Negative => "negative interfacial current",
            Electrode::Positive => "positive interfacial current",
        }
    }

    fn provides(&self) -> Vec<String> {
        let mut provided = Vec::new();
        if !self.is_state() {
            provided.push(self.name(quantities::TOTAL_CURRENT));
        }
        if self.inverse {
            provided.push(self.name(quantities::INTERFACIAL_CURRENT));
        }
        provided
    }

    fn requires(&self) -> Vec<String> {
        if self.scope == Scope::Averaged || self.is_state() {
            return Vec::new();
        }
        let mut required = vec![self.name(quantities::INTERFACIAL_CURRENT)];
        required.extend(self.side_reactions());
        required
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        if self.is_state() {
            let total = self.total();
            vars.insert(total.name(), total.symbol());
        }
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        match self.scope {
            Scope::Distributed if self.is_state() => {}
            Scope::Distributed => {
                let total = self.sum(vars)?;
                vars.insert(self.name(quantities::TOTAL_CURRENT), total);
            }
            Scope::Averaged => {
                let applied = self.applied(vars)?;
                if self.inverse {
                    vars.insert(self.name(quantities::INTERFACIAL_CURRENT), applied.clone());
                }
                vars.insert(self.name(quantities::TOTAL_CURRENT), applied);
            }
        }
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let k = self.electrode;
        if self.is_state() {
            let total = self.total();
            let residual = total.symbol().minus(&self.sum(vars)?)?;
            builder
                .algebraic(&total, residual)?
                .initial_condition(&total, self.applied(vars)?);
        }
        let total = vars.get(&self.name(quantities::TOTAL_CURRENT))?;
        match self.scope {
            Scope::Distributed => {
                builder.variable(
                    &k.averaged(quantities::TOTAL_CURRENT),
                    x_average(&total, &k.thickness())?,
                );
            }
            Scope::Averaged => {
                let intercalation = vars.get(&self.name(quantities::INTERFACIAL_CURRENT))?;
                builder
                    .variable(&k.name(quantities::TOTAL_CURRENT), total.broadcast(k.domain())?)
                    .variable(
                        &k.name(quantities::INTERFACIAL_CURRENT),
                        intercalation.broadcast(k.domain())?,
                    );
            }
        }
        builder.variable(&self.name(quantities::TOTAL_CURRENT), total);
        Ok(())
    }
}
