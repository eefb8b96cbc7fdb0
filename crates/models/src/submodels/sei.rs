use voltaic_core::{ModelBuilder, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    options::Sei as Growth,
    parameters::names as parameter_names,
    variables::quantities,
};

use super::on;

/// Growth of the solid-electrolyte interphase on the negative particles.
#[derive(Debug, Clone, Copy)]
pub struct Sei {
    growth: Growth,
    scope: Scope,
}

impl Sei {
    #[must_use]
    pub fn new(growth: Growth, scope: Scope) -> Self {
        Self { growth, scope }
    }

    fn name(&self, quantity: &str) -> String {
        self.scope.name(Electrode::Negative, quantity)
    }

    fn thickness(&self) -> Variable {
        Variable::new(
            &self.name(quantities::SEI_THICKNESS),
            self.scope.domain(Electrode::Negative),
        )
    }

    fn grows(&self) -> bool {
        !matches!(self.growth, Growth::None | Growth::Constant)
    }

    /// SEI side-reaction current density, negative while the film grows.
    fn current(&self, vars: &Variables, thickness: &Symbol) -> Result<Symbol, BuildError> {
        let delta_phi = vars.get(&self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE))?;
        let film = vars.get(&self.name(quantities::FILM_OVERPOTENTIAL))?;
        let temperature = vars.get(&self.name(quantities::TEMPERATURE))?;
        let driving = delta_phi.minus(&Symbol::parameter(parameter_names::SEI_OCP))?;
        let eta = driving.minus(&film)?;
        let rate = Symbol::parameter(parameter_names::SEI_REACTION_RATE);
        let kinetic = || -> Result<Symbol, BuildError> {
            let exponent = -eta.over(&(2.0 * temperature.clone()))?;
            Ok(rate.times(&exponent.exp())?)
        };

        let current = match self.growth {
            Growth::None | Growth::Constant => Symbol::constant(0.0),
            Growth::ReactionLimited => -kinetic()?,
            Growth::SolventDiffusionLimited => {
                -Symbol::parameter(parameter_names::SEI_SOLVENT_DIFFUSIVITY).over(thickness)?
            }
            Growth::ElectronMigrationLimited => {
                Symbol::parameter(parameter_names::SEI_ELECTRON_CONDUCTIVITY)
                    .times(&driving)?
                    .over(thickness)?
            }
            Growth::InterstitialDiffusionLimited => {
                -Symbol::parameter(parameter_names::SEI_INTERSTITIAL_DIFFUSIVITY)
                    .times(&(-delta_phi).exp())?
                    .over(thickness)?
            }
            Growth::EcReactionLimited => {
                let rate = kinetic()?;
                let diffusivity = Symbol::parameter(parameter_names::EC_DIFFUSIVITY);
                // EC concentration at the reaction front, depleted across the film.
                let ec = 1.0 / (1.0 + thickness.times(&rate)?.over(&diffusivity)?);
                -rate.times(&ec)?
            }
        };
        Ok(current)
    }
}

impl SubModel for Sei {
    fn name(&self) -> &'static str {
        "sei"
    }

    fn provides(&self) -> Vec<String> {
        vec![
            self.name(quantities::SEI_CURRENT),
            self.name(quantities::SEI_GROWTH),
        ]
    }

    fn requires(&self) -> Vec<String> {
        vec![
            self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE),
            self.name(quantities::FILM_OVERPOTENTIAL),
            self.name(quantities::TEMPERATURE),
        ]
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let thickness = if self.grows() {
            self.thickness().symbol()
        } else {
            let initial = Symbol::parameter(parameter_names::INITIAL_SEI_THICKNESS);
            match self.scope {
                Scope::Distributed => on(Electrode::Negative.sub_domain(), initial)?,
                Scope::Averaged => initial,
            }
        };
        vars.insert(self.name(quantities::SEI_THICKNESS), thickness);
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let thickness = vars.get(&self.name(quantities::SEI_THICKNESS))?;
        let current = self.current(vars, &thickness)?;
        let growth = -Symbol::parameter(parameter_names::SEI_GROWTH).times(&current)?;
        vars.insert(self.name(quantities::SEI_CURRENT), current);
        vars.insert(self.name(quantities::SEI_GROWTH), growth);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        if self.grows() {
            let thickness = self.thickness();
            builder
                .rhs(&thickness, vars.get(&self.name(quantities::SEI_GROWTH))?)?
                .initial_condition(
                    &thickness,
                    Symbol::parameter(parameter_names::INITIAL_SEI_THICKNESS),
                );
        }
        for quantity in [
            quantities::SEI_THICKNESS,
            quantities::SEI_CURRENT,
            quantities::SEI_GROWTH,
        ] {
            let name = self.name(quantity);
            builder.variable(&name, vars.get(&name)?);
        }
        Ok(())
    }
}
