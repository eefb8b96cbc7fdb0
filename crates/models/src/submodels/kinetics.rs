//! Butler-Volmer kinetics at the electrode/electrolyte interface.
//!
//! The forward form computes the interfacial current from the surface
//! potential difference. The inverse form, used by x-averaged models whose
//! interfacial current is fixed by the applied current, solves for the
//! overpotential instead. With a surface form the potential difference is
//! itself a state, charged by the double layer.

use std::collections::BTreeMap;

use voltaic_core::{Domain, ModelBuilder, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    options::{SeiFilmResistance, SurfaceForm},
    parameters::{electrode, names as parameter_names},
    variables::{names, quantities},
};

use super::{Chemistry, averaged_flux, initial_ocp, ocp, x_average};

#[derive(Debug, Clone, Copy)]
pub struct Kinetics {
    electrode: Electrode,
    chemistry: Chemistry,
    scope: Scope,
    surface_form: SurfaceForm,
    film: SeiFilmResistance,
}

impl Kinetics {
    #[must_use]
    pub fn new(electrode: Electrode, chemistry: Chemistry, scope: Scope) -> Self {
        Self {
            electrode,
            chemistry,
            scope,
            surface_form: SurfaceForm::False,
            film: SeiFilmResistance::None,
        }
    }

    #[must_use]
    pub fn with_surface_form(mut self, surface_form: SurfaceForm) -> Self {
        self.surface_form = surface_form;
        self
    }

    /// Adds the overpotential across an SEI film.
    #[must_use]
    pub fn with_film(mut self, film: SeiFilmResistance) -> Self {
        self.film = film;
        self
    }

    fn name(&self, quantity: &str) -> String {
        self.scope.name(self.electrode, quantity)
    }

    /// Inverse kinetics: x-averaged interface with no double layer.
    fn is_inverse(&self) -> bool {
        self.scope == Scope::Averaged && self.surface_form == SurfaceForm::False
    }

    fn potential_difference(&self) -> Variable {
        Variable::new(
            &self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE),
            self.scope.domain(self.electrode),
        )
    }

    /// Open-circuit potential and its temperature derivative at `argument`.
    fn open_circuit(
        &self,
        argument: Symbol,
        temperature: &Symbol,
    ) -> Result<(Symbol, Symbol), BuildError> {
        let placeholder = Variable::new("kinetics reference temperature", Domain::scalar());
        let u = ocp(self.electrode, argument, &placeholder.symbol())?;
        let entropic = u.differentiate(&placeholder)?;
        let map = BTreeMap::from([(placeholder, temperature.clone())]);
        Ok((u.substitute(&map)?, entropic))
    }

    fn exchange_current(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let k = self.electrode;
        let rate = k.parameter(electrode::REACTION_RATE);
        let c_e = vars.get(&self.name(quantities::ELECTROLYTE_CONCENTRATION))?;
        let j0 = match self.chemistry {
            Chemistry::LithiumIon => {
                let c_s = vars.get(&self.name(quantities::SURFACE_CONCENTRATION))?;
                let product = c_e.times(&c_s)?.times(&(1.0 - c_s.clone()))?;
                let enhancement = vars
                    .find(&self.name(quantities::CRACK_ENHANCEMENT))
                    .cloned()
                    .unwrap_or_else(|| Symbol::constant(1.0));
                rate.times(&product.sqrt())?.times(&enhancement)?
            }
            Chemistry::LeadAcid if k.is_negative() => rate.times(&c_e)?,
            Chemistry::LeadAcid => rate.times(&c_e.powf(2.0))?,
        };
        Ok(j0)
    }

    fn ocp_argument(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let quantity = match self.chemistry {
            Chemistry::LithiumIon => quantities::SURFACE_CONCENTRATION,
            Chemistry::LeadAcid => quantities::ELECTROLYTE_CONCENTRATION,
        };
        Ok(vars.get(&self.name(quantity))?)
    }

    /// Overpotential across the SEI film.
    fn film_overpotential(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let flux = match self.film {
            SeiFilmResistance::None => return Ok(Symbol::constant(0.0)),
            SeiFilmResistance::Distributed => vars.get(&self.name(quantities::TOTAL_CURRENT))?,
            SeiFilmResistance::Average => {
                let current = vars.get(names::CURRENT)?;
                let area = vars.get(&self.name(quantities::SURFACE_AREA))?;
                averaged_flux(self.electrode, &current, &area)?
            }
        };
        let thickness = vars.get(&self.name(quantities::SEI_THICKNESS))?;
        Ok(Symbol::parameter(parameter_names::SEI_RESISTIVITY)
            .times(&thickness)?
            .times(&flux)?)
    }

    /// Charging current of the double layer: the current delivered to the
    /// interface less the current consumed by reactions.
    fn double_layer_imbalance(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let k = self.electrode;
        let imbalance = match self.scope {
            Scope::Distributed => {
                let i_e = vars.get(names::ELECTROLYTE_CURRENT)?;
                let area = vars.get(&self.name(quantities::SURFACE_AREA))?;
                i_e.div()?
                    .restrict(&[k.sub_domain()])?
                    .over(&area)?
                    .minus(&vars.get(&self.name(quantities::TOTAL_CURRENT))?)?
            }
            Scope::Averaged => vars
                .get(&self.name(quantities::TOTAL_CURRENT))?
                .minus(&vars.get(&self.name(quantities::INTERFACIAL_CURRENT))?)?,
        };
        Ok(imbalance)
    }
}

impl SubModel for Kinetics {
    fn name(&self) -> &'static str {
        match self.electrode {
            Electrode::Negative => "negative kinetics",
            Electrode::Positive => "positive kinetics",
        }
    }

    fn provides(&self) -> Vec<String> {
        let mut provided = vec![
            self.name(quantities::OCP),
            self.name(quantities::ENTROPIC_CHANGE),
            self.name(quantities::EXCHANGE_CURRENT),
            self.name(quantities::OVERPOTENTIAL),
            self.name(quantities::FILM_OVERPOTENTIAL),
        ];
        if self.surface_form == SurfaceForm::False {
            provided.push(self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE));
        }
        if !self.is_inverse() {
            provided.push(self.name(quantities::INTERFACIAL_CURRENT));
        }
        provided
    }

    fn requires(&self) -> Vec<String> {
        let mut required = vec![
            self.name(quantities::ELECTROLYTE_CONCENTRATION),
            self.name(quantities::TEMPERATURE),
        ];
        if self.chemistry == Chemistry::LithiumIon {
            required.push(self.name(quantities::SURFACE_CONCENTRATION));
        }
        if self.is_inverse() {
            required.push(self.name(quantities::TOTAL_CURRENT));
        } else if self.surface_form == SurfaceForm::False {
            required.push(self.name(quantities::POTENTIAL));
            required.push(self.name(quantities::ELECTROLYTE_POTENTIAL));
        }
        if self.film == SeiFilmResistance::Distributed {
            required.push(self.name(quantities::TOTAL_CURRENT));
        }
        required
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        if self.surface_form != SurfaceForm::False {
            let delta_phi = self.potential_difference();
            vars.insert(delta_phi.name(), delta_phi.symbol());
        }
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let temperature = vars.get(&self.name(quantities::TEMPERATURE))?;
        let (u, entropic) = self.open_circuit(self.ocp_argument(vars)?, &temperature)?;
        let j0 = self.exchange_current(vars)?;
        let film = self.film_overpotential(vars)?;

        if self.is_inverse() {
            let j = vars.get(&self.name(quantities::TOTAL_CURRENT))?;
            let eta = (2.0 * temperature.clone()).times(&j.over(&(2.0 * j0.clone()))?.arcsinh())?;
            let delta_phi = u.plus(&eta)?.plus(&film)?;
            vars.insert(self.name(quantities::OVERPOTENTIAL), eta);
            vars.insert(self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE), delta_phi);
        } else {
            let delta_phi = if self.surface_form == SurfaceForm::False {
                let phi_s = vars.get(&self.name(quantities::POTENTIAL))?;
                let phi_e = vars.get(&self.name(quantities::ELECTROLYTE_POTENTIAL))?;
                let delta_phi = phi_s.minus(&phi_e)?;
                vars.insert(self.name(quantities::SURFACE_POTENTIAL_DIFFERENCE), delta_phi.clone());
                delta_phi
            } else {
                self.potential_difference().symbol()
            };
            let eta = delta_phi.minus(&u)?.minus(&film)?;
            let j = (2.0 * j0.clone()).times(&eta.over(&(2.0 * temperature.clone()))?.sinh())?;
            vars.insert(self.name(quantities::OVERPOTENTIAL), eta);
            vars.insert(self.name(quantities::INTERFACIAL_CURRENT), j);
        }
        vars.insert(self.name(quantities::OCP), u);
        vars.insert(self.name(quantities::ENTROPIC_CHANGE), entropic);
        vars.insert(self.name(quantities::EXCHANGE_CURRENT), j0);
        vars.insert(self.name(quantities::FILM_OVERPOTENTIAL), film);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let k = self.electrode;
        if self.surface_form != SurfaceForm::False {
            let delta_phi = self.potential_difference();
            let imbalance = self.double_layer_imbalance(vars)?;
            let initial = initial_ocp(self.chemistry, k)?;
            match self.surface_form {
                SurfaceForm::Differential => {
                    let capacity = k.parameter(electrode::DOUBLE_LAYER);
                    builder.rhs(&delta_phi, imbalance.over(&capacity)?)?;
                }
                _ => {
                    builder.algebraic(&delta_phi, imbalance)?;
                }
            }
            builder.initial_condition(&delta_phi, initial);
        }

        for quantity in [
            quantities::SURFACE_POTENTIAL_DIFFERENCE,
            quantities::OCP,
            quantities::OVERPOTENTIAL,
            quantities::EXCHANGE_CURRENT,
            quantities::INTERFACIAL_CURRENT,
        ] {
            let name = self.name(quantity);
            let symbol = vars.get(&name)?;
            if self.scope == Scope::Distributed {
                builder.variable(&k.averaged(quantity), x_average(&symbol, &k.thickness())?);
            }
            builder.variable(&name, symbol);
        }
        if self.film != SeiFilmResistance::None {
            let name = self.name(quantities::FILM_OVERPOTENTIAL);
            builder.variable(&name, vars.get(&name)?);
        }
        Ok(())
    }
}
