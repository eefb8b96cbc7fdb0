//! Charge conservation in the electrolyte.
//!
//! The full model solves for the electrolyte potential as an algebraic
//! state. The x-averaged models integrate the current through the cell
//! analytically and only report the resulting potential profile and the
//! overpotential and ohmic losses it implies.

use voltaic_core::{
    BoundaryCondition, Domain, ModelBuilder, SpatialVariable, SubDomain, Symbol, Variable,
};

use crate::{
    BuildError, Electrode, SubModel, Variables,
    options::{ElectrolyteConductivity, SurfaceForm},
    parameters::names as parameter_names,
    variables::{names, quantities},
};

use super::{Chemistry, initial_ocp, through_cell, tortuosity, x_average};

#[derive(Debug, Clone, Copy)]
pub struct Conductivity {
    model: ElectrolyteConductivity,
    chemistry: Chemistry,
    surface_form: SurfaceForm,
}

impl Conductivity {
    /// `model` must already be resolved for the model family.
    #[must_use]
    pub fn new(model: ElectrolyteConductivity, chemistry: Chemistry) -> Self {
        Self {
            model,
            chemistry,
            surface_form: SurfaceForm::False,
        }
    }

    #[must_use]
    pub fn with_surface_form(mut self, surface_form: SurfaceForm) -> Self {
        self.surface_form = surface_form;
        self
    }

    fn is_full(&self) -> bool {
        matches!(
            self.model,
            ElectrolyteConductivity::Full | ElectrolyteConductivity::Default
        )
    }

    fn potential() -> Variable {
        Variable::new(names::ELECTROLYTE_POTENTIAL, Domain::through_cell())
    }

    fn conductivity() -> Symbol {
        Symbol::parameter(parameter_names::ELECTROLYTE_CONDUCTIVITY)
    }

    fn diffusion_coefficient() -> Symbol {
        2.0 * (1.0 - Symbol::parameter(parameter_names::TRANSFERENCE))
    }

    /// Effective conductivity of each region, from x-averaged porosities.
    fn region_conductivities(vars: &Variables) -> Result<[Symbol; 3], BuildError> {
        let kappa = Self::conductivity();
        let effective = |porosity: &Symbol| -> Result<Symbol, BuildError> {
            Ok(kappa.times(&tortuosity(porosity)?)?)
        };
        Ok([
            effective(&vars.get(&Electrode::Negative.averaged(quantities::POROSITY))?)?,
            effective(&Symbol::parameter(parameter_names::SEPARATOR_POROSITY))?,
            effective(&vars.get(&Electrode::Positive.averaged(quantities::POROSITY))?)?,
        ])
    }

    /// Concentration overpotential across the cell.
    fn concentration_overpotential(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let log_average = |k: Electrode| -> Result<Symbol, BuildError> {
            Ok(match self.model {
                ElectrolyteConductivity::Integrated => {
                    let part = vars.get(&k.name(quantities::ELECTROLYTE_CONCENTRATION))?;
                    x_average(&part.log(), &k.thickness())?
                }
                _ => vars
                    .get(&k.averaged(quantities::ELECTROLYTE_CONCENTRATION))?
                    .log(),
            })
        };
        let temperature = vars.get(names::AVERAGE_TEMPERATURE)?;
        let difference = log_average(Electrode::Positive)?.minus(&log_average(Electrode::Negative)?)?;
        Ok(Self::diffusion_coefficient()
            .times(&temperature)?
            .times(&difference)?)
    }

    /// Potential drop in the electrolyte when the current is carried
    /// uniformly by the reactions, measured from the negative electrode's
    /// current collector.
    fn ohmic_profile(vars: &Variables) -> Result<[Symbol; 3], BuildError> {
        let current = vars.get(names::CURRENT)?;
        let [kappa_n, kappa_s, kappa_p] = Self::region_conductivities(vars)?;
        let l_n = Electrode::Negative.thickness();
        let l_s = Symbol::parameter(parameter_names::SEPARATOR_THICKNESS);
        let l_p = Electrode::Positive.thickness();
        let x = |sub: SubDomain| Symbol::coordinate(SpatialVariable::X, Domain::single(sub));

        let drop_n = |position: &Symbol| -> Result<Symbol, BuildError> {
            let integral = position.powf(2.0).over(&(2.0 * l_n.clone()))?;
            Ok(-current.times(&integral)?.over(&kappa_n)?)
        };
        let end_n = drop_n(&l_n)?;
        let negative = drop_n(&x(SubDomain::NegativeElectrode))?;

        let separator = end_n.minus(
            &current
                .times(&x(SubDomain::Separator).minus(&l_n)?)?
                .over(&kappa_s)?,
        )?;
        let end_s = end_n.minus(&current.times(&l_s)?.over(&kappa_s)?)?;

        let y = x(SubDomain::PositiveElectrode).minus(&l_n.plus(&l_s)?)?;
        let integral = y.minus(&y.powf(2.0).over(&(2.0 * l_p.clone()))?)?;
        let positive = end_s.minus(&current.times(&integral)?.over(&kappa_p)?)?;
        Ok([negative, separator, positive])
    }

    /// `x`-averaged ohmic losses, `phi_e` averaged over the positive
    /// electrode less its average over the negative.
    fn ohmic_losses(vars: &Variables) -> Result<Symbol, BuildError> {
        let current = vars.get(names::CURRENT)?;
        let [kappa_n, kappa_s, kappa_p] = Self::region_conductivities(vars)?;
        let l_s = Symbol::parameter(parameter_names::SEPARATOR_THICKNESS);
        let resistance = Electrode::Negative
            .thickness()
            .over(&(3.0 * kappa_n))?
            .plus(&l_s.over(&kappa_s)?)?
            .plus(&Electrode::Positive.thickness().over(&(3.0 * kappa_p))?)?;
        Ok(-current.times(&resistance)?)
    }

    fn full_current(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let phi_e = vars.get(names::ELECTROLYTE_POTENTIAL)?;
        let c_e = vars.get(names::ELECTROLYTE_CONCENTRATION)?;
        let temperature = vars.get(names::CELL_TEMPERATURE)?;
        let porosity = vars.get(names::POROSITY)?;
        let diffusion = Self::diffusion_coefficient()
            .times(&temperature)?
            .times(&c_e.grad()?)?
            .over(&c_e)?;
        let driving = diffusion.minus(&phi_e.grad()?)?;
        Ok(Self::conductivity()
            .times(&tortuosity(&porosity)?)?
            .times(&driving)?)
    }

    fn full_residual(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let i_e = vars.get(names::ELECTROLYTE_CURRENT)?;
        if self.surface_form == SurfaceForm::False {
            let reaction = |k: Electrode| -> Result<Symbol, BuildError> {
                let area = vars.get(&k.name(quantities::SURFACE_AREA))?;
                Ok(area.times(&vars.get(&k.name(quantities::TOTAL_CURRENT))?)?)
            };
            let source = through_cell(
                reaction(Electrode::Negative)?,
                Symbol::constant(0.0),
                reaction(Electrode::Positive)?,
            )?;
            return Ok(i_e.div()?.minus(&source)?);
        }
        let closure = |k: Electrode| -> Result<Symbol, BuildError> {
            let phi_s = vars.get(&k.name(quantities::POTENTIAL))?;
            let delta_phi = vars.get(&k.name(quantities::SURFACE_POTENTIAL_DIFFERENCE))?;
            let phi_e = vars.get(&k.name(quantities::ELECTROLYTE_POTENTIAL))?;
            Ok(phi_s.minus(&delta_phi)?.minus(&phi_e)?)
        };
        Ok(Symbol::concatenate(vec![
            closure(Electrode::Negative)?,
            i_e.div()?.restrict(&[SubDomain::Separator])?,
            closure(Electrode::Positive)?,
        ])?)
    }
}

impl SubModel for Conductivity {
    fn name(&self) -> &'static str {
        "electrolyte conductivity"
    }

    fn provides(&self) -> Vec<String> {
        if self.is_full() {
            vec![names::ELECTROLYTE_CURRENT.to_owned()]
        } else {
            vec![
                names::ELECTROLYTE_POTENTIAL.to_owned(),
                names::ELECTROLYTE_OVERPOTENTIAL.to_owned(),
                names::ELECTROLYTE_OHMIC_LOSSES.to_owned(),
            ]
        }
    }

    fn requires(&self) -> Vec<String> {
        if self.is_full() {
            Vec::new()
        } else {
            vec![Electrode::Negative.averaged(quantities::SURFACE_POTENTIAL_DIFFERENCE)]
        }
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        if self.is_full() {
            let phi_e = Self::potential().symbol();
            for k in Electrode::BOTH {
                let part = phi_e.restrict(&[k.sub_domain()])?;
                vars.insert(k.averaged(quantities::ELECTROLYTE_POTENTIAL), x_average(&part, &k.thickness())?);
                vars.insert(k.name(quantities::ELECTROLYTE_POTENTIAL), part);
            }
            vars.insert(names::ELECTROLYTE_POTENTIAL, phi_e);
        }
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        if self.is_full() {
            let i_e = self.full_current(vars)?;
            vars.insert(names::ELECTROLYTE_CURRENT, i_e);
            return Ok(());
        }

        let reference = -vars.get(&Electrode::Negative.averaged(quantities::SURFACE_POTENTIAL_DIFFERENCE))?;
        let (overpotential, losses, profile) = match self.model {
            ElectrolyteConductivity::LeadingOrder => {
                let zero = Symbol::constant(0.0);
                (zero.clone(), zero.clone(), [zero.clone(), zero.clone(), zero])
            }
            _ => (
                self.concentration_overpotential(vars)?,
                Self::ohmic_losses(vars)?,
                Self::ohmic_profile(vars)?,
            ),
        };
        let [negative, separator, positive] = profile;
        // Shift the profile so its negative-electrode average sits at the
        // reference set by the negative interface.
        let offset = reference.minus(&x_average(&negative, &Electrode::Negative.thickness())?)?;
        let phi_e = through_cell(
            negative.plus(&offset)?,
            separator.plus(&offset)?,
            positive.plus(&offset)?,
        )?;
        vars.insert(names::ELECTROLYTE_POTENTIAL, phi_e);
        vars.insert(names::ELECTROLYTE_OVERPOTENTIAL, overpotential);
        vars.insert(names::ELECTROLYTE_OHMIC_LOSSES, losses);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        if self.is_full() {
            let phi_e = Self::potential();
            let initial = -initial_ocp(self.chemistry, Electrode::Negative)?;
            builder
                .algebraic(&phi_e, self.full_residual(vars)?)?
                .boundary_conditions(
                    &phi_e,
                    BoundaryCondition::no_flux(),
                    BoundaryCondition::no_flux(),
                )
                .initial_condition(&phi_e, initial)
                .variable(names::ELECTROLYTE_CURRENT, vars.get(names::ELECTROLYTE_CURRENT)?);
            let overpotential = vars
                .get(&Electrode::Positive.averaged(quantities::ELECTROLYTE_POTENTIAL))?
                .minus(&vars.get(&Electrode::Negative.averaged(quantities::ELECTROLYTE_POTENTIAL))?)?;
            builder.variable(names::ELECTROLYTE_OVERPOTENTIAL, overpotential);
        } else {
            for name in [names::ELECTROLYTE_OVERPOTENTIAL, names::ELECTROLYTE_OHMIC_LOSSES] {
                builder.variable(name, vars.get(name)?);
            }
        }
        builder.variable(names::ELECTROLYTE_POTENTIAL, vars.get(names::ELECTROLYTE_POTENTIAL)?);
        Ok(())
    }
}
