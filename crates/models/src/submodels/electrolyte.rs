use voltaic_core::{BoundaryCondition, Domain, Event, ModelBuilder, SubDomain, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    parameters::{electrode, names as parameter_names},
    variables::{names, quantities},
};

use super::{Chemistry, on, through_cell, tortuosity, x_average};

/// Concentrations below this stop a simulation.
const MINIMUM_CONCENTRATION: f64 = 0.002;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectrolyteModel {
    /// Diffusion through the cell, driven by the interfacial reactions.
    Full,
    /// The concentration stays at its initial value.
    Constant,
}

/// Salt (or acid) transport in the electrolyte.
#[derive(Debug, Clone, Copy)]
pub struct ElectrolyteDiffusion {
    model: ElectrolyteModel,
    chemistry: Chemistry,
    scope: Scope,
    convection: bool,
}

impl ElectrolyteDiffusion {
    #[must_use]
    pub fn new(model: ElectrolyteModel, chemistry: Chemistry, scope: Scope) -> Self {
        Self {
            model,
            chemistry,
            scope,
            convection: false,
        }
    }

    /// Adds advection by the volume-averaged velocity.
    #[must_use]
    pub fn with_convection(mut self, convection: bool) -> Self {
        self.convection = convection;
        self
    }

    fn concentration() -> Variable {
        Variable::new(names::ELECTROLYTE_CONCENTRATION, Domain::through_cell())
    }

    /// Salt released into the electrolyte by an electrode's reactions.
    fn source(&self, vars: &Variables, k: Electrode) -> Result<Symbol, BuildError> {
        let area = vars.get(&self.scope.name(k, quantities::SURFACE_AREA))?;
        let capacity = Symbol::parameter(parameter_names::ELECTROLYTE_CAPACITY);
        let (factor, current) = match self.chemistry {
            Chemistry::LithiumIon => (
                1.0 - Symbol::parameter(parameter_names::TRANSFERENCE),
                vars.get(&self.scope.name(k, quantities::TOTAL_CURRENT))?,
            ),
            Chemistry::LeadAcid => (
                k.parameter(electrode::ELECTROLYTE_SOURCE),
                vars.get(&self.scope.name(k, quantities::INTERFACIAL_CURRENT))?,
            ),
        };
        let source = factor.times(&area)?.times(&current)?.over(&capacity)?;
        Ok(on(k.sub_domain(), source)?)
    }
}

impl SubModel for ElectrolyteDiffusion {
    fn name(&self) -> &'static str {
        "electrolyte diffusion"
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let initial = Symbol::parameter(parameter_names::INITIAL_ELECTROLYTE);
        let c_e = match self.model {
            ElectrolyteModel::Full => Self::concentration().symbol(),
            ElectrolyteModel::Constant => initial.broadcast(Domain::through_cell())?,
        };
        for k in Electrode::BOTH {
            let part = c_e.restrict(&[k.sub_domain()])?;
            let averaged = match self.model {
                ElectrolyteModel::Full => x_average(&part, &k.thickness())?,
                ElectrolyteModel::Constant => initial.clone(),
            };
            vars.insert(k.name(quantities::ELECTROLYTE_CONCENTRATION), part);
            vars.insert(k.averaged(quantities::ELECTROLYTE_CONCENTRATION), averaged);
        }
        vars.insert(
            names::SEPARATOR_ELECTROLYTE_CONCENTRATION,
            c_e.restrict(&[SubDomain::Separator])?,
        );
        vars.insert(names::ELECTROLYTE_CONCENTRATION, c_e);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let c_e = vars.get(names::ELECTROLYTE_CONCENTRATION)?;
        if self.model == ElectrolyteModel::Full {
            let variable = Self::concentration();
            let porosity = vars.get(names::POROSITY)?;
            let timescale = Symbol::parameter(parameter_names::ELECTROLYTE_TIMESCALE);

            let mut flux = -tortuosity(&porosity)?.times(&c_e.grad()?)?.over(&timescale)?;
            if self.convection {
                flux = flux.plus(&c_e.times(&vars.get(names::VELOCITY)?)?)?;
            }
            let source = through_cell(
                self.source(vars, Electrode::Negative)?,
                Symbol::constant(0.0),
                self.source(vars, Electrode::Positive)?,
            )?;
            let swelling = c_e.times(&vars.get(names::POROSITY_CHANGE)?)?;
            let rhs = (-flux.div()?)
                .plus(&source)?
                .minus(&swelling)?
                .over(&porosity)?;

            builder
                .rhs(&variable, rhs)?
                .boundary_conditions(
                    &variable,
                    BoundaryCondition::no_flux(),
                    BoundaryCondition::no_flux(),
                )
                .initial_condition(&variable, Symbol::parameter(parameter_names::INITIAL_ELECTROLYTE))
                .event(Event::termination(
                    "Zero electrolyte concentration cut-off",
                    c_e.min() - MINIMUM_CONCENTRATION,
                ));
        }

        builder.variable(names::ELECTROLYTE_CONCENTRATION, c_e);
        for k in Electrode::BOTH {
            let name = k.averaged(quantities::ELECTROLYTE_CONCENTRATION);
            builder.variable(&name, vars.get(&name)?);
        }
        Ok(())
    }
}
