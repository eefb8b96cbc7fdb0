use voltaic_core::{BoundaryCondition, Domain, ModelBuilder, Symbol, Variable};

use crate::{
    BuildError, Electrode, SubModel, Variables,
    parameters::{electrode, names as parameter_names},
    variables::{names, quantities},
};

use super::through_cell;

/// Electrolyte flow driven by the volume change of the lead-acid reactions.
///
/// The velocity follows Darcy's law from a pressure that is an algebraic
/// state, fixed to zero at the positive current collector.
#[derive(Debug, Clone, Copy, Default)]
pub struct Convection;

impl Convection {
    fn pressure() -> Variable {
        Variable::new(names::PRESSURE, Domain::through_cell())
    }
}

impl SubModel for Convection {
    fn name(&self) -> &'static str {
        "convection"
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let pressure = Self::pressure().symbol();
        let coefficient = Symbol::parameter(parameter_names::PRESSURE_COEFFICIENT);
        let velocity = -coefficient.times(&pressure.grad()?)?;
        vars.insert(names::VELOCITY, velocity);
        vars.insert(names::PRESSURE, pressure);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let pressure = Self::pressure();
        let source = |k: Electrode| -> Result<Symbol, BuildError> {
            let area = vars.get(&k.name(quantities::SURFACE_AREA))?;
            let current = vars.get(&k.name(quantities::INTERFACIAL_CURRENT))?;
            Ok(k
                .parameter(electrode::VELOCITY_SOURCE)
                .times(&area)?
                .times(&current)?)
        };
        let sources = through_cell(
            source(Electrode::Negative)?,
            Symbol::constant(0.0),
            source(Electrode::Positive)?,
        )?;
        let residual = pressure.symbol().grad()?.div()?.plus(&sources)?;
        builder
            .algebraic(&pressure, residual)?
            .boundary_conditions(
                &pressure,
                BoundaryCondition::no_flux(),
                BoundaryCondition::dirichlet(Symbol::constant(0.0)),
            )
            .initial_condition(&pressure, Symbol::constant(0.0))
            .variable(names::PRESSURE, pressure.symbol())
            .variable(names::VELOCITY, vars.get(names::VELOCITY)?);
        Ok(())
    }
}
