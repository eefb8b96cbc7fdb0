//! Cell temperature.
//!
//! Temperatures are scaled so that the ambient reference is one. Lumped
//! models track a single x-averaged temperature, optionally resolved along
//! the current collector. The x-full model resolves it through the cell.

use voltaic_core::{
    BoundaryCondition, Domain, ExprError, ModelBuilder, SubDomain, Symbol, Variable,
};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    options::{Dimensionality, Thermal as ThermalOption},
    parameters::{electrode, names as parameter_names},
    variables::{names, quantities},
};

use super::{cell_thickness, on, through_cell, x_average};

#[derive(Debug, Clone, Copy)]
pub struct Thermal {
    model: ThermalOption,
    dimensionality: Dimensionality,
    scope: Scope,
}

impl Thermal {
    #[must_use]
    pub fn new(model: ThermalOption, dimensionality: Dimensionality, scope: Scope) -> Self {
        Self {
            model,
            dimensionality,
            scope,
        }
    }

    /// Whether the lumped temperature varies along the current collector.
    fn along_collector(&self) -> bool {
        self.model == ThermalOption::XLumped && self.dimensionality != Dimensionality::Zero
    }

    fn state(&self) -> Option<Variable> {
        match self.model {
            ThermalOption::Isothermal => None,
            ThermalOption::XFull => {
                Some(Variable::new(names::CELL_TEMPERATURE, Domain::through_cell()))
            }
            _ if self.along_collector() => Some(Variable::new(
                names::AVERAGE_TEMPERATURE,
                Domain::single(SubDomain::CurrentCollector),
            )),
            _ => Some(Variable::new(names::AVERAGE_TEMPERATURE, Domain::scalar())),
        }
    }

    fn ambient() -> Symbol {
        Symbol::parameter(parameter_names::AMBIENT_TEMPERATURE)
    }

    fn cooling_coefficient(&self) -> Result<Symbol, BuildError> {
        let h = Symbol::parameter(parameter_names::HEAT_TRANSFER);
        if self.model == ThermalOption::XLumped && !self.along_collector() {
            return Ok(h.plus(&Symbol::parameter(parameter_names::EDGE_HEAT_TRANSFER))?);
        }
        Ok(h)
    }

    /// Robin conditions for heat lost through the two edges of a domain.
    fn edge_cooling(coefficient: &Symbol) -> Result<[BoundaryCondition; 2], ExprError> {
        let conductivity = Symbol::parameter(parameter_names::THERMAL_CONDUCTIVITY);
        let ambient = Self::ambient();
        let flux = |sign: f64| -> Result<BoundaryCondition, ExprError> {
            let h = sign * coefficient.clone();
            let value = h.times(&ambient)?;
            Ok(BoundaryCondition::robin(h, conductivity.clone(), value))
        };
        Ok([flux(-1.0)?, flux(1.0)?])
    }

    /// Reversible heat `a j T dU/dT` of one electrode.
    fn reversible_heat(
        &self,
        vars: &Variables,
        k: Electrode,
        temperature: &Symbol,
    ) -> Result<Symbol, BuildError> {
        let name = |quantity| self.scope.name(k, quantity);
        let area = vars.get(&name(quantities::SURFACE_AREA))?;
        let current = vars.get(&name(quantities::INTERFACIAL_CURRENT))?;
        let entropic = vars.get(&name(quantities::ENTROPIC_CHANGE))?;
        Ok(area
            .times(&current)?
            .times(temperature)?
            .times(&entropic)?)
    }

    /// Heat generated per unit volume through the cell.
    fn distributed_heat(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let electrode_heat = |k: Electrode| -> Result<Symbol, BuildError> {
            let phi_s = vars.get(&k.name(quantities::POTENTIAL))?;
            let sigma = k.parameter(electrode::CONDUCTIVITY);
            let gradient = phi_s.grad()?;
            let ohmic = sigma.times(&gradient)?.times(&gradient)?;

            let area = vars.get(&k.name(quantities::SURFACE_AREA))?;
            let current = vars.get(&k.name(quantities::INTERFACIAL_CURRENT))?;
            let overpotential = vars.get(&k.name(quantities::OVERPOTENTIAL))?;
            let irreversible = area.times(&current)?.times(&overpotential)?;
            let temperature = vars.get(&k.name(quantities::TEMPERATURE))?;
            let reversible = self.reversible_heat(vars, k, &temperature)?;
            Ok(on(k.sub_domain(), ohmic.plus(&irreversible)?.plus(&reversible)?)?)
        };
        let negative = electrode_heat(Electrode::Negative)?;
        let positive = electrode_heat(Electrode::Positive)?;
        let solid = through_cell(negative, Symbol::constant(0.0), positive)?;

        let i_e = vars.get(names::ELECTROLYTE_CURRENT)?;
        let phi_e = vars.get(names::ELECTROLYTE_POTENTIAL)?;
        let electrolyte = -i_e.times(&phi_e.grad()?)?;
        Ok(solid.plus(&electrolyte)?)
    }

    /// Cell-averaged heat of x-averaged models: the gap between the
    /// open-circuit and cell voltages, plus the reversible heat.
    fn averaged_heat(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        let current = vars.get(names::CURRENT)?;
        let temperature = vars.get(names::AVERAGE_TEMPERATURE)?;
        let ocv = vars
            .get(&Electrode::Positive.averaged(quantities::OCP))?
            .minus(&vars.get(&Electrode::Negative.averaged(quantities::OCP))?)?;
        let gap = ocv.minus(&vars.get(names::CELL_VOLTAGE)?)?;
        let mut heat = current.times(&gap)?;
        for k in Electrode::BOTH {
            let reversible = self.reversible_heat(vars, k, &temperature)?;
            heat = heat.plus(&reversible.times(&k.thickness())?)?;
        }
        Ok(heat.over(&cell_thickness()?)?)
    }

    fn heat(&self, vars: &Variables) -> Result<Symbol, BuildError> {
        match self.scope {
            Scope::Distributed => self.distributed_heat(vars),
            Scope::Averaged => self.averaged_heat(vars),
        }
    }
}

impl SubModel for Thermal {
    fn name(&self) -> &'static str {
        "thermal"
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let (cell, average) = match (self.model, self.state()) {
            (ThermalOption::XFull, Some(state)) => {
                let cell = state.symbol();
                let average = x_average(&cell, &cell_thickness()?)?;
                (cell, average)
            }
            (_, Some(state)) if self.along_collector() => {
                let average = x_average(
                    &state.symbol(),
                    &Symbol::parameter(parameter_names::ELECTRODE_HEIGHT),
                )?;
                (average.broadcast(Domain::through_cell())?, average)
            }
            (_, Some(state)) => {
                let average = state.symbol();
                (average.broadcast(Domain::through_cell())?, average)
            }
            (_, None) => {
                let ambient = Self::ambient();
                (ambient.broadcast(Domain::through_cell())?, ambient)
            }
        };
        for k in Electrode::BOTH {
            let (part, part_average) = if self.model == ThermalOption::XFull {
                let part = cell.restrict(&[k.sub_domain()])?;
                let part_average = x_average(&part, &k.thickness())?;
                (part, part_average)
            } else {
                (on(k.sub_domain(), average.clone())?, average.clone())
            };
            vars.insert(k.averaged(quantities::TEMPERATURE), part_average);
            vars.insert(k.name(quantities::TEMPERATURE), part);
        }
        vars.insert(names::CELL_TEMPERATURE, cell);
        vars.insert(names::AVERAGE_TEMPERATURE, average);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        builder
            .variable(names::CELL_TEMPERATURE, vars.get(names::CELL_TEMPERATURE)?)
            .variable(names::AVERAGE_TEMPERATURE, vars.get(names::AVERAGE_TEMPERATURE)?);
        let Some(state) = self.state() else {
            return Ok(());
        };

        let capacity = Symbol::parameter(parameter_names::HEAT_CAPACITY);
        let heating = Symbol::parameter(parameter_names::HEATING);
        let heat = self.heat(vars)?;
        let average_heat = if heat.domain().is_scalar() {
            heat.clone()
        } else {
            x_average(&heat, &cell_thickness()?)?
        };
        let temperature = state.symbol();

        let rhs = match self.model {
            ThermalOption::XFull => {
                let conductivity = Symbol::parameter(parameter_names::THERMAL_CONDUCTIVITY);
                let coefficient = Symbol::parameter(parameter_names::HEAT_TRANSFER);
                let [left, right] = Self::edge_cooling(&coefficient)?;
                builder.boundary_conditions(&state, left, right);
                conductivity
                    .times(&temperature.grad()?.div()?)?
                    .plus(&heating.times(&heat)?)?
            }
            _ if self.along_collector() => {
                let conductivity = Symbol::parameter(parameter_names::THERMAL_CONDUCTIVITY);
                let coefficient = Symbol::parameter(parameter_names::EDGE_HEAT_TRANSFER);
                let [left, right] = Self::edge_cooling(&coefficient)?;
                builder.boundary_conditions(&state, left, right);
                let cooling = self
                    .cooling_coefficient()?
                    .times(&(temperature.minus(&Self::ambient())?))?;
                let source = heating
                    .times(&average_heat)?
                    .broadcast(Domain::single(SubDomain::CurrentCollector))?;
                conductivity
                    .times(&temperature.grad()?.div()?)?
                    .plus(&source)?
                    .minus(&cooling)?
            }
            _ => {
                let cooling = self
                    .cooling_coefficient()?
                    .times(&(temperature.minus(&Self::ambient())?))?;
                heating.times(&average_heat)?.minus(&cooling)?
            }
        };
        builder
            .rhs(&state, rhs.over(&capacity)?)?
            .initial_condition(&state, Symbol::parameter(parameter_names::INITIAL_TEMPERATURE))
            .variable("X-averaged total heating", average_heat);
        Ok(())
    }
}
