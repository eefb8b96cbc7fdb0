use voltaic_core::{
    BoundaryCondition, Domain, Event, ModelBuilder, Side, SpatialVariable, SubDomain, Symbol,
    Variable,
};

use crate::{
    BuildError, Electrode, SubModel, Variables,
    options::CurrentCollector,
    parameters::{electrode, names as parameter_names},
    variables::names,
};

use super::{Chemistry, initial_voltage, volts};

/// Current collectors and the terminal voltage they deliver.
#[derive(Debug, Clone, Copy)]
pub struct Collector {
    model: CurrentCollector,
    chemistry: Chemistry,
}

impl Collector {
    #[must_use]
    pub fn new(model: CurrentCollector, chemistry: Chemistry) -> Self {
        Self { model, chemistry }
    }

    fn domain() -> Domain {
        Domain::single(SubDomain::CurrentCollector)
    }

    fn negative_potential() -> Variable {
        Variable::new("Negative current collector potential", Self::domain())
    }

    fn positive_potential() -> Variable {
        Variable::new("Positive current collector potential", Self::domain())
    }

    fn through_current() -> Variable {
        Variable::new("Current collector current density", Self::domain())
    }

    fn conductivity(k: Electrode) -> Symbol {
        k.parameter(electrode::COLLECTOR_CONDUCTIVITY)
    }

    fn height() -> Symbol {
        Symbol::parameter(parameter_names::ELECTRODE_HEIGHT)
    }

    /// Voltage lost along collectors that conduct well enough for the
    /// through-cell current to stay uniform.
    fn conductive_loss(current: &Symbol) -> Result<Symbol, BuildError> {
        let compliance = (1.0 / Self::conductivity(Electrode::Negative))
            .plus(&(1.0 / Self::conductivity(Electrode::Positive)))?;
        let loss = current
            .times(&Self::height().powf(2.0))?
            .times(&compliance)?;
        Ok(loss / 3.0)
    }

    fn pair_equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let current = vars.get(names::CURRENT)?;
        let cell_voltage = vars.get(names::CELL_VOLTAGE)?;
        let (phi_n, phi_p, i_cc) = (
            Self::negative_potential(),
            Self::positive_potential(),
            Self::through_current(),
        );
        let sigma_n = Self::conductivity(Electrode::Negative);
        let sigma_p = Self::conductivity(Electrode::Positive);

        let negative = sigma_n
            .times(&phi_n.symbol().grad()?.div()?)?
            .plus(&i_cc.symbol())?;
        let positive = sigma_p
            .times(&phi_p.symbol().grad()?.div()?)?
            .minus(&i_cc.symbol())?;
        let contact = phi_p
            .symbol()
            .minus(&phi_n.symbol())?
            .minus(&cell_voltage)?
            .over(&Symbol::parameter(parameter_names::CELL_RESISTANCE))?;
        let balance = i_cc.symbol().minus(&current)?.minus(&contact)?;
        let tab_gradient = current.times(&Self::height())?.over(&sigma_p)?;

        builder
            .algebraic(&phi_n, negative)?
            .boundary_conditions(
                &phi_n,
                BoundaryCondition::dirichlet(Symbol::constant(0.0)),
                BoundaryCondition::no_flux(),
            )
            .initial_condition(&phi_n, Symbol::constant(0.0));
        builder
            .algebraic(&phi_p, positive)?
            .boundary_conditions(
                &phi_p,
                BoundaryCondition::no_flux(),
                BoundaryCondition::neumann(tab_gradient),
            )
            .initial_condition(&phi_p, initial_voltage(self.chemistry)?);
        builder
            .algebraic(&i_cc, balance)?
            .initial_condition(&i_cc, current);
        builder
            .variable(phi_n.name(), phi_n.symbol())
            .variable(phi_p.name(), phi_p.symbol())
            .variable(i_cc.name(), i_cc.symbol());
        Ok(())
    }

    /// Potential profiles along conductive collectors.
    fn conductive_profiles(current: &Symbol, terminal: &Symbol) -> Result<[Symbol; 2], BuildError> {
        let z = Symbol::coordinate(SpatialVariable::Z, Self::domain());
        let height = Self::height();
        let negative = current
            .over(&Self::conductivity(Electrode::Negative))?
            .times(&height.times(&z)?.minus(&(z.powf(2.0) / 2.0))?)?;
        let positive = terminal.plus(
            &current
                .over(&(2.0 * Self::conductivity(Electrode::Positive)))?
                .times(&z.powf(2.0).minus(&height.powf(2.0))?)?,
        )?;
        Ok([negative, positive])
    }
}

impl SubModel for Collector {
    fn name(&self) -> &'static str {
        "current collector"
    }

    fn provides(&self) -> Vec<String> {
        vec![names::TERMINAL_VOLTAGE.to_owned()]
    }

    fn requires(&self) -> Vec<String> {
        vec![names::CELL_VOLTAGE.to_owned()]
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let cell_voltage = vars.get(names::CELL_VOLTAGE)?;
        let terminal = match self.model {
            CurrentCollector::Uniform => cell_voltage,
            CurrentCollector::PotentialPair => {
                Self::positive_potential().symbol().boundary_value(Side::Right)?
            }
            CurrentCollector::QuiteConductive => {
                let current = vars.get(names::CURRENT)?;
                cell_voltage.minus(&Self::conductive_loss(&current)?)?
            }
        };
        vars.insert(names::TERMINAL_VOLTAGE, terminal);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let terminal = vars.get(names::TERMINAL_VOLTAGE)?;
        match self.model {
            CurrentCollector::Uniform => {}
            CurrentCollector::PotentialPair => self.pair_equations(vars, builder)?,
            CurrentCollector::QuiteConductive => {
                let current = vars.get(names::CURRENT)?;
                let [negative, positive] = Self::conductive_profiles(&current, &terminal)?;
                builder
                    .variable(Self::negative_potential().name(), negative)
                    .variable(Self::positive_potential().name(), positive);
            }
        }

        builder
            .variable(names::CELL_VOLTAGE, vars.get(names::CELL_VOLTAGE)?)
            .variable(names::TERMINAL_VOLTAGE, terminal.clone())
            .variable(&format!("{} [V]", names::TERMINAL_VOLTAGE), volts(&terminal)?)
            .event(Event::termination(
                "Minimum voltage",
                terminal.minus(&Symbol::parameter(parameter_names::LOWER_CUTOFF))?,
            ))
            .event(Event::termination(
                "Maximum voltage",
                Symbol::parameter(parameter_names::UPPER_CUTOFF).minus(&terminal)?,
            ));
        Ok(())
    }
}
