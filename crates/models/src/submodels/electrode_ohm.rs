use voltaic_core::{BoundaryCondition, ModelBuilder, Side, SpatialVariable, Symbol, Variable};

use crate::{
    BuildError, Electrode, SubModel, Variables,
    options::SurfaceForm,
    parameters::{electrode, names as parameter_names},
    variables::{names, quantities},
};

use super::{Chemistry, initial_voltage, x_average};

/// Ohm's law in the solid phase of one electrode.
#[derive(Debug, Clone, Copy)]
pub struct ElectrodeOhm {
    electrode: Electrode,
    chemistry: Chemistry,
    surface_form: SurfaceForm,
}

impl ElectrodeOhm {
    #[must_use]
    pub fn new(electrode: Electrode, chemistry: Chemistry) -> Self {
        Self {
            electrode,
            chemistry,
            surface_form: SurfaceForm::False,
        }
    }

    #[must_use]
    pub fn with_surface_form(mut self, surface_form: SurfaceForm) -> Self {
        self.surface_form = surface_form;
        self
    }

    fn potential(k: Electrode) -> Variable {
        Variable::new(&k.name(quantities::POTENTIAL), k.domain())
    }
}

impl SubModel for ElectrodeOhm {
    fn name(&self) -> &'static str {
        match self.electrode {
            Electrode::Negative => "negative electrode ohm",
            Electrode::Positive => "positive electrode ohm",
        }
    }

    fn provides(&self) -> Vec<String> {
        match self.electrode {
            Electrode::Negative => Vec::new(),
            Electrode::Positive => vec![names::CELL_VOLTAGE.to_owned()],
        }
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let k = self.electrode;
        let phi_s = Self::potential(k).symbol();
        vars.insert(k.averaged(quantities::POTENTIAL), x_average(&phi_s, &k.thickness())?);
        vars.insert(k.name(quantities::POTENTIAL), phi_s);
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        if self.electrode == Electrode::Positive {
            let positive = Self::potential(Electrode::Positive).symbol();
            let negative = Self::potential(Electrode::Negative).symbol();
            let voltage = positive
                .boundary_value(Side::Right)?
                .minus(&negative.boundary_value(Side::Left)?)?;
            vars.insert(names::CELL_VOLTAGE, voltage);
        }
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        let k = self.electrode;
        let phi_s = Self::potential(k);
        let sigma = k.parameter(electrode::CONDUCTIVITY);
        let conduction = sigma.times(&phi_s.symbol().grad()?.div()?)?;
        let sink = if self.surface_form == SurfaceForm::False {
            let area = vars.get(&k.name(quantities::SURFACE_AREA))?;
            area.times(&vars.get(&k.name(quantities::TOTAL_CURRENT))?)?
        } else {
            vars.get(names::ELECTROLYTE_CURRENT)?
                .div()?
                .restrict(&[k.sub_domain()])?
        };

        let (left, right, initial) = match k {
            Electrode::Negative => (
                BoundaryCondition::dirichlet(Symbol::constant(0.0)),
                BoundaryCondition::no_flux(),
                Symbol::constant(0.0),
            ),
            Electrode::Positive => {
                let current = vars.get(names::CURRENT)?;
                (
                    BoundaryCondition::no_flux(),
                    BoundaryCondition::neumann(-current.over(&sigma)?),
                    initial_voltage(self.chemistry)?,
                )
            }
        };
        builder
            .algebraic(&phi_s, conduction.minus(&sink)?)?
            .boundary_conditions(&phi_s, left, right)
            .initial_condition(&phi_s, initial)
            .variable(phi_s.name(), phi_s.symbol())
            .variable(
                &k.averaged(quantities::POTENTIAL),
                vars.get(&k.averaged(quantities::POTENTIAL))?,
            );
        Ok(())
    }
}

/// Solid-phase potentials of x-averaged models, where the cell voltage
/// follows from the interfaces and the losses between them.
#[derive(Debug, Clone, Copy)]
pub struct AveragedElectrodeOhm {
    /// Includes the first-order ohmic drop in the solid.
    composite: bool,
}

impl AveragedElectrodeOhm {
    #[must_use]
    pub fn new(composite: bool) -> Self {
        Self { composite }
    }

    fn solid_losses(current: &Symbol) -> Result<Symbol, BuildError> {
        let resistance = |k: Electrode| -> Result<Symbol, BuildError> {
            Ok(k.thickness().over(&k.parameter(electrode::CONDUCTIVITY))?)
        };
        let total = resistance(Electrode::Positive)?.plus(&resistance(Electrode::Negative)?)?;
        Ok(-current.times(&total)? / 3.0)
    }

    fn coordinate(k: Electrode) -> Symbol {
        Symbol::coordinate(SpatialVariable::X, k.domain())
    }

    /// Potential profiles through each electrode for a uniform reaction.
    fn profiles(&self, current: &Symbol, voltage: &Symbol) -> Result<(Symbol, Symbol), BuildError> {
        let (n, p) = (Electrode::Negative, Electrode::Positive);
        if !self.composite {
            return Ok((
                Symbol::constant(0.0).broadcast(n.domain())?,
                voltage.broadcast(p.domain())?,
            ));
        }
        let sigma_n = n.parameter(electrode::CONDUCTIVITY);
        let x = Self::coordinate(n);
        let shape = x.minus(&x.powf(2.0).over(&(2.0 * n.thickness()))?)?;
        let negative = -current.over(&sigma_n)?.times(&shape)?;

        let sigma_p = p.parameter(electrode::CONDUCTIVITY);
        let start = n
            .thickness()
            .plus(&Symbol::parameter(parameter_names::SEPARATOR_THICKNESS))?;
        let y = Self::coordinate(p).minus(&start)?;
        let shape = y.powf(2.0).minus(&p.thickness().powf(2.0))? / 2.0;
        let drop = current.over(&sigma_p.times(&p.thickness())?)?.times(&shape)?;
        let positive = voltage.minus(&drop)?;
        Ok((negative, positive))
    }
}

impl SubModel for AveragedElectrodeOhm {
    fn name(&self) -> &'static str {
        "x-averaged electrode ohm"
    }

    fn provides(&self) -> Vec<String> {
        vec![
            names::CELL_VOLTAGE.to_owned(),
            Electrode::Negative.name(quantities::POTENTIAL),
            Electrode::Positive.name(quantities::POTENTIAL),
        ]
    }

    fn requires(&self) -> Vec<String> {
        vec![
            Electrode::Negative.averaged(quantities::SURFACE_POTENTIAL_DIFFERENCE),
            Electrode::Positive.averaged(quantities::SURFACE_POTENTIAL_DIFFERENCE),
            names::ELECTROLYTE_OVERPOTENTIAL.to_owned(),
            names::ELECTROLYTE_OHMIC_LOSSES.to_owned(),
        ]
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let current = vars.get(names::CURRENT)?;
        let delta_phi = |k: Electrode| vars.get(&k.averaged(quantities::SURFACE_POTENTIAL_DIFFERENCE));
        let mut voltage = delta_phi(Electrode::Positive)?
            .minus(&delta_phi(Electrode::Negative)?)?
            .plus(&vars.get(names::ELECTROLYTE_OVERPOTENTIAL)?)?
            .plus(&vars.get(names::ELECTROLYTE_OHMIC_LOSSES)?)?;
        if self.composite {
            voltage = voltage.plus(&Self::solid_losses(&current)?)?;
        }
        let (negative, positive) = self.profiles(&current, &voltage)?;
        for (k, profile) in [(Electrode::Negative, negative), (Electrode::Positive, positive)] {
            vars.insert(k.averaged(quantities::POTENTIAL), x_average(&profile, &k.thickness())?);
            vars.insert(k.name(quantities::POTENTIAL), profile);
        }
        vars.insert(names::CELL_VOLTAGE, voltage);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        for k in Electrode::BOTH {
            for name in [k.name(quantities::POTENTIAL), k.averaged(quantities::POTENTIAL)] {
                builder.variable(&name, vars.get(&name)?);
            }
        }
        Ok(())
    }
}
