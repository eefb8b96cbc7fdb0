//! The sub-model library.
//!
//! Each family picks its sub-models from these through a dispatch table in
//! [`crate::build`].

pub mod active_material;
pub mod collector;
pub mod conductivity;
pub mod convection;
pub mod current;
pub mod electrode_ohm;
pub mod electrolyte;
pub mod interfacial;
pub mod kinetics;
pub mod mechanics;
pub mod particle;
pub mod plating;
pub mod porosity;
pub mod sei;
pub mod thermal;

use voltaic_core::{Domain, ExprError, SubDomain, Symbol};

use crate::{
    Electrode,
    parameters::{electrode, names},
};

/// The chemistry an electrode-level sub-model is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chemistry {
    LithiumIon,
    LeadAcid,
}

/// Places a scalar onto `sub`; other symbols pass through.
pub(crate) fn on(sub: SubDomain, symbol: Symbol) -> Result<Symbol, ExprError> {
    if symbol.domain().is_scalar() {
        symbol.broadcast(Domain::single(sub))
    } else {
        Ok(symbol)
    }
}

/// Joins negative, separator and positive parts into a through-cell symbol.
pub(crate) fn through_cell(
    negative: Symbol,
    separator: Symbol,
    positive: Symbol,
) -> Result<Symbol, ExprError> {
    Symbol::concatenate(vec![
        on(SubDomain::NegativeElectrode, negative)?,
        on(SubDomain::Separator, separator)?,
        on(SubDomain::PositiveElectrode, positive)?,
    ])
}

/// Average over the primary domain of `symbol`, which spans `thickness`.
pub(crate) fn x_average(symbol: &Symbol, thickness: &Symbol) -> Result<Symbol, ExprError> {
    if symbol.domain().is_scalar() {
        return Ok(symbol.clone());
    }
    symbol.integral()?.over(thickness)
}

/// Total thickness of the cell.
pub(crate) fn cell_thickness() -> Result<Symbol, ExprError> {
    Electrode::Negative
        .thickness()
        .plus(&Symbol::parameter(names::SEPARATOR_THICKNESS))?
        .plus(&Electrode::Positive.thickness())
}

/// Effective transport coefficient `porosity ^ b`.
pub(crate) fn tortuosity(porosity: &Symbol) -> Result<Symbol, ExprError> {
    porosity.pow(&Symbol::parameter(names::BRUGGEMAN))
}

/// Open-circuit potential at the state of charge `argument` before any
/// temperature correction.
pub(crate) fn reference_ocp(k: Electrode, argument: Symbol) -> Result<Symbol, ExprError> {
    Symbol::function_parameter(&k.name(electrode::OCP), vec![argument])
}

/// Open-circuit potential with its linear temperature correction.
pub(crate) fn ocp(k: Electrode, argument: Symbol, temperature: &Symbol) -> Result<Symbol, ExprError> {
    let entropic = Symbol::function_parameter(&k.name(electrode::ENTROPIC_CHANGE), vec![
        argument.clone(),
    ])?;
    reference_ocp(k, argument)?.plus(&(temperature.clone() - 1.0).times(&entropic)?)
}

/// The argument of an electrode's open-circuit potential at rest.
pub(crate) fn initial_argument(chemistry: Chemistry, k: Electrode) -> Symbol {
    match chemistry {
        Chemistry::LithiumIon => k.parameter(electrode::INITIAL_CONCENTRATION),
        Chemistry::LeadAcid => Symbol::parameter(names::INITIAL_ELECTROLYTE),
    }
}

/// Open-circuit potential of an electrode at rest.
pub(crate) fn initial_ocp(chemistry: Chemistry, k: Electrode) -> Result<Symbol, ExprError> {
    reference_ocp(k, initial_argument(chemistry, k))
}

/// Open-circuit voltage of the cell at rest.
pub(crate) fn initial_voltage(chemistry: Chemistry) -> Result<Symbol, ExprError> {
    initial_ocp(chemistry, Electrode::Positive)?.minus(&initial_ocp(chemistry, Electrode::Negative)?)
}

/// Converts a dimensionless potential to volts.
pub(crate) fn volts(potential: &Symbol) -> Result<Symbol, ExprError> {
    potential.times(&Symbol::parameter(names::THERMAL_VOLTAGE))
}

/// Discharge flux `±i / (a l)` carried by an electrode's interface.
pub(crate) fn averaged_flux(
    k: Electrode,
    current: &Symbol,
    area: &Symbol,
) -> Result<Symbol, ExprError> {
    let flux = current.over(&area.times(&k.thickness())?)?;
    Ok(k.sign() * flux)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use voltaic_core::{Bindings, Value, Variable};

    use super::*;

    #[test]
    fn through_cell_broadcasts_scalars() {
        let c = through_cell(
            Symbol::constant(1.0),
            Symbol::constant(2.0),
            Symbol::constant(3.0),
        )
        .unwrap();
        assert_eq!(c.domain(), &Domain::through_cell());
    }

    #[test]
    fn temperature_correction_is_linear() {
        let t = Variable::new("T", Domain::scalar());
        let u = ocp(Electrode::Negative, Symbol::constant(0.5), &t.symbol()).unwrap();
        let mut values = crate::parameters::lithium_ion();
        values.insert(&Electrode::Negative.name(electrode::ENTROPIC_CHANGE), 2.0);
        let u = values.process_symbol(&u).unwrap();

        let at = |temperature: f64| {
            let bindings = Bindings::new().with_variable("T", Value::Scalar(temperature));
            u.evaluate(&bindings).unwrap().as_scalar().unwrap()
        };
        let (hot, reference) = (at(1.5), at(1.0));
        assert_relative_eq!(hot - reference, 1.0, epsilon = 1e-12);
    }
}
