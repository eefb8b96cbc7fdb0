//! Default dimensionless parameter sets.
//!
//! Potentials are scaled by the thermal voltage, time by the discharge
//! timescale, concentrations by their maximum values and lengths by the
//! cell thickness.

use voltaic_core::{ExprError, ParameterValues, Symbol};

use crate::{Electrode, Family};

/// Thermal voltage at the reference temperature, in volts.
pub const THERMAL_VOLTAGE: f64 = 0.025_693;

/// Discharge timescale of the default sets, in seconds.
pub const DISCHARGE_TIMESCALE: f64 = 3600.0;

/// Names of parameters shared across electrodes.
pub mod names {
    pub const CURRENT: &str = "Current function";
    pub const THERMAL_VOLTAGE: &str = "Thermal voltage [V]";
    pub const TIMESCALE: &str = "Discharge timescale [s]";
    pub const SEPARATOR_THICKNESS: &str = "Separator thickness";
    pub const SEPARATOR_POROSITY: &str = "Separator porosity";
    pub const ELECTRODE_HEIGHT: &str = "Electrode height";
    pub const ELECTRODE_WIDTH: &str = "Electrode width";
    pub const ELECTROLYTE_TIMESCALE: &str = "Electrolyte diffusion timescale";
    pub const ELECTROLYTE_CAPACITY: &str = "Electrolyte capacity ratio";
    pub const TRANSFERENCE: &str = "Cation transference number";
    pub const BRUGGEMAN: &str = "Bruggeman coefficient";
    pub const ELECTROLYTE_CONDUCTIVITY: &str = "Electrolyte conductivity";
    pub const INITIAL_ELECTROLYTE: &str = "Initial concentration in electrolyte";
    pub const LOWER_CUTOFF: &str = "Lower voltage cut-off";
    pub const UPPER_CUTOFF: &str = "Upper voltage cut-off";
    pub const AMBIENT_TEMPERATURE: &str = "Ambient temperature";
    pub const INITIAL_TEMPERATURE: &str = "Initial temperature";
    pub const HEAT_CAPACITY: &str = "Cell heat capacity";
    pub const THERMAL_CONDUCTIVITY: &str = "Thermal conductivity";
    pub const HEAT_TRANSFER: &str = "Heat transfer coefficient";
    pub const EDGE_HEAT_TRANSFER: &str = "Edge heat transfer coefficient";
    pub const HEATING: &str = "Heating coefficient";
    pub const CELL_RESISTANCE: &str = "Effective cell resistance";
    pub const INITIAL_SEI_THICKNESS: &str = "Initial SEI thickness";
    pub const SEI_REACTION_RATE: &str = "SEI reaction rate";
    pub const SEI_OCP: &str = "SEI open-circuit potential";
    pub const SEI_GROWTH: &str = "SEI growth coefficient";
    pub const SEI_RESISTIVITY: &str = "SEI resistivity";
    pub const SEI_SOLVENT_DIFFUSIVITY: &str = "SEI solvent diffusivity";
    pub const SEI_ELECTRON_CONDUCTIVITY: &str = "SEI electron conductivity";
    pub const SEI_INTERSTITIAL_DIFFUSIVITY: &str = "SEI interstitial diffusivity";
    pub const EC_DIFFUSIVITY: &str = "EC diffusivity";
    pub const SEI_POROSITY: &str = "SEI porosity coefficient";
    pub const PLATING_RATE: &str = "Lithium plating rate";
    pub const STRIPPING_RATE: &str = "Lithium stripping rate";
    pub const PLATED_CAPACITY: &str = "Plated lithium capacity ratio";
    pub const PARIS_EXPONENT: &str = "Paris law exponent";
    pub const LAM_EXPONENT: &str = "LAM stress exponent";
    pub const PRESSURE_COEFFICIENT: &str = "Electrolyte velocity coefficient";
}

/// Per-electrode quantities, prefixed with `Negative` or `Positive`.
pub mod electrode {
    pub const THICKNESS: &str = "electrode thickness";
    pub const CONDUCTIVITY: &str = "electrode conductivity";
    pub const POROSITY: &str = "electrode porosity";
    pub const PARTICLE_TIMESCALE: &str = "particle diffusion timescale";
    pub const CAPACITY: &str = "electrode capacity ratio";
    pub const REACTION_RATE: &str = "electrode reaction rate";
    pub const SURFACE_AREA: &str = "electrode surface area to volume ratio";
    pub const DOUBLE_LAYER: &str = "electrode double-layer capacity";
    pub const OCP: &str = "electrode OCP";
    pub const ENTROPIC_CHANGE: &str = "electrode OCP entropic change";
    pub const INITIAL_CONCENTRATION: &str = "electrode initial concentration";
    pub const STRESS: &str = "particle stress coefficient";
    pub const CRACK_GROWTH: &str = "electrode crack growth rate";
    pub const CRACK_AREA: &str = "electrode crack area factor";
    pub const LAM_RATE: &str = "electrode LAM rate";
    pub const COLLECTOR_CONDUCTIVITY: &str = "current collector conductivity";
    pub const VOLUME_CHANGE: &str = "electrode volume change";
    pub const ELECTROLYTE_SOURCE: &str = "electrode electrolyte source";
    pub const VELOCITY_SOURCE: &str = "electrode velocity source";
}

/// The default parameter set for a family.
#[must_use]
pub fn for_family(family: Family) -> ParameterValues {
    if family.is_lithium_ion() {
        lithium_ion()
    } else {
        lead_acid()
    }
}

/// A graphite / lithium cobalt oxide cell.
#[must_use]
pub fn lithium_ion() -> ParameterValues {
    let mut values = ParameterValues::new();
    shared(&mut values);
    values
        .insert(&Electrode::Negative.name(electrode::THICKNESS), 100.0 / 225.0)
        .insert(names::SEPARATOR_THICKNESS, 25.0 / 225.0)
        .insert(&Electrode::Positive.name(electrode::THICKNESS), 100.0 / 225.0)
        .insert(names::SEPARATOR_POROSITY, 1.0)
        .insert(names::ELECTROLYTE_TIMESCALE, 0.2)
        .insert(names::ELECTROLYTE_CAPACITY, 2.0)
        .insert(names::TRANSFERENCE, 0.4)
        .insert(names::ELECTROLYTE_CONDUCTIVITY, 2.0)
        .insert(names::LOWER_CUTOFF, 3.105 / THERMAL_VOLTAGE)
        .insert(names::UPPER_CUTOFF, 4.2 / THERMAL_VOLTAGE)
        .insert(names::INITIAL_SEI_THICKNESS, 1.0)
        .insert(names::SEI_REACTION_RATE, 1e-5)
        .insert(names::SEI_OCP, 0.4 / THERMAL_VOLTAGE)
        .insert(names::SEI_GROWTH, 1.0)
        .insert(names::SEI_RESISTIVITY, 0.01)
        .insert(names::SEI_SOLVENT_DIFFUSIVITY, 1e-4)
        .insert(names::SEI_ELECTRON_CONDUCTIVITY, 1e-6)
        .insert(names::SEI_INTERSTITIAL_DIFFUSIVITY, 1e-3)
        .insert(names::EC_DIFFUSIVITY, 1.0)
        .insert(names::SEI_POROSITY, 0.01)
        .insert(names::PLATING_RATE, 1e-5)
        .insert(names::STRIPPING_RATE, 1e-5)
        .insert(names::PLATED_CAPACITY, 1.0)
        .insert(names::PARIS_EXPONENT, 2.2)
        .insert(names::LAM_EXPONENT, 2.0);

    let electrodes = [
        (Electrode::Negative, 100.0, 3.75, 0.8),
        (Electrode::Positive, 10.0, 9.0, 0.6),
    ];
    for (k, conductivity, capacity, initial) in electrodes {
        values
            .insert(&k.name(electrode::CONDUCTIVITY), conductivity)
            .insert(&k.name(electrode::POROSITY), 0.3)
            .insert(&k.name(electrode::PARTICLE_TIMESCALE), 0.1)
            .insert(&k.name(electrode::CAPACITY), capacity)
            .insert(&k.name(electrode::REACTION_RATE), 1.0)
            .insert(&k.name(electrode::SURFACE_AREA), 3.0)
            .insert(&k.name(electrode::DOUBLE_LAYER), 0.1)
            .insert(&k.name(electrode::INITIAL_CONCENTRATION), initial)
            .insert(&k.name(electrode::STRESS), 1.0)
            .insert(&k.name(electrode::CRACK_GROWTH), 1e-3)
            .insert(&k.name(electrode::CRACK_AREA), 0.01)
            .insert(&k.name(electrode::LAM_RATE), 1e-3)
            .insert(&k.name(electrode::COLLECTOR_CONDUCTIVITY), 100.0);
    }

    values
        .insert_function(&Electrode::Negative.name(electrode::OCP), |args| {
            graphite_ocp(single(args, "graphite OCP")?)
        })
        .insert_function(&Electrode::Positive.name(electrode::OCP), |args| {
            lico2_ocp(single(args, "LiCoO2 OCP")?)
        })
        .insert_function(&Electrode::Negative.name(electrode::ENTROPIC_CHANGE), |args| {
            let sto = single(args, "graphite entropic change")?;
            Ok(0.3 - 0.6 * sto.clone())
        })
        .insert_function(&Electrode::Positive.name(electrode::ENTROPIC_CHANGE), |args| {
            let sto = single(args, "LiCoO2 entropic change")?;
            Ok(-0.4 + 0.2 * sto.clone())
        });
    values
}

/// A lead-acid cell, with acid concentration as the only state of charge.
#[must_use]
pub fn lead_acid() -> ParameterValues {
    let mut values = ParameterValues::new();
    shared(&mut values);
    values
        .insert(&Electrode::Negative.name(electrode::THICKNESS), 0.9 / 1.8)
        .insert(names::SEPARATOR_THICKNESS, 0.2 / 1.8)
        .insert(&Electrode::Positive.name(electrode::THICKNESS), 0.7 / 1.8)
        .insert(names::SEPARATOR_POROSITY, 0.92)
        .insert(names::ELECTROLYTE_TIMESCALE, 0.5)
        .insert(names::ELECTROLYTE_CAPACITY, 1.0)
        .insert(names::TRANSFERENCE, 0.72)
        .insert(names::ELECTROLYTE_CONDUCTIVITY, 5.0)
        .insert(names::LOWER_CUTOFF, 1.75 / THERMAL_VOLTAGE)
        .insert(names::UPPER_CUTOFF, 2.42 / THERMAL_VOLTAGE)
        .insert(names::PRESSURE_COEFFICIENT, 1.0);

    let electrodes = [
        (Electrode::Negative, 0.53, 0.08, -1.0, 0.05),
        (Electrode::Positive, 0.57, -0.08, 1.0, -0.05),
    ];
    for (k, porosity, volume_change, source, velocity) in electrodes {
        values
            .insert(&k.name(electrode::CONDUCTIVITY), 100.0)
            .insert(&k.name(electrode::POROSITY), porosity)
            .insert(&k.name(electrode::SURFACE_AREA), 1.0)
            .insert(&k.name(electrode::REACTION_RATE), 1.0)
            .insert(&k.name(electrode::DOUBLE_LAYER), 0.1)
            .insert(&k.name(electrode::VOLUME_CHANGE), volume_change)
            .insert(&k.name(electrode::ELECTROLYTE_SOURCE), source)
            .insert(&k.name(electrode::VELOCITY_SOURCE), velocity)
            .insert(&k.name(electrode::ENTROPIC_CHANGE), 0.0)
            .insert(&k.name(electrode::COLLECTOR_CONDUCTIVITY), 100.0);
    }

    values
        .insert_function(&Electrode::Negative.name(electrode::OCP), |args| {
            let c = single(args, "lead OCP")?;
            Ok((-0.295 - 0.074 * log10(&(5.65 * c.clone()))) / THERMAL_VOLTAGE)
        })
        .insert_function(&Electrode::Positive.name(electrode::OCP), |args| {
            let c = single(args, "lead dioxide OCP")?;
            Ok((1.628 + 0.074 * log10(&(5.65 * c.clone()))) / THERMAL_VOLTAGE)
        });
    values
}

fn shared(values: &mut ParameterValues) {
    values
        .insert(names::CURRENT, 1.0)
        .insert(names::THERMAL_VOLTAGE, THERMAL_VOLTAGE)
        .insert(names::TIMESCALE, DISCHARGE_TIMESCALE)
        .insert(names::ELECTRODE_HEIGHT, 1.0)
        .insert(names::ELECTRODE_WIDTH, 1.0)
        .insert(names::BRUGGEMAN, 1.5)
        .insert(names::INITIAL_ELECTROLYTE, 1.0)
        .insert(names::AMBIENT_TEMPERATURE, 1.0)
        .insert(names::INITIAL_TEMPERATURE, 1.0)
        .insert(names::HEAT_CAPACITY, 1.0)
        .insert(names::THERMAL_CONDUCTIVITY, 1.0)
        .insert(names::HEAT_TRANSFER, 1.0)
        .insert(names::EDGE_HEAT_TRANSFER, 0.1)
        .insert(names::HEATING, 5e-4)
        .insert(names::CELL_RESISTANCE, 1.0);
}

fn single<'a>(args: &'a [Symbol], name: &str) -> Result<&'a Symbol, ExprError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(ExprError::InvalidParameter {
            name: name.to_owned(),
            reason: format!("takes one argument, got {}", args.len()),
        }),
    }
}

fn log10(x: &Symbol) -> Symbol {
    x.log() / std::f64::consts::LN_10
}

fn sum(terms: impl IntoIterator<Item = Symbol>) -> Result<Symbol, ExprError> {
    terms
        .into_iter()
        .try_fold(Symbol::constant(0.0), |acc, term| acc.plus(&term))
}

/// Graphite open-circuit potential over stoichiometry.
fn graphite_ocp(sto: &Symbol) -> Result<Symbol, ExprError> {
    let step = |centre: f64, width: f64| ((sto.clone() - centre) / width).tanh();
    let u = sum([
        0.194 + 1.5 * (-120.0 * sto.clone()).exp(),
        0.0351 * step(0.286, 0.083),
        -0.0045 * step(0.849, 0.119),
        -0.035 * step(0.9233, 0.05),
        -0.0147 * step(0.5, 0.034),
        -0.102 * step(0.194, 0.142),
        -0.022 * step(0.9, 0.0164),
        -0.011 * step(0.124, 0.0226),
        0.0155 * step(0.105, 0.029),
    ])?;
    Ok(u / THERMAL_VOLTAGE)
}

/// Lithium cobalt oxide open-circuit potential over stoichiometry.
fn lico2_ocp(sto: &Symbol) -> Result<Symbol, ExprError> {
    let sto = sto.clone() * 1.062;
    let ramp = |offset: f64, slope: f64| (offset - slope * sto.clone()).tanh();
    let u = sum([
        Symbol::constant(2.16216),
        0.07645 * ramp(30.834, 54.4806),
        2.1581 * ramp(52.294, 50.294),
        -0.14169 * ramp(11.0923, 19.8543),
        0.2051 * ramp(1.4684, 5.4888),
        0.2531 * ((0.56478 - sto.clone()) / 0.1316).tanh(),
        -0.02167 * ((sto.clone() - 0.525) / 0.006).tanh(),
    ])?;
    Ok(u / THERMAL_VOLTAGE)
}
