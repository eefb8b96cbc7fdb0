use std::collections::BTreeMap;

use voltaic_core::{ModelError, Symbol};

/// Names of cell-wide coupling variables.
pub mod names {
    pub const CURRENT: &str = "Current density";
    pub const CELL_TEMPERATURE: &str = "Cell temperature";
    pub const AVERAGE_TEMPERATURE: &str = "X-averaged cell temperature";
    pub const ELECTROLYTE_CONCENTRATION: &str = "Electrolyte concentration";
    pub const SEPARATOR_ELECTROLYTE_CONCENTRATION: &str = "Separator electrolyte concentration";
    pub const ELECTROLYTE_POTENTIAL: &str = "Electrolyte potential";
    pub const ELECTROLYTE_CURRENT: &str = "Electrolyte current density";
    pub const ELECTROLYTE_OVERPOTENTIAL: &str = "X-averaged electrolyte overpotential";
    pub const ELECTROLYTE_OHMIC_LOSSES: &str = "X-averaged electrolyte ohmic losses";
    pub const POROSITY: &str = "Porosity";
    pub const POROSITY_CHANGE: &str = "Porosity change";
    pub const CELL_VOLTAGE: &str = "Cell voltage";
    pub const TERMINAL_VOLTAGE: &str = "Terminal voltage";
    pub const VELOCITY: &str = "Volume-averaged velocity";
    pub const PRESSURE: &str = "Pressure";
}

/// Per-electrode coupling quantities, named through
/// [`Electrode::name`](crate::Electrode::name) or
/// [`Scope::name`](crate::Scope::name).
pub mod quantities {
    pub const PARTICLE_CONCENTRATION: &str = "particle concentration";
    pub const SURFACE_CONCENTRATION: &str = "particle surface concentration";
    pub const AVERAGE_CONCENTRATION: &str = "particle average concentration";
    pub const SURFACE_CONCENTRATION_STATE: &str = "particle surface concentration state";
    pub const PROFILE_STATE: &str = "particle concentration gradient";
    pub const TEMPERATURE: &str = "electrode temperature";
    pub const ELECTROLYTE_CONCENTRATION: &str = "electrolyte concentration";
    pub const ELECTROLYTE_POTENTIAL: &str = "electrolyte potential";
    pub const POTENTIAL: &str = "electrode potential";
    pub const POROSITY: &str = "electrode porosity";
    pub const POROSITY_CHANGE: &str = "electrode porosity change";
    pub const SURFACE_AREA: &str = "electrode surface area to volume ratio";
    pub const SURFACE_POTENTIAL_DIFFERENCE: &str = "electrode surface potential difference";
    pub const OCP: &str = "electrode open-circuit potential";
    pub const ENTROPIC_CHANGE: &str = "electrode entropic change";
    pub const OVERPOTENTIAL: &str = "electrode reaction overpotential";
    pub const EXCHANGE_CURRENT: &str = "electrode exchange current density";
    pub const INTERFACIAL_CURRENT: &str = "electrode interfacial current density";
    pub const TOTAL_CURRENT: &str = "electrode total interfacial current density";
    pub const SEI_CURRENT: &str = "electrode SEI interfacial current density";
    pub const SEI_THICKNESS: &str = "electrode SEI thickness";
    pub const SEI_GROWTH: &str = "electrode SEI growth rate";
    pub const FILM_OVERPOTENTIAL: &str = "electrode SEI film overpotential";
    pub const PLATED_LITHIUM: &str = "electrode plated lithium concentration";
    pub const PLATING_CURRENT: &str = "electrode lithium plating interfacial current density";
    pub const STRESS: &str = "particle surface tangential stress";
    pub const CRACK_LENGTH: &str = "particle crack length";
    pub const CRACK_ENHANCEMENT: &str = "particle crack area enhancement";
    pub const ACTIVE_MATERIAL: &str = "electrode active material volume fraction";
}

/// Coupling variables shared between sub-models while a model is assembled.
///
/// Lookups report the sub-model currently being asked, so a missing
/// coupling names who needed it.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    symbols: BTreeMap<String, Symbol>,
    current: String,
}

impl Variables {
    pub(crate) fn enter(&mut self, submodel: &str) {
        submodel.clone_into(&mut self.current);
    }

    /// Publishes a coupling variable, replacing any earlier value.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.symbols.insert(name.into(), symbol);
    }

    /// Returns a coupling variable.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingCoupling`] if no sub-model provided it.
    pub fn get(&self, name: &str) -> Result<Symbol, ModelError> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::MissingCoupling {
                name: name.to_owned(),
                submodel: self.current.clone(),
            })
    }

    /// Returns a coupling variable if present.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(name, symbol)| (name.as_str(), symbol))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
