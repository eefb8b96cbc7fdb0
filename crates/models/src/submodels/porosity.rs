use voltaic_core::{Domain, ModelBuilder, SubDomain, Symbol, Variable};

use crate::{
    BuildError, Electrode, Scope, SubModel, Variables,
    parameters::{electrode, names as parameter_names},
    variables::{names, quantities},
};

use super::{on, through_cell, x_average};

/// How the electrolyte volume fraction evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PorosityModel {
    Constant,
    /// SEI growth fills the negative electrode's pores.
    SeiDriven,
    /// The lead-acid reactions change the solid volume in both electrodes.
    LeadAcid,
}

#[derive(Debug, Clone, Copy)]
pub struct Porosity {
    model: PorosityModel,
    scope: Scope,
}

impl Porosity {
    #[must_use]
    pub fn new(model: PorosityModel, scope: Scope) -> Self {
        Self { model, scope }
    }

    /// The negative electrode's porosity when SEI fills it.
    fn negative(&self) -> Variable {
        Variable::new(
            &self.scope.name(Electrode::Negative, quantities::POROSITY),
            self.scope.domain(Electrode::Negative),
        )
    }

    fn whole_cell(&self) -> Variable {
        Variable::new(names::POROSITY, Domain::through_cell())
    }

    fn separator() -> Symbol {
        Symbol::parameter(parameter_names::SEPARATOR_POROSITY)
    }

    fn initial(k: Electrode) -> Symbol {
        k.parameter(electrode::POROSITY)
    }

    fn initial_profile() -> Result<Symbol, BuildError> {
        Ok(through_cell(
            Self::initial(Electrode::Negative),
            Self::separator(),
            Self::initial(Electrode::Positive),
        )?)
    }

    /// Publishes the through-cell porosity and its per-electrode parts.
    fn publish(
        &self,
        vars: &mut Variables,
        negative: Symbol,
        positive: Symbol,
    ) -> Result<(), BuildError> {
        let mut whole = through_cell(negative.clone(), Self::separator(), positive.clone())?;
        if self.model == PorosityModel::LeadAcid {
            whole = self.whole_cell().symbol();
        }
        for (k, part) in [(Electrode::Negative, negative), (Electrode::Positive, positive)] {
            vars.insert(k.averaged(quantities::POROSITY), x_average(&part, &k.thickness())?);
            vars.insert(k.name(quantities::POROSITY), on(k.sub_domain(), part)?);
        }
        vars.insert(names::POROSITY, whole);
        Ok(())
    }
}

impl SubModel for Porosity {
    fn name(&self) -> &'static str {
        "porosity"
    }

    fn provides(&self) -> Vec<String> {
        match self.model {
            PorosityModel::Constant => Vec::new(),
            PorosityModel::SeiDriven | PorosityModel::LeadAcid => {
                vec![names::POROSITY_CHANGE.to_owned()]
            }
        }
    }

    fn requires(&self) -> Vec<String> {
        match self.model {
            PorosityModel::Constant => Vec::new(),
            PorosityModel::SeiDriven => {
                vec![self.scope.name(Electrode::Negative, quantities::SEI_GROWTH)]
            }
            PorosityModel::LeadAcid => Electrode::BOTH
                .iter()
                .map(|k| k.name(quantities::INTERFACIAL_CURRENT))
                .collect(),
        }
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        match self.model {
            PorosityModel::Constant => {
                let (negative, positive) = (
                    Self::initial(Electrode::Negative),
                    Self::initial(Electrode::Positive),
                );
                self.publish(vars, negative, positive)?;
                vars.insert(names::POROSITY_CHANGE, Symbol::constant(0.0));
            }
            PorosityModel::SeiDriven => {
                let negative = self.negative().symbol();
                self.publish(vars, negative, Self::initial(Electrode::Positive))?;
            }
            PorosityModel::LeadAcid => {
                let whole = self.whole_cell().symbol();
                let negative = whole.restrict(&[SubDomain::NegativeElectrode])?;
                let positive = whole.restrict(&[SubDomain::PositiveElectrode])?;
                self.publish(vars, negative, positive)?;
            }
        }
        Ok(())
    }

    fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
        let change = match self.model {
            PorosityModel::Constant => return Ok(()),
            PorosityModel::SeiDriven => {
                let growth = vars.get(&self.scope.name(Electrode::Negative, quantities::SEI_GROWTH))?;
                let rate = -Symbol::parameter(parameter_names::SEI_POROSITY).times(&growth)?;
                vars.insert(
                    self.scope.name(Electrode::Negative, quantities::POROSITY_CHANGE),
                    rate.clone(),
                );
                through_cell(rate, Symbol::constant(0.0), Symbol::constant(0.0))?
            }
            PorosityModel::LeadAcid => {
                let rate = |k: Electrode| -> Result<Symbol, BuildError> {
                    let area = vars.get(&k.name(quantities::SURFACE_AREA))?;
                    let current = vars.get(&k.name(quantities::INTERFACIAL_CURRENT))?;
                    Ok(-k
                        .parameter(electrode::VOLUME_CHANGE)
                        .times(&area)?
                        .times(&current)?)
                };
                let negative = rate(Electrode::Negative)?;
                let positive = rate(Electrode::Positive)?;
                vars.insert(Electrode::Negative.name(quantities::POROSITY_CHANGE), negative.clone());
                vars.insert(Electrode::Positive.name(quantities::POROSITY_CHANGE), positive.clone());
                through_cell(negative, Symbol::constant(0.0), positive)?
            }
        };
        vars.insert(names::POROSITY_CHANGE, change);
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        match self.model {
            PorosityModel::Constant => {}
            PorosityModel::SeiDriven => {
                let negative = self.negative();
                let rate = vars.get(&self.scope.name(Electrode::Negative, quantities::POROSITY_CHANGE))?;
                builder
                    .rhs(&negative, rate)?
                    .initial_condition(&negative, Self::initial(Electrode::Negative));
            }
            PorosityModel::LeadAcid => {
                let whole = self.whole_cell();
                builder
                    .rhs(&whole, vars.get(names::POROSITY_CHANGE)?)?
                    .initial_condition(&whole, Self::initial_profile()?);
            }
        }
        builder.variable(names::POROSITY, vars.get(names::POROSITY)?);
        for k in Electrode::BOTH {
            let name = k.averaged(quantities::POROSITY);
            builder.variable(&name, vars.get(&name)?);
        }
        Ok(())
    }
}
