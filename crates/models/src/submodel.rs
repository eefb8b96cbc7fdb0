//! The sub-model trait and the three-phase assembly of a model.

use std::collections::BTreeMap;

use log::debug;
use voltaic_core::{CouplingGraph, Model, ModelBuilder, ModelError};

use crate::{BuildError, Options, Variables};

/// One physical process contributing states and equations to a model.
///
/// Assembly runs the phases in order across all sub-models:
///
/// 1. [`fundamental`](SubModel::fundamental) in list order, declaring each
///    sub-model's own states and the symbols derived only from them,
/// 2. [`coupled`](SubModel::coupled) in dependency order, deriving symbols
///    from other sub-models' coupling variables,
/// 3. [`equations`](SubModel::equations) in list order, with every
///    coupling variable available.
pub trait SubModel {
    fn name(&self) -> &'static str;

    /// Coupling variables published by [`SubModel::coupled`].
    fn provides(&self) -> Vec<String> {
        Vec::new()
    }

    /// Coupling variables read by [`SubModel::coupled`].
    fn requires(&self) -> Vec<String> {
        Vec::new()
    }

    /// Declares states and the symbols derived only from them.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the option combination is unsupported or
    /// a symbol cannot be composed.
    fn fundamental(&self, _vars: &mut Variables) -> Result<(), BuildError> {
        Ok(())
    }

    /// Derives symbols from other sub-models' coupling variables.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if a coupling variable is missing or a
    /// symbol cannot be composed.
    fn coupled(&self, _vars: &mut Variables) -> Result<(), BuildError> {
        Ok(())
    }

    /// Adds equations, conditions, outputs and events.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if a coupling variable is missing or an
    /// equation is given twice.
    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError>;
}

/// Assembles sub-models into a model.
///
/// # Errors
///
/// Returns [`ModelError::CircularDependency`] if the coupled phases form a
/// cycle, [`ModelError::MissingCoupling`] if a required variable has no
/// provider, and any error raised by a sub-model.
pub fn assemble(
    name: &str,
    options: &Options,
    submodels: &[Box<dyn SubModel>],
) -> Result<Model, BuildError> {
    let mut vars = Variables::default();
    for submodel in submodels {
        vars.enter(submodel.name());
        submodel.fundamental(&mut vars)?;
    }

    let mut providers = BTreeMap::new();
    for submodel in submodels {
        for variable in submodel.provides() {
            providers.insert(variable, submodel.name());
        }
    }

    let mut graph = CouplingGraph::new();
    for submodel in submodels {
        graph.add_submodel(submodel.name());
    }
    for submodel in submodels {
        for variable in submodel.requires() {
            match providers.get(&variable) {
                Some(provider) => graph.connect(provider, submodel.name(), &variable),
                None if vars.contains(&variable) => {}
                None => {
                    return Err(ModelError::MissingCoupling {
                        name: variable,
                        submodel: submodel.name().to_owned(),
                    }
                    .into());
                }
            }
        }
    }

    let order = graph.call_order()?;
    debug!("`{name}` coupled phase order: {}", order.join(" -> "));
    for submodel_name in order {
        for submodel in submodels.iter().filter(|s| s.name() == submodel_name) {
            vars.enter(submodel.name());
            submodel.coupled(&mut vars)?;
        }
    }

    let mut builder = ModelBuilder::new(name);
    for submodel in submodels {
        vars.enter(submodel.name());
        submodel.equations(&vars, &mut builder)?;
    }
    for (option, value) in options.summary() {
        builder.option(option, &value);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use voltaic_core::{Domain, Symbol, Variable};

    use super::*;
    use crate::Family;

    /// A scalar decay `du/dt = -k u`, where `k` comes from another sub-model.
    struct Decay;

    impl SubModel for Decay {
        fn name(&self) -> &'static str {
            "decay"
        }

        fn requires(&self) -> Vec<String> {
            vec!["rate".to_owned()]
        }

        fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
            vars.insert("u", Variable::new("u", Domain::scalar()).symbol());
            Ok(())
        }

        fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
            let flux = vars.get("rate")?.times(&vars.get("u")?)?;
            vars.insert("flux", flux);
            Ok(())
        }

        fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
            let u = Variable::new("u", Domain::scalar());
            builder
                .rhs(&u, -vars.get("flux")?)?
                .initial_condition(&u, Symbol::constant(1.0));
            Ok(())
        }
    }

    /// Publishes `rate`, optionally reading `flux` back.
    struct Rate {
        circular: bool,
    }

    impl SubModel for Rate {
        fn name(&self) -> &'static str {
            "rate"
        }

        fn provides(&self) -> Vec<String> {
            vec!["rate".to_owned()]
        }

        fn requires(&self) -> Vec<String> {
            if self.circular {
                vec!["flux".to_owned()]
            } else {
                Vec::new()
            }
        }

        fn coupled(&self, vars: &mut Variables) -> Result<(), BuildError> {
            vars.insert("rate", Symbol::constant(2.0));
            Ok(())
        }

        fn equations(&self, _: &Variables, _: &mut ModelBuilder) -> Result<(), BuildError> {
            Ok(())
        }
    }

    /// Declares `flux` as provided so the cycle is visible.
    struct FluxProvider;

    impl SubModel for FluxProvider {
        fn name(&self) -> &'static str {
            "flux"
        }

        fn provides(&self) -> Vec<String> {
            vec!["flux".to_owned()]
        }

        fn requires(&self) -> Vec<String> {
            vec!["rate".to_owned()]
        }

        fn equations(&self, _: &Variables, _: &mut ModelBuilder) -> Result<(), BuildError> {
            Ok(())
        }
    }

    #[test]
    fn coupled_phase_runs_providers_first() {
        // Listed consumer-first on purpose.
        let submodels: Vec<Box<dyn SubModel>> =
            vec![Box::new(Decay), Box::new(Rate { circular: false })];
        let model = assemble("decay", &Options::new(Family::Dfn), &submodels).unwrap();
        assert_eq!(model.rhs().len(), 1);
        assert!(model.check_well_posedness().is_ok());
        assert_eq!(model.options()["thermal"], "isothermal");
    }

    #[test]
    fn circular_coupling_is_rejected() {
        let submodels: Vec<Box<dyn SubModel>> =
            vec![Box::new(FluxProvider), Box::new(Rate { circular: true })];
        let err = assemble("cycle", &Options::new(Family::Dfn), &submodels).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Model(ModelError::CircularDependency(_))
        ));
    }

    #[test]
    fn unprovided_requirement_is_named() {
        let submodels: Vec<Box<dyn SubModel>> = vec![Box::new(Decay)];
        let err = assemble("orphan", &Options::new(Family::Dfn), &submodels).unwrap_err();
        assert_eq!(
            err,
            BuildError::Model(ModelError::MissingCoupling {
                name: "rate".to_owned(),
                submodel: "decay".to_owned(),
            })
        );
    }
}
