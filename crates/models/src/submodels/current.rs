//! The applied current.

use voltaic_core::{ModelBuilder, Symbol};

use crate::{BuildError, SubModel, Variables, parameters, variables::names};

/// Reads the applied current density from the `Current function` parameter,
/// which may be a constant or an expression in time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Current;

impl SubModel for Current {
    fn name(&self) -> &'static str {
        "current"
    }

    fn fundamental(&self, vars: &mut Variables) -> Result<(), BuildError> {
        vars.insert(names::CURRENT, Symbol::parameter(parameters::names::CURRENT));
        Ok(())
    }

    fn equations(&self, vars: &Variables, builder: &mut ModelBuilder) -> Result<(), BuildError> {
        builder.variable(names::CURRENT, vars.get(names::CURRENT)?);
        Ok(())
    }
}
