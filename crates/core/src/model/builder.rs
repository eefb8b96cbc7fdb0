use std::collections::BTreeMap;

use crate::{Side, Symbol, Variable};

use super::{BoundaryCondition, Event, Model, ModelError};

/// Incrementally assembles a [`Model`].
///
/// Sub-models contribute through a shared builder. Each state may be given
/// only one governing equation; later contributions to conditions and
/// output variables replace earlier ones.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            model: Model {
                name: name.to_owned(),
                rhs: Vec::new(),
                algebraic: Vec::new(),
                initial_conditions: BTreeMap::new(),
                boundary_conditions: BTreeMap::new(),
                variables: BTreeMap::new(),
                events: Vec::new(),
                options: BTreeMap::new(),
            },
        }
    }

    /// Adds a differential equation `d(variable)/dt = expr`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateEquation`] if the variable already has
    /// an equation.
    pub fn rhs(&mut self, variable: &Variable, expr: Symbol) -> Result<&mut Self, ModelError> {
        self.ensure_new(variable)?;
        self.model.rhs.push((variable.clone(), expr));
        Ok(self)
    }

    /// Adds an algebraic equation `0 = expr` that determines `variable`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateEquation`] if the variable already has
    /// an equation.
    pub fn algebraic(
        &mut self,
        variable: &Variable,
        expr: Symbol,
    ) -> Result<&mut Self, ModelError> {
        self.ensure_new(variable)?;
        self.model.algebraic.push((variable.clone(), expr));
        Ok(self)
    }

    pub fn initial_condition(&mut self, variable: &Variable, expr: Symbol) -> &mut Self {
        self.model
            .initial_conditions
            .insert(variable.clone(), expr);
        self
    }

    pub fn boundary_condition(
        &mut self,
        variable: &Variable,
        side: Side,
        condition: BoundaryCondition,
    ) -> &mut Self {
        self.model
            .boundary_conditions
            .entry(variable.clone())
            .or_default()
            .insert(side, condition);
        self
    }

    /// Sets both edges at once.
    pub fn boundary_conditions(
        &mut self,
        variable: &Variable,
        left: BoundaryCondition,
        right: BoundaryCondition,
    ) -> &mut Self {
        self.boundary_condition(variable, Side::Left, left)
            .boundary_condition(variable, Side::Right, right)
    }

    /// Registers a named output variable.
    pub fn variable(&mut self, name: &str, expr: Symbol) -> &mut Self {
        self.model.variables.insert(name.to_owned(), expr);
        self
    }

    pub fn event(&mut self, event: Event) -> &mut Self {
        self.model.events.push(event);
        self
    }

    /// Records an option value in the model's summary.
    pub fn option(&mut self, name: &str, value: &str) -> &mut Self {
        self.model
            .options
            .insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn build(self) -> Model {
        self.model
    }

    fn ensure_new(&self, variable: &Variable) -> Result<(), ModelError> {
        let exists = self
            .model
            .equations()
            .any(|(existing, _)| existing == variable);
        if exists {
            return Err(ModelError::DuplicateEquation {
                variable: variable.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Domain;

    #[test]
    fn rejects_second_equation_for_a_variable() {
        let v = Variable::new("v", Domain::scalar());
        let mut builder = ModelBuilder::new("test");
        builder.rhs(&v, Symbol::constant(1.0)).unwrap();
        let err = builder.algebraic(&v, v.symbol()).unwrap_err();
        assert_eq!(err, ModelError::DuplicateEquation { variable: v });
    }

    #[test]
    fn later_outputs_replace_earlier_ones() {
        let mut builder = ModelBuilder::new("test");
        builder
            .variable("x", Symbol::constant(1.0))
            .variable("x", Symbol::constant(2.0));
        let model = builder.build();
        assert_eq!(model.variables()["x"].as_constant(), Some(2.0));
    }
}
