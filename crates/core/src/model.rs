//! Composite models: equations, conditions, events, and outputs.
//!
//! A [`Model`] is assembled once through a [`ModelBuilder`] and never
//! mutated afterwards. Parameter processing and discretization consume it and
//! produce new artifacts.

mod boundary;
mod builder;
mod error;
mod event;
mod well_posed;

use std::collections::BTreeMap;

pub use boundary::{BoundaryCondition, BoundaryKind};
pub use builder::ModelBuilder;
pub use error::ModelError;
pub use event::{Event, EventKind};

use crate::{ExprError, Side, Symbol, Variable};

/// Boundary conditions of one variable, keyed by edge.
pub type BoundaryConditions = BTreeMap<Side, BoundaryCondition>;

/// A composite PDE/DAE model.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: String,
    rhs: Vec<(Variable, Symbol)>,
    algebraic: Vec<(Variable, Symbol)>,
    initial_conditions: BTreeMap<Variable, Symbol>,
    boundary_conditions: BTreeMap<Variable, BoundaryConditions>,
    variables: BTreeMap<String, Symbol>,
    events: Vec<Event>,
    options: BTreeMap<String, String>,
}

impl Model {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Differential equations, `dv/dt = expr`, in declaration order.
    #[must_use]
    pub fn rhs(&self) -> &[(Variable, Symbol)] {
        &self.rhs
    }

    /// Algebraic equations, `0 = expr`, in declaration order.
    #[must_use]
    pub fn algebraic(&self) -> &[(Variable, Symbol)] {
        &self.algebraic
    }

    #[must_use]
    pub fn initial_conditions(&self) -> &BTreeMap<Variable, Symbol> {
        &self.initial_conditions
    }

    #[must_use]
    pub fn initial_condition(&self, variable: &Variable) -> Option<&Symbol> {
        self.initial_conditions.get(variable)
    }

    #[must_use]
    pub fn all_boundary_conditions(&self) -> &BTreeMap<Variable, BoundaryConditions> {
        &self.boundary_conditions
    }

    #[must_use]
    pub fn boundary_conditions(&self, variable: &Variable) -> Option<&BoundaryConditions> {
        self.boundary_conditions.get(variable)
    }

    /// Named output variables.
    #[must_use]
    pub fn variables(&self) -> &BTreeMap<String, Symbol> {
        &self.variables
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The option values that produced this model.
    #[must_use]
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    /// Returns `true` if the model has algebraic equations.
    #[must_use]
    pub fn is_dae(&self) -> bool {
        !self.algebraic.is_empty()
    }

    /// Iterates over every state with its governing equation, differential
    /// states first.
    pub fn equations(&self) -> impl Iterator<Item = (&Variable, &Symbol)> {
        self.rhs
            .iter()
            .chain(self.algebraic.iter())
            .map(|(variable, expr)| (variable, expr))
    }

    /// Returns a copy with `f` applied to every symbol the model owns.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn try_map_symbols(
        &self,
        f: &mut impl FnMut(&Symbol) -> Result<Symbol, ExprError>,
    ) -> Result<Model, ExprError> {
        let rhs = map_equations(&self.rhs, f)?;
        let algebraic = map_equations(&self.algebraic, f)?;

        let mut initial_conditions = BTreeMap::new();
        for (variable, expr) in &self.initial_conditions {
            initial_conditions.insert(variable.clone(), f(expr)?);
        }

        let mut boundary_conditions = BTreeMap::new();
        for (variable, conditions) in &self.boundary_conditions {
            let mut mapped = BTreeMap::new();
            for (side, condition) in conditions {
                let kind = match &condition.kind {
                    BoundaryKind::Robin { alpha, beta } => BoundaryKind::Robin {
                        alpha: f(alpha)?,
                        beta: f(beta)?,
                    },
                    other => other.clone(),
                };
                mapped.insert(
                    *side,
                    BoundaryCondition {
                        value: f(&condition.value)?,
                        kind,
                    },
                );
            }
            boundary_conditions.insert(variable.clone(), mapped);
        }

        let mut variables = BTreeMap::new();
        for (name, expr) in &self.variables {
            variables.insert(name.clone(), f(expr)?);
        }

        let mut events = Vec::with_capacity(self.events.len());
        for event in &self.events {
            events.push(Event {
                name: event.name.clone(),
                expression: f(&event.expression)?,
                kind: event.kind,
            });
        }

        Ok(Model {
            name: self.name.clone(),
            rhs,
            algebraic,
            initial_conditions,
            boundary_conditions,
            variables,
            events,
            options: self.options.clone(),
        })
    }
}

fn map_equations(
    equations: &[(Variable, Symbol)],
    f: &mut impl FnMut(&Symbol) -> Result<Symbol, ExprError>,
) -> Result<Vec<(Variable, Symbol)>, ExprError> {
    equations
        .iter()
        .map(|(variable, expr)| Ok((variable.clone(), f(expr)?)))
        .collect()
}
