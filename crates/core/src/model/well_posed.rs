use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use petgraph::{algo::maximum_matching, graph::UnGraph};

use crate::{Expr, Side, Symbol, Variable};

use super::{Model, ModelError};

impl Model {
    /// Checks that the model is well posed, without discretizing it.
    ///
    /// Verifies, in order:
    ///
    /// - (a) every referenced variable has exactly one governing equation,
    /// - (b) every variable inside a gradient has conditions on both edges,
    /// - (c) equations and initial conditions sit on their variable's domain
    ///   and every state is initialised,
    /// - (d) the algebraic equations can be matched one-to-one with the
    ///   algebraic variables, so none is circularly undetermined.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModelError`] found, naming the offending variable.
    pub fn check_well_posedness(&self) -> Result<(), ModelError> {
        let states = self.check_equations()?;
        self.check_boundary_conditions(&states)?;
        self.check_domains(&states)?;
        self.check_algebraic_structure()?;
        debug!(
            "model `{}` is well posed: {} differential, {} algebraic",
            self.name,
            self.rhs.len(),
            self.algebraic.len()
        );
        Ok(())
    }

    /// Check (a). Returns the set of states.
    fn check_equations(&self) -> Result<BTreeSet<Variable>, ModelError> {
        let mut states = BTreeSet::new();
        for (variable, _) in self.equations() {
            if !states.insert(variable.clone()) {
                return Err(ModelError::DuplicateEquation {
                    variable: variable.clone(),
                });
            }
        }

        let referenced = self
            .equations()
            .map(|(_, expr)| expr)
            .chain(
                self.boundary_conditions
                    .values()
                    .flat_map(|bcs| bcs.values().map(|bc| &bc.value)),
            )
            .chain(self.events.iter().map(|event| &event.expression))
            .chain(self.variables.values())
            .flat_map(Symbol::variables);
        for variable in referenced {
            if !states.contains(&variable) {
                return Err(ModelError::MissingEquation { variable });
            }
        }
        Ok(states)
    }

    /// Check (b).
    fn check_boundary_conditions(&self, states: &BTreeSet<Variable>) -> Result<(), ModelError> {
        if let Some(variable) = self
            .boundary_conditions
            .keys()
            .find(|v| !states.contains(*v))
        {
            return Err(ModelError::ExtraneousCondition {
                variable: variable.clone(),
            });
        }

        let mut operands = Vec::new();
        for (_, expr) in self.equations() {
            gradient_operands(expr, &mut operands);
        }
        for operand in operands {
            let Some(variable) = operand.as_variable() else {
                return Err(ModelError::GradientOfExpression {
                    expression: operand.to_string(),
                });
            };
            let conditions = self.boundary_conditions.get(variable);
            for side in [Side::Left, Side::Right] {
                if conditions.is_none_or(|bcs| !bcs.contains_key(&side)) {
                    return Err(ModelError::MissingBoundaryCondition {
                        variable: variable.clone(),
                        side,
                    });
                }
            }
        }
        Ok(())
    }

    /// Check (c).
    fn check_domains(&self, states: &BTreeSet<Variable>) -> Result<(), ModelError> {
        for (variable, expr) in self.equations() {
            if !fits(variable, expr) {
                return Err(ModelError::DomainMismatch {
                    variable: variable.clone(),
                    expected: variable.domain().clone(),
                    found: expr.domain().clone(),
                });
            }
            let Some(initial) = self.initial_conditions.get(variable) else {
                return Err(ModelError::MissingInitialCondition {
                    variable: variable.clone(),
                });
            };
            if !fits(variable, initial) {
                return Err(ModelError::DomainMismatch {
                    variable: variable.clone(),
                    expected: variable.domain().clone(),
                    found: initial.domain().clone(),
                });
            }
        }
        if let Some(variable) = self
            .initial_conditions
            .keys()
            .find(|v| !states.contains(*v))
        {
            return Err(ModelError::ExtraneousCondition {
                variable: variable.clone(),
            });
        }
        Ok(())
    }

    /// Check (d), a maximum bipartite matching between algebraic equations
    /// and the algebraic variables they reference.
    fn check_algebraic_structure(&self) -> Result<(), ModelError> {
        let count = self.algebraic.len();
        if count == 0 {
            return Ok(());
        }

        let mut graph = UnGraph::<(), ()>::with_capacity(2 * count, 0);
        let equations: Vec<_> = (0..count).map(|_| graph.add_node(())).collect();
        let unknowns: Vec<_> = (0..count).map(|_| graph.add_node(())).collect();
        let index: BTreeMap<&Variable, usize> = self
            .algebraic
            .iter()
            .enumerate()
            .map(|(i, (variable, _))| (variable, i))
            .collect();

        for (i, (_, expr)) in self.algebraic.iter().enumerate() {
            for variable in expr.variables() {
                if let Some(&j) = index.get(&variable) {
                    graph.add_edge(equations[i], unknowns[j], ());
                }
            }
        }

        let matching = maximum_matching(&graph);
        if matching.is_perfect() {
            return Ok(());
        }
        let unmatched = unknowns
            .iter()
            .position(|&node| matching.mate(node).is_none())
            .unwrap_or(0);
        Err(ModelError::StructurallySingular {
            variable: self.algebraic[unmatched].0.clone(),
        })
    }
}

/// An expression fits a variable if it is on the same domain or is scalar.
fn fits(variable: &Variable, expr: &Symbol) -> bool {
    expr.domain().is_scalar() || expr.domain() == variable.domain()
}

fn gradient_operands(symbol: &Symbol, found: &mut Vec<Symbol>) {
    if let Expr::Gradient(operand) = symbol.expr() {
        found.push(operand.clone());
    }
    for child in symbol.children() {
        gradient_operands(child, found);
    }
}

#[cfg(test)]
mod tests {
    use crate::{BoundaryCondition, Domain, ModelBuilder, ModelError, Side, SubDomain, Symbol, Variable};

    fn diffusion(with_right_bc: bool) -> crate::Model {
        let c = Variable::new("c", Domain::single(SubDomain::Separator));
        let mut builder = ModelBuilder::new("diffusion");
        builder
            .rhs(&c, c.symbol().grad().unwrap().div().unwrap())
            .unwrap();
        builder
            .initial_condition(&c, Symbol::constant(1.0))
            .boundary_condition(&c, Side::Left, BoundaryCondition::no_flux());
        if with_right_bc {
            builder.boundary_condition(&c, Side::Right, BoundaryCondition::no_flux());
        }
        builder.build()
    }

    #[test]
    fn complete_diffusion_model_is_well_posed() {
        diffusion(true).check_well_posedness().unwrap();
    }

    #[test]
    fn missing_edge_is_reported() {
        let err = diffusion(false).check_well_posedness().unwrap_err();
        assert!(matches!(
            err,
            ModelError::MissingBoundaryCondition {
                side: Side::Right,
                ..
            }
        ));
    }

    #[test]
    fn undefined_variable_is_reported() {
        let a = Variable::new("a", Domain::scalar());
        let b = Variable::new("b", Domain::scalar());
        let mut builder = ModelBuilder::new("m");
        builder.rhs(&a, b.symbol()).unwrap();
        builder.initial_condition(&a, Symbol::constant(0.0));
        let err = builder.build().check_well_posedness().unwrap_err();
        assert_eq!(err, ModelError::MissingEquation { variable: b });
    }

    #[test]
    fn missing_initial_condition_is_reported() {
        let a = Variable::new("a", Domain::scalar());
        let mut builder = ModelBuilder::new("m");
        builder.rhs(&a, Symbol::constant(1.0)).unwrap();
        let err = builder.build().check_well_posedness().unwrap_err();
        assert_eq!(err, ModelError::MissingInitialCondition { variable: a });
    }

    #[test]
    fn equation_on_wrong_domain_is_reported() {
        let a = Variable::new("a", Domain::single(SubDomain::Separator));
        let b = Variable::new("b", Domain::through_cell());
        let mut builder = ModelBuilder::new("m");
        builder.rhs(&a, b.symbol()).unwrap();
        builder.rhs(&b, Symbol::constant(0.0)).unwrap();
        builder
            .initial_condition(&a, Symbol::constant(0.0))
            .initial_condition(&b, Symbol::constant(0.0));
        let err = builder.build().check_well_posedness().unwrap_err();
        assert!(matches!(err, ModelError::DomainMismatch { variable, .. } if variable == a));
    }

    #[test]
    fn algebraic_loop_without_unknown_is_singular() {
        // Both algebraic equations only reference `x`, so `y` is undetermined.
        let x = Variable::new("x", Domain::scalar());
        let y = Variable::new("y", Domain::scalar());
        let mut builder = ModelBuilder::new("m");
        builder.algebraic(&x, x.symbol() - 1.0).unwrap();
        builder.algebraic(&y, x.symbol() * 2.0).unwrap();
        builder
            .initial_condition(&x, Symbol::constant(0.0))
            .initial_condition(&y, Symbol::constant(0.0));
        let err = builder.build().check_well_posedness().unwrap_err();
        assert!(matches!(err, ModelError::StructurallySingular { .. }));
    }

    #[test]
    fn coupled_algebraic_pair_is_matched() {
        let x = Variable::new("x", Domain::scalar());
        let y = Variable::new("y", Domain::scalar());
        let mut builder = ModelBuilder::new("m");
        builder
            .algebraic(&x, y.symbol().minus(&x.symbol().exp()).unwrap())
            .unwrap();
        builder.algebraic(&y, y.symbol() - 2.0).unwrap();
        builder
            .initial_condition(&x, Symbol::constant(0.0))
            .initial_condition(&y, Symbol::constant(0.0));
        builder.build().check_well_posedness().unwrap();
    }
}
