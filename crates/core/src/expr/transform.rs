use std::collections::{BTreeMap, BTreeSet};

use super::{Expr, ExprError, Symbol, Variable};

impl Symbol {
    /// Returns every variable referenced by the expression.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut found = BTreeSet::new();
        self.collect_variables(&mut found);
        found
    }

    fn collect_variables(&self, found: &mut BTreeSet<Variable>) {
        if let Expr::Variable(variable) = self.expr() {
            found.insert(variable.clone());
        }
        for child in self.children() {
            child.collect_variables(found);
        }
    }

    /// Returns `true` if the expression references `variable`.
    #[must_use]
    pub fn depends_on(&self, variable: &Variable) -> bool {
        match self.expr() {
            Expr::Variable(v) => v == variable,
            _ => self.children().iter().any(|c| c.depends_on(variable)),
        }
    }

    /// Returns `true` if any node satisfies `predicate`.
    pub fn any(&self, predicate: &mut impl FnMut(&Symbol) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        self.children().iter().any(|c| c.any(predicate))
    }

    /// Rebuilds the tree top-down.
    ///
    /// `replace` sees each node before its children; returning `Some`
    /// substitutes that node, returning `None` recurses. Rebuilt nodes go
    /// through the checked constructors, so folding and domain checks apply.
    ///
    /// # Errors
    ///
    /// Propagates errors from `replace` and from re-composition.
    pub fn rebuild(
        &self,
        replace: &mut impl FnMut(&Symbol) -> Result<Option<Symbol>, ExprError>,
    ) -> Result<Symbol, ExprError> {
        if let Some(replacement) = replace(self)? {
            return Ok(replacement);
        }
        let children = self.children();
        if children.is_empty() {
            return Ok(self.clone());
        }
        let mut rebuilt = Vec::with_capacity(children.len());
        let mut changed = false;
        for child in children {
            let new = child.rebuild(replace)?;
            changed |= &new != child;
            rebuilt.push(new);
        }
        if !changed {
            return Ok(self.clone());
        }
        self.with_children(rebuilt)
    }

    /// Replaces variables by symbols.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] if a replacement does not fit
    /// where the variable was used.
    pub fn substitute(&self, map: &BTreeMap<Variable, Symbol>) -> Result<Symbol, ExprError> {
        self.rebuild(&mut |node| {
            Ok(node
                .as_variable()
                .and_then(|variable| map.get(variable))
                .cloned())
        })
    }

    /// Rebuilds this node around new children, in [`Symbol::children`] order.
    fn with_children(&self, children: Vec<Symbol>) -> Result<Symbol, ExprError> {
        let domain = self.domain().clone();
        Ok(match self.expr() {
            Expr::Constant(_)
            | Expr::Parameter(_)
            | Expr::Variable(_)
            | Expr::Time
            | Expr::Coordinate(_) => self.clone(),
            Expr::FunctionParameter { name, .. } => Symbol::function_parameter(name, children)?,
            Expr::Concatenation(_) => Symbol::concatenate(children)?,
            Expr::Binary(op, _, _) => {
                let [left, right] = pair(children)?;
                Symbol::binary(*op, &left, &right)?
            }
            Expr::Function(func, _) => single(children)?.apply(*func),
            Expr::Gradient(_) => single(children)?.grad()?,
            Expr::Divergence(_) => single(children)?.div()?,
            Expr::Integral(_) => single(children)?.integral()?,
            Expr::BoundaryValue(side, _) => single(children)?.boundary_value(*side)?,
            Expr::Broadcast(_) => single(children)?.broadcast(domain)?,
            Expr::Restrict(_) => {
                let child = single(children)?;
                if child.domain().is_scalar() {
                    child
                } else {
                    child.restrict(domain.primary())?
                }
            }
            Expr::Reduce(reduction, _) => {
                let child = single(children)?;
                if child.domain().is_scalar() {
                    child
                } else {
                    Symbol::from_parts(Expr::Reduce(*reduction, child), domain)
                }
            }
        })
    }
}

fn single(children: Vec<Symbol>) -> Result<Symbol, ExprError> {
    let len = children.len();
    let mut iter = children.into_iter();
    match (iter.next(), iter.next()) {
        (Some(child), None) => Ok(child),
        _ => Err(ExprError::ShapeMismatch {
            left: 1,
            right: len,
        }),
    }
}

fn pair(children: Vec<Symbol>) -> Result<[Symbol; 2], ExprError> {
    let len = children.len();
    <[Symbol; 2]>::try_from(children).map_err(|_| ExprError::ShapeMismatch {
        left: 2,
        right: len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Domain, SubDomain};

    #[test]
    fn collects_variables() {
        let a = Variable::new("a", Domain::scalar());
        let b = Variable::new("b", Domain::scalar());
        let expr = a.symbol().times(&b.symbol()).unwrap().exp();
        let found = expr.variables();
        assert!(found.contains(&a) && found.contains(&b));
        assert!(expr.depends_on(&a));
        assert!(!Symbol::parameter("k").depends_on(&a));
    }

    #[test]
    fn substitution_refolds_constants() {
        let a = Variable::new("a", Domain::scalar());
        let expr = a.symbol() * 2.0 + 1.0;
        let map = BTreeMap::from([(a, Symbol::constant(3.0))]);
        assert_eq!(expr.substitute(&map).unwrap().as_constant(), Some(7.0));
    }

    #[test]
    fn substitution_checks_domains() {
        let a = Variable::new("a", Domain::single(SubDomain::Separator));
        let expr = a.symbol().grad().unwrap();
        let map = BTreeMap::from([(a, Symbol::constant(3.0))]);
        assert!(matches!(
            expr.substitute(&map),
            Err(ExprError::DomainMismatch { .. })
        ));
    }
}
