use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::{Domain, SubDomain};

use super::{BinaryOp, Expr, ExprError, Func, Reduction, Side, Symbol};

impl Symbol {
    /// Combines two symbols with a binary operator.
    ///
    /// Constants are folded and additive/multiplicative identities dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] unless the operand domains are
    /// equal or one of them is scalar.
    pub fn binary(op: BinaryOp, left: &Symbol, right: &Symbol) -> Result<Symbol, ExprError> {
        if !left.domain().is_compatible(right.domain()) {
            return Err(ExprError::DomainMismatch {
                operation: op.name(),
                left: left.domain().clone(),
                right: right.domain().clone(),
            });
        }
        Ok(Symbol::combine(op, left, right))
    }

    /// Folds, simplifies, and builds a node for operands known to be compatible.
    fn combine(op: BinaryOp, left: &Symbol, right: &Symbol) -> Symbol {
        if let (Some(a), Some(b)) = (left.as_constant(), right.as_constant()) {
            return Symbol::constant(op.apply(a, b));
        }

        let (l, r) = (left.as_constant(), right.as_constant());
        let simplified = match op {
            BinaryOp::Add if r == Some(0.0) => Some(left.clone()),
            BinaryOp::Add if l == Some(0.0) => Some(right.clone()),
            BinaryOp::Sub if r == Some(0.0) => Some(left.clone()),
            BinaryOp::Mul | BinaryOp::Div if r == Some(1.0) => Some(left.clone()),
            BinaryOp::Mul if l == Some(1.0) => Some(right.clone()),
            BinaryOp::Mul if l == Some(0.0) && right.domain().is_scalar() => {
                Some(Symbol::constant(0.0))
            }
            BinaryOp::Mul if r == Some(0.0) && left.domain().is_scalar() => {
                Some(Symbol::constant(0.0))
            }
            BinaryOp::Pow if r == Some(1.0) => Some(left.clone()),
            _ => None,
        };
        if let Some(symbol) = simplified {
            return symbol;
        }

        let domain = if left.domain().is_scalar() {
            right.domain().clone()
        } else {
            left.domain().clone()
        };
        Symbol::from_parts(Expr::Binary(op, left.clone(), right.clone()), domain)
    }

    /// Checked `self + other`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] on incompatible domains.
    pub fn plus(&self, other: &Symbol) -> Result<Symbol, ExprError> {
        Symbol::binary(BinaryOp::Add, self, other)
    }

    /// Checked `self - other`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] on incompatible domains.
    pub fn minus(&self, other: &Symbol) -> Result<Symbol, ExprError> {
        Symbol::binary(BinaryOp::Sub, self, other)
    }

    /// Checked `self * other`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] on incompatible domains.
    pub fn times(&self, other: &Symbol) -> Result<Symbol, ExprError> {
        Symbol::binary(BinaryOp::Mul, self, other)
    }

    /// Checked `self / other`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] on incompatible domains.
    pub fn over(&self, other: &Symbol) -> Result<Symbol, ExprError> {
        Symbol::binary(BinaryOp::Div, self, other)
    }

    /// Checked `self ^ other`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] on incompatible domains.
    pub fn pow(&self, other: &Symbol) -> Result<Symbol, ExprError> {
        Symbol::binary(BinaryOp::Pow, self, other)
    }

    /// `self ^ exponent` for a numeric exponent.
    #[must_use]
    pub fn powf(&self, exponent: f64) -> Symbol {
        self.scalar_op(BinaryOp::Pow, exponent, false)
    }

    /// Applies an elementwise function.
    #[must_use]
    pub fn apply(&self, func: Func) -> Symbol {
        if let Some(value) = self.as_constant() {
            return Symbol::constant(func.apply(value));
        }
        Symbol::from_parts(Expr::Function(func, self.clone()), self.domain().clone())
    }

    #[must_use]
    pub fn exp(&self) -> Symbol {
        self.apply(Func::Exp)
    }

    #[must_use]
    pub fn log(&self) -> Symbol {
        self.apply(Func::Log)
    }

    #[must_use]
    pub fn sqrt(&self) -> Symbol {
        self.apply(Func::Sqrt)
    }

    #[must_use]
    pub fn sinh(&self) -> Symbol {
        self.apply(Func::Sinh)
    }

    #[must_use]
    pub fn cosh(&self) -> Symbol {
        self.apply(Func::Cosh)
    }

    #[must_use]
    pub fn tanh(&self) -> Symbol {
        self.apply(Func::Tanh)
    }

    #[must_use]
    pub fn arcsinh(&self) -> Symbol {
        self.apply(Func::Arcsinh)
    }

    #[must_use]
    pub fn abs(&self) -> Symbol {
        self.apply(Func::Abs)
    }

    #[must_use]
    pub fn sign(&self) -> Symbol {
        self.apply(Func::Sign)
    }

    /// The positive part, `max(self, 0)` pointwise.
    #[must_use]
    pub fn positive_part(&self) -> Symbol {
        Symbol::combine(BinaryOp::Add, self, &self.abs()) * 0.5
    }

    /// Spatial gradient, located on cell faces once discretized.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] for scalar operands.
    pub fn grad(&self) -> Result<Symbol, ExprError> {
        self.require_spatial("gradient")?;
        Ok(Symbol::from_parts(
            Expr::Gradient(self.clone()),
            self.domain().clone(),
        ))
    }

    /// Spatial divergence of a flux.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] for scalar operands.
    pub fn div(&self) -> Result<Symbol, ExprError> {
        self.require_spatial("divergence")?;
        Ok(Symbol::from_parts(
            Expr::Divergence(self.clone()),
            self.domain().clone(),
        ))
    }

    /// Integral over the primary domain.
    ///
    /// Particle integrals are volume integrals (`4 pi r^2 dr`).
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] for scalar operands.
    pub fn integral(&self) -> Result<Symbol, ExprError> {
        self.require_spatial("integral")?;
        Ok(Symbol::from_parts(
            Expr::Integral(self.clone()),
            self.domain().collapsed(),
        ))
    }

    /// Value at one edge of the primary domain.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] for scalar operands.
    pub fn boundary_value(&self, side: Side) -> Result<Symbol, ExprError> {
        self.require_spatial("boundary value")?;
        Ok(Symbol::from_parts(
            Expr::BoundaryValue(side, self.clone()),
            self.domain().collapsed(),
        ))
    }

    /// Broadcasts onto `domain`.
    ///
    /// A scalar can be broadcast anywhere. A quantity on primary domain `P`
    /// can be broadcast onto any domain whose secondary domain is `P`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] for any other pairing.
    pub fn broadcast(&self, domain: Domain) -> Result<Symbol, ExprError> {
        let source = self.domain();
        let allowed = !domain.is_scalar()
            && (source.is_scalar()
                || (source.secondary().is_empty() && source.primary() == domain.secondary()));
        if !allowed {
            return Err(ExprError::DomainMismatch {
                operation: "broadcast",
                left: source.clone(),
                right: domain,
            });
        }
        if source == &domain {
            return Ok(self.clone());
        }
        Ok(Symbol::from_parts(Expr::Broadcast(self.clone()), domain))
    }

    /// Restricts a multi-sub-domain quantity to a contiguous part of it.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] if `subs` is not contained in
    /// this symbol's primary domain.
    pub fn restrict(&self, subs: &[SubDomain]) -> Result<Symbol, ExprError> {
        let source = self.domain();
        let target = Domain::new(subs.to_vec());
        let contained = source.secondary().is_empty()
            && Domain::is_contiguous(subs)
            && subs.iter().all(|s| source.primary().contains(s));
        if !contained {
            return Err(ExprError::DomainMismatch {
                operation: "restriction",
                left: source.clone(),
                right: target,
            });
        }
        if source == &target {
            return Ok(self.clone());
        }
        if let Expr::Concatenation(parts) = self.expr() {
            if let Some(part) = parts.iter().find(|p| p.domain() == &target) {
                return Ok(part.clone());
            }
        }
        Ok(Symbol::from_parts(Expr::Restrict(self.clone()), target))
    }

    /// Joins quantities on adjacent sub-domains into one quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] if the parts are scalar, carry a
    /// secondary domain, or are not contiguous in cell order, or if there are
    /// no parts at all.
    pub fn concatenate(parts: Vec<Symbol>) -> Result<Symbol, ExprError> {
        if parts.is_empty() {
            return Err(ExprError::DomainMismatch {
                operation: "concatenation",
                left: Domain::scalar(),
                right: Domain::through_cell(),
            });
        }
        let mut subs = Vec::new();
        for part in &parts {
            if part.domain().is_scalar() || !part.domain().secondary().is_empty() {
                return Err(ExprError::DomainMismatch {
                    operation: "concatenation",
                    left: Domain::new(subs),
                    right: part.domain().clone(),
                });
            }
            subs.extend_from_slice(part.domain().primary());
        }
        if !Domain::is_contiguous(&subs) {
            return Err(ExprError::DomainMismatch {
                operation: "concatenation",
                left: Domain::new(subs),
                right: Domain::through_cell(),
            });
        }
        if parts.len() == 1 {
            return Ok(parts[0].clone());
        }
        Ok(Symbol::from_parts(
            Expr::Concatenation(parts),
            Domain::new(subs),
        ))
    }

    /// Minimum over the whole symbol, a scalar.
    #[must_use]
    pub fn min(&self) -> Symbol {
        self.reduce(Reduction::Min)
    }

    /// Maximum over the whole symbol, a scalar.
    #[must_use]
    pub fn max(&self) -> Symbol {
        self.reduce(Reduction::Max)
    }

    fn reduce(&self, reduction: Reduction) -> Symbol {
        if self.domain().is_scalar() {
            return self.clone();
        }
        Symbol::from_parts(Expr::Reduce(reduction, self.clone()), Domain::scalar())
    }

    fn require_spatial(&self, operation: &'static str) -> Result<(), ExprError> {
        if self.domain().is_scalar() {
            return Err(ExprError::DomainMismatch {
                operation,
                left: self.domain().clone(),
                right: Domain::scalar(),
            });
        }
        Ok(())
    }

    /// Combines with a numeric operand, which is compatible with any domain.
    fn scalar_op(&self, op: BinaryOp, value: f64, value_on_left: bool) -> Symbol {
        let constant = Symbol::constant(value);
        if value_on_left {
            Symbol::combine(op, &constant, self)
        } else {
            Symbol::combine(op, self, &constant)
        }
    }
}

impl Add<f64> for Symbol {
    type Output = Symbol;

    fn add(self, rhs: f64) -> Symbol {
        self.scalar_op(BinaryOp::Add, rhs, false)
    }
}

impl Sub<f64> for Symbol {
    type Output = Symbol;

    fn sub(self, rhs: f64) -> Symbol {
        self.scalar_op(BinaryOp::Sub, rhs, false)
    }
}

impl Mul<f64> for Symbol {
    type Output = Symbol;

    fn mul(self, rhs: f64) -> Symbol {
        self.scalar_op(BinaryOp::Mul, rhs, false)
    }
}

impl Div<f64> for Symbol {
    type Output = Symbol;

    fn div(self, rhs: f64) -> Symbol {
        self.scalar_op(BinaryOp::Div, rhs, false)
    }
}

impl Add<Symbol> for f64 {
    type Output = Symbol;

    fn add(self, rhs: Symbol) -> Symbol {
        rhs.scalar_op(BinaryOp::Add, self, true)
    }
}

impl Sub<Symbol> for f64 {
    type Output = Symbol;

    fn sub(self, rhs: Symbol) -> Symbol {
        rhs.scalar_op(BinaryOp::Sub, self, true)
    }
}

impl Mul<Symbol> for f64 {
    type Output = Symbol;

    fn mul(self, rhs: Symbol) -> Symbol {
        rhs.scalar_op(BinaryOp::Mul, self, true)
    }
}

impl Div<Symbol> for f64 {
    type Output = Symbol;

    fn div(self, rhs: Symbol) -> Symbol {
        rhs.scalar_op(BinaryOp::Div, self, true)
    }
}

impl Neg for Symbol {
    type Output = Symbol;

    fn neg(self) -> Symbol {
        self.scalar_op(BinaryOp::Mul, -1.0, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SubDomain, Variable};

    fn electrolyte() -> Symbol {
        Variable::new("c_e", Domain::through_cell()).symbol()
    }

    #[test]
    fn constants_fold() {
        let sum = Symbol::constant(2.0).plus(&Symbol::constant(3.0)).unwrap();
        assert_eq!(sum.as_constant(), Some(5.0));
        assert_eq!((Symbol::constant(2.0) * 4.0).as_constant(), Some(8.0));
    }

    #[test]
    fn identities_are_dropped() {
        let c = electrolyte();
        assert_eq!(c.clone() + 0.0, c);
        assert_eq!(c.clone() * 1.0, c);
        assert_eq!(c.powf(1.0), c);
    }

    #[test]
    fn scalar_combines_with_any_domain() {
        let c = electrolyte();
        let product = c.times(&Symbol::parameter("kappa")).unwrap();
        assert_eq!(product.domain(), &Domain::through_cell());
    }

    #[test]
    fn mismatched_domains_are_rejected() {
        let c = electrolyte();
        let phi = Variable::new("phi_s_n", Domain::single(SubDomain::NegativeElectrode)).symbol();
        let err = c.plus(&phi).unwrap_err();
        assert!(matches!(
            err,
            ExprError::DomainMismatch {
                operation: "addition",
                ..
            }
        ));
    }

    #[test]
    fn empty_concatenation_is_rejected() {
        let err = Symbol::concatenate(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ExprError::DomainMismatch {
                operation: "concatenation",
                ..
            }
        ));
    }

    #[test]
    fn gradient_of_scalar_is_rejected() {
        assert!(Symbol::parameter("k").grad().is_err());
    }

    #[test]
    fn restriction_of_concatenation_returns_part() {
        let n = Variable::new("a", Domain::single(SubDomain::NegativeElectrode)).symbol();
        let s = Variable::new("b", Domain::single(SubDomain::Separator)).symbol();
        let joined = Symbol::concatenate(vec![n.clone(), s]).unwrap();
        assert_eq!(joined.domain().primary().len(), 2);
        assert_eq!(
            joined.restrict(&[SubDomain::NegativeElectrode]).unwrap(),
            n
        );
    }

    #[test]
    fn concatenation_must_be_contiguous() {
        let n = Variable::new("a", Domain::single(SubDomain::NegativeElectrode)).symbol();
        let p = Variable::new("b", Domain::single(SubDomain::PositiveElectrode)).symbol();
        assert!(Symbol::concatenate(vec![n, p]).is_err());
    }

    #[test]
    fn particle_integral_collapses_onto_electrode() {
        let c_s = Variable::new(
            "c_s_n",
            Domain::single(SubDomain::NegativeParticle)
                .with_secondary(vec![SubDomain::NegativeElectrode]),
        )
        .symbol();
        let average = c_s.integral().unwrap();
        assert_eq!(
            average.domain(),
            &Domain::single(SubDomain::NegativeElectrode)
        );
    }

    #[test]
    fn broadcast_rules() {
        let j = Variable::new("j", Domain::single(SubDomain::NegativeElectrode)).symbol();
        let particle = Domain::single(SubDomain::NegativeParticle)
            .with_secondary(vec![SubDomain::NegativeElectrode]);
        assert!(j.broadcast(particle).is_ok());
        assert!(j.broadcast(Domain::through_cell()).is_err());
        assert!(Symbol::constant(1.0).broadcast(Domain::through_cell()).is_ok());
    }
}
