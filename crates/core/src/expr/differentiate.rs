use crate::Domain;

use super::{BinaryOp, Expr, ExprError, Func, Symbol, Variable};

impl Symbol {
    /// Differentiates with respect to a variable.
    ///
    /// Uses linearity and the product, quotient, power, and chain rules.
    /// Parts of the tree that do not reference `wrt` differentiate to zero
    /// without inspection, so non-smooth nodes are only an error when they
    /// actually depend on `wrt`.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::NotDifferentiable`] for `sign`, `abs`, min/max
    /// reductions, unprocessed function parameters, and spatial operators
    /// whose operand depends on `wrt`.
    pub fn differentiate(&self, wrt: &Variable) -> Result<Symbol, ExprError> {
        if !self.depends_on(wrt) {
            return Ok(Symbol::constant(0.0));
        }

        match self.expr() {
            Expr::Variable(_) => Ok(Symbol::constant(1.0)),
            Expr::Function(func, u) => {
                let du = u.differentiate(wrt)?;
                let outer = match func {
                    Func::Exp => u.exp(),
                    Func::Log => 1.0 / u.clone(),
                    Func::Sqrt => 0.5 / u.sqrt(),
                    Func::Sinh => u.cosh(),
                    Func::Cosh => u.sinh(),
                    Func::Tanh => 1.0 - u.tanh().powf(2.0),
                    Func::Arcsinh => 1.0 / (u.powf(2.0) + 1.0).sqrt(),
                    Func::Abs | Func::Sign => {
                        return Err(ExprError::NotDifferentiable(format!(
                            "{}, which is not smooth",
                            func.name()
                        )));
                    }
                };
                outer.times(&du)
            }
            Expr::Binary(op, u, v) => {
                let du = u.differentiate(wrt)?;
                let dv = v.differentiate(wrt)?;
                match op {
                    BinaryOp::Add => du.plus(&dv),
                    BinaryOp::Sub => du.minus(&dv),
                    BinaryOp::Mul => u.times(&dv)?.plus(&du.times(v)?),
                    BinaryOp::Div => {
                        let numerator = du.times(v)?.minus(&u.times(&dv)?)?;
                        numerator.over(&v.powf(2.0))
                    }
                    BinaryOp::Pow => {
                        if v.depends_on(wrt) {
                            // d(u^v) = u^v (v' ln u + v u' / u)
                            let term = dv
                                .times(&u.log())?
                                .plus(&v.times(&du)?.over(u)?)?;
                            self.times(&term)
                        } else {
                            let exponent = v.clone() - 1.0;
                            v.times(&u.pow(&exponent)?)?.times(&du)
                        }
                    }
                }
            }
            Expr::Broadcast(u) => {
                let du = u.differentiate(wrt)?;
                du.broadcast(self.domain().clone())
            }
            Expr::Restrict(u) => {
                let du = u.differentiate(wrt)?;
                if du.domain().is_scalar() {
                    Ok(du)
                } else {
                    du.restrict(self.domain().primary())
                }
            }
            Expr::Concatenation(parts) => {
                let mut derivatives = Vec::with_capacity(parts.len());
                for part in parts {
                    let d = part.differentiate(wrt)?;
                    derivatives.push(on_domain(d, part.domain())?);
                }
                Symbol::concatenate(derivatives)
            }
            Expr::FunctionParameter { name, .. } => Err(ExprError::NotDifferentiable(format!(
                "function parameter `{name}` before it is processed"
            ))),
            Expr::Reduce(..) => Err(ExprError::NotDifferentiable(
                "a min/max reduction".to_owned(),
            )),
            Expr::Gradient(_)
            | Expr::Divergence(_)
            | Expr::Integral(_)
            | Expr::BoundaryValue(..) => Err(ExprError::NotDifferentiable(format!(
                "spatial operator `{self}` with respect to `{wrt}`"
            ))),
            Expr::Constant(_) | Expr::Parameter(_) | Expr::Time | Expr::Coordinate(_) => {
                Ok(Symbol::constant(0.0))
            }
        }
    }
}

/// Broadcasts scalar derivatives back onto the part's domain.
fn on_domain(symbol: Symbol, domain: &Domain) -> Result<Symbol, ExprError> {
    if symbol.domain().is_scalar() && !domain.is_scalar() {
        symbol.broadcast(domain.clone())
    } else {
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{Bindings, Value};

    fn at(symbol: &Symbol, x: f64) -> f64 {
        let bindings = Bindings::new().with_variable("x", Value::Scalar(x));
        symbol.evaluate(&bindings).unwrap().as_scalar().unwrap()
    }

    fn x() -> Variable {
        Variable::new("x", Domain::scalar())
    }

    #[test]
    fn product_rule() {
        let x = x();
        let f = x.symbol().times(&x.symbol().exp()).unwrap();
        let df = f.differentiate(&x).unwrap();
        assert_relative_eq!(at(&df, 0.5), (1.0 + 0.5) * 0.5_f64.exp(), epsilon = 1e-12);
    }

    #[test]
    fn quotient_and_chain_rules() {
        let x = x();
        let f = x.symbol().sinh().over(&(x.symbol() + 2.0)).unwrap();
        let df = f.differentiate(&x).unwrap();
        let expected = |x: f64| (x.cosh() * (x + 2.0) - x.sinh()) / (x + 2.0).powi(2);
        assert_relative_eq!(at(&df, 0.3), expected(0.3), epsilon = 1e-12);
    }

    #[test]
    fn power_rules() {
        let x = x();
        let cube = x.symbol().powf(3.0);
        assert_relative_eq!(at(&cube.differentiate(&x).unwrap(), 2.0), 12.0);

        let general = x.symbol().pow(&x.symbol()).unwrap();
        let d = general.differentiate(&x).unwrap();
        assert_relative_eq!(at(&d, 1.5), 1.5_f64.powf(1.5) * (1.5_f64.ln() + 1.0), epsilon = 1e-12);
    }

    #[test]
    fn linearity() {
        let x = x();
        let f = (x.symbol().arcsinh() * 3.0)
            .minus(&x.symbol().tanh())
            .unwrap();
        let df = f.differentiate(&x).unwrap();
        let expected = 3.0 / (0.7_f64.powi(2) + 1.0).sqrt() - (1.0 - 0.7_f64.tanh().powi(2));
        assert_relative_eq!(at(&df, 0.7), expected, epsilon = 1e-12);
    }

    #[test]
    fn independent_parts_vanish() {
        let x = x();
        let y = Variable::new("y", Domain::scalar());
        let f = y.symbol().sign().times(&x.symbol()).unwrap();
        // sign(y) is constant with respect to x
        let df = f.differentiate(&x).unwrap();
        assert_eq!(df, y.symbol().sign());
    }

    #[test]
    fn sign_is_not_differentiable() {
        let x = x();
        assert!(matches!(
            x.symbol().sign().differentiate(&x),
            Err(ExprError::NotDifferentiable(_))
        ));
        assert!(matches!(
            x.symbol().abs().differentiate(&x),
            Err(ExprError::NotDifferentiable(_))
        ));
    }
}
