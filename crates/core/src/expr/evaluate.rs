use std::collections::BTreeMap;

use nalgebra::DVector;

use super::{Expr, ExprError, Reduction, Symbol};

/// A numeric value produced by evaluating a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Vector(DVector<f64>),
}

impl Value {
    /// Returns the scalar, or `None` for vectors.
    #[must_use]
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Vector(_) => None,
        }
    }

    /// Returns the value as a vector of `len` entries, repeating scalars.
    #[must_use]
    pub fn to_vector(&self, len: usize) -> DVector<f64> {
        match self {
            Self::Scalar(value) => DVector::from_element(len, *value),
            Self::Vector(vector) => vector.clone(),
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Value {
        match self {
            Self::Scalar(value) => Self::Scalar(f(value)),
            Self::Vector(vector) => Self::Vector(vector.map(f)),
        }
    }

    fn zip(self, other: Value, f: impl Fn(f64, f64) -> f64) -> Result<Value, ExprError> {
        Ok(match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => Self::Scalar(f(a, b)),
            (Self::Scalar(a), Self::Vector(b)) => Self::Vector(b.map(|b| f(a, b))),
            (Self::Vector(a), Self::Scalar(b)) => Self::Vector(a.map(|a| f(a, b))),
            (Self::Vector(a), Self::Vector(b)) => {
                if a.len() != b.len() {
                    return Err(ExprError::ShapeMismatch {
                        left: a.len(),
                        right: b.len(),
                    });
                }
                Self::Vector(a.zip_map(&b, f))
            }
        })
    }
}

/// Numeric values for the variables, parameters, and time in an expression.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    variables: BTreeMap<String, Value>,
    parameters: BTreeMap<String, f64>,
    time: Option<f64>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_variable(mut self, name: &str, value: Value) -> Self {
        self.variables.insert(name.to_owned(), value);
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: &str, value: f64) -> Self {
        self.parameters.insert(name.to_owned(), value);
        self
    }

    #[must_use]
    pub fn with_time(mut self, t: f64) -> Self {
        self.time = Some(t);
        self
    }
}

impl Symbol {
    /// Evaluates the expression pointwise.
    ///
    /// Spatial operators, broadcasts, and coordinates have no meaning until
    /// a mesh exists and fail with [`ExprError::RequiresDiscretization`].
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UndefinedSymbol`] if a referenced variable,
    /// parameter, or time lacks a binding.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<Value, ExprError> {
        match self.expr() {
            Expr::Constant(value) => Ok(Value::Scalar(*value)),
            Expr::Parameter(name) => bindings
                .parameters
                .get(name)
                .map(|v| Value::Scalar(*v))
                .ok_or_else(|| ExprError::UndefinedSymbol(name.clone())),
            Expr::FunctionParameter { name, .. } => Err(ExprError::UndefinedSymbol(name.clone())),
            Expr::Variable(variable) => bindings
                .variables
                .get(variable.name())
                .cloned()
                .ok_or_else(|| ExprError::UndefinedSymbol(variable.name().to_owned())),
            Expr::Time => bindings
                .time
                .map(Value::Scalar)
                .ok_or_else(|| ExprError::UndefinedSymbol("time".to_owned())),
            Expr::Function(func, child) => Ok(child.evaluate(bindings)?.map(|x| func.apply(x))),
            Expr::Binary(op, left, right) => {
                let left = left.evaluate(bindings)?;
                let right = right.evaluate(bindings)?;
                left.zip(right, |a, b| op.apply(a, b))
            }
            Expr::Concatenation(parts) => {
                let mut values = Vec::new();
                for part in parts {
                    match part.evaluate(bindings)? {
                        Value::Scalar(_) => {
                            return Err(ExprError::RequiresDiscretization(
                                "concatenation of scalar parts",
                            ));
                        }
                        Value::Vector(v) => values.extend(v.iter().copied()),
                    }
                }
                Ok(Value::Vector(DVector::from_vec(values)))
            }
            Expr::Reduce(reduction, child) => {
                let value = child.evaluate(bindings)?;
                Ok(Value::Scalar(match value {
                    Value::Scalar(v) => v,
                    Value::Vector(v) => match reduction {
                        Reduction::Min => v.min(),
                        Reduction::Max => v.max(),
                    },
                }))
            }
            Expr::Coordinate(_) => Err(ExprError::RequiresDiscretization("coordinate")),
            Expr::Gradient(_) => Err(ExprError::RequiresDiscretization("gradient")),
            Expr::Divergence(_) => Err(ExprError::RequiresDiscretization("divergence")),
            Expr::Integral(_) => Err(ExprError::RequiresDiscretization("integral")),
            Expr::BoundaryValue(..) => Err(ExprError::RequiresDiscretization("boundary value")),
            Expr::Broadcast(_) => Err(ExprError::RequiresDiscretization("broadcast")),
            Expr::Restrict(_) => Err(ExprError::RequiresDiscretization("restriction")),
        }
    }

    /// Evaluates a symbol that references nothing but constants.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol references anything that needs a binding
    /// or is not scalar.
    pub fn evaluate_constant(&self) -> Result<f64, ExprError> {
        self.evaluate(&Bindings::new())?
            .as_scalar()
            .ok_or(ExprError::RequiresDiscretization("non-scalar constant"))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    use super::*;
    use crate::{Domain, Variable};

    #[test]
    fn evaluates_arithmetic_with_bindings() {
        let x = Variable::new("x", Domain::scalar());
        let expr = (x.symbol() * 2.0).plus(&Symbol::parameter("a")).unwrap();
        let bindings = Bindings::new()
            .with_variable("x", Value::Scalar(3.0))
            .with_parameter("a", 0.5);
        assert_eq!(expr.evaluate(&bindings).unwrap(), Value::Scalar(6.5));
    }

    #[test]
    fn vectors_broadcast_against_scalars() {
        let c = Variable::new("c", Domain::through_cell());
        let expr = c.symbol().exp() * 2.0;
        let bindings = Bindings::new().with_variable("c", Value::Vector(dvector![0.0, 1.0]));
        let Value::Vector(v) = expr.evaluate(&bindings).unwrap() else {
            panic!("expected a vector");
        };
        assert_relative_eq!(v[0], 2.0);
        assert_relative_eq!(v[1], 2.0 * 1.0_f64.exp());
    }

    #[test]
    fn missing_binding_is_undefined() {
        let expr = Symbol::parameter("missing") + 1.0;
        assert_eq!(
            expr.evaluate(&Bindings::new()).unwrap_err(),
            ExprError::UndefinedSymbol("missing".to_owned())
        );
        assert!(matches!(
            Symbol::time().evaluate(&Bindings::new()),
            Err(ExprError::UndefinedSymbol(_))
        ));
    }

    #[test]
    fn spatial_operators_need_a_mesh() {
        let c = Variable::new("c", Domain::through_cell());
        let expr = c.symbol().grad().unwrap();
        let bindings = Bindings::new().with_variable("c", Value::Scalar(1.0));
        assert_eq!(
            expr.evaluate(&bindings).unwrap_err(),
            ExprError::RequiresDiscretization("gradient")
        );
    }

    #[test]
    fn reductions_collapse_vectors() {
        let c = Variable::new("c", Domain::through_cell());
        let bindings =
            Bindings::new().with_variable("c", Value::Vector(dvector![0.3, -1.0, 2.0]));
        assert_eq!(
            c.symbol().min().evaluate(&bindings).unwrap(),
            Value::Scalar(-1.0)
        );
        assert_eq!(
            c.symbol().max().evaluate(&bindings).unwrap(),
            Value::Scalar(2.0)
        );
    }
}
