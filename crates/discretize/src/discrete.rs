//! Numeric expression trees produced by discretization.

use std::{ops::Range, sync::Arc};

use nalgebra::DVector;
use nalgebra_sparse::csr::CsrMatrix;
use voltaic_core::{BinaryOp, Func, Reduction};

use crate::{DiscretizationError, sparse::matvec};

/// A discretized expression, evaluated against time and the state vector.
///
/// Length-one operands broadcast against longer ones.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscreteExpr {
    Constant(f64),
    Vector(DVector<f64>),
    /// A slice of the state vector.
    State(Range<usize>),
    Time,
    /// A sparse operator applied to its operand.
    MatVec(Arc<CsrMatrix<f64>>, Box<DiscreteExpr>),
    Function(Func, Box<DiscreteExpr>),
    Binary(BinaryOp, Box<DiscreteExpr>, Box<DiscreteExpr>),
    Concat(Vec<DiscreteExpr>),
    Reduce(Reduction, Box<DiscreteExpr>),
}

impl DiscreteExpr {
    pub(crate) fn mat_vec(matrix: CsrMatrix<f64>, operand: DiscreteExpr) -> Self {
        Self::MatVec(Arc::new(matrix), Box::new(operand))
    }

    pub(crate) fn binary(op: BinaryOp, left: DiscreteExpr, right: DiscreteExpr) -> Self {
        if let (Self::Constant(a), Self::Constant(b)) = (&left, &right) {
            return Self::Constant(op.apply(*a, *b));
        }
        Self::Binary(op, Box::new(left), Box::new(right))
    }

    /// Returns `true` if the expression reads the state vector.
    #[must_use]
    pub fn depends_on_state(&self) -> bool {
        match self {
            Self::State(_) => true,
            Self::Constant(_) | Self::Vector(_) | Self::Time => false,
            Self::MatVec(_, operand) | Self::Function(_, operand) | Self::Reduce(_, operand) => {
                operand.depends_on_state()
            }
            Self::Binary(_, left, right) => left.depends_on_state() || right.depends_on_state(),
            Self::Concat(parts) => parts.iter().any(Self::depends_on_state),
        }
    }

    /// Evaluates the expression at time `t` and state `y`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::ShapeMismatch`] if operand lengths
    /// disagree, which indicates a state vector of the wrong size.
    pub fn evaluate(&self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>, DiscretizationError> {
        Ok(match self {
            Self::Constant(value) => DVector::from_element(1, *value),
            Self::Vector(vector) => vector.clone(),
            Self::State(range) => {
                if range.end > y.len() {
                    return Err(DiscretizationError::ShapeMismatch {
                        context: "state slice".to_owned(),
                        expected: range.end,
                        found: y.len(),
                    });
                }
                y.rows(range.start, range.len()).into_owned()
            }
            Self::Time => DVector::from_element(1, t),
            Self::MatVec(matrix, operand) => {
                let x = operand.evaluate(t, y)?;
                if x.len() != matrix.ncols() {
                    return Err(DiscretizationError::ShapeMismatch {
                        context: "operator".to_owned(),
                        expected: matrix.ncols(),
                        found: x.len(),
                    });
                }
                matvec(matrix, &x)
            }
            Self::Function(func, operand) => operand.evaluate(t, y)?.map(|x| func.apply(x)),
            Self::Binary(op, left, right) => {
                let a = left.evaluate(t, y)?;
                let b = right.evaluate(t, y)?;
                zip(*op, &a, &b)?
            }
            Self::Concat(parts) => {
                let values = parts
                    .iter()
                    .map(|part| part.evaluate(t, y))
                    .collect::<Result<Vec<_>, _>>()?;
                let len = values.iter().map(DVector::len).sum();
                DVector::from_iterator(len, values.iter().flat_map(|v| v.iter().copied()))
            }
            Self::Reduce(reduction, operand) => {
                let x = operand.evaluate(t, y)?;
                let value = match reduction {
                    Reduction::Min => x.iter().copied().fold(f64::INFINITY, f64::min),
                    Reduction::Max => x.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                };
                DVector::from_element(1, value)
            }
        })
    }
}

fn zip(op: BinaryOp, a: &DVector<f64>, b: &DVector<f64>) -> Result<DVector<f64>, DiscretizationError> {
    match (a.len(), b.len()) {
        (1, _) => Ok(b.map(|b| op.apply(a[0], b))),
        (_, 1) => Ok(a.map(|a| op.apply(a, b[0]))),
        (m, n) if m == n => Ok(a.zip_map(b, |a, b| op.apply(a, b))),
        (m, n) => Err(DiscretizationError::ShapeMismatch {
            context: op.name().to_owned(),
            expected: m,
            found: n,
        }),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn scalars_broadcast_against_vectors() {
        let expr = DiscreteExpr::binary(
            BinaryOp::Mul,
            DiscreteExpr::State(1..3),
            DiscreteExpr::Time,
        );
        let y = DVector::from_vec(vec![9.0, 2.0, 3.0]);
        let value = expr.evaluate(2.0, &y).unwrap();
        assert_eq!(value, DVector::from_vec(vec![4.0, 6.0]));
        assert!(expr.depends_on_state());
    }

    #[test]
    fn constants_fold() {
        let expr = DiscreteExpr::binary(
            BinaryOp::Pow,
            DiscreteExpr::Constant(2.0),
            DiscreteExpr::Constant(3.0),
        );
        assert_eq!(expr, DiscreteExpr::Constant(8.0));
    }

    #[test]
    fn reductions_and_functions() {
        let y = DVector::from_vec(vec![0.5, -1.0, 2.0]);
        let min = DiscreteExpr::Reduce(Reduction::Min, Box::new(DiscreteExpr::State(0..3)));
        assert_relative_eq!(min.evaluate(0.0, &y).unwrap()[0], -1.0);

        let exp = DiscreteExpr::Function(Func::Exp, Box::new(DiscreteExpr::State(0..1)));
        assert_relative_eq!(exp.evaluate(0.0, &y).unwrap()[0], 0.5_f64.exp());
    }

    #[test]
    fn short_state_is_a_shape_error() {
        let err = DiscreteExpr::State(0..4)
            .evaluate(0.0, &DVector::zeros(2))
            .unwrap_err();
        assert!(matches!(err, DiscretizationError::ShapeMismatch { .. }));
    }
}
