//! Symbolic expression trees for battery models.
//!
//! A [`Symbol`] is an immutable, cheaply clonable node. Every node carries a
//! [`Domain`] tag, and compositions check those tags when the node is built,
//! so mismatched spatial operands are rejected at model-build time rather
//! than when numbers first flow through the tree.
//!
//! ```text
//! c_e (through-cell) ──grad──► faces ──div──► nodes
//!        │
//!        └── restrict(negative electrode) ──► pointwise kinetics
//! ```

mod compose;
mod differentiate;
mod error;
mod evaluate;
mod transform;

use std::{fmt, sync::Arc};

pub use error::ExprError;
pub use evaluate::{Bindings, Value};

use crate::{Domain, SpatialVariable};

/// A state variable of a model.
///
/// Variables are identified by name and domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: Arc<str>,
    domain: Domain,
}

impl Variable {
    #[must_use]
    pub fn new(name: &str, domain: Domain) -> Self {
        Self {
            name: Arc::from(name),
            domain,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the symbol that refers to this variable.
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        Symbol::variable(self)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Elementwise functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Exp,
    Log,
    Sqrt,
    Sinh,
    Cosh,
    Tanh,
    Arcsinh,
    Abs,
    Sign,
}

impl Func {
    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Sqrt => x.sqrt(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Tanh => x.tanh(),
            Self::Arcsinh => x.asinh(),
            Self::Abs => x.abs(),
            Self::Sign => {
                if x == 0.0 {
                    0.0
                } else {
                    x.signum()
                }
            }
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sqrt => "sqrt",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Arcsinh => "arcsinh",
            Self::Abs => "abs",
            Self::Sign => "sign",
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    #[must_use]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Pow => a.powf(b),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "addition",
            Self::Sub => "subtraction",
            Self::Mul => "multiplication",
            Self::Div => "division",
            Self::Pow => "power",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }
}

/// Reductions of a spatially distributed quantity to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    Min,
    Max,
}

/// An edge of a one-dimensional domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

/// The kinds of node in an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Parameter(String),
    /// A named parameter whose value is a function of other symbols.
    FunctionParameter {
        name: String,
        args: Vec<Symbol>,
    },
    Variable(Variable),
    Time,
    Coordinate(SpatialVariable),
    Function(Func, Symbol),
    Binary(BinaryOp, Symbol, Symbol),
    Gradient(Symbol),
    Divergence(Symbol),
    Integral(Symbol),
    BoundaryValue(Side, Symbol),
    Broadcast(Symbol),
    Restrict(Symbol),
    Concatenation(Vec<Symbol>),
    Reduce(Reduction, Symbol),
}

#[derive(Debug, PartialEq)]
struct Node {
    expr: Expr,
    domain: Domain,
}

/// An immutable expression node with a domain tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol(Arc<Node>);

impl Symbol {
    fn from_parts(expr: Expr, domain: Domain) -> Self {
        Self(Arc::new(Node { expr, domain }))
    }

    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::from_parts(Expr::Constant(value), Domain::scalar())
    }

    #[must_use]
    pub fn parameter(name: &str) -> Self {
        Self::from_parts(Expr::Parameter(name.to_owned()), Domain::scalar())
    }

    /// Builds a function parameter evaluated at `args`.
    ///
    /// The result lives on the domain of its non-scalar arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::DomainMismatch`] if the arguments are on
    /// incompatible domains.
    pub fn function_parameter(name: &str, args: Vec<Symbol>) -> Result<Self, ExprError> {
        let mut domain = Domain::scalar();
        for arg in &args {
            if !domain.is_compatible(arg.domain()) {
                return Err(ExprError::DomainMismatch {
                    operation: "function parameter",
                    left: domain,
                    right: arg.domain().clone(),
                });
            }
            if domain.is_scalar() {
                domain = arg.domain().clone();
            }
        }
        Ok(Self::from_parts(
            Expr::FunctionParameter {
                name: name.to_owned(),
                args,
            },
            domain,
        ))
    }

    #[must_use]
    pub fn variable(variable: &Variable) -> Self {
        Self::from_parts(
            Expr::Variable(variable.clone()),
            variable.domain().clone(),
        )
    }

    #[must_use]
    pub fn time() -> Self {
        Self::from_parts(Expr::Time, Domain::scalar())
    }

    /// The coordinate `var` sampled across `domain`.
    #[must_use]
    pub fn coordinate(var: SpatialVariable, domain: Domain) -> Self {
        Self::from_parts(Expr::Coordinate(var), domain)
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.0.expr
    }

    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.0.domain
    }

    /// Returns the value if this node is a constant.
    #[must_use]
    pub fn as_constant(&self) -> Option<f64> {
        match self.expr() {
            Expr::Constant(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the variable if this node refers to one directly.
    #[must_use]
    pub fn as_variable(&self) -> Option<&Variable> {
        match self.expr() {
            Expr::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    /// Returns the direct children of this node.
    #[must_use]
    pub fn children(&self) -> Vec<&Symbol> {
        match self.expr() {
            Expr::Constant(_)
            | Expr::Parameter(_)
            | Expr::Variable(_)
            | Expr::Time
            | Expr::Coordinate(_) => Vec::new(),
            Expr::FunctionParameter { args, .. } => args.iter().collect(),
            Expr::Concatenation(parts) => parts.iter().collect(),
            Expr::Function(_, child)
            | Expr::Gradient(child)
            | Expr::Divergence(child)
            | Expr::Integral(child)
            | Expr::BoundaryValue(_, child)
            | Expr::Broadcast(child)
            | Expr::Restrict(child)
            | Expr::Reduce(_, child) => vec![child],
            Expr::Binary(_, left, right) => vec![left, right],
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr() {
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Parameter(name) => write!(f, "{name}"),
            Expr::FunctionParameter { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::Variable(variable) => write!(f, "{variable}"),
            Expr::Time => f.write_str("t"),
            Expr::Coordinate(var) => write!(f, "{var}"),
            Expr::Function(func, child) => write!(f, "{}({child})", func.name()),
            Expr::Binary(op, left, right) => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Gradient(child) => write!(f, "grad({child})"),
            Expr::Divergence(child) => write!(f, "div({child})"),
            Expr::Integral(child) => write!(f, "integral({child})"),
            Expr::BoundaryValue(side, child) => write!(f, "boundary_value({child}, {side})"),
            Expr::Broadcast(child) => write!(f, "broadcast({child})"),
            Expr::Restrict(child) => write!(f, "{child}|{}", self.domain()),
            Expr::Concatenation(parts) => {
                f.write_str("concat(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
            Expr::Reduce(Reduction::Min, child) => write!(f, "min({child})"),
            Expr::Reduce(Reduction::Max, child) => write!(f, "max({child})"),
        }
    }
}

impl From<f64> for Symbol {
    fn from(value: f64) -> Self {
        Symbol::constant(value)
    }
}

impl From<&Variable> for Symbol {
    fn from(variable: &Variable) -> Self {
        Symbol::variable(variable)
    }
}
