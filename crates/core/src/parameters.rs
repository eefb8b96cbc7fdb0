//! Replacing named parameters by values.

use std::{collections::BTreeMap, fmt, sync::Arc};

use log::debug;

use crate::{Expr, ExprError, Model, Symbol};

/// A function parameter, called with the processed argument symbols.
pub type ParameterFn = Arc<dyn Fn(&[Symbol]) -> Result<Symbol, ExprError> + Send + Sync>;

/// The value bound to a parameter name.
#[derive(Clone)]
pub enum ParameterValue {
    Scalar(f64),
    /// A symbolic value, for example a current that depends on time.
    Expression(Symbol),
    /// A function of state, such as an open-circuit potential.
    Function(ParameterFn),
}

impl fmt::Debug for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "Scalar({value})"),
            Self::Expression(symbol) => write!(f, "Expression({symbol})"),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Symbol> for ParameterValue {
    fn from(symbol: Symbol) -> Self {
        Self::Expression(symbol)
    }
}

/// A named set of parameter values.
#[derive(Debug, Clone, Default)]
pub struct ParameterValues {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing any existing value.
    pub fn insert(&mut self, name: &str, value: impl Into<ParameterValue>) -> &mut Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    /// Sets a function parameter.
    pub fn insert_function<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&[Symbol]) -> Result<Symbol, ExprError> + Send + Sync + 'static,
    {
        self.values
            .insert(name.to_owned(), ParameterValue::Function(Arc::new(f)));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Returns the value of a scalar parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UndefinedSymbol`] if the name is unknown, or
    /// [`ExprError::InvalidParameter`] if it is not a number.
    pub fn scalar(&self, name: &str) -> Result<f64, ExprError> {
        match self.values.get(name) {
            Some(ParameterValue::Scalar(value)) => Ok(*value),
            Some(ParameterValue::Expression(symbol)) => self
                .process_symbol(symbol)?
                .evaluate_constant()
                .map_err(|_| invalid(name, "is not a constant")),
            Some(ParameterValue::Function(_)) => Err(invalid(name, "is a function")),
            None => Err(ExprError::UndefinedSymbol(name.to_owned())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Replaces every parameter in `symbol` by its value.
    ///
    /// Function parameters are called with their processed arguments, and
    /// whatever they return is processed too.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError::UndefinedSymbol`] for unknown names and
    /// [`ExprError::InvalidParameter`] when a scalar is used as a function
    /// or the other way around.
    pub fn process_symbol(&self, symbol: &Symbol) -> Result<Symbol, ExprError> {
        symbol.rebuild(&mut |node| match node.expr() {
            Expr::Parameter(name) => match self.values.get(name) {
                Some(ParameterValue::Scalar(value)) => Ok(Some(Symbol::constant(*value))),
                Some(ParameterValue::Expression(expr)) => self.process_symbol(expr).map(Some),
                Some(ParameterValue::Function(_)) => {
                    Err(invalid(name, "is a function and needs arguments"))
                }
                None => Err(ExprError::UndefinedSymbol(name.clone())),
            },
            Expr::FunctionParameter { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.process_symbol(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match self.values.get(name) {
                    Some(ParameterValue::Function(f)) => {
                        let value = f(&args)?;
                        self.process_symbol(&value).map(Some)
                    }
                    Some(ParameterValue::Scalar(value)) => Ok(Some(Symbol::constant(*value))),
                    Some(ParameterValue::Expression(_)) => {
                        Err(invalid(name, "is an expression, not a function"))
                    }
                    None => Err(ExprError::UndefinedSymbol(name.clone())),
                }
            }
            _ => Ok(None),
        })
    }

    /// Returns a copy of `model` with every parameter replaced.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::process_symbol`].
    pub fn process_model(&self, model: &Model) -> Result<Model, ExprError> {
        let processed = model.try_map_symbols(&mut |symbol| self.process_symbol(symbol))?;
        debug!("processed parameters of model `{}`", model.name());
        Ok(processed)
    }
}

fn invalid(name: &str, reason: &str) -> ExprError {
    ExprError::InvalidParameter {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{Bindings, Domain, Value, Variable};

    fn values() -> ParameterValues {
        let mut values = ParameterValues::new();
        values
            .insert("a", 2.0)
            .insert("b", Symbol::parameter("a") * 3.0)
            .insert_function("square", |args: &[Symbol]| {
                let [x] = args else {
                    return Err(ExprError::InvalidParameter {
                        name: "square".into(),
                        reason: "expects one argument".into(),
                    });
                };
                x.times(x)
            });
        values
    }

    #[test]
    fn scalars_and_expressions_become_constants() {
        let sum = Symbol::parameter("a")
            .plus(&Symbol::parameter("b"))
            .unwrap();
        let processed = values().process_symbol(&sum).unwrap();
        assert_eq!(processed.as_constant(), Some(8.0));

        let b = values().process_symbol(&Symbol::parameter("b")).unwrap();
        assert_eq!(b.as_constant(), Some(6.0));
    }

    #[test]
    fn functions_receive_processed_arguments() {
        let c = Variable::new("c", Domain::scalar());
        let call = Symbol::function_parameter("square", vec![c.symbol()]).unwrap();
        let processed = values().process_symbol(&call).unwrap();
        let value = processed
            .evaluate(&Bindings::new().with_variable("c", Value::Scalar(1.5)))
            .unwrap();
        assert_relative_eq!(value.as_scalar().unwrap(), 2.25);

        let call = Symbol::function_parameter("square", vec![Symbol::parameter("a")]).unwrap();
        let processed = values().process_symbol(&call).unwrap();
        assert_eq!(processed.as_constant(), Some(4.0));
    }

    #[test]
    fn unknown_and_misused_names_fail() {
        let err = values().process_symbol(&Symbol::parameter("missing")).unwrap_err();
        assert_eq!(err, ExprError::UndefinedSymbol("missing".into()));

        let err = values().process_symbol(&Symbol::parameter("square")).unwrap_err();
        assert!(matches!(err, ExprError::InvalidParameter { .. }));

        assert_eq!(values().scalar("b").unwrap(), 6.0);
        assert!(values().scalar("square").is_err());
    }
}
