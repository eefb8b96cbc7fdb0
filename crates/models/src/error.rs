use thiserror::Error;
use voltaic_core::{ExprError, ModelError, NotImplementedError};

/// An option request that is wrong, as opposed to one not yet supported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown option `{option}` for the {family} model; valid options: {}", .choices.join(", "))]
    UnknownOption {
        option: String,
        family: &'static str,
        choices: Vec<&'static str>,
    },

    #[error("invalid value `{value}` for option `{option}`; valid choices: {}", .choices.join(", "))]
    InvalidValue {
        option: &'static str,
        value: String,
        choices: Vec<&'static str>,
    },

    #[error("option `{option}` = `{value}` {reason}")]
    Inconsistent {
        option: &'static str,
        value: String,
        reason: String,
    },

    #[error("options are not a valid table: {0}")]
    Parse(String),
}

impl OptionError {
    pub(crate) fn invalid(option: &'static str, value: &str, choices: &[&'static str]) -> Self {
        Self::InvalidValue {
            option,
            value: value.to_owned(),
            choices: choices.to_vec(),
        }
    }

    pub(crate) fn inconsistent(
        option: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::Inconsistent {
            option,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by [`build_model`](crate::build_model).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Option(#[from] OptionError),

    #[error(transparent)]
    NotImplemented(#[from] NotImplementedError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl BuildError {
    pub(crate) fn not_implemented(feature: impl Into<String>) -> Self {
        Self::NotImplemented(NotImplementedError::new(feature))
    }
}

impl From<ExprError> for BuildError {
    fn from(err: ExprError) -> Self {
        Self::Model(ModelError::Expr(err))
    }
}
