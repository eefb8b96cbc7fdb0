use serde::Deserialize;
use thiserror::Error;

use crate::equation::newton;

/// Whether termination events are honoured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ignore events and integrate to the last output time.
    Fast,

    /// Stop at the first event crossing.
    #[default]
    Safe,
}

/// Configuration for the implicit Euler integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_step: f64,
    max_halvings: usize,
    mode: Mode,
    newton: newton::Config,
}

/// Errors that can occur when validating an implicit Euler config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_step must be finite and positive")]
    MaxStep,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_step: 1e-3,
            max_halvings: 10,
            mode: Mode::Safe,
            newton: newton::Config::default(),
        }
    }
}

impl Config {
    /// Creates a new config with a validated step size.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_step` is not finite and positive.
    pub fn new(max_step: f64, max_halvings: usize, mode: Mode) -> Result<Self, ConfigError> {
        if !max_step.is_finite() || max_step <= 0.0 {
            return Err(ConfigError::MaxStep);
        }
        Ok(Self {
            max_step,
            max_halvings,
            mode,
            newton: newton::Config::default(),
        })
    }

    /// Replaces the Newton settings used for each step.
    #[must_use]
    pub fn with_newton(mut self, newton: newton::Config) -> Self {
        self.newton = newton;
        self
    }

    /// Returns the largest step taken, in problem time units.
    #[must_use]
    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Returns how many times a failed step may be halved.
    #[must_use]
    pub fn max_halvings(&self) -> usize {
        self.max_halvings
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn newton(&self) -> &newton::Config {
        &self.newton
    }
}
