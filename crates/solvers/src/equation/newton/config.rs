use thiserror::Error;

/// Configuration for the Newton solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_iters: usize,
    residual_tol: f64,
    step_tol: f64,
    fd_step: f64,
}

/// Errors that can occur when validating a Newton solver config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("residual_tol must be finite and non-negative")]
    ResidualTol,

    #[error("step_tol must be finite and non-negative")]
    StepTol,

    #[error("fd_step must be finite and positive")]
    FdStep,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 50,
            residual_tol: 1e-10,
            step_tol: 1e-14,
            fd_step: 1e-7,
        }
    }
}

impl Config {
    /// Creates a new config with validated tolerances.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite, or if the
    /// finite-difference step is not positive.
    pub fn new(
        max_iters: usize,
        residual_tol: f64,
        step_tol: f64,
        fd_step: f64,
    ) -> Result<Self, ConfigError> {
        if !residual_tol.is_finite() || residual_tol < 0.0 {
            return Err(ConfigError::ResidualTol);
        }
        if !step_tol.is_finite() || step_tol < 0.0 {
            return Err(ConfigError::StepTol);
        }
        if !fd_step.is_finite() || fd_step <= 0.0 {
            return Err(ConfigError::FdStep);
        }

        Ok(Self {
            max_iters,
            residual_tol,
            step_tol,
            fd_step,
        })
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the tolerance on the largest absolute residual.
    #[must_use]
    pub fn residual_tol(&self) -> f64 {
        self.residual_tol
    }

    /// Returns the relative step size below which iteration stops.
    #[must_use]
    pub fn step_tol(&self) -> f64 {
        self.step_tol
    }

    /// Returns the relative perturbation of the finite-difference Jacobian.
    #[must_use]
    pub fn fd_step(&self) -> f64 {
        self.fd_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_tolerances() {
        assert_eq!(Config::new(10, -1.0, 0.0, 1e-7), Err(ConfigError::ResidualTol));
        assert_eq!(Config::new(10, 1e-8, f64::NAN, 1e-7), Err(ConfigError::StepTol));
        assert_eq!(Config::new(10, 1e-8, 0.0, 0.0), Err(ConfigError::FdStep));
        assert!(Config::new(10, 0.0, 0.0, 1e-7).is_ok());
    }
}
