use std::sync::Arc;

use nalgebra::DVector;
use uom::si::{f64::Time, time::second};
use voltaic_discretize::DiscretizedSystem;
use voltaic_solvers::transient::{Status, Trajectory};

use crate::{ProcessedVariable, SolutionError};

/// States at the output times of one solve, queryable by variable name.
///
/// Times are dimensionless; [`Solution::times`] converts them to seconds.
#[derive(Debug, Clone)]
pub struct Solution {
    system: Arc<DiscretizedSystem>,
    t: Vec<f64>,
    y: Vec<DVector<f64>>,
    status: Status,
    steps: usize,
    timescale: f64,
}

impl Solution {
    pub(crate) fn new(system: Arc<DiscretizedSystem>, trajectory: Trajectory, timescale: f64) -> Self {
        let Trajectory { t, y, status, steps } = trajectory;
        Self {
            system,
            t,
            y,
            status,
            steps,
            timescale,
        }
    }

    /// Dimensionless output times.
    #[must_use]
    pub fn t(&self) -> &[f64] {
        &self.t
    }

    #[must_use]
    pub fn times(&self) -> Vec<Time> {
        self.t
            .iter()
            .map(|&t| Time::new::<second>(t * self.timescale))
            .collect()
    }

    #[must_use]
    pub fn states(&self) -> &[DVector<f64>] {
        &self.y
    }

    #[must_use]
    pub fn last_state(&self) -> Option<&DVector<f64>> {
        self.y.last()
    }

    /// How the integration ended. An event means the solution stops short
    /// of the last requested time.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    #[must_use]
    pub fn system(&self) -> &DiscretizedSystem {
        &self.system
    }

    /// Names of every output variable, sorted.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.system.variables().keys().map(String::as_str)
    }

    /// Evaluates a variable at every output time.
    ///
    /// # Errors
    ///
    /// Returns [`SolutionError::UnknownVariable`] if the model has no such
    /// output, or an evaluation error.
    pub fn variable(&self, name: &str) -> Result<ProcessedVariable, SolutionError> {
        let variable = self
            .system
            .variable(name)
            .ok_or_else(|| SolutionError::UnknownVariable(name.to_owned()))?;
        ProcessedVariable::evaluate(name, variable, &self.t, &self.y)
    }
}
