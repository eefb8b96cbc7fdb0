//! Time integration of DAE problems.
//!
//! Integrators implement [`DaeSolver`]: given a [`DaeProblem`], a consistent
//! initial state and output times, they return a [`Trajectory`] whose
//! [`Status`] says whether the integration completed, stopped at an event,
//! was stopped by the observer, or failed to converge.
//!
//! # Solvers
//!
//! - [`implicit_euler`]: first-order, robust for stiff index-1 systems

mod action;
mod error;
mod event;
mod trajectory;

pub mod implicit_euler;

pub use action::Action;
pub use error::Error;
pub use event::Event;
pub use implicit_euler::ImplicitEuler;
pub use trajectory::{Status, Trajectory};

use nalgebra::DVector;
use voltaic_core::{DaeProblem, Observer};

/// A time integrator for semi-explicit DAE problems.
pub trait DaeSolver {
    /// Integrates `problem` from `y0` at `t_eval[0]`, recording the state at
    /// each entry of `t_eval`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] for invalid inputs or if the problem cannot be
    /// evaluated. Events and non-convergence are reported through
    /// [`Trajectory::status`].
    fn solve<P, Obs>(
        &self,
        problem: &P,
        y0: &DVector<f64>,
        t_eval: &[f64],
        observer: Obs,
    ) -> Result<Trajectory, Error>
    where
        P: DaeProblem,
        Obs: Observer<Event, Action>;

    /// Integrates without observation.
    ///
    /// # Errors
    ///
    /// Returns an error as [`DaeSolver::solve`] does.
    fn solve_unobserved<P: DaeProblem>(
        &self,
        problem: &P,
        y0: &DVector<f64>,
        t_eval: &[f64],
    ) -> Result<Trajectory, Error> {
        self.solve(problem, y0, t_eval, ())
    }
}
