//! Numerical solvers for discretized voltaic models.
//!
//! - [`equation::newton`]: Newton's method for nonlinear systems, used to
//!   make algebraic initial states consistent
//! - [`transient::implicit_euler`]: an implicit Euler DAE integrator with
//!   event detection, behind the [`transient::DaeSolver`] trait

pub mod equation;
pub mod transient;
