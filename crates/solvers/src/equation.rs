//! Solvers for equation problems: finding roots of systems of equations.
//!
//! A residual function maps `x` to `F(x)`. Solvers in this module drive the
//! residual toward zero.
//!
//! # Solvers
//!
//! - [`newton`]: quadratic convergence from a good starting point

mod jacobian;

pub(crate) use jacobian::{jacobian, max_norm};

pub mod newton;
