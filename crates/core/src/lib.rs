//! Core types for building battery models.
//!
//! This crate defines the shared abstractions the rest of the workspace
//! builds on:
//!
//! - [`Symbol`]: a domain-tagged symbolic expression node
//! - [`Model`]: equations, conditions, events, and outputs, assembled
//!   through a [`ModelBuilder`] and checked by [`Model::check_well_posedness`]
//! - [`CouplingGraph`]: orders sub-models by the variables they share
//! - [`ParameterValues`]: replaces named parameters by values
//! - [`DaeProblem`]: the interface a time integrator consumes
//! - [`Observer`]: receives solver events and optionally returns actions

mod domain;
mod expr;
mod graph;
mod model;
mod not_implemented;
mod observer;
mod parameters;
mod problems;

pub use domain::{Domain, SpatialVariable, SubDomain};
pub use expr::{
    BinaryOp, Bindings, Expr, ExprError, Func, Reduction, Side, Symbol, Value, Variable,
};
pub use graph::CouplingGraph;
pub use model::{
    BoundaryCondition, BoundaryConditions, BoundaryKind, Event, EventKind, Model, ModelBuilder,
    ModelError,
};
pub use not_implemented::NotImplementedError;
pub use observer::Observer;
pub use parameters::{ParameterFn, ParameterValue, ParameterValues};
pub use problems::DaeProblem;
