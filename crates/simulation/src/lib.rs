//! End-to-end battery simulations.
//!
//! A [`Simulation`] builds a model from a family and options, processes the
//! default parameters, meshes the cell, and discretizes once on first use.
//! Solving makes the algebraic initial state consistent, integrates with the
//! configured solver, and returns a [`Solution`] queried by variable name.
//!
//! ```no_run
//! use voltaic_models::Family;
//! use voltaic_sim::{Simulation, SimulationConfig};
//!
//! let simulation = Simulation::new(Family::Spm, &[], SimulationConfig::default())?;
//! let solution = simulation.solve(&[0.0, 0.05, 0.1])?;
//! let voltage = solution.variable("Terminal voltage [V]")?;
//! println!("{:?}", voltage.series()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod processed;
mod simulation;
mod solution;
mod sweep;

pub use config::{ConfigError, FaceInterpolation, SimulationConfig, SolverSettings};
pub use error::{InitialConditionError, SimulationError, SolutionError};
pub use processed::ProcessedVariable;
pub use simulation::{Simulation, check_initial_state};
pub use solution::Solution;
pub use sweep::{ResolutionSweep, SweepPoint, relative_error};
