//! Building, discretizing and solving one model.

use std::sync::{Arc, OnceLock};

use log::{debug, info};
use nalgebra::DVector;
use uom::si::{electric_potential::volt, f64::Time, time::second};
use voltaic_core::{DaeProblem, Model, ParameterValues};
use voltaic_discretize::{DiscretizationError, DiscretizedSystem, Geometry, Mesh, discretize};
use voltaic_models::{Family, Options, build, parameters};
use voltaic_solvers::{
    equation::{newton, newton::Status as NewtonStatus},
    transient::{DaeSolver, ImplicitEuler},
};

use crate::{InitialConditionError, SimulationConfig, SimulationError, Solution};

/// One model on one mesh, discretized on first use.
#[derive(Debug)]
pub struct Simulation {
    options: Options,
    model: Model,
    processed: Model,
    parameters: ParameterValues,
    mesh: Mesh,
    config: SimulationConfig,
    timescale: f64,
    system: OnceLock<Result<Arc<DiscretizedSystem>, DiscretizationError>>,
}

impl Simulation {
    /// Builds and checks the model, processes parameters, and meshes the cell.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulationError`] if the options are invalid or
    /// unsupported, the model is not well posed, a parameter is missing, or
    /// the configuration cannot be meshed.
    pub fn new(
        family: Family,
        options: &[(&str, &str)],
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let options = Options::parse(family, options.iter().copied())
            .map_err(voltaic_models::BuildError::from)?;
        Self::from_options(options, config)
    }

    /// Like [`Simulation::new`], from already validated options.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulationError`] as [`Simulation::new`] does.
    pub fn from_options(options: Options, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let model = build(&options)?;
        model.check_well_posedness()?;
        info!(
            "built {} model: {} differential and {} algebraic states",
            model.name(),
            model.rhs().len(),
            model.algebraic().len()
        );

        let values = parameter_values(options.family(), &config)?;
        let processed = values.process_model(&model)?;
        let timescale = values.scalar(parameters::names::TIMESCALE)?;

        let geometry = Geometry::battery(&values, options.dimensionality.value())?;
        let mesh = Mesh::new(&geometry, &config.mesh_points()?)?;
        info!("built mesh for {} sub-domains", geometry.sub_domains().count());

        Ok(Self {
            options,
            model,
            processed,
            parameters: values,
            mesh,
            config,
            timescale,
            system: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The model as built, before parameter processing.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterValues {
        &self.parameters
    }

    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Seconds per unit of dimensionless time.
    #[must_use]
    pub fn timescale(&self) -> f64 {
        self.timescale
    }

    /// Converts a time span to dimensionless time.
    #[must_use]
    pub fn dimensionless(&self, time: Time) -> f64 {
        time.get::<second>() / self.timescale
    }

    /// The discretized system, built on the first call and shared afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Discretization`] if the model cannot be
    /// discretized on the mesh. The error is cached like a success.
    pub fn discretized(&self) -> Result<Arc<DiscretizedSystem>, SimulationError> {
        let system = self.system.get_or_init(|| {
            let system = discretize(&self.processed, &self.mesh, &self.config.method())?;
            info!(
                "discretized {}: {} states ({} algebraic), {} events",
                system.name(),
                system.size(),
                system.algebraic_size(),
                system.event_count()
            );
            Ok(Arc::new(system))
        });
        Ok(system.clone()?)
    }

    /// Solves at dimensionless output times with the configured integrator.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InitialCondition`] if the algebraic initial
    /// state cannot be made consistent, and any discretization or solver
    /// error.
    pub fn solve(&self, t_eval: &[f64]) -> Result<Solution, SimulationError> {
        let solver = ImplicitEuler::new(self.config.solver.integrator(self.timescale)?);
        self.solve_with(&solver, t_eval)
    }

    /// Solves from rest until `end`, reporting `outputs` evenly spaced times.
    ///
    /// # Errors
    ///
    /// Returns an error as [`Simulation::solve`] does.
    pub fn solve_until(&self, end: Time, outputs: usize) -> Result<Solution, SimulationError> {
        let end = self.dimensionless(end);
        let count = outputs.max(2);
        let t_eval: Vec<f64> = (0..count)
            .map(|i| end * i as f64 / (count - 1) as f64)
            .collect();
        self.solve(&t_eval)
    }

    /// Solves with an explicitly chosen solver.
    ///
    /// # Errors
    ///
    /// Returns an error as [`Simulation::solve`] does.
    pub fn solve_with<S: DaeSolver>(&self, solver: &S, t_eval: &[f64]) -> Result<Solution, SimulationError> {
        let system = self.discretized()?;
        let t0 = t_eval.first().copied().unwrap_or_default();
        let y0 = self.consistent_state(&system, t0)?;
        self.integrate(solver, system, &y0, t_eval)
    }

    /// Solves from a caller-supplied state, which must already satisfy the
    /// algebraic equations.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::InitialCondition`] if it does not, before
    /// the solver is invoked.
    pub fn solve_from(&self, y0: &DVector<f64>, t_eval: &[f64]) -> Result<Solution, SimulationError> {
        let system = self.discretized()?;
        let t0 = t_eval.first().copied().unwrap_or_default();
        check_initial_state(&*system, t0, y0, self.config.solver.tolerance)?;
        let solver = ImplicitEuler::new(self.config.solver.integrator(self.timescale)?);
        self.integrate(&solver, system, y0, t_eval)
    }

    fn integrate<S: DaeSolver>(
        &self,
        solver: &S,
        system: Arc<DiscretizedSystem>,
        y0: &DVector<f64>,
        t_eval: &[f64],
    ) -> Result<Solution, SimulationError> {
        let trajectory = solver.solve_unobserved(&*system, y0, t_eval)?;
        info!(
            "solved {} to t = {} in {} steps: {:?}",
            system.name(),
            trajectory.t.last().copied().unwrap_or_default(),
            trajectory.steps,
            trajectory.status
        );
        Ok(Solution::new(system, trajectory, self.timescale))
    }

    /// Solves the algebraic equations for the algebraic states at `t0`,
    /// holding the differential states at their initial values.
    fn consistent_state(
        &self,
        system: &DiscretizedSystem,
        t0: f64,
    ) -> Result<DVector<f64>, SimulationError> {
        let y0 = system.initial_state().clone();
        let algebraic: Vec<usize> = (0..system.size()).filter(|&i| system.is_algebraic(i)).collect();
        if algebraic.is_empty() {
            return Ok(y0);
        }

        let settings = &self.config.solver;
        let z0 = DVector::from_iterator(algebraic.len(), algebraic.iter().map(|&i| y0[i]));
        let residual = |z: &DVector<f64>| -> Result<DVector<f64>, DiscretizationError> {
            let mut y = y0.clone();
            for (k, &i) in algebraic.iter().enumerate() {
                y[i] = z[k];
            }
            let f = system.rhs_algebraic(t0, &y)?;
            Ok(DVector::from_iterator(algebraic.len(), algebraic.iter().map(|&i| f[i])))
        };
        let solution = newton::solve_unobserved(residual, z0, &settings.newton()?)?;
        debug!(
            "initialization: {:?} after {} iterations, residual {:e}",
            solution.status, solution.iters, solution.residual_norm
        );
        if solution.status != NewtonStatus::Converged {
            return Err(InitialConditionError {
                residual_norm: solution.residual_norm,
                tolerance: settings.tolerance,
            }
            .into());
        }

        let mut y = y0;
        for (k, &i) in algebraic.iter().enumerate() {
            y[i] = solution.x[k];
        }
        Ok(y)
    }
}

/// Checks that `y` satisfies the algebraic equations of `problem` at `t`.
///
/// # Errors
///
/// Returns [`SimulationError::InitialCondition`] if the largest algebraic
/// residual exceeds `tolerance`, or a problem error if it cannot be
/// evaluated.
pub fn check_initial_state<P>(
    problem: &P,
    t: f64,
    y: &DVector<f64>,
    tolerance: f64,
) -> Result<(), SimulationError>
where
    P: DaeProblem,
    SimulationError: From<P::Error>,
{
    let f = problem.rhs_algebraic(t, y)?;
    let residual_norm = (0..problem.size())
        .filter(|&i| problem.is_algebraic(i))
        .map(|i| f[i].abs())
        .fold(0.0, |norm: f64, value| if value.is_nan() { f64::INFINITY } else { norm.max(value) });
    if residual_norm > tolerance {
        return Err(InitialConditionError {
            residual_norm,
            tolerance,
        }
        .into());
    }
    Ok(())
}

/// The family's default parameters with the configuration's overrides.
fn parameter_values(family: Family, config: &SimulationConfig) -> Result<ParameterValues, SimulationError> {
    use parameters::names;

    let mut values = parameters::for_family(family);
    let thermal_voltage = values.scalar(names::THERMAL_VOLTAGE)?;
    if let Some(c_rate) = config.c_rate {
        values.insert(names::CURRENT, c_rate);
    }
    if let Some(cutoff) = config.lower_cutoff {
        values.insert(names::LOWER_CUTOFF, cutoff.get::<volt>() / thermal_voltage);
    }
    if let Some(cutoff) = config.upper_cutoff {
        values.insert(names::UPPER_CUTOFF, cutoff.get::<volt>() / thermal_voltage);
    }
    for (name, &value) in &config.parameters {
        values.insert(name, value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use voltaic_solvers::transient::{Status, implicit_euler::Mode};

    use super::*;

    fn small() -> SimulationConfig {
        SimulationConfig::default().with_uniform_points(4)
    }

    #[test]
    fn discretizes_once() {
        let simulation = Simulation::new(Family::Spm, &[], small()).unwrap();
        let first = simulation.discretized().unwrap();
        let again = simulation.discretized().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.algebraic_size(), 0);
    }

    #[test]
    fn spm_discharge_lowers_voltage() {
        let simulation = Simulation::new(Family::Spm, &[], small()).unwrap();
        let solution = simulation.solve(&[0.0, 0.01, 0.02]).unwrap();

        assert_eq!(*solution.status(), Status::Complete);
        let voltage = solution.variable("Terminal voltage [V]").unwrap();
        let series = voltage.series().unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|v| v.is_finite()), "{series:?}");
        assert!(series[2] < series[0], "{series:?}");
    }

    #[test]
    fn parameter_overrides_apply() {
        let mut config = small();
        config.c_rate = Some(2.0);
        config.lower_cutoff = Some(uom::si::f64::ElectricPotential::new::<volt>(3.3));
        let simulation = Simulation::new(Family::Spm, &[], config).unwrap();

        assert_relative_eq!(simulation.parameters().scalar(parameters::names::CURRENT).unwrap(), 2.0);
        let thermal_voltage = simulation.parameters().scalar(parameters::names::THERMAL_VOLTAGE).unwrap();
        assert_relative_eq!(
            simulation.parameters().scalar(parameters::names::LOWER_CUTOFF).unwrap() * thermal_voltage,
            3.3,
            epsilon = 1e-12
        );
    }

    #[test]
    fn time_conversion_uses_timescale() {
        let simulation = Simulation::new(Family::Spm, &[], small()).unwrap();
        assert_relative_eq!(simulation.dimensionless(Time::new::<second>(360.0)), 0.1);
    }

    #[test]
    fn inconsistent_state_is_rejected_before_solving() {
        let simulation = Simulation::new(Family::Dfn, &[], small()).unwrap();
        let system = simulation.discretized().unwrap();
        let mut y0 = system.initial_state().clone();
        let algebraic = (0..y0.len()).find(|&i| system.is_algebraic(i)).unwrap();
        y0[algebraic] += 10.0;

        let err = simulation.solve_from(&y0, &[0.0, 0.01]).unwrap_err();
        assert!(matches!(err, SimulationError::InitialCondition(_)), "{err}");
    }

    #[test]
    fn dfn_initialization_is_consistent() {
        let config = small().with_mode(Mode::Fast);
        let simulation = Simulation::new(Family::Dfn, &[], config).unwrap();
        let solution = simulation.solve(&[0.0, 0.005]).unwrap();

        assert_eq!(*solution.status(), Status::Complete);
        let system = simulation.discretized().unwrap();
        check_initial_state(&*system, 0.0, &solution.states()[0], 1e-6).unwrap();
    }

    #[test]
    fn invalid_options_fail_early() {
        let err = Simulation::new(Family::Dfn, &[("electrolyte conductivity", "integrated")], small())
            .unwrap_err();
        assert!(err.to_string().contains("electrolyte conductivity"), "{err}");
    }
}
