//! Simulation settings, readable from TOML.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use uom::si::{
    electric_potential::volt,
    f64::{ElectricPotential, Time},
    time::second,
};
use voltaic_discretize::{FiniteVolume, Interpolation, MeshError, Points};
use voltaic_solvers::{
    equation::newton,
    transient::implicit_euler::{self, Mode},
};

/// Errors raised by invalid simulation settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error(transparent)]
    Points(#[from] MeshError),

    #[error("invalid newton settings: {0}")]
    Newton(#[from] newton::ConfigError),

    #[error("invalid solver settings: {0}")]
    Solver(#[from] implicit_euler::ConfigError),

    #[error("`{name}` must be finite, found {value}")]
    NotFinite { name: String, value: f64 },
}

/// How node values are interpolated onto faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceInterpolation {
    #[default]
    Arithmetic,
    Harmonic,
}

impl From<FaceInterpolation> for Interpolation {
    fn from(value: FaceInterpolation) -> Self {
        match value {
            FaceInterpolation::Arithmetic => Interpolation::Arithmetic,
            FaceInterpolation::Harmonic => Interpolation::Harmonic,
        }
    }
}

/// Settings of the reference integrator and of consistent initialization.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    pub mode: Mode,

    /// Largest integration step.
    pub max_step: Time,

    /// How many times a step that fails to converge may be halved.
    pub max_halvings: usize,

    /// Newton tolerance on the largest absolute residual.
    pub tolerance: f64,

    /// Newton iterations per step and for initialization.
    pub max_iters: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Safe,
            max_step: Time::new::<second>(10.0),
            max_halvings: 10,
            tolerance: 1e-8,
            max_iters: 50,
        }
    }
}

impl SolverSettings {
    /// Newton settings used for initialization and for each step.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Newton`] if the tolerance is invalid.
    pub fn newton(&self) -> Result<newton::Config, ConfigError> {
        let defaults = newton::Config::default();
        Ok(newton::Config::new(
            self.max_iters,
            self.tolerance,
            defaults.step_tol(),
            defaults.fd_step(),
        )?)
    }

    /// Integrator settings, with the step scaled by the discharge timescale
    /// in seconds.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the step or tolerance is invalid.
    pub fn integrator(&self, timescale: f64) -> Result<implicit_euler::Config, ConfigError> {
        let max_step = self.max_step.get::<second>() / timescale;
        Ok(implicit_euler::Config::new(max_step, self.max_halvings, self.mode)?
            .with_newton(self.newton()?))
    }
}

/// Everything a [`Simulation`](crate::Simulation) needs besides the model
/// family and options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Cells per direction, keyed by spatial variable (`x_n`, `r_p`, ...).
    pub points: BTreeMap<String, usize>,

    pub interpolation: FaceInterpolation,

    /// Applied current relative to the 1C discharge current.
    pub c_rate: Option<f64>,

    pub lower_cutoff: Option<ElectricPotential>,
    pub upper_cutoff: Option<ElectricPotential>,

    /// Overrides of scalar parameters by name.
    pub parameters: BTreeMap<String, f64>,

    pub solver: SolverSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let points = [
            ("x_n", 20),
            ("x_s", 20),
            ("x_p", 20),
            ("r_n", 30),
            ("r_p", 30),
            ("y", 10),
            ("z", 10),
        ]
        .into_iter()
        .map(|(name, count)| (name.to_owned(), count))
        .collect();
        Self {
            points,
            interpolation: FaceInterpolation::default(),
            c_rate: None,
            lower_cutoff: None,
            upper_cutoff: None,
            parameters: BTreeMap::new(),
            solver: SolverSettings::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration from TOML, filling omitted fields and point
    /// counts with defaults, and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields,
    /// and any error [`SimulationConfig::validate`] reports.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        for (name, count) in Self::default().points {
            config.points.entry(name).or_insert(count);
        }
        config.validate()?;
        Ok(config)
    }

    /// Sets the same point count for every through-cell and radial direction.
    #[must_use]
    pub fn with_uniform_points(mut self, count: usize) -> Self {
        for name in ["x_n", "x_s", "x_p", "r_n", "r_p"] {
            self.points.insert(name.to_owned(), count);
        }
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.solver.mode = mode;
        self
    }

    /// Checks point counts, numeric overrides and solver settings.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mesh_points()?;
        let scalars = self
            .parameters
            .iter()
            .map(|(name, &value)| (name.clone(), value))
            .chain(self.c_rate.map(|value| ("c_rate".to_owned(), value)))
            .chain(self.lower_cutoff.map(|v| ("lower_cutoff".to_owned(), v.get::<volt>())))
            .chain(self.upper_cutoff.map(|v| ("upper_cutoff".to_owned(), v.get::<volt>())));
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        self.solver.integrator(1.0)?;
        Ok(())
    }

    /// Point counts in mesh form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Points`] for unknown names or zero counts.
    pub fn mesh_points(&self) -> Result<Points, ConfigError> {
        Ok(Points::from_named(
            self.points.iter().map(|(name, &count)| (name.as_str(), count)),
        )?)
    }

    #[must_use]
    pub fn method(&self) -> FiniteVolume {
        FiniteVolume::new(self.interpolation.into())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.points["r_n"], 30);
        assert_eq!(config.solver.mode, Mode::Safe);
    }

    #[test]
    fn reads_toml_with_units() {
        let config = SimulationConfig::from_toml_str(
            r#"
            c_rate = 2.0
            lower_cutoff = 3.2
            interpolation = "harmonic"

            [points]
            x_n = 5
            r_p = 8

            [solver]
            mode = "fast"
            max_step = 30.0
            "#,
        )
        .unwrap();

        assert_eq!(config.points["x_n"], 5);
        assert_eq!(config.points["r_p"], 8);
        assert_eq!(config.points["x_s"], 20);
        assert_eq!(config.c_rate, Some(2.0));
        assert_relative_eq!(config.lower_cutoff.unwrap().get::<volt>(), 3.2);
        assert_eq!(config.interpolation, FaceInterpolation::Harmonic);
        assert_eq!(config.solver.mode, Mode::Fast);
        assert_relative_eq!(config.solver.max_step.get::<second>(), 30.0);
        assert_eq!(config.solver.max_halvings, 10);
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = SimulationConfig::from_toml_str("bc_options = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_zero_points() {
        let err = SimulationConfig::from_toml_str("[points]\nx_s = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Points(MeshError::InvalidPoints { count: 0, .. })
        ));
    }

    #[test]
    fn rejects_unknown_spatial_variable() {
        let err = SimulationConfig::from_toml_str("[points]\nq = 3").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Points(MeshError::UnknownSpatialVariable(_))
        ));
    }

    #[test]
    fn rejects_non_positive_step() {
        let err = SimulationConfig::from_toml_str("[solver]\nmax_step = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Solver(_)));
    }

    #[test]
    fn step_scales_with_timescale() {
        let settings = SolverSettings::default();
        let config = settings.integrator(3600.0).unwrap();
        assert_relative_eq!(config.max_step(), 10.0 / 3600.0);
    }

    #[test]
    fn uniform_points_keep_collector_counts() {
        let config = SimulationConfig::default().with_uniform_points(4);
        assert_eq!(config.points["x_s"], 4);
        assert_eq!(config.points["r_p"], 4);
        assert_eq!(config.points["z"], 10);
    }
}
