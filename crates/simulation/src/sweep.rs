//! Convergence of the reduced model toward the full one as the mesh refines.

use std::collections::BTreeMap;

use log::info;
use ndarray::Array1;
use voltaic_models::Family;

use crate::{
    ProcessedVariable, Simulation, SimulationConfig, SimulationError, Solution, SolutionError,
};

/// Variables compared at every resolution.
const VARIABLES: [&str; 4] = [
    "Terminal voltage",
    "Negative particle surface concentration",
    "Positive particle surface concentration",
    "Negative electrode potential",
];

/// Samples along each axis of the comparison grid.
const SAMPLES: usize = 100;

/// Errors of the SPMe against the DFN at one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub points: usize,
    pub errors: BTreeMap<String, f64>,
}

/// Solves the DFN and SPMe at a sequence of uniform resolutions.
#[derive(Debug, Clone)]
pub struct ResolutionSweep {
    points: Vec<usize>,
    t_eval: Vec<f64>,
    config: SimulationConfig,
}

impl ResolutionSweep {
    #[must_use]
    pub fn new(points: Vec<usize>, t_eval: Vec<f64>) -> Self {
        Self {
            points,
            t_eval,
            config: SimulationConfig::default(),
        }
    }

    /// Base settings; the mesh points are replaced at every resolution.
    #[must_use]
    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs every resolution in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`SimulationError`] from building or solving
    /// either model.
    pub fn run(&self) -> Result<Vec<SweepPoint>, SimulationError> {
        self.points
            .iter()
            .map(|&points| -> Result<SweepPoint, SimulationError> {
                let config = self.config.clone().with_uniform_points(points);
                let reference = Simulation::new(Family::Dfn, &[], config.clone())?.solve(&self.t_eval)?;
                let reduced = Simulation::new(Family::Spme, &[], config)?.solve(&self.t_eval)?;

                let mut errors = BTreeMap::new();
                for name in VARIABLES {
                    errors.insert(name.to_owned(), compare(&reference, &reduced, name)?);
                }
                info!("sweep at {points} points: {errors:?}");
                Ok(SweepPoint { points, errors })
            })
            .collect()
    }
}

/// Relative error of one variable between two solutions.
fn compare(reference: &Solution, other: &Solution, name: &str) -> Result<f64, SolutionError> {
    compare_variables(&reference.variable(name)?, &other.variable(name)?)
}

/// Relative error of two evaluations of one variable, sampled on a shared
/// grid so that meshes and output times of either solution do not matter.
///
/// Times span the range both solutions reached. Profiles are sampled across
/// the outermost nodes of either mesh.
fn compare_variables(
    reference: &ProcessedVariable,
    other: &ProcessedVariable,
) -> Result<f64, SolutionError> {
    let (Some(start), Some(end)) = (
        reference.times().first().zip(other.times().first()).map(|(a, b)| a.max(*b)),
        reference.times().last().zip(other.times().last()).map(|(a, b)| a.min(*b)),
    ) else {
        return Err(SolutionError::ShapeMismatch {
            expected: reference.times().len(),
            found: other.times().len(),
        });
    };
    let times = grid(start, end.max(start));
    let positions = positions(reference, other);

    let sample = |variable: &ProcessedVariable| -> Result<Vec<f64>, SolutionError> {
        let mut values = Vec::with_capacity(times.len() * positions.len());
        for &t in &times {
            for &x in &positions {
                values.push(variable.at(t, x)?);
            }
        }
        Ok(values)
    };
    relative_error(&sample(reference)?, &sample(other)?)
}

/// Evenly spaced samples that end exactly on `end`.
fn grid(start: f64, end: f64) -> Array1<f64> {
    let mut samples = Array1::linspace(start, end, SAMPLES);
    samples[SAMPLES - 1] = end;
    samples
}

/// Sample positions across both profiles; a single dummy position for scalars.
fn positions(reference: &ProcessedVariable, other: &ProcessedVariable) -> Array1<f64> {
    let bounds = [reference, other]
        .into_iter()
        .filter(|variable| !variable.is_scalar())
        .filter_map(|variable| {
            let coordinates = variable.coordinates();
            coordinates.first().copied().zip(coordinates.last().copied())
        })
        .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)));
    match bounds {
        Some((start, end)) => grid(start, end),
        None => Array1::zeros(1),
    }
}

/// Root-sum-square difference relative to the reference.
///
/// Falls back to the absolute difference when the reference is zero.
///
/// # Errors
///
/// Returns [`SolutionError::ShapeMismatch`] if the lengths differ.
pub fn relative_error(reference: &[f64], other: &[f64]) -> Result<f64, SolutionError> {
    if reference.len() != other.len() {
        return Err(SolutionError::ShapeMismatch {
            expected: reference.len(),
            found: other.len(),
        });
    }
    let difference = reference
        .iter()
        .zip(other)
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt();
    let norm = reference.iter().map(|a| a.powi(2)).sum::<f64>().sqrt();
    Ok(if norm > 0.0 { difference / norm } else { difference })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    #[test]
    fn different_output_times_compare_on_a_shared_grid() {
        let fine = ProcessedVariable::from_parts(
            "v",
            array![0.0, 0.5, 1.0],
            array![],
            1,
            array![[1.0, 2.0, 3.0]],
        );
        let coarse =
            ProcessedVariable::from_parts("v", array![0.0, 1.0], array![], 1, array![[1.0, 3.0]]);
        assert_relative_eq!(compare_variables(&fine, &coarse).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn different_meshes_compare_on_a_shared_grid() {
        // u = t + x on two and three nodes.
        let two = ProcessedVariable::from_parts(
            "u",
            array![0.0, 1.0],
            array![0.25, 0.75],
            1,
            array![[0.25, 1.25], [0.75, 1.75]],
        );
        let three = ProcessedVariable::from_parts(
            "u",
            array![0.0, 1.0],
            array![0.25, 0.5, 0.75],
            1,
            array![[0.25, 1.25], [0.5, 1.5], [0.75, 1.75]],
        );
        assert_relative_eq!(compare_variables(&two, &three).unwrap(), 0.0, epsilon = 1e-12);

        let shifted = ProcessedVariable::from_parts(
            "u",
            array![0.0, 1.0],
            array![0.25, 0.5, 0.75],
            1,
            array![[0.35, 1.35], [0.6, 1.6], [0.85, 1.85]],
        );
        assert!(compare_variables(&two, &shifted).unwrap() > 0.0);
    }

    #[test]
    fn only_times_both_reached_are_compared() {
        let full = ProcessedVariable::from_parts(
            "v",
            array![0.0, 0.5, 1.0],
            array![],
            1,
            array![[1.0, 1.0, 9.0]],
        );
        let stopped =
            ProcessedVariable::from_parts("v", array![0.0, 0.5], array![], 1, array![[1.0, 1.0]]);
        assert_relative_eq!(compare_variables(&full, &stopped).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn identical_values_have_no_error() {
        assert_eq!(relative_error(&[1.0, 2.0], &[1.0, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn error_is_relative_to_reference() {
        let error = relative_error(&[3.0, 4.0], &[3.0, 4.5]).unwrap();
        assert_relative_eq!(error, 0.1);
    }

    #[test]
    fn zero_reference_uses_absolute_error() {
        let error = relative_error(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert_relative_eq!(error, 5.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = relative_error(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            SolutionError::ShapeMismatch {
                expected: 1,
                found: 2
            }
        ));
    }
}
