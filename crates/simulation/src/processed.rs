//! Output variables evaluated over a solution.

use nalgebra::DVector;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use ninterp::{
    interpolator::Extrapolate,
    prelude::{Interp1DOwned, Interpolator},
    strategy::Linear,
};
use voltaic_discretize::DiscretizedVariable;

use crate::SolutionError;

/// An output variable evaluated at every solution time.
///
/// Entries are stored one row per mesh entry and one column per time. A
/// variable on a primary domain with a secondary domain holds one profile per
/// secondary point, stored one after another.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedVariable {
    name: String,
    times: Array1<f64>,
    coordinates: Array1<f64>,
    secondary: usize,
    entries: Array2<f64>,
}

impl ProcessedVariable {
    pub(crate) fn evaluate(
        name: &str,
        variable: &DiscretizedVariable,
        times: &[f64],
        states: &[DVector<f64>],
    ) -> Result<Self, SolutionError> {
        let len = variable.len().max(1);
        let mut entries = Array2::zeros((len, times.len()));
        for (column, (&t, y)) in times.iter().zip(states).enumerate() {
            let value = variable.evaluate(t, y)?;
            if value.len() != len {
                return Err(SolutionError::ShapeMismatch {
                    expected: len,
                    found: value.len(),
                });
            }
            for (row, v) in value.iter().enumerate() {
                entries[(row, column)] = *v;
            }
        }
        Ok(Self::from_parts(
            name,
            Array1::from(times.to_vec()),
            Array1::from_iter(variable.coordinates().iter().copied()),
            variable.secondary_points().max(1),
            entries,
        ))
    }

    pub(crate) fn from_parts(
        name: &str,
        times: Array1<f64>,
        coordinates: Array1<f64>,
        secondary: usize,
        entries: Array2<f64>,
    ) -> Self {
        Self {
            name: name.to_owned(),
            times,
            coordinates,
            secondary,
            entries,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    /// Primary coordinates of one profile, empty for scalars.
    #[must_use]
    pub fn coordinates(&self) -> &Array1<f64> {
        &self.coordinates
    }

    /// All entries, one row per mesh entry and one column per time.
    #[must_use]
    pub fn entries(&self) -> &Array2<f64> {
        &self.entries
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.entries.nrows() == 1
    }

    /// The time series of a scalar variable.
    ///
    /// # Errors
    ///
    /// Returns [`SolutionError::NotScalar`] for spatially resolved variables.
    pub fn series(&self) -> Result<ArrayView1<'_, f64>, SolutionError> {
        if !self.is_scalar() {
            return Err(SolutionError::NotScalar {
                name: self.name.clone(),
                len: self.entries.nrows(),
            });
        }
        Ok(self.entries.row(0))
    }

    /// Interpolates every entry linearly in time.
    ///
    /// # Errors
    ///
    /// Returns [`SolutionError::OutOfRange`] for times outside the solution.
    pub fn at_times(&self, t: &[f64]) -> Result<Array2<f64>, SolutionError> {
        let mut values = Array2::zeros((self.entries.nrows(), t.len()));
        for (row, series) in self.entries.axis_iter(Axis(0)).enumerate() {
            let series = series.to_owned();
            for (column, &time) in t.iter().enumerate() {
                values[(row, column)] = interpolate(&self.times, &series, time, "time", false)?;
            }
        }
        Ok(values)
    }

    /// Interpolates linearly in time, then in space along the profile.
    ///
    /// Positions between the outermost node and the domain edge take the
    /// nearest node value. Scalars ignore `x`.
    ///
    /// # Errors
    ///
    /// Returns [`SolutionError::OutOfRange`] for times outside the solution
    /// and [`SolutionError::SecondaryProfiles`] for variables holding more
    /// than one profile, and [`SolutionError::ShapeMismatch`] when the
    /// coordinates do not match the profile length.
    pub fn at(&self, t: f64, x: f64) -> Result<f64, SolutionError> {
        if self.secondary > 1 {
            return Err(SolutionError::SecondaryProfiles {
                name: self.name.clone(),
                secondary: self.secondary,
            });
        }
        let profile = self.at_times(&[t])?.column(0).to_owned();
        if self.is_scalar() {
            return Ok(profile[0]);
        }
        if self.coordinates.len() != profile.len() {
            return Err(SolutionError::ShapeMismatch {
                expected: self.coordinates.len(),
                found: profile.len(),
            });
        }
        interpolate(&self.coordinates, &profile, x, "position", true)
    }
}

/// Linear interpolation on a strictly increasing grid.
fn interpolate(
    grid: &Array1<f64>,
    values: &Array1<f64>,
    at: f64,
    quantity: &'static str,
    clamp: bool,
) -> Result<f64, SolutionError> {
    let (Some(&min), Some(&max)) = (grid.first(), grid.last()) else {
        return Err(SolutionError::ShapeMismatch {
            expected: 1,
            found: 0,
        });
    };
    if !clamp && !(min..=max).contains(&at) {
        return Err(SolutionError::OutOfRange {
            quantity,
            value: at,
            min,
            max,
        });
    }
    if grid.len() == 1 {
        return Ok(values[0]);
    }
    let extrapolate = if clamp {
        Extrapolate::Clamp
    } else {
        Extrapolate::Error
    };
    let interp = Interp1DOwned::new(grid.clone(), values.clone(), Linear, extrapolate)?;
    Ok(interp.interpolate(&[at])?)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::array;

    use super::*;

    fn profile() -> ProcessedVariable {
        // Two nodes at x = 0.25 and 0.75, sampled at t = 0 and 1.
        ProcessedVariable::from_parts(
            "c",
            array![0.0, 1.0],
            array![0.25, 0.75],
            1,
            array![[1.0, 3.0], [2.0, 6.0]],
        )
    }

    #[test]
    fn interpolates_in_time() {
        let values = profile().at_times(&[0.5]).unwrap();
        assert_relative_eq!(values[(0, 0)], 2.0);
        assert_relative_eq!(values[(1, 0)], 4.0);
    }

    #[test]
    fn interpolates_in_time_and_space() {
        let variable = profile();
        assert_relative_eq!(variable.at(0.5, 0.5).unwrap(), 3.0);
        assert_relative_eq!(variable.at(1.0, 0.0).unwrap(), 3.0);
        assert_relative_eq!(variable.at(1.0, 1.0).unwrap(), 6.0);
    }

    #[test]
    fn profile_without_matching_coordinates_is_rejected() {
        let variable = ProcessedVariable::from_parts(
            "c",
            array![0.0, 1.0],
            array![0.25, 0.5, 0.75],
            1,
            array![[1.0, 3.0], [2.0, 6.0]],
        );
        assert!(matches!(
            variable.at(0.5, 0.5),
            Err(SolutionError::ShapeMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn rejects_times_outside_solution() {
        let err = profile().at_times(&[1.5]).unwrap_err();
        assert!(matches!(err, SolutionError::OutOfRange { quantity: "time", .. }));
    }

    #[test]
    fn series_requires_scalar() {
        assert!(matches!(profile().series(), Err(SolutionError::NotScalar { len: 2, .. })));

        let scalar = ProcessedVariable::from_parts(
            "V",
            array![0.0, 1.0],
            Array1::zeros(0),
            1,
            array![[4.0, 3.5]],
        );
        assert_eq!(scalar.series().unwrap(), array![4.0, 3.5]);
        assert_relative_eq!(scalar.at(0.5, 123.0).unwrap(), 3.75);
    }

    #[test]
    fn single_time_is_exact_only() {
        let variable = ProcessedVariable::from_parts(
            "V",
            array![0.0],
            Array1::zeros(0),
            1,
            array![[4.0]],
        );
        assert_relative_eq!(variable.at(0.0, 0.0).unwrap(), 4.0);
        assert!(variable.at(0.1, 0.0).is_err());
    }

    #[test]
    fn particle_profiles_need_a_secondary_index() {
        let variable = ProcessedVariable::from_parts(
            "c_s",
            array![0.0, 1.0],
            array![0.5],
            2,
            array![[1.0, 1.0], [2.0, 2.0]],
        );
        assert!(matches!(
            variable.at(0.5, 0.5),
            Err(SolutionError::SecondaryProfiles { secondary: 2, .. })
        ));
    }
}
