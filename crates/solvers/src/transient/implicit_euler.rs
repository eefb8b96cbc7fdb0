//! Implicit (backward) Euler integration of semi-explicit DAEs.
//!
//! # Algorithm
//!
//! Each step of size `h` solves
//!
//! ```text
//! M (y_{n+1} - y_n) / h - F(t_{n+1}, y_{n+1}) = 0
//! ```
//!
//! for `y_{n+1}` with Newton's method, so differential and algebraic rows
//! are advanced together. Steps never exceed the configured maximum and end
//! exactly on each output time. A step whose Newton iteration fails is
//! retried at half the size, up to the configured number of halvings.
//!
//! # Events
//!
//! In [`Mode::Safe`], event functions are checked after every step. When one
//! crosses from positive to non-positive, the crossing is located by linear
//! interpolation within the step, the interpolated state is recorded, and
//! integration stops with [`Status::Event`]. [`Mode::Fast`] skips the checks.

mod config;

pub use config::{Config, ConfigError, Mode};

use log::{debug, warn};
use nalgebra::DVector;
use voltaic_core::{DaeProblem, Observer};

use crate::equation::newton;

use super::{Action, DaeSolver, Error, Event, Status, Trajectory};

/// The implicit Euler integrator with a fixed configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImplicitEuler {
    config: Config,
}

impl ImplicitEuler {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl DaeSolver for ImplicitEuler {
    fn solve<P, Obs>(
        &self,
        problem: &P,
        y0: &DVector<f64>,
        t_eval: &[f64],
        observer: Obs,
    ) -> Result<Trajectory, Error>
    where
        P: DaeProblem,
        Obs: Observer<Event, Action>,
    {
        solve(problem, y0, t_eval, &self.config, observer)
    }
}

/// Integrates `problem` with implicit Euler.
///
/// # Errors
///
/// Returns [`Error::InvalidTimes`] unless `t_eval` is non-empty, finite and
/// strictly increasing, [`Error::ShapeMismatch`] if `y0` does not match the
/// problem size, and [`Error::Problem`] if the problem cannot be evaluated.
pub fn solve<P, Obs>(
    problem: &P,
    y0: &DVector<f64>,
    t_eval: &[f64],
    config: &Config,
    mut observer: Obs,
) -> Result<Trajectory, Error>
where
    P: DaeProblem,
    Obs: Observer<Event, Action>,
{
    validate_times(t_eval)?;
    if y0.len() != problem.size() {
        return Err(Error::ShapeMismatch {
            expected: problem.size(),
            found: y0.len(),
        });
    }
    let safe = config.mode() == Mode::Safe;
    let names: Vec<String> = problem.event_names().into_iter().map(str::to_owned).collect();

    let mut t = t_eval[0];
    let mut y = y0.clone();
    let mut trajectory = Trajectory::start(t, y.clone());
    let mut steps = 0;

    let mut events = if safe {
        problem.events(t, &y).map_err(Error::problem)?
    } else {
        DVector::zeros(0)
    };
    if let Some(index) = events.iter().position(|&g| g <= 0.0) {
        return Ok(trajectory.finish(Status::Event(event_name(&names, index)), steps));
    }
    if let Some(Action::StopEarly) = observer.observe(&Event { step: 0, t, y: y.clone() }) {
        return Ok(trajectory.finish(Status::StoppedByObserver, steps));
    }

    for &target in &t_eval[1..] {
        while t < target {
            let span = target - t;
            // Absorb a sliver left by rounding into the final step.
            let mut h = if span <= config.max_step() * (1.0 + 1e-9) {
                span
            } else {
                config.max_step()
            };
            let mut halvings = 0;
            let y_next = loop {
                if let Some(y_next) = step(problem, t, &y, h, config.newton())? {
                    break y_next;
                }
                if halvings == config.max_halvings() {
                    let reason = format!("Newton iteration did not converge at t = {t} with step {h:e}");
                    trajectory.record_end(t, y);
                    return Ok(trajectory.finish(Status::Failed(reason), steps));
                }
                h /= 2.0;
                halvings += 1;
                warn!("implicit Euler step at t = {t} did not converge, retrying with step {h:e}");
            };
            let t_next = if h >= span { target } else { t + h };

            if safe {
                let next_events = problem.events(t_next, &y_next).map_err(Error::problem)?;
                if let Some((index, theta)) = first_crossing(&events, &next_events) {
                    let t_event = t + theta * (t_next - t);
                    let y_event = &y + (&y_next - &y) * theta;
                    trajectory.record(t_event, y_event);
                    debug!("event `{}` at t = {t_event} after {} steps", event_name(&names, index), steps + 1);
                    return Ok(trajectory.finish(Status::Event(event_name(&names, index)), steps + 1));
                }
                events = next_events;
            }

            t = t_next;
            y = y_next;
            steps += 1;
            let event = Event { step: steps, t, y: y.clone() };
            if let Some(Action::StopEarly) = observer.observe(&event) {
                trajectory.record_end(t, y);
                return Ok(trajectory.finish(Status::StoppedByObserver, steps));
            }
        }
        trajectory.record(target, y.clone());
    }

    debug!("implicit Euler reached t = {t} in {steps} steps");
    Ok(trajectory.finish(Status::Complete, steps))
}

fn validate_times(t_eval: &[f64]) -> Result<(), Error> {
    if t_eval.is_empty() {
        return Err(Error::InvalidTimes("no output times"));
    }
    if t_eval.iter().any(|t| !t.is_finite()) {
        return Err(Error::InvalidTimes("times must be finite"));
    }
    if t_eval.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(Error::InvalidTimes("times must be strictly increasing"));
    }
    Ok(())
}

/// Takes one step of size `h`, returning `None` if Newton does not converge.
fn step<P: DaeProblem>(
    problem: &P,
    t: f64,
    y: &DVector<f64>,
    h: f64,
    newton: &newton::Config,
) -> Result<Option<DVector<f64>>, Error> {
    let mass = problem.mass();
    let t_next = t + h;
    let residual = |y_next: &DVector<f64>| -> Result<DVector<f64>, P::Error> {
        let f = problem.rhs_algebraic(t_next, y_next)?;
        Ok(mass.component_mul(&(y_next - y)) / h - f)
    };
    let solution = newton::solve_unobserved(residual, y.clone(), newton)?;
    Ok(solution.is_converged().then_some(solution.x))
}

/// Finds the earliest event crossing from positive to non-positive within a
/// step, as the fraction of the step where it happens.
fn first_crossing(before: &DVector<f64>, after: &DVector<f64>) -> Option<(usize, f64)> {
    before
        .iter()
        .zip(after.iter())
        .enumerate()
        .filter(|(_, (g0, g1))| **g0 > 0.0 && **g1 <= 0.0)
        .map(|(index, (g0, g1))| (index, g0 / (g0 - g1)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn event_name(names: &[String], index: usize) -> String {
    names
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("event {index}"))
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use approx::assert_relative_eq;

    use super::*;

    /// `y' = -k y` with an optional algebraic `0 = z - 2 y` and a threshold
    /// event `y - threshold`.
    struct Decay {
        rate: f64,
        mass: DVector<f64>,
        threshold: Option<f64>,
    }

    impl Decay {
        fn ode(rate: f64) -> Self {
            Self {
                rate,
                mass: DVector::from_element(1, 1.0),
                threshold: None,
            }
        }

        fn dae(rate: f64) -> Self {
            Self {
                rate,
                mass: DVector::from_vec(vec![1.0, 0.0]),
                threshold: None,
            }
        }

        fn with_threshold(mut self, threshold: f64) -> Self {
            self.threshold = Some(threshold);
            self
        }
    }

    impl DaeProblem for Decay {
        type Error = Infallible;

        fn size(&self) -> usize {
            self.mass.len()
        }

        fn mass(&self) -> &DVector<f64> {
            &self.mass
        }

        fn rhs_algebraic(&self, _t: f64, y: &DVector<f64>) -> Result<DVector<f64>, Infallible> {
            let mut f = DVector::zeros(self.size());
            f[0] = -self.rate * y[0];
            if self.size() == 2 {
                f[1] = y[1] - 2.0 * y[0];
            }
            Ok(f)
        }

        fn event_names(&self) -> Vec<&str> {
            if self.threshold.is_some() { vec!["threshold"] } else { Vec::new() }
        }

        fn events(&self, _t: f64, y: &DVector<f64>) -> Result<DVector<f64>, Infallible> {
            Ok(match self.threshold {
                Some(threshold) => DVector::from_element(1, y[0] - threshold),
                None => DVector::zeros(0),
            })
        }
    }

    fn config(max_step: f64, mode: Mode) -> Config {
        Config::new(max_step, 4, mode).unwrap()
    }

    #[test]
    fn exponential_decay() {
        let solver = ImplicitEuler::new(config(1e-4, Mode::Safe));
        let y0 = DVector::from_element(1, 1.0);
        let trajectory = solver.solve_unobserved(&Decay::ode(1.0), &y0, &[0.0, 0.5, 1.0]).unwrap();

        assert_eq!(trajectory.status, Status::Complete);
        assert_eq!(trajectory.t, vec![0.0, 0.5, 1.0]);
        assert_relative_eq!(trajectory.y[1][0], (-0.5_f64).exp(), max_relative = 1e-3);
        assert_relative_eq!(trajectory.y[2][0], (-1.0_f64).exp(), max_relative = 1e-3);
        assert!(trajectory.steps >= 10_000);
    }

    #[test]
    fn algebraic_rows_stay_consistent() {
        let solver = ImplicitEuler::new(config(1e-2, Mode::Safe));
        let y0 = DVector::from_vec(vec![1.0, 2.0]);
        let trajectory = solver.solve_unobserved(&Decay::dae(2.0), &y0, &[0.0, 1.0]).unwrap();

        let (t, y) = trajectory.last().unwrap();
        assert_relative_eq!(t, 1.0);
        assert_relative_eq!(y[1], 2.0 * y[0], epsilon = 1e-9);
    }

    #[test]
    fn stops_at_event_crossing() {
        let solver = ImplicitEuler::new(config(1e-3, Mode::Safe));
        let y0 = DVector::from_element(1, 1.0);
        let problem = Decay::ode(1.0).with_threshold(0.5);
        let trajectory = solver.solve_unobserved(&problem, &y0, &[0.0, 5.0]).unwrap();

        assert_eq!(trajectory.status, Status::Event("threshold".into()));
        let (t, y) = trajectory.last().unwrap();
        assert_relative_eq!(t, 2.0_f64.ln(), max_relative = 1e-3);
        assert_relative_eq!(y[0], 0.5, epsilon = 1e-9);
    }

    #[test]
    fn fast_mode_ignores_events() {
        let solver = ImplicitEuler::new(config(1e-2, Mode::Fast));
        let y0 = DVector::from_element(1, 1.0);
        let problem = Decay::ode(1.0).with_threshold(0.5);
        let trajectory = solver.solve_unobserved(&problem, &y0, &[0.0, 5.0]).unwrap();

        assert_eq!(trajectory.status, Status::Complete);
        assert!(trajectory.y[1][0] < 0.5);
    }

    #[test]
    fn event_already_triggered_at_start() {
        let solver = ImplicitEuler::default();
        let y0 = DVector::from_element(1, 0.25);
        let problem = Decay::ode(1.0).with_threshold(0.5);
        let trajectory = solver.solve_unobserved(&problem, &y0, &[0.0, 1.0]).unwrap();

        assert_eq!(trajectory.status, Status::Event("threshold".into()));
        assert_eq!(trajectory.steps, 0);
        assert_eq!(trajectory.t, vec![0.0]);
    }

    #[test]
    fn observer_can_stop_early() {
        let solver = ImplicitEuler::new(config(0.1, Mode::Safe));
        let y0 = DVector::from_element(1, 1.0);
        let trajectory = solver
            .solve(&Decay::ode(1.0), &y0, &[0.0, 1.0], |event: &Event| {
                (event.step == 3).then_some(Action::StopEarly)
            })
            .unwrap();

        assert_eq!(trajectory.status, Status::StoppedByObserver);
        assert_eq!(trajectory.steps, 3);
        let (t, _) = trajectory.last().unwrap();
        assert_relative_eq!(t, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn divergent_steps_fail_with_status() {
        struct Diverging {
            mass: DVector<f64>,
        }

        impl DaeProblem for Diverging {
            type Error = Infallible;

            fn size(&self) -> usize {
                1
            }

            fn mass(&self) -> &DVector<f64> {
                &self.mass
            }

            fn rhs_algebraic(&self, _t: f64, _y: &DVector<f64>) -> Result<DVector<f64>, Infallible> {
                Ok(DVector::from_element(1, f64::NAN))
            }
        }

        let problem = Diverging { mass: DVector::from_element(1, 1.0) };
        let y0 = DVector::from_element(1, 1.0);
        let trajectory = ImplicitEuler::default().solve_unobserved(&problem, &y0, &[0.0, 1.0]).unwrap();

        assert!(matches!(trajectory.status, Status::Failed(_)));
        assert_eq!(trajectory.steps, 0);
    }

    #[test]
    fn rejects_bad_inputs() {
        let solver = ImplicitEuler::default();
        let y0 = DVector::from_element(1, 1.0);
        let problem = Decay::ode(1.0);

        for times in [&[][..], &[0.0, 0.0], &[1.0, 0.5], &[0.0, f64::INFINITY]] {
            let err = solver.solve_unobserved(&problem, &y0, times).unwrap_err();
            assert!(matches!(err, Error::InvalidTimes(_)), "{times:?}");
        }
        let err = solver
            .solve_unobserved(&problem, &DVector::zeros(2), &[0.0, 1.0])
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn config_rejects_bad_step() {
        assert_eq!(Config::new(0.0, 4, Mode::Safe), Err(ConfigError::MaxStep));
        assert_eq!(Config::new(f64::NAN, 4, Mode::Safe), Err(ConfigError::MaxStep));
    }
}
