//! Newton's method for square nonlinear systems.
//!
//! # Algorithm
//!
//! Starting from `x0`, each iteration evaluates the residual `F(x)`, forms a
//! forward-difference Jacobian `J`, and solves `J dx = -F(x)` with a dense LU
//! factorization. The iteration converges once the largest residual entry is
//! within the configured tolerance.
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per iteration before testing convergence.
//! Observers can return [`Action::StopEarly`] to halt with the current
//! iterate.
//!
//! Running out of iterations and hitting a singular Jacobian are reported
//! through [`Status`], not as errors, so callers decide how to react.

mod action;
mod config;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use std::error::Error as StdError;

use nalgebra::DVector;
use voltaic_core::Observer;

use super::{jacobian, max_norm};

/// Finds a root of `residual` starting from `x0`.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the residual length differs from the
/// length of `x0`, and [`Error::Problem`] if the residual cannot be
/// evaluated.
pub fn solve<F, E, Obs>(
    mut residual: F,
    x0: DVector<f64>,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
    E: StdError + Send + Sync + 'static,
    Obs: Observer<Event, Action>,
{
    let mut x = x0;
    let mut r = evaluate(&mut residual, &x)?;

    for iter in 0..config.max_iters() {
        let norm = max_norm(&r);
        let event = Event {
            iter,
            x: x.clone(),
            residual_norm: norm,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(Solution::new(Status::StoppedByObserver, x, norm, iter));
        }
        if norm <= config.residual_tol() {
            return Ok(Solution::new(Status::Converged, x, norm, iter));
        }

        let jac = jacobian(&mut residual, &x, &r, config.fd_step()).map_err(Error::problem)?;
        let Some(dx) = jac.lu().solve(&(-&r)) else {
            return Ok(Solution::new(Status::Singular, x, norm, iter));
        };
        x += &dx;
        r = evaluate(&mut residual, &x)?;

        if max_norm(&dx) <= config.step_tol() * (1.0 + max_norm(&x)) {
            let norm = max_norm(&r);
            let status = if norm <= config.residual_tol() {
                Status::Converged
            } else {
                Status::Stalled
            };
            return Ok(Solution::new(status, x, norm, iter + 1));
        }
    }

    let norm = max_norm(&r);
    let status = if norm <= config.residual_tol() {
        Status::Converged
    } else {
        Status::MaxIters
    };
    Ok(Solution::new(status, x, norm, config.max_iters()))
}

/// Finds a root of `residual` without observation.
///
/// # Errors
///
/// Returns an error as [`solve`] does.
pub fn solve_unobserved<F, E>(residual: F, x0: DVector<f64>, config: &Config) -> Result<Solution, Error>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
    E: StdError + Send + Sync + 'static,
{
    solve(residual, x0, config, ())
}

fn evaluate<F, E>(residual: &mut F, x: &DVector<f64>) -> Result<DVector<f64>, Error>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
    E: StdError + Send + Sync + 'static,
{
    let r = residual(x).map_err(Error::problem)?;
    if r.len() != x.len() {
        return Err(Error::ShapeMismatch {
            unknowns: x.len(),
            residuals: r.len(),
        });
    }
    Ok(r)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use approx::assert_relative_eq;

    use super::*;

    fn vector(values: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(values)
    }

    #[test]
    fn finds_square_root() {
        let residual = |x: &DVector<f64>| -> Result<_, Infallible> { Ok(vector(&[x[0] * x[0] - 2.0])) };
        let solution = solve_unobserved(residual, vector(&[1.0]), &Config::default()).unwrap();

        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.x[0], 2.0_f64.sqrt(), epsilon = 1e-9);
        assert!(solution.iters < 10);
    }

    #[test]
    fn solves_coupled_system() {
        // x + y = 3, x y = 2, starting near the root (1, 2).
        let residual = |x: &DVector<f64>| -> Result<_, Infallible> {
            Ok(vector(&[x[0] + x[1] - 3.0, x[0] * x[1] - 2.0]))
        };
        let solution = solve_unobserved(residual, vector(&[0.8, 2.3]), &Config::default()).unwrap();

        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(solution.x[1], 2.0, epsilon = 1e-8);
    }

    #[test]
    fn empty_system_is_converged() {
        let residual = |_: &DVector<f64>| -> Result<_, Infallible> { Ok(DVector::zeros(0)) };
        let solution = solve_unobserved(residual, DVector::zeros(0), &Config::default()).unwrap();

        assert_eq!(solution.status, Status::Converged);
        assert_eq!(solution.iters, 0);
    }

    #[test]
    fn singular_jacobian_is_a_status() {
        let residual = |x: &DVector<f64>| -> Result<_, Infallible> { Ok(vector(&[x[1] - 1.0, x[1] - 1.0])) };
        let solution = solve_unobserved(residual, vector(&[0.0, 0.0]), &Config::default()).unwrap();

        assert_eq!(solution.status, Status::Singular);
    }

    #[test]
    fn iteration_limit_is_a_status() {
        let residual = |x: &DVector<f64>| -> Result<_, Infallible> { Ok(vector(&[x[0].exp()])) };
        let config = Config::new(3, 1e-12, 0.0, 1e-7).unwrap();
        let solution = solve_unobserved(residual, vector(&[0.0]), &config).unwrap();

        assert_eq!(solution.status, Status::MaxIters);
        assert_eq!(solution.iters, 3);
    }

    #[test]
    fn observer_can_stop_early() {
        let residual = |x: &DVector<f64>| -> Result<_, Infallible> { Ok(vector(&[x[0] * x[0] - 2.0])) };
        let mut seen = Vec::new();
        let solution = solve(residual, vector(&[10.0]), &Config::default(), |event: &Event| {
            seen.push(event.residual_norm);
            (event.iter == 2).then_some(Action::StopEarly)
        })
        .unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.iters, 2);
        assert_eq!(seen.len(), 3);
        assert!(seen[2] < seen[0]);
    }

    #[test]
    fn wrong_residual_length_is_an_error() {
        let residual = |_: &DVector<f64>| -> Result<_, Infallible> { Ok(vector(&[1.0, 2.0])) };
        let err = solve_unobserved(residual, vector(&[0.0]), &Config::default()).unwrap_err();

        assert!(matches!(
            err,
            Error::ShapeMismatch {
                unknowns: 1,
                residuals: 2
            }
        ));
    }

    #[test]
    fn residual_errors_propagate() {
        let residual = |_: &DVector<f64>| -> Result<DVector<f64>, std::fmt::Error> { Err(std::fmt::Error) };
        let err = solve_unobserved(residual, vector(&[0.0]), &Config::default()).unwrap_err();

        assert!(matches!(err, Error::Problem(_)));
    }
}
