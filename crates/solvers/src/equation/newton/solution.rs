use nalgebra::DVector;

/// How the Newton solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The residual is within tolerance.
    Converged,

    /// Steps became negligible while the residual stayed above tolerance.
    Stalled,

    /// The Jacobian could not be factorized.
    Singular,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of a Newton solve.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: Status,

    /// Final iterate.
    pub x: DVector<f64>,

    /// Largest absolute residual at `x`.
    pub residual_norm: f64,

    /// Iterations completed.
    pub iters: usize,
}

impl Solution {
    pub(super) fn new(status: Status, x: DVector<f64>, residual_norm: f64, iters: usize) -> Self {
        Self {
            status,
            x,
            residual_norm,
            iters,
        }
    }

    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == Status::Converged
    }
}
