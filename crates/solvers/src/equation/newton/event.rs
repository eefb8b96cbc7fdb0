use nalgebra::DVector;

/// Event emitted by the Newton solver at the start of each iteration.
#[derive(Debug, Clone)]
pub struct Event {
    /// Iterations completed so far.
    pub iter: usize,

    /// The current iterate.
    pub x: DVector<f64>,

    /// Largest absolute residual at `x`.
    pub residual_norm: f64,
}
