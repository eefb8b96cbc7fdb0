use nalgebra::DVector;

/// Event emitted by a time integrator for each accepted step.
///
/// Step 0 is the initial state before any integration.
#[derive(Debug, Clone)]
pub struct Event {
    pub step: usize,

    /// Time at the end of the step.
    pub t: f64,

    /// State at the end of the step.
    pub y: DVector<f64>,
}
