use nalgebra::DVector;

/// Indicates how an integration terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Reached the last output time.
    Complete,

    /// A termination event fired; holds the event name.
    Event(String),

    /// Stopped early due to an observer action.
    StoppedByObserver,

    /// A step could not be converged even at the smallest allowed size.
    Failed(String),
}

/// States recorded at the output times reached.
///
/// When integration stops early, the last entry is the state where it
/// stopped, which need not be an output time.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub y: Vec<DVector<f64>>,
    pub status: Status,

    /// Accepted integration steps.
    pub steps: usize,
}

impl Trajectory {
    pub(crate) fn start(t: f64, y: DVector<f64>) -> Self {
        Self {
            t: vec![t],
            y: vec![y],
            status: Status::Complete,
            steps: 0,
        }
    }

    pub(crate) fn record(&mut self, t: f64, y: DVector<f64>) {
        self.t.push(t);
        self.y.push(y);
    }

    /// Records where integration stopped unless that time is already the
    /// last entry.
    pub(crate) fn record_end(&mut self, t: f64, y: DVector<f64>) {
        if self.t.last().is_none_or(|&last| t > last) {
            self.record(t, y);
        }
    }

    pub(crate) fn finish(mut self, status: Status, steps: usize) -> Self {
        self.status = status;
        self.steps = steps;
        self
    }

    /// Returns the last recorded time and state.
    #[must_use]
    pub fn last(&self) -> Option<(f64, &DVector<f64>)> {
        Some((*self.t.last()?, self.y.last()?))
    }
}
