/// Receives solver events and optionally returns a control action.
///
/// Observers let callers log progress, record intermediate states, or stop a
/// solve early without the solver knowing anything about them.
pub trait Observer<E, A> {
    /// Inspects an event, returning `Some(action)` to steer the solver.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

/// The unit observer ignores every event.
impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}
