use crate::Symbol;

/// What happens when an event expression crosses zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Stop the simulation.
    Termination,
}

/// A scalar function of the state whose zero-crossing signals an event.
///
/// The expression is positive while the simulation may continue.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub expression: Symbol,
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn termination(name: impl Into<String>, expression: Symbol) -> Self {
        Self {
            name: name.into(),
            expression,
            kind: EventKind::Termination,
        }
    }
}
