//! The discretized system handed to solvers.

use std::{collections::BTreeMap, ops::Range};

use nalgebra::DVector;
use voltaic_core::{DaeProblem, Domain, Variable};

use crate::{DiscretizationError, discrete::DiscreteExpr};

/// Where the entries of a discretized quantity sit on the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Scalar,
    Nodes,
    Faces,
}

impl Location {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "a scalar",
            Self::Nodes => "nodes",
            Self::Faces => "faces",
        }
    }
}

/// One state variable's slice of the state vector.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSlot {
    pub variable: Variable,
    pub range: Range<usize>,
    pub differential: bool,
}

/// Assignment of state variables to contiguous slices.
///
/// Differential states come first, algebraic states after.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateLayout {
    slots: Vec<StateSlot>,
    index: BTreeMap<Variable, usize>,
}

impl StateLayout {
    pub(crate) fn push(&mut self, variable: Variable, size: usize, differential: bool) {
        let start = self.size();
        self.index.insert(variable.clone(), self.slots.len());
        self.slots.push(StateSlot {
            variable,
            range: start..start + size,
            differential,
        });
    }

    #[must_use]
    pub fn slots(&self) -> &[StateSlot] {
        &self.slots
    }

    /// Total number of states.
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.last().map_or(0, |slot| slot.range.end)
    }

    #[must_use]
    pub fn range_of(&self, variable: &Variable) -> Option<Range<usize>> {
        self.index
            .get(variable)
            .map(|&i| self.slots[i].range.clone())
    }

    pub(crate) fn size_of(&self, variable: &Variable) -> Result<usize, DiscretizationError> {
        self.range_of(variable)
            .map(|range| range.len())
            .ok_or_else(|| DiscretizationError::UnknownVariable(variable.clone()))
    }
}

/// An output variable in discrete form.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscretizedVariable {
    expr: DiscreteExpr,
    domain: Domain,
    location: Location,
    coordinates: DVector<f64>,
    len: usize,
}

impl DiscretizedVariable {
    pub(crate) fn new(
        expr: DiscreteExpr,
        domain: Domain,
        location: Location,
        coordinates: DVector<f64>,
        len: usize,
    ) -> Self {
        Self {
            expr,
            domain,
            location,
            coordinates,
            len,
        }
    }

    #[must_use]
    pub fn expr(&self) -> &DiscreteExpr {
        &self.expr
    }

    #[must_use]
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Primary coordinates of the entries, empty for scalars.
    #[must_use]
    pub fn coordinates(&self) -> &DVector<f64> {
        &self.coordinates
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of secondary points, each holding one primary profile.
    #[must_use]
    pub fn secondary_points(&self) -> usize {
        if self.coordinates.is_empty() {
            self.len
        } else {
            self.len / self.coordinates.len()
        }
    }

    /// Evaluates the variable at time `t` and state `y`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscretizationError::ShapeMismatch`] if `y` has the wrong size.
    pub fn evaluate(&self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>, DiscretizationError> {
        let value = self.expr.evaluate(t, y)?;
        if value.len() == 1 && self.len > 1 {
            return Ok(DVector::from_element(self.len, value[0]));
        }
        Ok(value)
    }
}

/// A model reduced to `M y' = F(t, y)` with events and outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscretizedSystem {
    name: String,
    layout: StateLayout,
    mass: DVector<f64>,
    equations: Vec<DiscreteExpr>,
    y0: DVector<f64>,
    events: Vec<(String, DiscreteExpr)>,
    variables: BTreeMap<String, DiscretizedVariable>,
}

impl DiscretizedSystem {
    pub(crate) fn new(
        name: String,
        layout: StateLayout,
        equations: Vec<DiscreteExpr>,
        y0: DVector<f64>,
        events: Vec<(String, DiscreteExpr)>,
        variables: BTreeMap<String, DiscretizedVariable>,
    ) -> Self {
        let mut mass = DVector::zeros(layout.size());
        for slot in layout.slots().iter().filter(|slot| slot.differential) {
            mass.rows_mut(slot.range.start, slot.range.len()).fill(1.0);
        }
        Self {
            name,
            layout,
            mass,
            equations,
            y0,
            events,
            variables,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    #[must_use]
    pub fn initial_state(&self) -> &DVector<f64> {
        &self.y0
    }

    /// Number of algebraic states.
    #[must_use]
    pub fn algebraic_size(&self) -> usize {
        self.mass.iter().filter(|&&m| m == 0.0).count()
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&DiscretizedVariable> {
        self.variables.get(name)
    }

    #[must_use]
    pub fn variables(&self) -> &BTreeMap<String, DiscretizedVariable> {
        &self.variables
    }

    /// The slice of `y` holding one state variable.
    #[must_use]
    pub fn state_of(&self, variable: &Variable, y: &DVector<f64>) -> Option<Vec<f64>> {
        let range = self.layout.range_of(variable)?;
        y.as_slice().get(range).map(<[f64]>::to_vec)
    }
}

impl DaeProblem for DiscretizedSystem {
    type Error = DiscretizationError;

    fn size(&self) -> usize {
        self.layout.size()
    }

    fn mass(&self) -> &DVector<f64> {
        &self.mass
    }

    fn rhs_algebraic(&self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        if y.len() != self.size() {
            return Err(DiscretizationError::ShapeMismatch {
                context: "state vector".to_owned(),
                expected: self.size(),
                found: y.len(),
            });
        }
        let mut out = DVector::zeros(self.size());
        for (slot, equation) in self.layout.slots().iter().zip(&self.equations) {
            let value = equation.evaluate(t, y)?;
            if value.len() != slot.range.len() {
                return Err(DiscretizationError::ShapeMismatch {
                    context: format!("equation for {}", slot.variable),
                    expected: slot.range.len(),
                    found: value.len(),
                });
            }
            out.rows_mut(slot.range.start, slot.range.len())
                .copy_from(&value);
        }
        Ok(out)
    }

    fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn events(&self, t: f64, y: &DVector<f64>) -> Result<DVector<f64>, Self::Error> {
        let values = self
            .events
            .iter()
            .map(|(_, expr)| expr.evaluate(t, y).map(|value| value[0]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DVector::from_vec(values))
    }
}
