use std::collections::HashMap;

use petgraph::{
    Direction,
    algo::toposort,
    graph::{DiGraph, NodeIndex},
};

use crate::ModelError;

/// A directed graph of coupling variables passed between sub-models.
///
/// An edge from `provider` to `consumer` means the consumer reads a coupling
/// variable the provider publishes, so the provider must contribute first.
#[derive(Debug)]
pub struct CouplingGraph {
    graph: DiGraph<String, Coupling>,
    node_map: HashMap<String, NodeIndex>,
}

impl CouplingGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Adds a sub-model with no couplings yet.
    pub fn add_submodel(&mut self, name: &str) {
        self.get_or_add(name);
    }

    /// Records that `consumer` reads `variable` from `provider`.
    ///
    /// Sub-models missing from the graph are added automatically.
    ///
    /// # Examples
    ///
    /// ```
    /// use voltaic_core::CouplingGraph;
    ///
    /// let mut graph = CouplingGraph::new();
    /// graph.connect("particle", "kinetics", "Negative particle surface concentration");
    /// graph.connect("kinetics", "current balance", "Negative electrode interfacial current density");
    ///
    /// let order = graph.call_order().unwrap();
    /// assert_eq!(order, vec!["particle", "kinetics", "current balance"]);
    /// ```
    pub fn connect(&mut self, provider: &str, consumer: &str, variable: &str) {
        let source = self.get_or_add(provider);
        let target = self.get_or_add(consumer);
        self.graph.add_edge(
            source,
            target,
            Coupling {
                variable: variable.to_owned(),
            },
        );
    }

    /// Returns sub-model names so that each appears after all its providers.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CircularDependency`] naming a sub-model on a
    /// cycle.
    pub fn call_order(&self) -> Result<Vec<&str>, ModelError> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            let name = &self.graph[cycle.node_id()];
            let via: Vec<_> = self
                .graph
                .edges_directed(cycle.node_id(), Direction::Incoming)
                .map(|edge| edge.weight().variable.as_str())
                .collect();
            ModelError::CircularDependency(format!("{name} (via {})", via.join(", ")))
        })?;
        Ok(order
            .into_iter()
            .map(|index| self.graph[index].as_str())
            .collect())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the coupling variables a sub-model reads from others.
    pub fn incoming(&self, submodel: &str) -> impl Iterator<Item = &str> {
        self.node_map
            .get(submodel)
            .into_iter()
            .flat_map(|&index| self.graph.edges_directed(index, Direction::Incoming))
            .map(|edge| edge.weight().variable.as_str())
    }

    fn get_or_add(&mut self, name: &str) -> NodeIndex {
        *self
            .node_map
            .entry(name.to_owned())
            .or_insert_with(|| self.graph.add_node(name.to_owned()))
    }
}

impl Default for CouplingGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// The variable carried along an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Coupling {
    variable: String,
}
