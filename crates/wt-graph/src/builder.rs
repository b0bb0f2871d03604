//! Incremental train builder.

use tracing::warn;
use wt_core::Real;

use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, Endpoint, NodeKind, ProcessAttrs, TrainGraph};

/// Id of the inlet anchor node of a unit process.
pub fn start_node_id(process: &str) -> String {
    format!("{process}_start")
}

/// Id of the outlet anchor node of a unit process.
pub fn end_node_id(process: &str) -> String {
    format!("{process}_end")
}

impl TrainGraph {
    /// Add a unit process as a `<name>_start -> <name>_end` treatment edge.
    ///
    /// Fails with `DuplicateEdge` if a process or link with this name exists;
    /// in that case the graph is left unchanged.
    pub fn add_unit_process(&mut self, name: &str, attrs: ProcessAttrs) -> GraphResult<()> {
        if self.contains_edge(name) {
            return Err(GraphError::DuplicateEdge {
                name: name.to_string(),
            });
        }
        let start = start_node_id(name);
        let end = end_node_id(name);
        self.add_node(
            start.clone(),
            NodeKind::ProcessEndpoint {
                process: name.to_string(),
                end: Endpoint::Start,
            },
        );
        self.add_node(
            end.clone(),
            NodeKind::ProcessEndpoint {
                process: name.to_string(),
                end: Endpoint::End,
            },
        );
        self.add_edge(&start, &end, Edge::process(name, attrs))
    }
}

/// Builder for constructing a train incrementally.
///
/// Use `add_source`, `add_use`, `add_unit_process` and `connect` to lay out
/// the train, then call `build()` to get the `TrainGraph`.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    graph: TrainGraph,
}

impl TopologyBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw-water intake node.
    pub fn add_source(&mut self, id: impl Into<String>) -> &mut Self {
        self.graph.add_node(id, NodeKind::Source);
        self
    }

    /// Add a terminal demand/discharge node.
    pub fn add_use(&mut self, id: impl Into<String>) -> &mut Self {
        self.graph.add_node(id, NodeKind::Use);
        self
    }

    pub fn add_junction(&mut self, id: impl Into<String>) -> &mut Self {
        self.graph.add_node(id, NodeKind::Junction);
        self
    }

    /// Add a unit process edge with its two anchor nodes.
    pub fn add_unit_process(&mut self, name: &str, attrs: ProcessAttrs) -> GraphResult<&mut Self> {
        self.graph.add_unit_process(name, attrs)?;
        Ok(self)
    }

    /// Add a transport link between two existing (or new junction) nodes.
    pub fn connect(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        split_fraction: Option<Real>,
    ) -> GraphResult<&mut Self> {
        self.graph
            .add_edge(from, to, Edge::transport(name, split_fraction))?;
        Ok(self)
    }

    /// Finish construction. Well-formedness violations are logged, not fatal.
    pub fn build(self) -> TrainGraph {
        for violation in self.graph.violations() {
            warn!(node = %violation.node, kind = ?violation.kind, "train node is not well connected");
        }
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_process_creates_anchor_pair() {
        let mut builder = TopologyBuilder::new();
        builder
            .add_unit_process("ro1", ProcessAttrs::new("reverse_osmosis"))
            .unwrap();
        let train = builder.build();

        assert_eq!(train.node_count(), 2);
        assert_eq!(train.edge_endpoints("ro1"), Some(("ro1_start", "ro1_end")));
        assert_eq!(train.node("ro1_end").unwrap().process(), Some("ro1"));
        assert!(matches!(
            train.node("ro1_start").unwrap().kind,
            NodeKind::ProcessEndpoint {
                end: Endpoint::Start,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_process_leaves_graph_unchanged() {
        let mut graph = TrainGraph::new();
        graph
            .add_unit_process("uv1", ProcessAttrs::new("uv_irradiation"))
            .unwrap();
        let before = graph.clone();
        let err = graph
            .add_unit_process("uv1", ProcessAttrs::new("ozonation"))
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateEdge { name: "uv1".into() });
        assert_eq!(graph, before);
    }

    #[test]
    fn connect_chains_processes() {
        let mut builder = TopologyBuilder::new();
        builder.add_source("intake").add_use("outfall");
        builder
            .add_unit_process("cf1", ProcessAttrs::new("coag_and_floc"))
            .unwrap();
        builder.connect("l1", "intake", "cf1_start", None).unwrap();
        builder.connect("l2", "cf1_end", "outfall", None).unwrap();
        let train = builder.build();

        assert_eq!(train.edge_count(), 3);
        assert!(train.violations().is_empty());
    }
}
