//! Read-only queries over the annotated train.
//!
//! Every query returns a freshly materialized `Vec` in insertion order, so
//! callers can hold results across later edits.

use std::collections::HashSet;

use tracing::warn;

use crate::graph::{NodeKind, TrainGraph};

impl TrainGraph {
    /// Display names of all unit processes.
    ///
    /// An empty train is valid; it is reported with a warning.
    pub fn unit_process_names(&self) -> Vec<String> {
        let names: Vec<String> = self
            .edges()
            .filter(|v| v.edge.is_process())
            .map(|v| v.edge.name.clone())
            .collect();
        if names.is_empty() {
            warn!("train has no unit processes");
        }
        names
    }

    /// Costing lookup keys (`treatment_name`) of all unit processes.
    pub fn unit_process_keys(&self) -> Vec<String> {
        self.edges()
            .filter_map(|v| v.edge.as_process())
            .map(|p| p.treatment_name.clone())
            .collect()
    }

    /// Nodes with at least one inbound and one outbound edge.
    pub fn interior_nodes(&self) -> Vec<String> {
        self.nodes()
            .filter(|n| self.in_degree(&n.id) > 0 && self.out_degree(&n.id) > 0)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Names of every edge, processes and links alike.
    pub fn link_names(&self) -> Vec<String> {
        self.edges().map(|v| v.edge.name.clone()).collect()
    }

    pub fn source_nodes(&self) -> Vec<String> {
        self.nodes_of_kind(&NodeKind::Source)
    }

    /// Recovered-water termini.
    pub fn use_nodes(&self) -> Vec<String> {
        self.nodes_of_kind(&NodeKind::Use)
    }

    fn nodes_of_kind(&self, kind: &NodeKind) -> Vec<String> {
        self.nodes()
            .filter(|n| &n.kind == kind)
            .map(|n| n.id.clone())
            .collect()
    }

    /// Names of edges leaving any of `nodes`.
    pub fn outbound_edges_of<S: AsRef<str>>(&self, nodes: &[S]) -> Vec<String> {
        let set: HashSet<&str> = nodes.iter().map(|s| s.as_ref()).collect();
        self.edges()
            .filter(|v| set.contains(v.source))
            .map(|v| v.edge.name.clone())
            .collect()
    }

    /// Names of edges entering any of `nodes`.
    pub fn inbound_edges_of<S: AsRef<str>>(&self, nodes: &[S]) -> Vec<String> {
        let set: HashSet<&str> = nodes.iter().map(|s| s.as_ref()).collect();
        self.edges()
            .filter(|v| set.contains(v.target))
            .map(|v| v.edge.name.clone())
            .collect()
    }
}
