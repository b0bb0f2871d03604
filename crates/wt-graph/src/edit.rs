//! Structural edits used when comparing train variants.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::graph::{NodeKind, TrainGraph};

/// Cleanup applied after a unit process is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PruneMode {
    /// One scan deleting nodes with no inbound and no outbound edges.
    #[default]
    Isolated,
    /// Repeat until stable, also deleting junctions left without any inbound
    /// or any outbound edge.
    DanglingJunctions,
}

impl TrainGraph {
    /// Remove a unit process: its edge, both anchor nodes, then isolated nodes.
    ///
    /// Returns the ids of every deleted node. Unknown names (and transport
    /// link names) are a no-op.
    pub fn remove_process(&mut self, name: &str) -> Vec<String> {
        self.remove_process_with(name, PruneMode::default())
    }

    /// Like [`TrainGraph::remove_process`] with an explicit cleanup mode.
    pub fn remove_process_with(&mut self, name: &str, mode: PruneMode) -> Vec<String> {
        if self.process(name).is_none() {
            debug!(process = name, "remove_process: no such unit process");
            return Vec::new();
        }
        let Some((start, end)) = self
            .edge_endpoints(name)
            .map(|(s, e)| (s.to_string(), e.to_string()))
        else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        for id in [start, end] {
            if self.remove_node(&id).is_some() {
                removed.push(id);
            }
        }
        match mode {
            PruneMode::Isolated => removed.extend(self.prune_pass(false)),
            PruneMode::DanglingJunctions => loop {
                let pass = self.prune_pass(true);
                if pass.is_empty() {
                    break;
                }
                removed.extend(pass);
            },
        }
        info!(process = name, removed = removed.len(), "removed unit process");
        removed
    }

    /// One scan over a snapshot of the node set.
    fn prune_pass(&mut self, dangling_junctions: bool) -> Vec<String> {
        let doomed: Vec<String> = self
            .nodes()
            .filter(|n| {
                let inbound = self.in_degree(&n.id);
                let outbound = self.out_degree(&n.id);
                let isolated = inbound == 0 && outbound == 0;
                let dangling =
                    n.kind == NodeKind::Junction && (inbound == 0 || outbound == 0);
                isolated || (dangling_junctions && dangling)
            })
            .map(|n| n.id.clone())
            .collect();
        for id in &doomed {
            self.remove_node(id);
        }
        doomed
    }

    /// Keep only the unit processes named in `allowed`.
    ///
    /// Deletes the anchor nodes (and so the edges) of every other process.
    /// Source, use and junction nodes are left untouched. Returns the names
    /// of the removed processes.
    pub fn select_subset<S: AsRef<str>>(&mut self, allowed: &[S]) -> Vec<String> {
        let allowed: HashSet<&str> = allowed.iter().map(|s| s.as_ref()).collect();
        let doomed: Vec<(String, String)> = self
            .nodes()
            .filter_map(|n| n.process().map(|p| (n.id.clone(), p.to_string())))
            .filter(|(_, process)| !allowed.contains(process.as_str()))
            .collect();

        let mut processes: Vec<String> = Vec::new();
        for (id, process) in doomed {
            self.remove_node(&id);
            if !processes.contains(&process) {
                processes.push(process);
            }
        }
        if !processes.is_empty() {
            info!(removed = ?processes, "trimmed train to selected unit processes");
        }
        processes
    }

    /// Copy of this train trimmed to `allowed`; `self` is not modified.
    pub fn variant<S: AsRef<str>>(&self, allowed: &[S]) -> TrainGraph {
        let mut copy = self.clone();
        copy.select_subset(allowed);
        copy
    }
}
