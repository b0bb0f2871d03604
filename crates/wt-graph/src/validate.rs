//! Well-formedness checks for a train.

use crate::graph::{NodeKind, TrainGraph};

/// How a node breaks the in/out connectivity rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A non-source node with nothing flowing in.
    NoInbound,
    /// A non-use node with nothing flowing out.
    NoOutbound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub node: String,
    pub kind: ViolationKind,
}

impl TrainGraph {
    /// Nodes violating "every non-source node has an inbound edge and every
    /// non-use node has an outbound edge", in insertion order.
    pub fn violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        for node in self.nodes() {
            if node.kind != NodeKind::Source && self.in_degree(&node.id) == 0 {
                out.push(Violation {
                    node: node.id.clone(),
                    kind: ViolationKind::NoInbound,
                });
            }
            if node.kind != NodeKind::Use && self.out_degree(&node.id) == 0 {
                out.push(Violation {
                    node: node.id.clone(),
                    kind: ViolationKind::NoOutbound,
                });
            }
        }
        out
    }

    pub fn is_well_formed(&self) -> bool {
        self.violations().is_empty()
    }
}
