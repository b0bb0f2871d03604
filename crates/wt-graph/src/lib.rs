//! wt-graph: the treatment-train graph.
//!
//! Provides:
//! - The graph store (`TrainGraph`) with typed node/edge attributes
//! - A topology builder that turns unit processes into `<name>_start -> <name>_end` edges
//! - Structural edits (process removal with pruning, subset selection)
//! - Read-only queries used by costing and reporting code
//!
//! # Example
//!
//! ```
//! use wt_graph::{ProcessAttrs, TopologyBuilder};
//!
//! let mut builder = TopologyBuilder::new();
//! builder.add_source("well");
//! builder.add_use("municipal");
//! builder.add_unit_process("mf1", ProcessAttrs::new("media_filtration")).unwrap();
//! builder.connect("l1", "well", "mf1_start", None).unwrap();
//! builder.connect("l2", "mf1_end", "municipal", None).unwrap();
//! let train = builder.build();
//!
//! assert_eq!(train.unit_process_names(), ["mf1"]);
//! assert_eq!(train.node_count(), 4);
//! ```

pub mod builder;
pub mod edit;
pub mod error;
pub mod graph;
pub mod query;
pub mod validate;

// Re-exports for ergonomics
pub use builder::{TopologyBuilder, end_node_id, start_node_id};
pub use edit::PruneMode;
pub use error::{GraphError, GraphResult};
pub use graph::{
    Edge, EdgeKind, EdgeView, Endpoint, InletConstraints, Node, NodeKind, PressureDrops,
    ProcessAttrs, ProcessFlows, StreamState, TrainGraph,
};
pub use validate::{Violation, ViolationKind};
