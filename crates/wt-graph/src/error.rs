//! Graph-specific error types.

use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction errors.
///
/// Removals and lookups on missing names are never errors; only inserts that
/// would break name uniqueness (or ordering queries on cyclic trains) fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An edge with this name already exists in the train.
    #[error("Duplicate edge name: {name}")]
    DuplicateEdge { name: String },

    /// The train is not acyclic; `node` lies on a cycle.
    #[error("Train contains a cycle through node {node}")]
    Cycle { node: String },
}
