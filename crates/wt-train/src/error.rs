//! Error types for train builds.

use thiserror::Error;
use wt_graph::GraphError;
use wt_project::ValidationError;

use crate::mass_balance::BalanceError;
use crate::split::SplitError;
use crate::tables::TableError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ValidationError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Mass balance error: {0}")]
    Balance(#[from] BalanceError),

    #[error("Link {link} refers to unknown node or process {id}")]
    UnknownEndpoint { link: String, id: String },

    #[error("Train not found: {0}")]
    TrainNotFound(String),
}

pub type TrainResult<T> = Result<T, TrainError>;
