//! Project schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wt_core::{DEFAULT_SPLIT_TOLERANCE, NEGLIGIBLE};
use wt_graph::{end_node_id, start_node_id};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub config: BuildConfig,
    #[serde(default)]
    pub trains: Vec<TrainDef>,
}

/// Settings threaded explicitly into every train build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Reference scenario used to pick recovery/removal table rows.
    #[serde(default = "default_case_study")]
    pub case_study: String,
    #[serde(default = "default_scenario")]
    pub scenario: String,
    /// Absolute tolerance on recovery + waste + recycle == 1.
    #[serde(default = "default_split_tolerance")]
    pub split_tolerance: f64,
    /// Removal fraction for constituents missing from the removal table.
    #[serde(default = "default_negligible")]
    pub default_removal: f64,
    /// Recovery used when neither the table nor the process gives one.
    #[serde(default = "default_recovery")]
    pub default_recovery: f64,
    /// Outlet/waste pressure drop stamped on non-RO processes, in bar.
    #[serde(default = "default_negligible")]
    pub negligible_pressure_drop_bar: f64,
}

pub const DEFAULT_CASE_STUDY: &str = "default";

fn default_case_study() -> String {
    DEFAULT_CASE_STUDY.to_string()
}

fn default_scenario() -> String {
    "baseline".to_string()
}

fn default_split_tolerance() -> f64 {
    DEFAULT_SPLIT_TOLERANCE
}

fn default_negligible() -> f64 {
    NEGLIGIBLE
}

fn default_recovery() -> f64 {
    1.0
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            case_study: default_case_study(),
            scenario: default_scenario(),
            split_tolerance: default_split_tolerance(),
            default_removal: default_negligible(),
            default_recovery: default_recovery(),
            negligible_pressure_drop_bar: default_negligible(),
        }
    }
}

impl BuildConfig {
    pub fn for_case_study(case_study: impl Into<String>) -> Self {
        Self {
            case_study: case_study.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainDef {
    pub id: String,
    pub name: String,
    /// Overrides `BuildConfig::case_study` for this train.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_study: Option<String>,
    /// Constituents tracked through this train.
    #[serde(default)]
    pub constituents: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub unit_processes: Vec<UnitProcessDef>,
    #[serde(default)]
    pub links: Vec<LinkDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    pub kind: NodeKindDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum NodeKindDef {
    Source,
    Use,
    Junction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitProcessDef {
    pub name: String,
    pub treatment_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,
    /// Process-level recovery used when the recovery table has no row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<f64>,
    /// Fraction of the waste stream recycled upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle_fraction: Option<f64>,
}

/// A transport link. `from`/`to` name either a node or a unit process; a
/// process name means its `_end` anchor as `from` and its `_start` anchor as `to`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkDef {
    pub name: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_fraction: Option<f64>,
}

impl TrainDef {
    fn has_process(&self, name: &str) -> bool {
        self.unit_processes.iter().any(|p| p.name == name)
    }

    fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
            || self
                .unit_processes
                .iter()
                .any(|p| start_node_id(&p.name) == id || end_node_id(&p.name) == id)
    }

    /// Graph node id a link leaves from, or `None` if `from` is unknown.
    pub fn link_source(&self, link: &LinkDef) -> Option<String> {
        if self.has_process(&link.from) {
            Some(end_node_id(&link.from))
        } else if self.has_node(&link.from) {
            Some(link.from.clone())
        } else {
            None
        }
    }

    /// Graph node id a link enters, or `None` if `to` is unknown.
    pub fn link_target(&self, link: &LinkDef) -> Option<String> {
        if self.has_process(&link.to) {
            Some(start_node_id(&link.to))
        } else if self.has_node(&link.to) {
            Some(link.to.clone())
        } else {
            None
        }
    }
}
