//! Core graph data structures: the train's nodes, edges and typed attributes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use wt_core::{MassConcentration, Pressure, Real, VolumeRate};

use crate::error::{GraphError, GraphResult};

/// Which anchor of a unit-process edge a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Start,
    End,
}

/// Role of a node in the train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Raw water intake.
    Source,
    /// Terminal demand or discharge ("recovered water" terminus).
    Use,
    /// Plain mixing/splitting point.
    Junction,
    /// Synthetic `<process>_start` / `<process>_end` anchor.
    ProcessEndpoint { process: String, end: Endpoint },
}

/// Flow and quality at a node, written by the mass balance or by collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamState {
    pub flow: Option<VolumeRate>,
    pub concentrations: BTreeMap<String, MassConcentration>,
}

/// A node in the train graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub state: StreamState,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            state: StreamState::default(),
        }
    }

    /// Name of the owning unit process for process-endpoint nodes.
    pub fn process(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::ProcessEndpoint { process, .. } => Some(process.as_str()),
            _ => None,
        }
    }
}

/// Upper bounds on inflow concentration checked by downstream feasibility tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InletConstraints {
    pub bod_max: Option<MassConcentration>,
    pub toc_max: Option<MassConcentration>,
}

/// Pressure drop across the outlet and waste streams of a process.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PressureDrops {
    pub outlet: Option<Pressure>,
    pub waste: Option<Pressure>,
}

/// Volumetric flows through one treatment process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessFlows {
    pub inlet: VolumeRate,
    pub outlet: VolumeRate,
    pub waste: VolumeRate,
    pub recycle: VolumeRate,
}

/// Typed attributes of a treatment-process edge.
///
/// Every resolved quantity is optional: `None` means "not fixed here", which
/// leaves it for the external solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessAttrs {
    /// Costing-unit lookup key (distinct from the edge's display name).
    pub treatment_name: String,
    /// Free-form unit parameters supplied by the train definition.
    pub params: BTreeMap<String, serde_json::Value>,
    /// Process-level recovery used when no table row exists.
    pub nominal_recovery: Option<Real>,
    /// Fraction of the waste stream to send back upstream.
    pub recycle_request: Option<Real>,
    pub recovery_factor: Option<Real>,
    pub waste_factor: Option<Real>,
    pub recycle_factor: Option<Real>,
    pub constraints: InletConstraints,
    /// Fixed removal fraction per constituent.
    pub removal_fractions: BTreeMap<String, Real>,
    /// Constituents whose removal is left to the solver.
    pub calculated_removal: BTreeSet<String>,
    pub pressure_drop: PressureDrops,
    pub flows: Option<ProcessFlows>,
}

impl ProcessAttrs {
    pub fn new(treatment_name: impl Into<String>) -> Self {
        Self {
            treatment_name: treatment_name.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_nominal_recovery(mut self, recovery: Real) -> Self {
        self.nominal_recovery = Some(recovery);
        self
    }

    pub fn with_recycle_request(mut self, fraction: Real) -> Self {
        self.recycle_request = Some(fraction);
        self
    }

    /// True once recovery, waste and recycle factors are all fixed.
    pub fn split_fixed(&self) -> bool {
        self.recovery_factor.is_some() && self.waste_factor.is_some() && self.recycle_factor.is_some()
    }
}

/// Edge kind and its kind-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    TransportLink { split_fraction: Option<Real> },
    TreatmentProcess(ProcessAttrs),
}

/// A directed edge; `name` is unique within the train.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub name: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn transport(name: impl Into<String>, split_fraction: Option<Real>) -> Self {
        Self {
            name: name.into(),
            kind: EdgeKind::TransportLink { split_fraction },
        }
    }

    pub fn process(name: impl Into<String>, attrs: ProcessAttrs) -> Self {
        Self {
            name: name.into(),
            kind: EdgeKind::TreatmentProcess(attrs),
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self.kind, EdgeKind::TreatmentProcess(_))
    }

    pub fn as_process(&self) -> Option<&ProcessAttrs> {
        match &self.kind {
            EdgeKind::TreatmentProcess(attrs) => Some(attrs),
            EdgeKind::TransportLink { .. } => None,
        }
    }

    pub fn as_process_mut(&mut self) -> Option<&mut ProcessAttrs> {
        match &mut self.kind {
            EdgeKind::TreatmentProcess(attrs) => Some(attrs),
            EdgeKind::TransportLink { .. } => None,
        }
    }
}

/// Borrowed view of an edge together with its endpoint ids.
#[derive(Debug, Clone, Copy)]
pub struct EdgeView<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub edge: &'a Edge,
}

/// The graph store: a directed multigraph of named nodes and edges.
///
/// Iteration follows insertion order. Mutations on missing names are no-ops.
/// Cloning yields a fully independent train (copy before mutating a variant).
#[derive(Debug, Clone, Default)]
pub struct TrainGraph {
    graph: StableDiGraph<Node, Edge>,
    node_index: HashMap<String, NodeIndex>,
    edge_index: HashMap<String, EdgeIndex>,
    node_order: Vec<NodeIndex>,
    edge_order: Vec<EdgeIndex>,
}

impl TrainGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_order.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_edge(&self, name: &str) -> bool {
        self.edge_index.contains_key(name)
    }

    /// Add a node, or update the kind of an existing node with the same id.
    pub fn add_node(&mut self, id: impl Into<String>, kind: NodeKind) {
        let id = id.into();
        if let Some(&ix) = self.node_index.get(&id) {
            self.graph[ix].kind = kind;
            return;
        }
        let ix = self.graph.add_node(Node::new(id.clone(), kind));
        self.node_index.insert(id, ix);
        self.node_order.push(ix);
    }

    /// Add an edge between two nodes; missing endpoints are created as junctions.
    ///
    /// Fails with [`GraphError::DuplicateEdge`] if the edge name is already taken.
    pub fn add_edge(&mut self, from: &str, to: &str, edge: Edge) -> GraphResult<()> {
        if self.edge_index.contains_key(&edge.name) {
            return Err(GraphError::DuplicateEdge { name: edge.name });
        }
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        let name = edge.name.clone();
        let ix = self.graph.add_edge(a, b, edge);
        self.edge_index.insert(name, ix);
        self.edge_order.push(ix);
        Ok(())
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&ix) = self.node_index.get(id) {
            return ix;
        }
        self.add_node(id, NodeKind::Junction);
        self.node_index[id]
    }

    /// Remove a node and all incident edges. Returns `None` if absent.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let ix = self.node_index.remove(id)?;
        let incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(ix, Direction::Outgoing)
            .chain(self.graph.edges_directed(ix, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        for e in incident {
            if let Some(edge) = self.graph.remove_edge(e) {
                self.edge_index.remove(&edge.name);
            }
        }
        self.edge_order.retain(|&e| self.graph.edge_weight(e).is_some());
        self.node_order.retain(|&n| n != ix);
        self.graph.remove_node(ix)
    }

    /// Remove an edge by name. Returns `None` if absent.
    pub fn remove_edge(&mut self, name: &str) -> Option<Edge> {
        let ix = self.edge_index.remove(name)?;
        self.edge_order.retain(|&e| e != ix);
        self.graph.remove_edge(ix)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&ix| &self.graph[ix])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let ix = *self.node_index.get(id)?;
        self.graph.node_weight_mut(ix)
    }

    pub fn edge(&self, name: &str) -> Option<&Edge> {
        self.edge_index.get(name).map(|&ix| &self.graph[ix])
    }

    pub fn edge_mut(&mut self, name: &str) -> Option<&mut Edge> {
        let ix = *self.edge_index.get(name)?;
        self.graph.edge_weight_mut(ix)
    }

    /// Attributes of a treatment-process edge (`None` for links or absent names).
    pub fn process(&self, name: &str) -> Option<&ProcessAttrs> {
        self.edge(name)?.as_process()
    }

    pub fn process_mut(&mut self, name: &str) -> Option<&mut ProcessAttrs> {
        self.edge_mut(name)?.as_process_mut()
    }

    /// Source and target node ids of an edge.
    pub fn edge_endpoints(&self, name: &str) -> Option<(&str, &str)> {
        let ix = *self.edge_index.get(name)?;
        let (a, b) = self.graph.edge_endpoints(ix)?;
        Some((self.graph[a].id.as_str(), self.graph[b].id.as_str()))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.node_order.iter().map(|&ix| &self.graph[ix])
    }

    /// All edges in insertion order, with endpoint ids.
    pub fn edges(&self) -> impl Iterator<Item = EdgeView<'_>> + '_ {
        self.edge_order.iter().filter_map(|&ix| self.view(ix))
    }

    fn view(&self, ix: EdgeIndex) -> Option<EdgeView<'_>> {
        let (a, b) = self.graph.edge_endpoints(ix)?;
        Some(EdgeView {
            source: &self.graph[a].id,
            target: &self.graph[b].id,
            edge: &self.graph[ix],
        })
    }

    /// Edges leaving `id`, in insertion order.
    pub fn out_edges(&self, id: &str) -> Vec<EdgeView<'_>> {
        self.edges().filter(|v| v.source == id).collect()
    }

    /// Edges entering `id`, in insertion order.
    pub fn in_edges(&self, id: &str) -> Vec<EdgeView<'_>> {
        self.edges().filter(|v| v.target == id).collect()
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    fn degree(&self, id: &str, dir: Direction) -> usize {
        self.node_index
            .get(id)
            .map_or(0, |&ix| self.graph.edges_directed(ix, dir).count())
    }

    /// Node ids in topological order; fails if the train contains a cycle.
    pub fn topological_order(&self) -> GraphResult<Vec<String>> {
        let sorted = petgraph::algo::toposort(&self.graph, None).map_err(|cycle| {
            GraphError::Cycle {
                node: self.graph[cycle.node_id()].id.clone(),
            }
        })?;
        Ok(sorted.into_iter().map(|ix| self.graph[ix].id.clone()).collect())
    }
}

impl PartialEq for TrainGraph {
    /// Attribute-for-attribute equality, including insertion order.
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes())
            && self.edge_count() == other.edge_count()
            && self.edges().zip(other.edges()).all(|(a, b)| {
                a.source == b.source && a.target == b.target && a.edge == b.edge
            })
    }
}
