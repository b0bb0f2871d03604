//! Water and constituent mass balance through a resolved train.
//!
//! Per treatment edge:
//! - `Q_out = recovery * Q_in`, `Q_waste = waste * Q_in`, `Q_recycle = recycle * Q_in`
//! - `m_out = (1 - removal) * m_in`; the removed mass leaves with waste + recycle
//!
//! This is the contract the external solver honours; [`propagate`] evaluates
//! it directly for trains whose fractions are all fixed.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;
use wt_core::{MassConcentration, Real, kg_per_m3, m3ps};
use wt_graph::{EdgeKind, GraphError, ProcessAttrs, ProcessFlows, StreamState, TrainGraph};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BalanceError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Split or removal on this edge is left to the solver.
    #[error("Edge {edge} has solver-owned fractions; cannot propagate")]
    Unresolved { edge: String },

    #[error("Split fractions leaving node {node} sum to {sum}")]
    SplitFractions { node: String, sum: Real },
}

/// Streams leaving one treatment process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutlets {
    pub flows: ProcessFlows,
    pub outlet: StreamState,
    /// Composition shared by the waste and recycle streams.
    pub waste: StreamState,
}

/// Raw SI accumulator: flow in m³/s, mass rate in kg/s per constituent.
#[derive(Debug, Clone, Default)]
struct Accum {
    flow: Real,
    mass: BTreeMap<String, Real>,
}

impl Accum {
    fn from_state(state: &StreamState) -> Self {
        let flow = state.flow.map_or(0.0, |q| q.value);
        let mass = state
            .concentrations
            .iter()
            .map(|(name, c)| (name.clone(), c.value * flow))
            .collect();
        Self { flow, mass }
    }

    fn add_scaled(&mut self, other: &Accum, share: Real) {
        self.flow += other.flow * share;
        for (name, m) in &other.mass {
            *self.mass.entry(name.clone()).or_insert(0.0) += m * share;
        }
    }

    fn to_state(&self) -> StreamState {
        StreamState {
            flow: Some(m3ps(self.flow)),
            concentrations: self
                .mass
                .iter()
                .map(|(name, m)| (name.clone(), concentration(*m, self.flow)))
                .collect(),
        }
    }
}

fn concentration(mass_rate: Real, flow: Real) -> MassConcentration {
    if flow > 0.0 {
        kg_per_m3(mass_rate / flow)
    } else {
        kg_per_m3(0.0)
    }
}

/// Evaluate one process for the given inlet stream.
pub fn process_outlets(
    edge: &str,
    attrs: &ProcessAttrs,
    inlet: &StreamState,
) -> Result<ProcessOutlets, BalanceError> {
    let unresolved = || BalanceError::Unresolved {
        edge: edge.to_string(),
    };
    let (Some(recovery), Some(waste), Some(recycle)) =
        (attrs.recovery_factor, attrs.waste_factor, attrs.recycle_factor)
    else {
        return Err(unresolved());
    };

    let inlet = Accum::from_state(inlet);
    let q_out = recovery * inlet.flow;
    let q_reject = (waste + recycle) * inlet.flow;

    let mut outlet = Accum {
        flow: q_out,
        ..Accum::default()
    };
    let mut rejected = Accum {
        flow: q_reject,
        ..Accum::default()
    };
    for (name, m_in) in &inlet.mass {
        if attrs.calculated_removal.contains(name) {
            return Err(unresolved());
        }
        let removal = attrs.removal_fractions.get(name).copied().unwrap_or(0.0);
        outlet.mass.insert(name.clone(), (1.0 - removal) * m_in);
        rejected.mass.insert(name.clone(), removal * m_in);
    }

    Ok(ProcessOutlets {
        flows: ProcessFlows {
            inlet: m3ps(inlet.flow),
            outlet: m3ps(q_out),
            waste: m3ps(waste * inlet.flow),
            recycle: m3ps(recycle * inlet.flow),
        },
        outlet: outlet.to_state(),
        waste: rejected.to_state(),
    })
}

/// Push source inflows through the train in topological order.
///
/// Writes node `state` and process `flows`. Sources missing from `inflows`
/// contribute nothing. Links without a `split_fraction` share whatever the
/// explicit fractions leave, equally; a treatment edge counts as such a link.
/// Waste and recycle streams are recorded on the edge but not routed.
pub fn propagate(
    graph: &mut TrainGraph,
    inflows: &BTreeMap<String, StreamState>,
    tolerance: Real,
) -> Result<(), BalanceError> {
    let order = graph.topological_order()?;
    let mut pending: BTreeMap<String, Accum> = inflows
        .iter()
        .map(|(id, state)| (id.clone(), Accum::from_state(state)))
        .collect();

    for node_id in order {
        let arrived = pending.remove(&node_id).unwrap_or_default();
        if let Some(node) = graph.node_mut(&node_id) {
            node.state = arrived.to_state();
        }

        let shares = outflow_shares(graph, &node_id, tolerance)?;
        for (edge_name, target, share) in shares {
            let Some(edge) = graph.edge_mut(&edge_name) else {
                continue;
            };
            let mut carried = Accum::default();
            carried.add_scaled(&arrived, share);
            let delivered = match &mut edge.kind {
                EdgeKind::TransportLink { .. } => carried,
                EdgeKind::TreatmentProcess(attrs) => {
                    let out = process_outlets(&edge_name, attrs, &carried.to_state())?;
                    attrs.flows = Some(out.flows);
                    Accum::from_state(&out.outlet)
                }
            };
            pending
                .entry(target)
                .or_default()
                .add_scaled(&delivered, 1.0);
        }
    }
    debug!(nodes = graph.node_count(), "propagated flows");
    Ok(())
}

/// `(edge, target, share)` for every edge leaving `node`.
fn outflow_shares(
    graph: &TrainGraph,
    node: &str,
    tolerance: Real,
) -> Result<Vec<(String, String, Real)>, BalanceError> {
    let out = graph.out_edges(node);
    let explicit: Real = out
        .iter()
        .filter_map(|v| match v.edge.kind {
            EdgeKind::TransportLink { split_fraction } => split_fraction,
            EdgeKind::TreatmentProcess(_) => None,
        })
        .sum();
    let implicit = out
        .iter()
        .filter(|v| {
            !matches!(
                v.edge.kind,
                EdgeKind::TransportLink {
                    split_fraction: Some(_)
                }
            )
        })
        .count();

    let remainder = 1.0 - explicit;
    if remainder < -tolerance || (implicit == 0 && !out.is_empty() && remainder > tolerance) {
        return Err(BalanceError::SplitFractions {
            node: node.to_string(),
            sum: explicit,
        });
    }
    let each = if implicit > 0 {
        remainder.max(0.0) / implicit as Real
    } else {
        0.0
    };

    Ok(out
        .into_iter()
        .map(|v| {
            let share = match v.edge.kind {
                EdgeKind::TransportLink {
                    split_fraction: Some(s),
                } => s,
                _ => each,
            };
            (v.edge.name.clone(), v.target.to_string(), share)
        })
        .collect())
}
