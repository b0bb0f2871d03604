//! Compile a train definition into an annotated `TrainGraph`.

use tracing::{debug, info, info_span};
use wt_graph::{ProcessAttrs, TopologyBuilder, TrainGraph};
use wt_project::schema::{NodeKindDef, Project, TrainDef, UnitProcessDef};
use wt_project::validate::{check_anchor_ids, validate_config};
use wt_project::BuildConfig;

use crate::constituents::ConstituentSet;
use crate::error::{TrainError, TrainResult};
use crate::resolve::{AttributeResolver, UnitKey};
use crate::split::{InletConstraintCatalog, SplitRuleEngine, verify_splits};
use crate::tables::ReferenceTables;

/// A train ready for the solver.
#[derive(Debug, Clone)]
pub struct BuiltTrain {
    pub id: String,
    pub name: String,
    /// Case study the tables were read for.
    pub case_study: String,
    pub constituents: ConstituentSet,
    pub graph: TrainGraph,
}

/// Runs topology, recovery, split and removal/pressure resolution for one train.
#[derive(Debug, Clone)]
pub struct TrainBuilder<'a> {
    tables: &'a ReferenceTables,
    config: &'a BuildConfig,
    catalog: InletConstraintCatalog,
}

impl<'a> TrainBuilder<'a> {
    pub fn new(tables: &'a ReferenceTables, config: &'a BuildConfig) -> Self {
        Self {
            tables,
            config,
            catalog: InletConstraintCatalog::default(),
        }
    }

    /// Replace the built-in inlet ceiling catalog.
    pub fn with_catalog(mut self, catalog: InletConstraintCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn build(&self, def: &TrainDef) -> TrainResult<BuiltTrain> {
        validate_config(self.config)?;
        let case_study = def
            .case_study
            .clone()
            .unwrap_or_else(|| self.config.case_study.clone());
        let _span = info_span!(
            "build_train",
            train = %def.id,
            case_study = %case_study,
            scenario = %self.config.scenario
        )
        .entered();

        let constituents = ConstituentSet::from_declared(&def.constituents);
        let mut graph = topology(def)?;
        self.annotate(&mut graph, &case_study, &constituents)?;

        info!(
            processes = graph.unit_process_names().len(),
            links = graph.link_names().len(),
            constituents = constituents.len(),
            "train built"
        );
        Ok(BuiltTrain {
            id: def.id.clone(),
            name: def.name.clone(),
            case_study,
            constituents,
            graph,
        })
    }

    /// Build every train in a project with the project's own configuration.
    pub fn build_project(tables: &ReferenceTables, project: &Project) -> TrainResult<Vec<BuiltTrain>> {
        let builder = TrainBuilder::new(tables, &project.config);
        project.trains.iter().map(|def| builder.build(def)).collect()
    }

    /// Resolve and stamp attributes on every treatment edge of `graph`.
    ///
    /// Stops at the first process whose split factors are inconsistent.
    pub fn annotate(
        &self,
        graph: &mut TrainGraph,
        case_study: &str,
        constituents: &ConstituentSet,
    ) -> TrainResult<()> {
        let resolver = AttributeResolver::new(&self.tables.recovery, &self.tables.removal, self.config);
        let engine = SplitRuleEngine::new(
            &self.catalog,
            self.config.split_tolerance,
            self.config.default_recovery,
        );

        for name in graph.unit_process_names() {
            let Some(attrs) = graph.process_mut(&name) else {
                continue;
            };
            let treatment = attrs.treatment_name.clone();
            let key = UnitKey::canonical(&treatment);

            let recovery = resolver.apply_recovery(key, case_study, attrs);
            let factors = engine.apply(&name, key, attrs, recovery)?;
            resolver.apply_removal(key, case_study, constituents, attrs);
            resolver.apply_pressure_drops(key, attrs);
            debug!(process = %name, unit = key.as_str(), ?factors, "process resolved");
        }

        verify_splits(graph, self.config.split_tolerance)?;
        Ok(())
    }
}

/// Lay out nodes, unit processes and links from a definition.
fn topology(def: &TrainDef) -> TrainResult<TrainGraph> {
    check_anchor_ids(def)?;
    let mut builder = TopologyBuilder::new();
    for node in &def.nodes {
        match node.kind {
            NodeKindDef::Source => builder.add_source(&node.id),
            NodeKindDef::Use => builder.add_use(&node.id),
            NodeKindDef::Junction => builder.add_junction(&node.id),
        };
    }
    for process in &def.unit_processes {
        builder.add_unit_process(&process.name, process_attrs(process))?;
    }
    for link in &def.links {
        let from = def.link_source(link).ok_or_else(|| TrainError::UnknownEndpoint {
            link: link.name.clone(),
            id: link.from.clone(),
        })?;
        let to = def.link_target(link).ok_or_else(|| TrainError::UnknownEndpoint {
            link: link.name.clone(),
            id: link.to.clone(),
        })?;
        builder.connect(&link.name, &from, &to, link.split_fraction)?;
    }
    Ok(builder.build())
}

fn process_attrs(def: &UnitProcessDef) -> ProcessAttrs {
    let mut attrs = ProcessAttrs::new(def.treatment_name.clone());
    attrs.params = def.params.clone();
    attrs.nominal_recovery = def.recovery;
    attrs.recycle_request = def.recycle_fraction;
    attrs
}
