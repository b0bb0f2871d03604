//! Project validation logic.

use std::collections::HashSet;

use wt_graph::{end_node_id, start_node_id};

use crate::schema::{BuildConfig, Project, TrainDef};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_config(&project.config)?;

    let mut train_ids = HashSet::new();
    for train in &project.trains {
        if !train_ids.insert(&train.id) {
            return Err(ValidationError::DuplicateId {
                id: train.id.clone(),
                context: "trains".to_string(),
            });
        }
        validate_train(train)?;
    }

    Ok(())
}

pub fn validate_config(config: &BuildConfig) -> Result<(), ValidationError> {
    if config.case_study.trim().is_empty() {
        return Err(invalid("config.case_study", "", "must not be empty"));
    }
    if !(config.split_tolerance.is_finite() && config.split_tolerance > 0.0) {
        return Err(invalid(
            "config.split_tolerance",
            config.split_tolerance,
            "must be finite and positive",
        ));
    }
    check_fraction("config.default_removal", config.default_removal)?;
    check_fraction("config.default_recovery", config.default_recovery)?;
    if !(config.negligible_pressure_drop_bar.is_finite()
        && config.negligible_pressure_drop_bar >= 0.0)
    {
        return Err(invalid(
            "config.negligible_pressure_drop_bar",
            config.negligible_pressure_drop_bar,
            "must be finite and non-negative",
        ));
    }
    Ok(())
}

fn validate_train(train: &TrainDef) -> Result<(), ValidationError> {
    let mut node_ids = HashSet::new();
    for node in &train.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: node.id.clone(),
                context: format!("train '{}' nodes", train.name),
            });
        }
    }

    // Processes and links share one edge namespace.
    let mut edge_names = HashSet::new();
    for process in &train.unit_processes {
        if !edge_names.insert(process.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: process.name.clone(),
                context: format!("train '{}' unit processes", train.name),
            });
        }
        if let Some(r) = process.recovery {
            check_fraction(&format!("{}.recovery", process.name), r)?;
        }
        if let Some(r) = process.recycle_fraction {
            check_fraction(&format!("{}.recycle_fraction", process.name), r)?;
        }
    }

    check_anchor_ids(train)?;

    for link in &train.links {
        if !edge_names.insert(link.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: link.name.clone(),
                context: format!("train '{}' links", train.name),
            });
        }
        if train.link_source(link).is_none() {
            return Err(ValidationError::MissingReference {
                id: link.from.clone(),
                context: format!("link '{}' from", link.name),
            });
        }
        if train.link_target(link).is_none() {
            return Err(ValidationError::MissingReference {
                id: link.to.clone(),
                context: format!("link '{}' to", link.name),
            });
        }
        if let Some(s) = link.split_fraction {
            check_fraction(&format!("{}.split_fraction", link.name), s)?;
        }
    }

    Ok(())
}

/// Declared nodes must not reuse a `<process>_start`/`<process>_end` anchor id.
pub fn check_anchor_ids(train: &TrainDef) -> Result<(), ValidationError> {
    for process in &train.unit_processes {
        for anchor in [start_node_id(&process.name), end_node_id(&process.name)] {
            if train.nodes.iter().any(|n| n.id == anchor) {
                return Err(ValidationError::DuplicateId {
                    id: anchor,
                    context: format!("train '{}' nodes vs unit process anchors", train.name),
                });
            }
        }
    }
    Ok(())
}

fn check_fraction(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value, "must be within 0..=1"))
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
